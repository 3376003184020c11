use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use super::registry::{Capability, PermissionRegistry};
use crate::errors::{AppError, AppResult};

/// Named roles, each holding a set of granted capabilities.
///
/// Mutated only by provisioning (single writer at startup or via admin
/// tooling). A role's capability set is replaced in one swap: readers see
/// the old set or the new set, never a partially updated one. Snapshots
/// are shared as `Arc`, so a request holding a set keeps a consistent
/// view even across a concurrent re-provision.
#[derive(Debug, Default)]
pub struct RoleStore {
    inner: RwLock<HashMap<String, Arc<BTreeSet<Capability>>>>,
}

impl RoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the role if absent, otherwise replace its capability set.
    ///
    /// Every capability is validated against the registry before anything
    /// is written; an undeclared capability aborts the whole call with
    /// `UnknownCapability`, leaving the previous definition intact.
    /// Re-running with an unchanged set produces no observable change.
    pub fn provision(
        &self,
        registry: &PermissionRegistry,
        role_name: &str,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> AppResult<()> {
        let capabilities: BTreeSet<Capability> = capabilities.into_iter().collect();

        for capability in &capabilities {
            if !registry.is_registered(capability) {
                return Err(AppError::unknown_capability(capability.to_string()));
            }
        }

        let mut inner = self.inner.write().expect("role store lock poisoned");
        let replaced = inner
            .insert(role_name.to_string(), Arc::new(capabilities))
            .is_some();

        tracing::info!(role = role_name, replaced, "provisioned role");
        Ok(())
    }

    /// The role's capability snapshot, or `UnknownRole`.
    pub fn granted(&self, role_name: &str) -> AppResult<Arc<BTreeSet<Capability>>> {
        let inner = self.inner.read().expect("role store lock poisoned");
        inner
            .get(role_name)
            .cloned()
            .ok_or_else(|| AppError::unknown_role(role_name))
    }

    /// Like `granted`, but a missing role yields an empty set instead of an
    /// error. Used by the guard: a stale role name on a principal grants
    /// nothing and must not fail the request.
    pub fn granted_or_empty(&self, role_name: &str) -> Arc<BTreeSet<Capability>> {
        let inner = self.inner.read().expect("role store lock poisoned");
        match inner.get(role_name) {
            Some(set) => Arc::clone(set),
            None => {
                tracing::warn!(role = role_name, "principal references unknown role");
                Arc::new(BTreeSet::new())
            }
        }
    }

    /// Role names in sorted order, for introspection surfaces.
    pub fn role_names(&self) -> Vec<String> {
        let inner = self.inner.read().expect("role store lock poisoned");
        let mut names: Vec<String> = inner.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_registry() -> PermissionRegistry {
        let registry = PermissionRegistry::new();
        for action in ["view", "create", "edit", "delete"] {
            registry.register("book", action);
        }
        registry
    }

    fn caps(names: &[&str]) -> Vec<Capability> {
        names.iter().map(|n| Capability::parse(n).unwrap()).collect()
    }

    #[test]
    fn provision_then_granted_matches() {
        let registry = book_registry();
        let store = RoleStore::new();

        store
            .provision(&registry, "Editors", caps(&["book.view", "book.create", "book.edit"]))
            .unwrap();

        let granted = store.granted("Editors").unwrap();
        assert_eq!(granted.len(), 3);
        assert!(granted.contains(&Capability::new("book", "edit")));
        assert!(!granted.contains(&Capability::new("book", "delete")));
    }

    #[test]
    fn provision_is_idempotent() {
        let registry = book_registry();
        let store = RoleStore::new();

        store.provision(&registry, "Viewers", caps(&["book.view"])).unwrap();
        let first = store.granted("Viewers").unwrap();

        store.provision(&registry, "Viewers", caps(&["book.view"])).unwrap();
        let second = store.granted("Viewers").unwrap();

        assert_eq!(*first, *second);
    }

    #[test]
    fn provision_replaces_whole_set() {
        let registry = book_registry();
        let store = RoleStore::new();

        store
            .provision(&registry, "Editors", caps(&["book.view", "book.edit"]))
            .unwrap();
        store.provision(&registry, "Editors", caps(&["book.view"])).unwrap();

        let granted = store.granted("Editors").unwrap();
        assert_eq!(granted.len(), 1);
        assert!(!granted.contains(&Capability::new("book", "edit")));
    }

    #[test]
    fn unknown_capability_aborts_without_partial_write() {
        let registry = book_registry();
        let store = RoleStore::new();

        store.provision(&registry, "Editors", caps(&["book.view"])).unwrap();

        let err = store
            .provision(&registry, "Editors", caps(&["book.view", "book.publish"]))
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownCapability(_)));

        // Previous definition still intact.
        let granted = store.granted("Editors").unwrap();
        assert_eq!(granted.len(), 1);
        assert!(granted.contains(&Capability::new("book", "view")));
    }

    #[test]
    fn unknown_role_errors_but_or_empty_does_not() {
        let store = RoleStore::new();

        assert!(matches!(store.granted("Ghost"), Err(AppError::UnknownRole(_))));
        assert!(store.granted_or_empty("Ghost").is_empty());
    }

    #[test]
    fn earlier_snapshot_survives_reprovision() {
        let registry = book_registry();
        let store = RoleStore::new();

        store
            .provision(&registry, "Admins", caps(&["book.view", "book.delete"]))
            .unwrap();
        let snapshot = store.granted("Admins").unwrap();

        store.provision(&registry, "Admins", caps(&["book.view"])).unwrap();

        // The held snapshot still shows the old set; a fresh read shows the new one.
        assert_eq!(snapshot.len(), 2);
        assert_eq!(store.granted("Admins").unwrap().len(), 1);
    }
}
