use std::collections::BTreeSet;
use std::sync::Arc;

use super::principal::Principal;
use super::registry::Capability;
use super::roles::RoleStore;

/// Outcome of an authorization check. Deny is a normal result, not an
/// error; the caller decides whether it maps to a forbidden or not-found
/// response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny,
}

impl AccessDecision {
    pub fn is_allow(self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// Policy seam for pluggable authorization logic. Decisions are pure and
/// synchronous: no state mutation, no blocking.
pub trait AccessPolicy: Send + Sync {
    fn authorize(&self, principal: &Principal, action: &str, resource_type: &str) -> AccessDecision;
}

/// Default guard over the role store.
///
/// Evaluation order:
/// 1. superuser flag -> allow
/// 2. union of capabilities granted by the principal's roles -> allow on match
/// 3. deny
#[derive(Debug, Clone)]
pub struct Guard {
    roles: Arc<RoleStore>,
}

impl Guard {
    pub fn new(roles: Arc<RoleStore>) -> Self {
        Self { roles }
    }

    /// The principal's effective capability set: the union over all held
    /// roles. Stale role names contribute nothing.
    pub fn effective_capabilities(&self, principal: &Principal) -> BTreeSet<Capability> {
        let mut effective = BTreeSet::new();
        for role in &principal.roles {
            let granted = self.roles.granted_or_empty(role);
            effective.extend(granted.iter().cloned());
        }
        effective
    }
}

impl AccessPolicy for Guard {
    fn authorize(&self, principal: &Principal, action: &str, resource_type: &str) -> AccessDecision {
        // 1. Superuser bypasses the lookup entirely
        if principal.superuser {
            tracing::debug!(
                principal = %principal.id,
                action,
                resource_type,
                "superuser bypass"
            );
            return AccessDecision::Allow;
        }

        // 2. Union over role grants
        let wanted = Capability::new(resource_type, action);
        for role in &principal.roles {
            if self.roles.granted_or_empty(role).contains(&wanted) {
                tracing::debug!(
                    principal = %principal.id,
                    role,
                    capability = %wanted,
                    "role grant match"
                );
                return AccessDecision::Allow;
            }
        }

        // 3. Deny
        tracing::debug!(
            principal = %principal.id,
            capability = %wanted,
            "access denied"
        );
        AccessDecision::Deny
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::registry::PermissionRegistry;
    use uuid::Uuid;

    fn guard_with_roles() -> Guard {
        let registry = PermissionRegistry::new();
        for action in ["view", "create", "edit", "delete"] {
            registry.register("book", action);
        }

        let store = RoleStore::new();
        let caps = |names: &[&str]| -> Vec<Capability> {
            names.iter().map(|n| Capability::parse(n).unwrap()).collect()
        };
        store
            .provision(&registry, "Editors", caps(&["book.view", "book.create", "book.edit"]))
            .unwrap();
        store.provision(&registry, "Viewers", caps(&["book.view"])).unwrap();
        store
            .provision(
                &registry,
                "Admins",
                caps(&["book.view", "book.create", "book.edit", "book.delete"]),
            )
            .unwrap();

        Guard::new(Arc::new(store))
    }

    #[test]
    fn superuser_bypasses_all() {
        let guard = guard_with_roles();
        let principal = Principal::new(Uuid::new_v4()).with_superuser(true);

        assert!(guard.authorize(&principal, "delete", "book").is_allow());
        assert!(guard.authorize(&principal, "anything", "anywhere").is_allow());
    }

    #[test]
    fn no_roles_always_denies() {
        let guard = guard_with_roles();
        let principal = Principal::new(Uuid::new_v4());

        for action in ["view", "create", "edit", "delete"] {
            assert_eq!(guard.authorize(&principal, action, "book"), AccessDecision::Deny);
        }
    }

    #[test]
    fn editor_can_edit_but_not_delete() {
        let guard = guard_with_roles();
        let principal = Principal::new(Uuid::new_v4()).with_roles(vec!["Editors".to_string()]);

        assert!(guard.authorize(&principal, "edit", "book").is_allow());
        assert!(guard.authorize(&principal, "view", "book").is_allow());
        assert_eq!(guard.authorize(&principal, "delete", "book"), AccessDecision::Deny);
    }

    #[test]
    fn capability_scope_is_per_resource_type() {
        let guard = guard_with_roles();
        let principal = Principal::new(Uuid::new_v4()).with_roles(vec!["Admins".to_string()]);

        assert!(guard.authorize(&principal, "delete", "book").is_allow());
        assert_eq!(guard.authorize(&principal, "delete", "magazine"), AccessDecision::Deny);
    }

    #[test]
    fn union_across_multiple_roles() {
        let guard = guard_with_roles();
        let principal = Principal::new(Uuid::new_v4())
            .with_roles(vec!["Viewers".to_string(), "Editors".to_string()]);

        let effective = guard.effective_capabilities(&principal);
        assert_eq!(effective.len(), 3);
        assert!(guard.authorize(&principal, "create", "book").is_allow());
    }

    #[test]
    fn stale_role_grants_nothing_without_failing() {
        let guard = guard_with_roles();
        let principal = Principal::new(Uuid::new_v4())
            .with_roles(vec!["Retired".to_string(), "Viewers".to_string()]);

        // The stale name is ignored; the live role still applies.
        assert!(guard.authorize(&principal, "view", "book").is_allow());
        assert_eq!(guard.authorize(&principal, "edit", "book"), AccessDecision::Deny);
    }
}
