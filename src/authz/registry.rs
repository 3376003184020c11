use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// One permission: an action on a resource type, rendered `resource.action`
/// (e.g. `book.view`). Capabilities are declared once and never renamed;
/// stored role grants reference them by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Capability {
    pub resource_type: String,
    pub action: String,
}

impl Capability {
    pub fn new(resource_type: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            action: action.into(),
        }
    }

    /// Parse the dotted `resource.action` form.
    pub fn parse(name: &str) -> AppResult<Self> {
        match name.split_once('.') {
            Some((resource, action)) if !resource.is_empty() && !action.is_empty() => {
                Ok(Self::new(resource, action))
            }
            _ => Err(AppError::unknown_capability(name)),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.action)
    }
}

/// Catalog of capability identifiers per resource type.
///
/// Registration happens at startup; lookups happen on every request.
/// Registering the same pair twice is a no-op.
#[derive(Debug, Default)]
pub struct PermissionRegistry {
    inner: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl PermissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a capability for a resource type. Idempotent.
    pub fn register(&self, resource_type: &str, action: &str) {
        let mut inner = self.inner.write().expect("permission registry lock poisoned");
        let actions = inner.entry(resource_type.to_string()).or_default();
        if actions.insert(action.to_string()) {
            tracing::debug!(resource_type, action, "registered capability");
        }
    }

    /// The declared action set for a resource type.
    pub fn capabilities(&self, resource_type: &str) -> AppResult<BTreeSet<String>> {
        let inner = self.inner.read().expect("permission registry lock poisoned");
        inner
            .get(resource_type)
            .cloned()
            .ok_or_else(|| AppError::unknown_resource_type(resource_type))
    }

    pub fn is_registered(&self, capability: &Capability) -> bool {
        let inner = self.inner.read().expect("permission registry lock poisoned");
        inner
            .get(&capability.resource_type)
            .is_some_and(|actions| actions.contains(&capability.action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent() {
        let registry = PermissionRegistry::new();
        registry.register("book", "view");
        registry.register("book", "view");
        registry.register("book", "edit");

        let caps = registry.capabilities("book").unwrap();
        assert_eq!(caps.len(), 2);
        assert!(caps.contains("view"));
        assert!(caps.contains("edit"));
    }

    #[test]
    fn unknown_resource_type_fails() {
        let registry = PermissionRegistry::new();
        registry.register("book", "view");

        let err = registry.capabilities("magazine").unwrap_err();
        assert!(matches!(err, AppError::UnknownResourceType(_)));
    }

    #[test]
    fn capability_parse_round_trip() {
        let cap = Capability::parse("book.view").unwrap();
        assert_eq!(cap.resource_type, "book");
        assert_eq!(cap.action, "view");
        assert_eq!(cap.to_string(), "book.view");

        assert!(Capability::parse("no-dot").is_err());
        assert!(Capability::parse(".view").is_err());
        assert!(Capability::parse("book.").is_err());
    }
}
