use crate::authz::{actions, resources, role_names, Capability, PermissionRegistry, RoleStore};
use crate::errors::AppResult;

/// One row of the provisioned role table.
#[derive(Debug, Clone, Copy)]
pub struct RoleSpec {
    pub name: &'static str,
    pub capabilities: &'static [&'static str],
}

/// The fixed role table:
/// - Editors: can view, create and edit books
/// - Viewers: can only view books
/// - Admins: can view, create, edit and delete books
pub const DEFAULT_ROLE_TABLE: &[RoleSpec] = &[
    RoleSpec {
        name: role_names::EDITORS,
        capabilities: &["book.view", "book.create", "book.edit"],
    },
    RoleSpec {
        name: role_names::VIEWERS,
        capabilities: &["book.view"],
    },
    RoleSpec {
        name: role_names::ADMINS,
        capabilities: &["book.view", "book.create", "book.edit", "book.delete"],
    },
];

/// Declare the capability catalog for the book resource.
pub fn register_capabilities(registry: &PermissionRegistry) {
    for action in [actions::VIEW, actions::CREATE, actions::EDIT, actions::DELETE] {
        registry.register(resources::BOOK, action);
    }
}

/// Register capabilities and provision the default role table.
///
/// Safe to re-run on every service start; provisioning replaces each
/// role's capability set wholesale. Any error here is a deployment defect
/// and must abort startup, so it is propagated rather than logged away.
pub fn provision_defaults(registry: &PermissionRegistry, roles: &RoleStore) -> AppResult<()> {
    register_capabilities(registry);

    for spec in DEFAULT_ROLE_TABLE {
        let capabilities = spec
            .capabilities
            .iter()
            .map(|name| Capability::parse(name))
            .collect::<AppResult<Vec<_>>>()?;

        roles.provision(registry, spec.name, capabilities)?;
        tracing::info!(role = spec.name, count = spec.capabilities.len(), "role ready");
    }

    Ok(())
}
