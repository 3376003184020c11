//! Authorization module - capability registry, role store and access guard
//!
//! The decision engine is split into:
//! - a registry of capability identifiers declared per resource type
//! - a role store mapping role names to granted capability sets
//! - a pure, synchronous guard computing Allow/Deny per request

mod guard;
mod principal;
mod registry;
mod roles;

pub use guard::{AccessDecision, AccessPolicy, Guard};
pub use principal::Principal;
pub use registry::{Capability, PermissionRegistry};
pub use roles::RoleStore;

/// Well-known role names, matching the provisioned role table.
pub mod role_names {
    pub const EDITORS: &str = "Editors";
    pub const VIEWERS: &str = "Viewers";
    pub const ADMINS: &str = "Admins";
}

/// Well-known action names.
pub mod actions {
    pub const VIEW: &str = "view";
    pub const CREATE: &str = "create";
    pub const EDIT: &str = "edit";
    pub const DELETE: &str = "delete";
}

/// Well-known resource types.
pub mod resources {
    pub const BOOK: &str = "book";
}
