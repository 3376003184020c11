use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// A role with its granted capability set, for the introspection routes.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoleView {
    #[schema(example = "Editors")]
    pub name: String,
    #[schema(example = json!(["book.create", "book.edit", "book.view"]))]
    pub capabilities: Vec<String>,
}

/// The caller's computed authorization state: held roles, the effective
/// capability union over them, and the superuser flag.
#[derive(Debug, Serialize, ToSchema)]
pub struct EffectiveCapabilities {
    pub principal_id: Uuid,
    pub roles: Vec<String>,
    pub superuser: bool,
    pub capabilities: Vec<String>,
}
