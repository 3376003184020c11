//! Read-only role introspection.
//!
//! Roles are provisioned at startup (or through the admin CLI); these
//! routes only report the current state. Any authenticated principal may
//! look up the role table and its own effective capabilities.

use axum::extract::{Path, State};
use axum::Json;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthPrincipal;
use crate::models::rbac::{EffectiveCapabilities, RoleView};

#[utoipa::path(
    get,
    path = "/rbac/roles",
    tag = "RBAC",
    responses((status = 200, description = "List of roles", body = [RoleView])),
    security(("bearerAuth" = []))
)]
pub async fn list_roles(
    State(state): State<AppState>,
    _auth: AuthPrincipal,
) -> AppResult<Json<Vec<RoleView>>> {
    let roles = state
        .roles
        .role_names()
        .into_iter()
        .map(|name| role_view(&state, &name))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Json(roles))
}

#[utoipa::path(
    get,
    path = "/rbac/roles/{name}",
    tag = "RBAC",
    params(("name" = String, Path, description = "Role name")),
    responses(
        (status = 200, description = "Role detail", body = RoleView),
        (status = 404, description = "Role does not exist")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_role(
    State(state): State<AppState>,
    _auth: AuthPrincipal,
    Path(name): Path<String>,
) -> AppResult<Json<RoleView>> {
    let view = role_view(&state, &name)
        .map_err(|_| AppError::not_found(format!("role {} not found", name)))?;
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/rbac/me",
    tag = "RBAC",
    responses((status = 200, description = "Caller's effective capabilities", body = EffectiveCapabilities)),
    security(("bearerAuth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> AppResult<Json<EffectiveCapabilities>> {
    let mut roles: Vec<String> = principal.roles.iter().cloned().collect();
    roles.sort();

    let capabilities = state
        .guard
        .effective_capabilities(&principal)
        .iter()
        .map(ToString::to_string)
        .collect();

    Ok(Json(EffectiveCapabilities {
        principal_id: principal.id,
        roles,
        superuser: principal.superuser,
        capabilities,
    }))
}

fn role_view(state: &AppState, name: &str) -> AppResult<RoleView> {
    let granted = state.roles.granted(name)?;
    Ok(RoleView {
        name: name.to_string(),
        capabilities: granted.iter().map(ToString::to_string).collect(),
    })
}
