use axum::http::header::{HeaderValue, SET_COOKIE};
use axum::response::{IntoResponse, Response};
use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::cookies::CookieKind;
use crate::errors::{AppError, AppResult};
use crate::session::Session;

#[derive(Debug, Serialize, ToSchema)]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

/// Issue (or re-derive) the CSRF token for the current session. Clients
/// send it back in `X-CSRFToken` on every state-changing request. The
/// token is also mirrored into the `csrftoken` cookie under the cookie
/// policy's attributes.
#[utoipa::path(
    get,
    path = "/security/csrf",
    tag = "Security",
    responses((status = 200, description = "CSRF token for the current session", body = CsrfTokenResponse))
)]
pub async fn csrf_token(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Response> {
    let token = state.csrf.issue(session.id)?;

    let cookie = state.cookie_policy.set_cookie(CookieKind::Csrf, &token);
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|_| AppError::internal("invalid csrf cookie value"))?;

    let mut response = Json(CsrfTokenResponse { csrf_token: token }).into_response();
    response.headers_mut().append(SET_COOKIE, cookie);
    Ok(response)
}
