//! Request security pipeline.
//!
//! Fixed stage order around every request:
//! 1. resolve the session (creating one when the cookie is absent)
//! 2. CSRF validation on state-changing requests, short-circuiting on failure
//! 3. capability guard per route, short-circuiting on Deny
//! 4. the resource handler
//! 5. security headers and cookie attributes on the way out, on every
//!    response including rejections from steps 2 and 3

use axum::extract::{Request, State};
use axum::http::header::{HeaderValue, COOKIE, SET_COOKIE};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;
use axum::Router;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::AccessPolicy;
use crate::cookies::{CookieKind, SESSION_COOKIE};
use crate::csrf::{is_state_changing, CSRF_HEADER};
use crate::errors::AppError;
use crate::jwt::decode_bearer;
use crate::session::Session;

/// Install the always-on stages. Axum applies the last-added layer
/// outermost, so headers wrap session resolution, which wraps CSRF
/// enforcement; headers are therefore attached even to CSRF rejections.
pub fn install(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    router
        .layer(middleware::from_fn_with_state(state.clone(), enforce_csrf))
        .layer(middleware::from_fn_with_state(state.clone(), resolve_session))
        .layer(middleware::from_fn_with_state(state.clone(), attach_security_headers))
}

/// Step 5: attach the full hardening header set to every response.
async fn attach_security_headers(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    state.headers.apply(response.headers_mut());
    response
}

/// Step 1: resolve the session from the `sessionid` cookie, creating a new
/// one when the cookie is missing or references nothing. A newly created
/// session is handed back via `Set-Cookie` with the policy's attributes.
async fn resolve_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let resolved = cookie_value(req.headers(), SESSION_COOKIE)
        .and_then(|raw| Uuid::parse_str(&raw).ok())
        .and_then(|id| state.sessions.get(id));

    let (session, created) = match resolved {
        Some(session) => (session, false),
        None => (state.sessions.create(), true),
    };

    let session_id = session.id;
    req.extensions_mut().insert(session);
    let mut response = next.run(req).await;

    if created {
        let cookie = state
            .cookie_policy
            .set_cookie(CookieKind::Session, &session_id.to_string());
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }

    response
}

/// Step 2: state-changing requests must carry a token in `X-CSRFToken`
/// matching the session's bound secret. Read-only requests pass through.
async fn enforce_csrf(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_state_changing(req.method()) {
        let session = req
            .extensions()
            .get::<Session>()
            .ok_or_else(|| AppError::internal("session not resolved before csrf check"))?;

        let supplied = req.headers().get(CSRF_HEADER).and_then(|v| v.to_str().ok());
        state.csrf.validate(session, supplied).inspect_err(|err| {
            tracing::info!(session = %session.id, error = err.kind(), "rejected request");
        })?;
    }

    Ok(next.run(req).await)
}

/// Step 3: wrap a method router so its handlers require `action` on
/// `resource_type`. Resolves the principal from the bearer token, consults
/// the guard, and rejects with 403 before the handler sees the request.
/// The resolved principal is left in the request extensions for handlers.
pub fn require_capability(
    method_router: MethodRouter<AppState>,
    state: &AppState,
    action: &'static str,
    resource_type: &'static str,
) -> MethodRouter<AppState> {
    let state = state.clone();
    method_router.layer(middleware::from_fn(move |mut req: Request, next: Next| {
        let state = state.clone();
        async move {
            let claims = match decode_bearer(req.headers(), &state.jwt) {
                Ok(claims) => claims,
                Err(err) => return err.into_response(),
            };

            let principal = claims.into_principal();
            if !state.guard.authorize(&principal, action, resource_type).is_allow() {
                // Deny maps to 403; the body names no role or capability.
                return AppError::forbidden("insufficient permissions").into_response();
            }

            req.extensions_mut().insert(principal);
            next.run(req).await
        }
    }))
}

fn cookie_value(headers: &axum::http::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|pair| {
                let (key, value) = pair.trim().split_once('=')?;
                (key == name).then(|| value.to_string())
            })
        })
}
