use std::sync::Arc;

use axum::http::Method;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{actions, resources, Guard, PermissionRegistry, RoleStore};
use crate::config::{DeploymentMode, SecurityConfig};
use crate::cookies::CookiePolicy;
use crate::csrf::CsrfTokenService;
use crate::errors::AppError;
use crate::headers::{DirectiveSet, SecurityHeaderBuilder};
use crate::jwt::JwtConfig;
use crate::pipeline;
use crate::provision::provision_defaults;
use crate::routes::{books, health, rbac, security};
use crate::session::SessionStore;
use crate::store::BookStore;

#[derive(Clone)]
pub struct AppState {
    pub mode: DeploymentMode,
    pub jwt: Arc<JwtConfig>,
    pub roles: Arc<RoleStore>,
    pub guard: Arc<Guard>,
    pub sessions: Arc<SessionStore>,
    pub csrf: CsrfTokenService,
    pub cookie_policy: CookiePolicy,
    pub headers: Arc<SecurityHeaderBuilder>,
    pub books: Arc<BookStore>,
}

pub async fn create_app(config: SecurityConfig) -> Result<Router, AppError> {
    let jwt = JwtConfig::from_env()?;

    // Capability catalog and role table. Any provisioning error is a
    // deployment defect: propagate it and let startup abort.
    let registry = PermissionRegistry::new();
    let roles = Arc::new(RoleStore::new());
    provision_defaults(&registry, &roles)?;

    let guard = Arc::new(Guard::new(Arc::clone(&roles)));
    let sessions = Arc::new(SessionStore::new(config.session_max_age_secs));
    let csrf = CsrfTokenService::new(Arc::clone(&sessions));
    let cookie_policy = CookiePolicy::new(config.mode, config.session_max_age_secs);

    // Production means trusted transport, which is what gates HSTS.
    let headers = Arc::new(SecurityHeaderBuilder::new(
        DirectiveSet::default_policy(),
        config.hsts,
        config.mode.is_production(),
    ));

    let state = AppState {
        mode: config.mode,
        jwt: Arc::new(jwt),
        roles,
        guard,
        sessions,
        csrf,
        cookie_policy,
        headers,
        books: Arc::new(BookStore::new()),
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    // Each book operation carries its own capability gate.
    let book_routes = Router::new()
        .route(
            "/",
            pipeline::require_capability(get(books::list_books), &state, actions::VIEW, resources::BOOK),
        )
        .route(
            "/",
            pipeline::require_capability(post(books::create_book), &state, actions::CREATE, resources::BOOK),
        )
        .route(
            "/:id",
            pipeline::require_capability(get(books::get_book), &state, actions::VIEW, resources::BOOK),
        )
        .route(
            "/:id",
            pipeline::require_capability(put(books::update_book), &state, actions::EDIT, resources::BOOK),
        )
        .route(
            "/:id",
            pipeline::require_capability(delete(books::delete_book), &state, actions::DELETE, resources::BOOK),
        );

    let rbac_routes = Router::new()
        .route("/roles", get(rbac::list_roles))
        .route("/roles/:name", get(rbac::get_role))
        .route("/me", get(rbac::me));

    let security_routes = Router::new().route("/csrf", get(security::csrf_token));

    let router = Router::new()
        .route("/api/health", get(health::health))
        .nest("/books", book_routes)
        .nest("/rbac", rbac_routes)
        .nest("/security", security_routes);

    let router = pipeline::install(router, &state);

    Ok(router
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}
