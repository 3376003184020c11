use shelfguard::config::{SecurityConfig, TlsConfig};
use shelfguard::{app, models, routes};

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(
            models::book::Book,
            models::book::BookCreateRequest,
            models::book::BookUpdateRequest,
            models::rbac::RoleView,
            models::rbac::EffectiveCapabilities,
            routes::security::CsrfTokenResponse,
            routes::health::HealthResponse
        )
    ),
    paths(
        routes::health::health,
        routes::security::csrf_token,
        routes::books::list_books,
        routes::books::get_book,
        routes::books::create_book,
        routes::books::update_book,
        routes::books::delete_book,
        routes::rbac::list_roles,
        routes::rbac::get_role,
        routes::rbac::me
    ),
    tags(
        (name = "Books", description = "Capability-gated book management"),
        (name = "RBAC", description = "Role and capability introspection"),
        (name = "Security", description = "CSRF token issuance"),
        (name = "Health", description = "Service health")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let config = SecurityConfig::from_env()?;
    tracing::info!(mode = config.mode.as_str(), "starting shelfguard");

    // create_app provisions the role table; a provisioning error aborts
    // startup here rather than serving with a broken policy.
    let app = app::create_app(config).await?;

    let openapi = serde_json::to_value(ApiDoc::openapi())?;
    let docs_route = axum::Router::new().route(
        "/api-docs/openapi.json",
        axum::routing::get(move || {
            let doc = openapi.clone();
            async move { axum::Json(doc) }
        }),
    );
    let app = app.merge(docs_route);

    let port = std::env::var("APP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    match TlsConfig::from_env() {
        Some(tls) => {
            let rustls = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                &tls.cert_path,
                &tls.key_path,
            )
            .await?;
            tracing::info!("listening on {} (tls)", addr);
            axum_server::bind_rustls(addr, rustls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!("listening on {}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
