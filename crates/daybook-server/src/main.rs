// Daybook API server
// Decision: PostgreSQL when DATABASE_URL is set, in-memory otherwise, so
// the server runs with no infrastructure in dev mode

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use daybook_server::auth::{ensure_bootstrap_admin, AuthConfig};
use daybook_server::openapi::ApiDoc;
use daybook_storage::StorageBackend;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daybook_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    if let Ok(path) = dotenvy::dotenv() {
        tracing::info!("Loaded .env from {:?}", path);
    }

    tracing::info!("daybook-server starting...");

    // Select storage backend
    let store = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let store = StorageBackend::postgres(&url)
                .await
                .context("Failed to connect to database")?;
            store.migrate().await.context("Failed to run migrations")?;
            tracing::info!("Connected to database");
            store
        }
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set; using in-memory storage, data will not survive a restart"
            );
            StorageBackend::in_memory()
        }
    };
    let store = Arc::new(store);

    // Load authentication configuration and seed the admin account
    let auth_config = AuthConfig::from_env();
    tracing::info!(
        strategy = auth_config.strategy.as_str(),
        open_registration = auth_config.open_registration(),
        "Authentication configured"
    );
    ensure_bootstrap_admin(&store, &auth_config).await?;

    // Upload directory; its relative form doubles as the public URL prefix
    let upload_dir = PathBuf::from(
        std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "static/uploads".to_string()),
    );

    // Load API prefix from environment (default: empty)
    // Example: API_PREFIX="/api" results in routes like /api/v1/activities
    let api_prefix = std::env::var("API_PREFIX").unwrap_or_default();
    if !api_prefix.is_empty() {
        tracing::info!(prefix = %api_prefix, "API prefix configured");
    }

    // Load CORS allowed origins from environment (optional)
    // Only needed when the UI is served from a different origin than the API
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect()
        })
        .unwrap_or_default();

    if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
    }

    let app = daybook_server::build_app(store, auth_config, upload_dir, &api_prefix);

    // Add Swagger UI
    let app =
        app.merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // Add CORS layer only if origins are configured
    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                    header::CACHE_CONTROL,
                ])
                .allow_credentials(true),
        )
    } else {
        app
    };

    // Add tracing
    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    let addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:9000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
