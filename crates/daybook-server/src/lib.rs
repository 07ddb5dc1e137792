// Daybook server library
// Decision: Shared library so the binary and the integration tests build
// the exact same router

// API routes and types (shared for OpenAPI generation)
pub mod api;

// Authentication module
pub mod auth;

// Error taxonomy shared by every handler
pub mod error;

// Services layer
pub mod services;
pub use services::{ActivityService, NoteService, UserService};

// OpenAPI spec generation
pub mod openapi;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use daybook_storage::StorageBackend;

use auth::AuthConfig;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    auth_strategy: &'static str,
    storage: &'static str,
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    auth_strategy: &'static str,
    storage: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        auth_strategy: state.auth_strategy,
        storage: state.storage,
    })
}

/// Assemble the application router: health and auth at the root, resource
/// routes optionally nested under `api_prefix`.
pub fn build_app(
    store: Arc<StorageBackend>,
    config: AuthConfig,
    upload_dir: PathBuf,
    api_prefix: &str,
) -> Router {
    let auth_state = auth::AuthState::new(config, store.clone());

    let users_state = api::users::UsersState::new(auth_state.clone());
    let activities_state = api::activities::ActivitiesState::new(auth_state.clone());
    let notes_state = api::notes::NotesState::new(auth_state.clone());
    let uploads_state = api::uploads::UploadsState::new(auth_state.clone(), upload_dir);
    let health_state = HealthState {
        auth_strategy: auth_state.config.strategy.as_str(),
        storage: if store.is_dev_mode() {
            "memory"
        } else {
            "postgres"
        },
    };

    let api_routes = Router::new()
        .merge(api::users::routes(users_state))
        .merge(api::activities::routes(activities_state))
        .merge(api::notes::routes(notes_state))
        .merge(api::uploads::routes(uploads_state));

    Router::new()
        .route("/health", get(health).with_state(health_state))
        .merge(auth::routes(auth_state))
        .merge(build_router_with_prefix(api_routes, api_prefix))
}

/// Build router with optional API prefix (extracted for testing)
pub fn build_router_with_prefix(api_routes: Router, api_prefix: &str) -> Router {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}
