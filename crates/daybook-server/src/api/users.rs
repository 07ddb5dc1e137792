// User management HTTP routes
//
// GET /v1/users             - List all users (admin)
// GET /v1/users/me          - Current user
// GET /v1/users/me/settings - Current user's settings object
// PUT /v1/users/me/settings - Replace current user's settings
// PUT /v1/users/:user_id    - Update a user (self or admin)
// DELETE /v1/users/:user_id - Delete a user (admin; admins are not deletable)

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use daybook_storage::UserRow;

use crate::auth::middleware::{AdminUser, AuthState, AuthUser, FromRef};
use crate::error::ApiResult;
use crate::services::UserService;

use super::common::{Envelope, MessageBody};

/// Public user record. The password hash never leaves the server; the
/// session token appears only on stored-token accounts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Settings as a JSON object; absent or malformed stored text reads as {}.
    pub settings: Value,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let settings = row.parsed_settings();
        Self {
            id: row.id,
            username: row.username,
            token: row.token,
            settings,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Request to update a user. Only provided fields change.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    /// New login password; stored re-hashed, never verbatim.
    pub password: Option<String>,
    /// Replacement opaque session token (stored-token deployments).
    pub token: Option<String>,
    /// Replacement settings object, serialized for storage as given.
    #[schema(value_type = Option<Object>)]
    pub settings: Option<serde_json::Map<String, Value>>,
}

/// App state for user routes
#[derive(Clone)]
pub struct UsersState {
    pub service: Arc<UserService>,
    pub auth: AuthState,
}

impl UsersState {
    pub fn new(auth: AuthState) -> Self {
        Self {
            service: Arc::new(UserService::new(auth.store.clone())),
            auth,
        }
    }
}

impl FromRef<UsersState> for AuthState {
    fn from_ref(state: &UsersState) -> AuthState {
        state.auth.clone()
    }
}

/// Create user routes
pub fn routes(state: UsersState) -> Router {
    Router::new()
        .route("/v1/users", get(list_users))
        .route("/v1/users/me", get(get_current_user))
        .route(
            "/v1/users/me/settings",
            get(get_settings).put(update_settings),
        )
        .route("/v1/users/:user_id", put(update_user).delete(delete_user))
        .with_state(state)
}

/// GET /v1/users - List all users
#[utoipa::path(
    get,
    path = "/v1/users",
    responses(
        (status = 200, description = "List of users", body = Envelope<Vec<User>>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin access required")
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<UsersState>,
    AdminUser(_admin): AdminUser,
) -> ApiResult<Envelope<Vec<User>>> {
    let users = state.service.list().await?;
    Ok(Envelope::ok(users))
}

/// GET /v1/users/me - Current user
#[utoipa::path(
    get,
    path = "/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = Envelope<User>),
        (status = 401, description = "Not authenticated")
    ),
    tag = "users"
)]
pub async fn get_current_user(
    State(state): State<UsersState>,
    user: AuthUser,
) -> ApiResult<Envelope<User>> {
    let user = state.service.get(user.id).await?;
    Ok(Envelope::ok(user))
}

/// GET /v1/users/me/settings - Current user's settings object
#[utoipa::path(
    get,
    path = "/v1/users/me/settings",
    responses(
        (status = 200, description = "Settings object"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "users"
)]
pub async fn get_settings(user: AuthUser) -> Envelope<Value> {
    // Already parsed (leniently) when the user context was built.
    Envelope::ok(user.settings)
}

/// PUT /v1/users/me/settings - Replace current user's settings
#[utoipa::path(
    put,
    path = "/v1/users/me/settings",
    responses(
        (status = 200, description = "Updated user", body = Envelope<User>),
        (status = 401, description = "Not authenticated")
    ),
    tag = "users"
)]
pub async fn update_settings(
    State(state): State<UsersState>,
    user: AuthUser,
    Json(settings): Json<serde_json::Map<String, Value>>,
) -> ApiResult<Envelope<User>> {
    let user = state.service.update_settings(&user, settings).await?;
    Ok(Envelope::ok(user))
}

/// PUT /v1/users/{user_id} - Update a user
#[utoipa::path(
    put,
    path = "/v1/users/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = Envelope<User>),
        (status = 400, description = "Empty or invalid update"),
        (status = 403, description = "Not your account"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username or token already in use")
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<UsersState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Envelope<User>> {
    let updated = state.service.update(&user, user_id, req).await?;
    Ok(Envelope::ok(updated))
}

/// DELETE /v1/users/{user_id} - Delete a user and everything they own
#[utoipa::path(
    delete,
    path = "/v1/users/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted", body = Envelope<MessageBody>),
        (status = 403, description = "Admin access required, or target is an admin"),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<UsersState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Envelope<MessageBody>> {
    state.service.delete(&admin, user_id).await?;
    Ok(Envelope::ok(MessageBody::new("user deleted")))
}
