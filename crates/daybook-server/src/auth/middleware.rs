// Authentication middleware and extractors
// Decision: Accept the token from the Authorization header (API clients)
// or the access_token cookie (browser UI)
// Decision: every verification failure collapses to one message; callers
// must not be able to probe whether a token is malformed, expired, or
// belongs to a deleted user

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use uuid::Uuid;

use daybook_storage::StorageBackend;

use super::config::{AuthConfig, AuthStrategy};
use super::token::TokenService;
use crate::error::ApiError;

/// The one message returned for every token verification failure.
pub const INVALID_TOKEN: &str = "Invalid or expired token";

/// Authenticated user context extracted from request
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User ID
    pub id: Uuid,
    /// Username
    pub username: String,
    /// Opaque session token, present only for stored-token accounts
    pub token: Option<String>,
    /// Admin role flag, read fresh from the user record
    pub is_admin: bool,
    /// Settings parsed to a JSON object ({} when absent or malformed)
    pub settings: serde_json::Value,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl AuthUser {
    fn from_row(row: daybook_storage::UserRow) -> Self {
        let settings = row.parsed_settings();
        Self {
            id: row.id,
            username: row.username,
            token: row.token,
            is_admin: row.is_admin,
            settings,
            updated_at: row.updated_at,
        }
    }
}

/// Auth state shared across routes
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub tokens: Arc<TokenService>,
    pub store: Arc<StorageBackend>,
}

impl AuthState {
    pub fn new(config: AuthConfig, store: Arc<StorageBackend>) -> Self {
        let tokens = Arc::new(TokenService::new(config.token.clone()));
        Self {
            config,
            tokens,
            store,
        }
    }
}

/// Helper trait for extracting AuthState from application state
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

impl FromRef<AuthState> for AuthState {
    fn from_ref(input: &AuthState) -> Self {
        input.clone()
    }
}

/// Extractor for authenticated user
/// This is required - returns 401 if not authenticated
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        extract_auth_user(parts, &auth_state).await
    }
}

/// Extract authenticated user from request
async fn extract_auth_user(parts: &mut Parts, auth_state: &AuthState) -> Result<AuthUser, ApiError> {
    // Try to extract from Authorization header first
    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::unauthorized("Invalid authorization header"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return authenticate_token(token, auth_state).await;
        }
    }

    // Try to extract from cookie (for UI)
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get("access_token") {
        return authenticate_token(cookie.value(), auth_state).await;
    }

    // No valid credentials found
    Err(ApiError::unauthorized("Authentication required"))
}

/// Resolve a bearer token to a user under the configured strategy
pub async fn authenticate_token(
    token: &str,
    auth_state: &AuthState,
) -> Result<AuthUser, ApiError> {
    match auth_state.config.strategy {
        AuthStrategy::Signed => {
            let claims = auth_state.tokens.verify(token).map_err(|e| {
                tracing::debug!("token verification failed: {e}");
                ApiError::unauthorized(INVALID_TOKEN)
            })?;

            let user_id = Uuid::parse_str(&claims.sub)
                .map_err(|_| ApiError::unauthorized(INVALID_TOKEN))?;

            // The subject must still exist; tokens die with their user.
            let user = auth_state
                .store
                .get_user(user_id)
                .await?
                .ok_or_else(|| ApiError::unauthorized(INVALID_TOKEN))?;

            Ok(AuthUser::from_row(user))
        }
        AuthStrategy::Stored => {
            let user = auth_state
                .store
                .get_user_by_token(token)
                .await?
                .ok_or_else(|| ApiError::unauthorized(INVALID_TOKEN))?;

            Ok(AuthUser::from_row(user))
        }
    }
}

/// Optional auth extractor - returns None instead of rejecting when the
/// request carries no valid credential
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        match extract_auth_user(parts, &auth_state).await {
            Ok(user) => Ok(OptionalAuthUser(Some(user))),
            Err(_) => Ok(OptionalAuthUser(None)),
        }
    }
}

/// Require admin role extractor
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_admin {
            return Err(ApiError::forbidden("Admin access required"));
        }

        Ok(AdminUser(user))
    }
}
