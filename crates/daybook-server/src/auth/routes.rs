// Authentication HTTP routes
// Decision: /v1/auth/* prefix, consistent with the other API routes
// Decision: login answers with the token in the body and as an HttpOnly
// cookie, so both API clients and the browser UI can hold a session

use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use daybook_storage::password::{hash_password, verify_password};
use daybook_storage::CreateUser;

use super::config::AuthStrategy;
use super::middleware::{AuthState, OptionalAuthUser, INVALID_TOKEN};
use super::token::generate_opaque_token;
use crate::api::common::{Envelope, MessageBody};
use crate::api::users::User;
use crate::error::{ApiError, ApiResult};

/// Register request. `password` is required under the signed strategy;
/// `token` is honored only under the stored strategy (omitted, one is
/// generated and returned on the created record).
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: Option<String>,
    pub token: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

/// Token validation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateRequest {
    pub token: String,
}

/// Token validation response. `user` is filled only under the stored
/// strategy, where validation resolves the token to its account.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Create auth routes
pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/validate", post(validate))
        .route("/v1/auth/logout", post(logout))
        .with_state(state)
}

/// POST /v1/auth/register - Create a new account
///
/// Open to anyone under the signed strategy; admin-only under the stored
/// strategy, where tokens are handed out rather than self-served.
pub async fn register(
    State(state): State<AuthState>,
    OptionalAuthUser(caller): OptionalAuthUser,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Envelope<User>> {
    if !state.config.open_registration() {
        match caller {
            None => return Err(ApiError::unauthorized("Authentication required")),
            Some(user) if !user.is_admin => {
                return Err(ApiError::forbidden("Admin access required"))
            }
            Some(_) => {}
        }
    }

    if req.username.trim().is_empty() {
        return Err(ApiError::Validation("username is required".to_string()));
    }

    let input = match state.config.strategy {
        AuthStrategy::Signed => {
            let password = req
                .password
                .as_deref()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| ApiError::Validation("password is required".to_string()))?;
            CreateUser {
                username: req.username,
                password_hash: Some(hash_password(password)?),
                token: None,
                settings: None,
                is_admin: false,
            }
        }
        AuthStrategy::Stored => CreateUser {
            username: req.username,
            password_hash: None,
            token: Some(req.token.unwrap_or_else(generate_opaque_token)),
            settings: None,
            is_admin: false,
        },
    };

    let user = state.store.create_user(input).await?;
    Ok(Envelope::created(User::from(user)))
}

/// POST /v1/auth/login - Login with username and password
///
/// One rejection message covers unknown users, passwordless accounts, and
/// wrong passwords; callers must not be able to probe which it was.
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Envelope<LoginResponse>)> {
    if !state.config.password_login_enabled() {
        return Err(ApiError::unauthorized("Password authentication is disabled"));
    }

    let user = state
        .store
        .get_user_by_username(&req.username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    let valid = user
        .password_hash
        .as_deref()
        .map(|hash| verify_password(&req.password, hash))
        .unwrap_or(false);
    if !valid {
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    let access_token = state.tokens.issue(user.id, &user.username)?;

    let cookie = Cookie::build(("access_token", access_token.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(state.tokens.lifetime_secs()))
        .build();

    Ok((
        jar.add(cookie),
        Envelope::ok(LoginResponse {
            access_token,
            token_type: "bearer".to_string(),
            user: User::from(user),
        }),
    ))
}

/// POST /v1/auth/validate - Check a token without opening a session
pub async fn validate(
    State(state): State<AuthState>,
    Json(req): Json<ValidateRequest>,
) -> ApiResult<Envelope<ValidateResponse>> {
    match state.config.strategy {
        AuthStrategy::Signed => {
            // Stateless: signature and expiry only, no store round trip.
            state
                .tokens
                .verify(&req.token)
                .map_err(|_| ApiError::unauthorized(INVALID_TOKEN))?;
            Ok(Envelope::ok(ValidateResponse {
                valid: true,
                user: None,
            }))
        }
        AuthStrategy::Stored => {
            let user = state
                .store
                .get_user_by_token(&req.token)
                .await?
                .ok_or_else(|| ApiError::unauthorized(INVALID_TOKEN))?;
            Ok(Envelope::ok(ValidateResponse {
                valid: true,
                user: Some(User::from(user)),
            }))
        }
    }
}

/// POST /v1/auth/logout - Clear the session cookie
pub async fn logout(jar: CookieJar) -> (CookieJar, Envelope<MessageBody>) {
    (
        jar.remove(Cookie::build("access_token").path("/")),
        Envelope::ok(MessageBody::new("logged out")),
    )
}
