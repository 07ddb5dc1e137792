// API error taxonomy
// Decision: one error enum for every handler; absence and denial on owned
// resources share a single NotFound rendering so responses cannot reveal
// whether a resource exists

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use daybook_storage::StoreError;
use thiserror::Error;

use crate::api::common::{Envelope, MessageBody};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, invalid, or expired credential.
    #[error("{0}")]
    Unauthorized(String),

    /// Valid identity, disallowed administrative action.
    #[error("{0}")]
    Forbidden(String),

    /// Resource absent or not owned by the caller.
    #[error("not found or not accessible")]
    NotFound,

    /// Duplicate username or session token.
    #[error("{0}")]
    Conflict(String),

    /// Malformed or incomplete input.
    #[error("{0}")]
    Validation(String),

    /// Storage or other unexpected failure. Rendered as a generic message;
    /// the cause chain goes to the log only.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::Unauthorized(message.to_string())
    }

    pub fn forbidden(message: &str) -> Self {
        Self::Forbidden(message.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Other(inner) => Self::Internal(inner),
            dup => Self::Conflict(dup.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Internal(err) => {
                tracing::error!("request failed: {err:#}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        Envelope::new(status, MessageBody::new(message)).into_response()
    }
}
