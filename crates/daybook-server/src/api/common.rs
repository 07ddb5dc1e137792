// Common DTOs for public API
//
// Every JSON response is wrapped in the same envelope: `{status, data}`,
// with the domain status mirrored into the transport status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard response envelope for API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Envelope<T> {
    /// Domain status, mirrored from the HTTP status code.
    pub status: u16,
    /// Operation payload.
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        Self {
            status: status.as_u16(),
            data,
        }
    }

    pub fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, data)
    }

    pub fn created(data: T) -> Self {
        Self::new(StatusCode::CREATED, data)
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Payload for endpoints that only confirm an outcome.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageBody {
    /// Human-readable outcome description.
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
