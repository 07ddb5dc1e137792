// File upload HTTP route
//
// POST /v1/uploads - Store an uploaded file under a random name and return
// the public path it will be served from

use anyhow::Context;
use axum::{
    extract::{Multipart, State},
    routing::post,
    Router,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use utoipa::ToSchema;

use crate::auth::middleware::{AuthState, AuthUser, FromRef};
use crate::error::{ApiError, ApiResult};

use super::common::Envelope;

/// Upload response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Public path of the stored file
    #[schema(example = "/static/uploads/a1b2c3d4e5f60718.png")]
    pub url: String,
}

/// App state for upload routes
#[derive(Clone)]
pub struct UploadsState {
    /// Directory uploads are written to. Its relative form doubles as the
    /// public URL prefix the files are served from.
    pub upload_dir: PathBuf,
    pub auth: AuthState,
}

impl UploadsState {
    pub fn new(auth: AuthState, upload_dir: PathBuf) -> Self {
        Self { upload_dir, auth }
    }
}

impl FromRef<UploadsState> for AuthState {
    fn from_ref(state: &UploadsState) -> AuthState {
        state.auth.clone()
    }
}

/// Create upload routes
pub fn routes(state: UploadsState) -> Router {
    Router::new()
        .route("/v1/uploads", post(upload_file))
        .with_state(state)
}

/// POST /v1/uploads - Store an uploaded file
#[utoipa::path(
    post,
    path = "/v1/uploads",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = Envelope<UploadResponse>),
        (status = 400, description = "Missing or unreadable file field"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "uploads"
)]
pub async fn upload_file(
    State(state): State<UploadsState>,
    _user: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Envelope<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("malformed multipart body".to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        // Random name, original extension; the client filename is never
        // trusted as a path.
        let extension = field
            .file_name()
            .and_then(|name| Path::new(name).extension())
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let data = field
            .bytes()
            .await
            .map_err(|_| ApiError::Validation("failed to read uploaded file".to_string()))?;

        let name_bytes: [u8; 8] = rand::thread_rng().gen();
        let filename = format!("{}{}", hex::encode(name_bytes), extension);

        tokio::fs::create_dir_all(&state.upload_dir)
            .await
            .context("failed to create upload directory")?;
        tokio::fs::write(state.upload_dir.join(&filename), &data)
            .await
            .context("failed to store uploaded file")?;

        let url = format!("/{}/{}", public_prefix(&state.upload_dir), filename);
        return Ok(Envelope::ok(UploadResponse { url }));
    }

    Err(ApiError::Validation("missing \"file\" field".to_string()))
}

fn public_prefix(dir: &Path) -> String {
    dir.to_string_lossy()
        .trim_start_matches("./")
        .trim_matches('/')
        .to_string()
}
