// Note CRUD HTTP routes
//
// Notes are strictly private: every note has an owner and only the owner
// (or an admin) can see it. There is no unowned-note carve-out.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use daybook_storage::NoteRow;

use crate::auth::middleware::{AuthState, AuthUser, FromRef};
use crate::error::ApiResult;
use crate::services::NoteService;

use super::common::{Envelope, MessageBody};

/// Public note record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Request to create a note
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    #[schema(example = "groceries")]
    pub title: String,
    #[schema(example = "milk, eggs, bread")]
    pub content: String,
}

/// Request to update a note. Only provided fields change.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// App state for note routes
#[derive(Clone)]
pub struct NotesState {
    pub service: Arc<NoteService>,
    pub auth: AuthState,
}

impl NotesState {
    pub fn new(auth: AuthState) -> Self {
        Self {
            service: Arc::new(NoteService::new(auth.store.clone())),
            auth,
        }
    }
}

impl FromRef<NotesState> for AuthState {
    fn from_ref(state: &NotesState) -> AuthState {
        state.auth.clone()
    }
}

/// Create note routes
pub fn routes(state: NotesState) -> Router {
    Router::new()
        .route("/v1/notes", post(create_note).get(list_notes))
        .route(
            "/v1/notes/:note_id",
            get(get_note).put(update_note).delete(delete_note),
        )
        .with_state(state)
}

/// POST /v1/notes - Create a new note
#[utoipa::path(
    post,
    path = "/v1/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created", body = Envelope<Note>),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "notes"
)]
pub async fn create_note(
    State(state): State<NotesState>,
    user: AuthUser,
    Json(req): Json<CreateNoteRequest>,
) -> ApiResult<Envelope<Note>> {
    let note = state.service.create(&user, req).await?;
    Ok(Envelope::created(note))
}

/// GET /v1/notes - List the caller's notes
#[utoipa::path(
    get,
    path = "/v1/notes",
    responses(
        (status = 200, description = "Notes, most recently updated first", body = Envelope<Vec<Note>>),
        (status = 401, description = "Not authenticated")
    ),
    tag = "notes"
)]
pub async fn list_notes(
    State(state): State<NotesState>,
    user: AuthUser,
) -> ApiResult<Envelope<Vec<Note>>> {
    let notes = state.service.list(&user).await?;
    Ok(Envelope::ok(notes))
}

/// GET /v1/notes/{note_id} - Get note by ID
#[utoipa::path(
    get,
    path = "/v1/notes/{note_id}",
    params(
        ("note_id" = Uuid, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note found", body = Envelope<Note>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not accessible")
    ),
    tag = "notes"
)]
pub async fn get_note(
    State(state): State<NotesState>,
    user: AuthUser,
    Path(note_id): Path<Uuid>,
) -> ApiResult<Envelope<Note>> {
    let note = state.service.get(&user, note_id).await?;
    Ok(Envelope::ok(note))
}

/// PUT /v1/notes/{note_id} - Update a note
#[utoipa::path(
    put,
    path = "/v1/notes/{note_id}",
    params(
        ("note_id" = Uuid, Path, description = "Note ID")
    ),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated", body = Envelope<Note>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not accessible")
    ),
    tag = "notes"
)]
pub async fn update_note(
    State(state): State<NotesState>,
    user: AuthUser,
    Path(note_id): Path<Uuid>,
    Json(req): Json<UpdateNoteRequest>,
) -> ApiResult<Envelope<Note>> {
    let note = state.service.update(&user, note_id, req).await?;
    Ok(Envelope::ok(note))
}

/// DELETE /v1/notes/{note_id} - Delete a note
#[utoipa::path(
    delete,
    path = "/v1/notes/{note_id}",
    params(
        ("note_id" = Uuid, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note deleted", body = Envelope<MessageBody>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not accessible")
    ),
    tag = "notes"
)]
pub async fn delete_note(
    State(state): State<NotesState>,
    user: AuthUser,
    Path(note_id): Path<Uuid>,
) -> ApiResult<Envelope<MessageBody>> {
    state.service.delete(&user, note_id).await?;
    Ok(Envelope::ok(MessageBody::new("note deleted")))
}
