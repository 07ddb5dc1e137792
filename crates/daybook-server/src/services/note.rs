// Note service
//
// Same load-then-policy shape as activities, minus the unowned carve-out:
// a note always has an owner and only the owner (or an admin) touches it.

use std::sync::Arc;

use uuid::Uuid;

use daybook_storage::{CreateNote, NoteRow, StorageBackend, UpdateNote};

use crate::api::notes::{CreateNoteRequest, Note, UpdateNoteRequest};
use crate::auth::middleware::AuthUser;
use crate::auth::policy;
use crate::error::{ApiError, ApiResult};

pub struct NoteService {
    store: Arc<StorageBackend>,
}

impl NoteService {
    pub fn new(store: Arc<StorageBackend>) -> Self {
        Self { store }
    }

    pub async fn create(&self, user: &AuthUser, req: CreateNoteRequest) -> ApiResult<Note> {
        if req.title.trim().is_empty() {
            return Err(ApiError::Validation("title is required".to_string()));
        }

        let row = self
            .store
            .create_note(CreateNote {
                title: req.title,
                content: req.content,
                owner_id: user.id,
            })
            .await?;
        Ok(Note::from(row))
    }

    pub async fn get(&self, user: &AuthUser, id: Uuid) -> ApiResult<Note> {
        let row = self.load_accessible(user, id).await?;
        Ok(Note::from(row))
    }

    pub async fn list(&self, user: &AuthUser) -> ApiResult<Vec<Note>> {
        let rows = self.store.list_notes_for_owner(user.id).await?;
        Ok(rows.into_iter().map(Note::from).collect())
    }

    pub async fn update(&self, user: &AuthUser, id: Uuid, req: UpdateNoteRequest) -> ApiResult<Note> {
        self.load_accessible(user, id).await?;

        let row = self
            .store
            .update_note(
                id,
                UpdateNote {
                    title: req.title,
                    content: req.content,
                },
            )
            .await?
            .ok_or(ApiError::NotFound)?;
        Ok(Note::from(row))
    }

    pub async fn delete(&self, user: &AuthUser, id: Uuid) -> ApiResult<()> {
        self.load_accessible(user, id).await?;

        if !self.store.delete_note(id).await? {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    async fn load_accessible(&self, user: &AuthUser, id: Uuid) -> ApiResult<NoteRow> {
        let row = self.store.get_note(id).await?.ok_or(ApiError::NotFound)?;
        if !policy::can_access_note(user, &row) {
            return Err(ApiError::NotFound);
        }
        Ok(row)
    }
}
