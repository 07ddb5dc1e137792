// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// This module provides a unified StorageBackend enum that can work with
// either PostgreSQL (production) or in-memory (dev mode) storage.

use anyhow::Result;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::memory::InMemoryStore;
use crate::models::*;
use crate::repositories::Database;

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory store (dev mode)
    InMemory(std::sync::Arc<InMemoryStore>),
}

impl StorageBackend {
    /// Create a PostgreSQL storage backend from a database URL
    pub async fn postgres(database_url: &str) -> Result<Self> {
        let db = Database::from_url(database_url).await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(std::sync::Arc::new(InMemoryStore::new()))
    }

    /// Check if this is dev mode (in-memory)
    pub fn is_dev_mode(&self) -> bool {
        matches!(self, Self::InMemory(_))
    }

    /// Run schema migrations. No-op for the in-memory backend.
    pub async fn migrate(&self) -> Result<()> {
        match self {
            Self::Postgres(db) => db.migrate().await,
            Self::InMemory(_) => Ok(()),
        }
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUser) -> StoreResult<UserRow> {
        match self {
            Self::Postgres(db) => db.create_user(input).await,
            Self::InMemory(db) => db.create_user(input).await,
        }
    }

    pub async fn get_user(&self, id: Uuid) -> StoreResult<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.get_user(id).await,
            Self::InMemory(db) => db.get_user(id).await,
        }
    }

    pub async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.get_user_by_username(username).await,
            Self::InMemory(db) => db.get_user_by_username(username).await,
        }
    }

    pub async fn get_user_by_token(&self, token: &str) -> StoreResult<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.get_user_by_token(token).await,
            Self::InMemory(db) => db.get_user_by_token(token).await,
        }
    }

    pub async fn list_users(&self) -> StoreResult<Vec<UserRow>> {
        match self {
            Self::Postgres(db) => db.list_users().await,
            Self::InMemory(db) => db.list_users().await,
        }
    }

    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> StoreResult<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.update_user(id, input).await,
            Self::InMemory(db) => db.update_user(id, input).await,
        }
    }

    pub async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        match self {
            Self::Postgres(db) => db.delete_user(id).await,
            Self::InMemory(db) => db.delete_user(id).await,
        }
    }

    // ============================================
    // Activities
    // ============================================

    pub async fn create_activity(&self, input: CreateActivity) -> StoreResult<ActivityRow> {
        match self {
            Self::Postgres(db) => db.create_activity(input).await,
            Self::InMemory(db) => db.create_activity(input).await,
        }
    }

    pub async fn get_activity(&self, id: Uuid) -> StoreResult<Option<ActivityRow>> {
        match self {
            Self::Postgres(db) => db.get_activity(id).await,
            Self::InMemory(db) => db.get_activity(id).await,
        }
    }

    pub async fn list_activities_for_owner(
        &self,
        owner_id: Uuid,
        include_unowned: bool,
    ) -> StoreResult<Vec<ActivityRow>> {
        match self {
            Self::Postgres(db) => db.list_activities_for_owner(owner_id, include_unowned).await,
            Self::InMemory(db) => db.list_activities_for_owner(owner_id, include_unowned).await,
        }
    }

    pub async fn update_activity(
        &self,
        id: Uuid,
        input: UpdateActivity,
    ) -> StoreResult<Option<ActivityRow>> {
        match self {
            Self::Postgres(db) => db.update_activity(id, input).await,
            Self::InMemory(db) => db.update_activity(id, input).await,
        }
    }

    pub async fn delete_activity(&self, id: Uuid) -> StoreResult<bool> {
        match self {
            Self::Postgres(db) => db.delete_activity(id).await,
            Self::InMemory(db) => db.delete_activity(id).await,
        }
    }

    // ============================================
    // Notes
    // ============================================

    pub async fn create_note(&self, input: CreateNote) -> StoreResult<NoteRow> {
        match self {
            Self::Postgres(db) => db.create_note(input).await,
            Self::InMemory(db) => db.create_note(input).await,
        }
    }

    pub async fn get_note(&self, id: Uuid) -> StoreResult<Option<NoteRow>> {
        match self {
            Self::Postgres(db) => db.get_note(id).await,
            Self::InMemory(db) => db.get_note(id).await,
        }
    }

    pub async fn list_notes_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<NoteRow>> {
        match self {
            Self::Postgres(db) => db.list_notes_for_owner(owner_id).await,
            Self::InMemory(db) => db.list_notes_for_owner(owner_id).await,
        }
    }

    pub async fn update_note(&self, id: Uuid, input: UpdateNote) -> StoreResult<Option<NoteRow>> {
        match self {
            Self::Postgres(db) => db.update_note(id, input).await,
            Self::InMemory(db) => db.update_note(id, input).await,
        }
    }

    pub async fn delete_note(&self, id: Uuid) -> StoreResult<bool> {
        match self {
            Self::Postgres(db) => db.delete_note(id).await,
            Self::InMemory(db) => db.delete_note(id).await,
        }
    }
}
