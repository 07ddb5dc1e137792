// In-memory storage implementation for dev mode
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
//
// This implementation provides a PostgreSQL-compatible API backed by in-memory
// HashMaps, allowing the server to run without a database for development.
// Every mutation happens under a single write lock, so check-then-write
// sequences (uniqueness, cascades) are atomic with respect to other requests.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::*;

/// In-memory store for dev mode.
/// All data is held in memory and lost on restart.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, UserRow>>,
    activities: RwLock<HashMap<Uuid, ActivityRow>>,
    notes: RwLock<HashMap<Uuid, NoteRow>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUser) -> StoreResult<UserRow> {
        let mut users = self.users.write();
        if users.values().any(|u| u.username == input.username) {
            return Err(StoreError::Duplicate("username"));
        }
        if let Some(token) = input.token.as_deref() {
            if users.values().any(|u| u.token.as_deref() == Some(token)) {
                return Err(StoreError::Duplicate("session token"));
            }
        }

        let now = Self::now();
        let id = Uuid::now_v7();
        let row = UserRow {
            id,
            username: input.username,
            password_hash: input.password_hash,
            token: input.token,
            settings: input.settings,
            is_admin: input.is_admin,
            created_at: now,
            updated_at: now,
        };
        users.insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> StoreResult<Option<UserRow>> {
        Ok(self.users.read().get(&id).cloned())
    }

    pub async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<UserRow>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    pub async fn get_user_by_token(&self, token: &str) -> StoreResult<Option<UserRow>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.token.as_deref() == Some(token))
            .cloned())
    }

    pub async fn list_users(&self) -> StoreResult<Vec<UserRow>> {
        let users = self.users.read();
        let mut result: Vec<_> = users.values().cloned().collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }

    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> StoreResult<Option<UserRow>> {
        let mut users = self.users.write();

        if let Some(username) = input.username.as_deref() {
            if users.values().any(|u| u.id != id && u.username == username) {
                return Err(StoreError::Duplicate("username"));
            }
        }
        if let Some(token) = input.token.as_deref() {
            if users
                .values()
                .any(|u| u.id != id && u.token.as_deref() == Some(token))
            {
                return Err(StoreError::Duplicate("session token"));
            }
        }

        if let Some(user) = users.get_mut(&id) {
            if let Some(username) = input.username {
                user.username = username;
            }
            if let Some(password_hash) = input.password_hash {
                user.password_hash = Some(password_hash);
            }
            if let Some(token) = input.token {
                user.token = Some(token);
            }
            if let Some(settings) = input.settings {
                user.settings = Some(settings);
            }
            user.updated_at = Self::now();
            return Ok(Some(user.clone()));
        }
        Ok(None)
    }

    pub async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut users = self.users.write();
        if users.remove(&id).is_none() {
            return Ok(false);
        }
        // Cascade, mirroring the foreign keys in the PostgreSQL schema
        self.activities
            .write()
            .retain(|_, a| a.owner_id != Some(id));
        self.notes.write().retain(|_, n| n.owner_id != id);
        Ok(true)
    }

    // ============================================
    // Activities
    // ============================================

    pub async fn create_activity(&self, input: CreateActivity) -> StoreResult<ActivityRow> {
        let now = Self::now();
        let id = Uuid::now_v7();
        let row = ActivityRow {
            id,
            name: input.name,
            date: input.date,
            status: input.status,
            category_id: input.category_id,
            remark: input.remark,
            address: input.address,
            owner_id: input.owner_id,
            created_at: now,
            updated_at: now,
        };
        self.activities.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_activity(&self, id: Uuid) -> StoreResult<Option<ActivityRow>> {
        Ok(self.activities.read().get(&id).cloned())
    }

    /// List activities visible to an owner. With `include_unowned`, rows with
    /// no owner are included as well (stored-token deployments).
    pub async fn list_activities_for_owner(
        &self,
        owner_id: Uuid,
        include_unowned: bool,
    ) -> StoreResult<Vec<ActivityRow>> {
        let activities = self.activities.read();
        let mut result: Vec<_> = activities
            .values()
            .filter(|a| a.owner_id == Some(owner_id) || (include_unowned && a.owner_id.is_none()))
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(result)
    }

    pub async fn update_activity(
        &self,
        id: Uuid,
        input: UpdateActivity,
    ) -> StoreResult<Option<ActivityRow>> {
        let mut activities = self.activities.write();
        if let Some(activity) = activities.get_mut(&id) {
            if let Some(name) = input.name {
                activity.name = name;
            }
            if let Some(date) = input.date {
                activity.date = date;
            }
            if let Some(status) = input.status {
                activity.status = status;
            }
            if let Some(category_id) = input.category_id {
                activity.category_id = category_id;
            }
            if let Some(remark) = input.remark {
                activity.remark = Some(remark);
            }
            if let Some(address) = input.address {
                activity.address = Some(address);
            }
            if let Some(owner_id) = input.owner_id {
                activity.owner_id = Some(owner_id);
            }
            activity.updated_at = Self::now();
            return Ok(Some(activity.clone()));
        }
        Ok(None)
    }

    pub async fn delete_activity(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.activities.write().remove(&id).is_some())
    }

    // ============================================
    // Notes
    // ============================================

    pub async fn create_note(&self, input: CreateNote) -> StoreResult<NoteRow> {
        let now = Self::now();
        let id = Uuid::now_v7();
        let row = NoteRow {
            id,
            title: input.title,
            content: input.content,
            owner_id: input.owner_id,
            created_at: now,
            updated_at: now,
        };
        self.notes.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_note(&self, id: Uuid) -> StoreResult<Option<NoteRow>> {
        Ok(self.notes.read().get(&id).cloned())
    }

    pub async fn list_notes_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<NoteRow>> {
        let notes = self.notes.read();
        let mut result: Vec<_> = notes
            .values()
            .filter(|n| n.owner_id == owner_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(result)
    }

    pub async fn update_note(&self, id: Uuid, input: UpdateNote) -> StoreResult<Option<NoteRow>> {
        let mut notes = self.notes.write();
        if let Some(note) = notes.get_mut(&id) {
            if let Some(title) = input.title {
                note.title = title;
            }
            if let Some(content) = input.content {
                note.content = content;
            }
            note.updated_at = Self::now();
            return Ok(Some(note.clone()));
        }
        Ok(None)
    }

    pub async fn delete_note(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.notes.write().remove(&id).is_some())
    }
}
