// User service
//
// Mutation rules live here: self-or-admin updates, admin-only deletion,
// and admin accounts that nothing can delete. Passwords are re-hashed on
// the way in and settings re-serialized, so the store only ever sees
// storage-shaped values.

use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;
use uuid::Uuid;

use daybook_storage::password::hash_password;
use daybook_storage::{StorageBackend, UpdateUser};

use crate::api::users::{UpdateUserRequest, User};
use crate::auth::middleware::AuthUser;
use crate::auth::policy;
use crate::error::{ApiError, ApiResult};

pub struct UserService {
    store: Arc<StorageBackend>,
}

impl UserService {
    pub fn new(store: Arc<StorageBackend>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<User> {
        let row = self.store.get_user(id).await?.ok_or(ApiError::NotFound)?;
        Ok(User::from(row))
    }

    pub async fn list(&self) -> ApiResult<Vec<User>> {
        let rows = self.store.list_users().await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn update(
        &self,
        actor: &AuthUser,
        target_id: Uuid,
        req: UpdateUserRequest,
    ) -> ApiResult<User> {
        if !policy::can_modify_user(actor, target_id) {
            return Err(ApiError::forbidden("You may only update your own account"));
        }

        if let Some(username) = req.username.as_deref() {
            if username.trim().is_empty() {
                return Err(ApiError::Validation("username cannot be empty".to_string()));
            }
        }
        if matches!(req.password.as_deref(), Some("")) {
            return Err(ApiError::Validation("password cannot be empty".to_string()));
        }

        let password_hash = match req.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let update = UpdateUser {
            username: req.username,
            password_hash,
            token: req.token,
            settings: serialize_settings(req.settings)?,
        };
        if update.is_empty() {
            return Err(ApiError::Validation("no fields to update".to_string()));
        }

        let row = self
            .store
            .update_user(target_id, update)
            .await?
            .ok_or(ApiError::NotFound)?;
        Ok(User::from(row))
    }

    pub async fn update_settings(
        &self,
        actor: &AuthUser,
        settings: serde_json::Map<String, Value>,
    ) -> ApiResult<User> {
        let update = UpdateUser {
            settings: serialize_settings(Some(settings))?,
            ..Default::default()
        };
        let row = self
            .store
            .update_user(actor.id, update)
            .await?
            .ok_or(ApiError::NotFound)?;
        Ok(User::from(row))
    }

    pub async fn delete(&self, actor: &AuthUser, target_id: Uuid) -> ApiResult<()> {
        let target = self
            .store
            .get_user(target_id)
            .await?
            .ok_or(ApiError::NotFound)?;

        if !policy::can_delete_user(actor, &target) {
            return Err(ApiError::forbidden("Admin accounts cannot be deleted"));
        }

        // Cascades: the target's activities and notes go with the account.
        if !self.store.delete_user(target_id).await? {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}

fn serialize_settings(
    settings: Option<serde_json::Map<String, Value>>,
) -> ApiResult<Option<String>> {
    match settings {
        Some(map) => {
            let text = serde_json::to_string(&map).context("failed to serialize settings")?;
            Ok(Some(text))
        }
        None => Ok(None),
    }
}
