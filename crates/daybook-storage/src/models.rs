// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// User models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    /// Null in stored-token deployments where identity is the token itself.
    pub password_hash: Option<String>,
    /// Opaque session token, unique when present (stored-token lookup key).
    pub token: Option<String>,
    /// Settings as serialized JSON text; parsed leniently on read.
    pub settings: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Settings parsed to a JSON object. Absent, malformed, or non-object
    /// text all normalize to `{}` rather than surfacing an error.
    pub fn parsed_settings(&self) -> serde_json::Value {
        self.settings
            .as_deref()
            .and_then(|raw| serde_json::from_str::<serde_json::Value>(raw).ok())
            .filter(|value| value.is_object())
            .unwrap_or_else(|| serde_json::json!({}))
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateUser {
    pub username: String,
    pub password_hash: Option<String>,
    pub token: Option<String>,
    pub settings: Option<String>,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub token: Option<String>,
    pub settings: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password_hash.is_none()
            && self.token.is_none()
            && self.settings.is_none()
    }
}

// ============================================
// Activity models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct ActivityRow {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub status: String,
    pub category_id: i32,
    pub remark: Option<String>,
    pub address: Option<String>,
    /// Null means "unscoped": visible to any authenticated user under the
    /// stored-token policy, invisible under the signed-token policy.
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateActivity {
    pub name: String,
    pub date: NaiveDate,
    pub status: String,
    pub category_id: i32,
    pub remark: Option<String>,
    pub address: Option<String>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateActivity {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub category_id: Option<i32>,
    pub remark: Option<String>,
    pub address: Option<String>,
    pub owner_id: Option<Uuid>,
}

// ============================================
// Note models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct NoteRow {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateNote {
    pub title: String,
    pub content: String,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateNote {
    pub title: Option<String>,
    pub content: Option<String>,
}
