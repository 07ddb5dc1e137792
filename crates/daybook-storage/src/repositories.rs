// PostgreSQL repository layer
//
// All mutations are single statements (INSERT/UPDATE ... RETURNING, DELETE),
// so a failed call leaves nothing partially written and the row returned to
// callers is always the canonical post-write one. Cascading deletes are
// declared in the schema, not reimplemented here.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::*;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

/// Map engine errors, turning unique violations into typed duplicates.
fn map_user_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_username_key") => StoreError::Duplicate("username"),
                Some("users_token_key") => StoreError::Duplicate("session token"),
                _ => StoreError::Duplicate("value"),
            };
        }
    }
    StoreError::Other(err.into())
}

fn map_error(err: sqlx::Error) -> StoreError {
    StoreError::Other(err.into())
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;
        Ok(Self { pool })
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUser) -> StoreResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, password_hash, token, settings, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, password_hash, token, settings, is_admin, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.username)
        .bind(&input.password_hash)
        .bind(&input.token)
        .bind(&input.settings)
        .bind(input.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_error)?;

        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> StoreResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, token, settings, is_admin, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_error)?;

        Ok(row)
    }

    pub async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, token, settings, is_admin, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_error)?;

        Ok(row)
    }

    /// Equality lookup of an opaque session token (stored-token auth).
    pub async fn get_user_by_token(&self, token: &str) -> StoreResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, token, settings, is_admin, created_at, updated_at
            FROM users
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_error)?;

        Ok(row)
    }

    pub async fn list_users(&self) -> StoreResult<Vec<UserRow>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, token, settings, is_admin, created_at, updated_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_error)?;

        Ok(rows)
    }

    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> StoreResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET
                username = COALESCE($2, username),
                password_hash = COALESCE($3, password_hash),
                token = COALESCE($4, token),
                settings = COALESCE($5, settings),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, password_hash, token, settings, is_admin, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.username)
        .bind(&input.password_hash)
        .bind(&input.token)
        .bind(&input.settings)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_user_error)?;

        Ok(row)
    }

    pub async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_error)?;

        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Activities
    // ============================================

    pub async fn create_activity(&self, input: CreateActivity) -> StoreResult<ActivityRow> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            INSERT INTO activities (id, name, date, status, category_id, remark, address, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, date, status, category_id, remark, address, owner_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.name)
        .bind(input.date)
        .bind(&input.status)
        .bind(input.category_id)
        .bind(&input.remark)
        .bind(&input.address)
        .bind(input.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_error)?;

        Ok(row)
    }

    pub async fn get_activity(&self, id: Uuid) -> StoreResult<Option<ActivityRow>> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, name, date, status, category_id, remark, address, owner_id, created_at, updated_at
            FROM activities
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_error)?;

        Ok(row)
    }

    /// List activities visible to an owner. With `include_unowned`, rows with
    /// no owner are included as well (stored-token deployments).
    pub async fn list_activities_for_owner(
        &self,
        owner_id: Uuid,
        include_unowned: bool,
    ) -> StoreResult<Vec<ActivityRow>> {
        let rows = if include_unowned {
            sqlx::query_as::<_, ActivityRow>(
                r#"
                SELECT id, name, date, status, category_id, remark, address, owner_id, created_at, updated_at
                FROM activities
                WHERE owner_id = $1 OR owner_id IS NULL
                ORDER BY date DESC, created_at DESC
                "#,
            )
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, ActivityRow>(
                r#"
                SELECT id, name, date, status, category_id, remark, address, owner_id, created_at, updated_at
                FROM activities
                WHERE owner_id = $1
                ORDER BY date DESC, created_at DESC
                "#,
            )
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(map_error)?;

        Ok(rows)
    }

    pub async fn update_activity(
        &self,
        id: Uuid,
        input: UpdateActivity,
    ) -> StoreResult<Option<ActivityRow>> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            UPDATE activities
            SET
                name = COALESCE($2, name),
                date = COALESCE($3, date),
                status = COALESCE($4, status),
                category_id = COALESCE($5, category_id),
                remark = COALESCE($6, remark),
                address = COALESCE($7, address),
                owner_id = COALESCE($8, owner_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, date, status, category_id, remark, address, owner_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.date)
        .bind(&input.status)
        .bind(input.category_id)
        .bind(&input.remark)
        .bind(&input.address)
        .bind(input.owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_error)?;

        Ok(row)
    }

    pub async fn delete_activity(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM activities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_error)?;

        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Notes
    // ============================================

    pub async fn create_note(&self, input: CreateNote) -> StoreResult<NoteRow> {
        let row = sqlx::query_as::<_, NoteRow>(
            r#"
            INSERT INTO notes (id, title, content, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, content, owner_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_error)?;

        Ok(row)
    }

    pub async fn get_note(&self, id: Uuid) -> StoreResult<Option<NoteRow>> {
        let row = sqlx::query_as::<_, NoteRow>(
            r#"
            SELECT id, title, content, owner_id, created_at, updated_at
            FROM notes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_error)?;

        Ok(row)
    }

    pub async fn list_notes_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<NoteRow>> {
        let rows = sqlx::query_as::<_, NoteRow>(
            r#"
            SELECT id, title, content, owner_id, created_at, updated_at
            FROM notes
            WHERE owner_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_error)?;

        Ok(rows)
    }

    pub async fn update_note(&self, id: Uuid, input: UpdateNote) -> StoreResult<Option<NoteRow>> {
        let row = sqlx::query_as::<_, NoteRow>(
            r#"
            UPDATE notes
            SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, content, owner_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.content)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_error)?;

        Ok(row)
    }

    pub async fn delete_note(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_error)?;

        Ok(result.rows_affected() > 0)
    }
}
