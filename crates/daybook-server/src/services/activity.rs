// Activity service
//
// Every per-row operation loads the record first and runs the ownership
// policy before anything else; absence and denial both surface as the
// same NotFound, so callers cannot probe for foreign records.

use std::sync::Arc;

use uuid::Uuid;

use daybook_storage::{ActivityRow, CreateActivity, StorageBackend, UpdateActivity};

use crate::api::activities::{Activity, CreateActivityRequest, UpdateActivityRequest};
use crate::auth::config::AuthStrategy;
use crate::auth::middleware::AuthUser;
use crate::auth::policy;
use crate::error::{ApiError, ApiResult};

pub struct ActivityService {
    store: Arc<StorageBackend>,
    strategy: AuthStrategy,
}

impl ActivityService {
    pub fn new(store: Arc<StorageBackend>, strategy: AuthStrategy) -> Self {
        Self { store, strategy }
    }

    pub async fn create(&self, user: &AuthUser, req: CreateActivityRequest) -> ApiResult<Activity> {
        if req.name.trim().is_empty() {
            return Err(ApiError::Validation("name is required".to_string()));
        }

        // Whatever owner the caller supplied, the record is theirs.
        let row = self
            .store
            .create_activity(CreateActivity {
                name: req.name,
                date: req.date,
                status: req.status,
                category_id: req.category_id,
                remark: req.remark,
                address: req.address,
                owner_id: Some(user.id),
            })
            .await?;
        Ok(Activity::from(row))
    }

    pub async fn get(&self, user: &AuthUser, id: Uuid) -> ApiResult<Activity> {
        let row = self.load_accessible(user, id).await?;
        Ok(Activity::from(row))
    }

    pub async fn list(&self, user: &AuthUser) -> ApiResult<Vec<Activity>> {
        // Unowned rows surface only under the stored-token strategy.
        let include_unowned = self.strategy == AuthStrategy::Stored;
        let rows = self
            .store
            .list_activities_for_owner(user.id, include_unowned)
            .await?;
        Ok(rows.into_iter().map(Activity::from).collect())
    }

    pub async fn update(
        &self,
        user: &AuthUser,
        id: Uuid,
        req: UpdateActivityRequest,
    ) -> ApiResult<Activity> {
        self.load_accessible(user, id).await?;

        let row = self
            .store
            .update_activity(
                id,
                UpdateActivity {
                    name: req.name,
                    date: req.date,
                    status: req.status,
                    category_id: req.category_id,
                    remark: req.remark,
                    address: req.address,
                    // Full updates re-stamp ownership to the acting user;
                    // under the stored strategy this is how unowned legacy
                    // rows get claimed.
                    owner_id: Some(user.id),
                },
            )
            .await?
            .ok_or(ApiError::NotFound)?;
        Ok(Activity::from(row))
    }

    pub async fn update_status(
        &self,
        user: &AuthUser,
        id: Uuid,
        status: String,
    ) -> ApiResult<Activity> {
        self.load_accessible(user, id).await?;

        // Status-only updates leave ownership untouched.
        let row = self
            .store
            .update_activity(
                id,
                UpdateActivity {
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await?
            .ok_or(ApiError::NotFound)?;
        Ok(Activity::from(row))
    }

    pub async fn delete(&self, user: &AuthUser, id: Uuid) -> ApiResult<()> {
        self.load_accessible(user, id).await?;

        if !self.store.delete_activity(id).await? {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    /// Render the caller's activities as CSV, one line per record, in the
    /// same order the list endpoint returns them.
    pub async fn export_csv(&self, user: &AuthUser) -> ApiResult<String> {
        let activities = self.list(user).await?;

        let mut csv = String::from("id,name,date,status,address,remark,category_id\n");
        for activity in &activities {
            let fields = [
                activity.id.to_string(),
                activity.name.clone(),
                activity.date.to_string(),
                activity.status.clone(),
                activity.address.clone().unwrap_or_default(),
                activity.remark.clone().unwrap_or_default(),
                activity.category_id.to_string(),
            ];
            let row: Vec<String> = fields.iter().map(|field| csv_escape(field)).collect();
            csv.push_str(&row.join(","));
            csv.push('\n');
        }
        Ok(csv)
    }

    /// Load a row and check the caller may touch it. Absence and denial are
    /// indistinguishable from the outside.
    async fn load_accessible(&self, user: &AuthUser, id: Uuid) -> ApiResult<ActivityRow> {
        let row = self
            .store
            .get_activity(id)
            .await?
            .ok_or(ApiError::NotFound)?;
        if !policy::can_access_activity(user, &row, self.strategy) {
            return Err(ApiError::NotFound);
        }
        Ok(row)
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
