// Activity CRUD HTTP routes
//
// POST   /v1/activities            - Create activity (caller becomes owner)
// GET    /v1/activities            - List the caller's activities
// GET    /v1/activities/export     - Download the caller's activities as CSV
// GET    /v1/activities/:id        - Get one activity
// PUT    /v1/activities/:id        - Update an activity
// PATCH  /v1/activities/:id/status - Update only the status field
// DELETE /v1/activities/:id        - Delete an activity

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::{get, patch, post},
    Json, Router,
};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use daybook_storage::ActivityRow;

use crate::auth::middleware::{AuthState, AuthUser, FromRef};
use crate::error::ApiResult;
use crate::services::ActivityService;

use super::common::{Envelope, MessageBody};

/// Public activity record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Activity {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub status: String,
    pub category_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Absent on legacy rows created before ownership scoping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ActivityRow> for Activity {
    fn from(row: ActivityRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            date: row.date,
            status: row.status,
            category_id: row.category_id,
            remark: row.remark,
            address: row.address,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Request to create an activity
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateActivityRequest {
    #[schema(example = "buy milk")]
    pub name: String,
    #[schema(example = "2024-01-01")]
    pub date: NaiveDate,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = 1)]
    pub category_id: i32,
    pub remark: Option<String>,
    pub address: Option<String>,
    /// Ignored: the authenticated caller always becomes the owner.
    #[serde(default)]
    pub owner_id: Option<Uuid>,
}

/// Request to update an activity. Only provided fields change.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateActivityRequest {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub category_id: Option<i32>,
    pub remark: Option<String>,
    pub address: Option<String>,
    /// Ignored: updates re-stamp the activity to the acting caller.
    #[serde(default)]
    pub owner_id: Option<Uuid>,
}

/// Request to update only the status of an activity
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    #[schema(example = "done")]
    pub status: String,
}

/// App state for activity routes
#[derive(Clone)]
pub struct ActivitiesState {
    pub service: Arc<ActivityService>,
    pub auth: AuthState,
}

impl ActivitiesState {
    pub fn new(auth: AuthState) -> Self {
        Self {
            service: Arc::new(ActivityService::new(
                auth.store.clone(),
                auth.config.strategy,
            )),
            auth,
        }
    }
}

impl FromRef<ActivitiesState> for AuthState {
    fn from_ref(state: &ActivitiesState) -> AuthState {
        state.auth.clone()
    }
}

/// Create activity routes
pub fn routes(state: ActivitiesState) -> Router {
    Router::new()
        .route("/v1/activities", post(create_activity).get(list_activities))
        .route("/v1/activities/export", get(export_activities))
        .route(
            "/v1/activities/:activity_id",
            get(get_activity)
                .put(update_activity)
                .delete(delete_activity),
        )
        .route("/v1/activities/:activity_id/status", patch(update_status))
        .with_state(state)
}

/// POST /v1/activities - Create a new activity
#[utoipa::path(
    post,
    path = "/v1/activities",
    request_body = CreateActivityRequest,
    responses(
        (status = 201, description = "Activity created", body = Envelope<Activity>),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "activities"
)]
pub async fn create_activity(
    State(state): State<ActivitiesState>,
    user: AuthUser,
    Json(req): Json<CreateActivityRequest>,
) -> ApiResult<Envelope<Activity>> {
    let activity = state.service.create(&user, req).await?;
    Ok(Envelope::created(activity))
}

/// GET /v1/activities - List the caller's activities
#[utoipa::path(
    get,
    path = "/v1/activities",
    responses(
        (status = 200, description = "Activities, newest date first", body = Envelope<Vec<Activity>>),
        (status = 401, description = "Not authenticated")
    ),
    tag = "activities"
)]
pub async fn list_activities(
    State(state): State<ActivitiesState>,
    user: AuthUser,
) -> ApiResult<Envelope<Vec<Activity>>> {
    let activities = state.service.list(&user).await?;
    Ok(Envelope::ok(activities))
}

/// GET /v1/activities/{activity_id} - Get activity by ID
#[utoipa::path(
    get,
    path = "/v1/activities/{activity_id}",
    params(
        ("activity_id" = Uuid, Path, description = "Activity ID")
    ),
    responses(
        (status = 200, description = "Activity found", body = Envelope<Activity>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not accessible")
    ),
    tag = "activities"
)]
pub async fn get_activity(
    State(state): State<ActivitiesState>,
    user: AuthUser,
    Path(activity_id): Path<Uuid>,
) -> ApiResult<Envelope<Activity>> {
    let activity = state.service.get(&user, activity_id).await?;
    Ok(Envelope::ok(activity))
}

/// PUT /v1/activities/{activity_id} - Update an activity
#[utoipa::path(
    put,
    path = "/v1/activities/{activity_id}",
    params(
        ("activity_id" = Uuid, Path, description = "Activity ID")
    ),
    request_body = UpdateActivityRequest,
    responses(
        (status = 200, description = "Activity updated", body = Envelope<Activity>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not accessible")
    ),
    tag = "activities"
)]
pub async fn update_activity(
    State(state): State<ActivitiesState>,
    user: AuthUser,
    Path(activity_id): Path<Uuid>,
    Json(req): Json<UpdateActivityRequest>,
) -> ApiResult<Envelope<Activity>> {
    let activity = state.service.update(&user, activity_id, req).await?;
    Ok(Envelope::ok(activity))
}

/// PATCH /v1/activities/{activity_id}/status - Update only the status field
#[utoipa::path(
    patch,
    path = "/v1/activities/{activity_id}/status",
    params(
        ("activity_id" = Uuid, Path, description = "Activity ID")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Envelope<Activity>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not accessible")
    ),
    tag = "activities"
)]
pub async fn update_status(
    State(state): State<ActivitiesState>,
    user: AuthUser,
    Path(activity_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Envelope<Activity>> {
    let activity = state
        .service
        .update_status(&user, activity_id, req.status)
        .await?;
    Ok(Envelope::ok(activity))
}

/// DELETE /v1/activities/{activity_id} - Delete an activity
#[utoipa::path(
    delete,
    path = "/v1/activities/{activity_id}",
    params(
        ("activity_id" = Uuid, Path, description = "Activity ID")
    ),
    responses(
        (status = 200, description = "Activity deleted", body = Envelope<MessageBody>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not accessible")
    ),
    tag = "activities"
)]
pub async fn delete_activity(
    State(state): State<ActivitiesState>,
    user: AuthUser,
    Path(activity_id): Path<Uuid>,
) -> ApiResult<Envelope<MessageBody>> {
    state.service.delete(&user, activity_id).await?;
    Ok(Envelope::ok(MessageBody::new("activity deleted")))
}

/// GET /v1/activities/export - Download the caller's activities as CSV
#[utoipa::path(
    get,
    path = "/v1/activities/export",
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "activities"
)]
pub async fn export_activities(
    State(state): State<ActivitiesState>,
    user: AuthUser,
) -> ApiResult<Response> {
    let csv = state.service.export_csv(&user).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"activities_{}.csv\"", user.id),
        )
        .body(Body::from(csv))
        .context("failed to build export response")?;

    Ok(response)
}
