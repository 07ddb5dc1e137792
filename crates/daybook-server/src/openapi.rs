// OpenAPI specification generation
//
// This module defines the OpenAPI spec for the Daybook API, served by the
// main server through Swagger UI.

use crate::api;
use crate::api::activities::Activity;
use crate::api::notes::Note;
use crate::api::uploads::UploadResponse;
use crate::api::users::User;
use crate::api::{Envelope, MessageBody};
use utoipa::OpenApi;

/// OpenAPI documentation for the Daybook API
#[derive(OpenApi)]
#[openapi(
    paths(
        api::users::list_users,
        api::users::get_current_user,
        api::users::get_settings,
        api::users::update_settings,
        api::users::update_user,
        api::users::delete_user,
        api::activities::create_activity,
        api::activities::list_activities,
        api::activities::get_activity,
        api::activities::update_activity,
        api::activities::update_status,
        api::activities::delete_activity,
        api::activities::export_activities,
        api::notes::create_note,
        api::notes::list_notes,
        api::notes::get_note,
        api::notes::update_note,
        api::notes::delete_note,
        api::uploads::upload_file,
    ),
    components(
        schemas(
            User, Activity, Note,
            api::users::UpdateUserRequest,
            api::activities::CreateActivityRequest,
            api::activities::UpdateActivityRequest,
            api::activities::UpdateStatusRequest,
            api::notes::CreateNoteRequest,
            api::notes::UpdateNoteRequest,
            UploadResponse,
            MessageBody,
            Envelope<User>,
            Envelope<Vec<User>>,
            Envelope<Activity>,
            Envelope<Vec<Activity>>,
            Envelope<Note>,
            Envelope<Vec<Note>>,
            Envelope<MessageBody>,
            Envelope<UploadResponse>,
        )
    ),
    tags(
        (name = "users", description = "User management endpoints"),
        (name = "activities", description = "Activity tracking endpoints"),
        (name = "notes", description = "Personal note endpoints"),
        (name = "uploads", description = "File upload endpoints")
    ),
    info(
        title = "Daybook API",
        version = "0.1.0",
        description = "API for personal activities, notes, and account management",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI spec as a pretty-printed JSON string
    pub fn to_json() -> String {
        Self::openapi()
            .to_pretty_json()
            .expect("Failed to serialize OpenAPI spec")
    }
}
