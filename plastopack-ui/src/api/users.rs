//! User administration handlers

use crate::api::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use plastopack_common::db::models::{Role, UserRecord};
use plastopack_common::db::users;
use plastopack_common::Error;
use serde::{Deserialize, Serialize};
use tracing::error;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserRecord>,
}

#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub password: Option<String>,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAdminRequest {
    pub name: String,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

impl ActionResponse {
    fn ok() -> Self {
        ActionResponse {
            success: true,
            message: None,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        ActionResponse {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Map a storage-layer error onto the `{success, message}` convention:
/// logical refusals keep their message, unexpected faults become 500s.
fn error_response(context: &str, e: Error) -> (StatusCode, Json<ActionResponse>) {
    match e {
        Error::Validation(message) => (StatusCode::BAD_REQUEST, Json(ActionResponse::failure(message))),
        Error::NotFound(message) => (StatusCode::NOT_FOUND, Json(ActionResponse::failure(message))),
        e => {
            error!("{context}: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ActionResponse::failure(format!(
                    "{context} due to a database error."
                ))),
            )
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<UserListResponse>, (StatusCode, Json<ActionResponse>)> {
    match users::list_users(&state.db).await {
        Ok(users) => Ok(Json(UserListResponse { users })),
        Err(e) => Err(error_response("Failed to list users", e)),
    }
}

/// POST /api/v1/users
pub async fn add_user(
    State(state): State<AppState>,
    Json(req): Json<AddUserRequest>,
) -> (StatusCode, Json<ActionResponse>) {
    match users::add_user(
        &state.db,
        &req.id,
        &req.name,
        req.password.as_deref(),
        req.role,
    )
    .await
    {
        Ok(()) => (StatusCode::OK, Json(ActionResponse::ok())),
        Err(e) => error_response("Failed to add user", e),
    }
}

/// PUT /api/v1/users/:id
///
/// Update an admin's display name and optionally the password.
pub async fn update_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAdminRequest>,
) -> (StatusCode, Json<ActionResponse>) {
    match users::update_admin_details(&state.db, &id, &req.name, req.password.as_deref()).await {
        Ok(()) => (StatusCode::OK, Json(ActionResponse::ok())),
        Err(e) => error_response("Failed to update user details", e),
    }
}

/// DELETE /api/v1/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ActionResponse>) {
    match users::delete_user(&state.db, &id).await {
        Ok(()) => (StatusCode::OK, Json(ActionResponse::ok())),
        Err(e) => error_response("Failed to delete user", e),
    }
}

/// GET /api/v1/users/:id/exists
///
/// Lets the client re-validate a remembered login after users may have
/// been removed.
pub async fn user_exists(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExistsResponse>, (StatusCode, Json<ActionResponse>)> {
    match users::user_exists(&state.db, &id).await {
        Ok(exists) => Ok(Json(ExistsResponse { exists })),
        Err(e) => Err(error_response("Failed to check user", e)),
    }
}
