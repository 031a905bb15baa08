//! Authentication handlers
//!
//! Admins log in with a password, employees with an OTP an admin
//! issued for them. Session bookkeeping lives in the client; the
//! server only answers "are these credentials good right now".

use crate::api::AppState;
use axum::{extract::State, http::StatusCode, Json};
use plastopack_common::db::models::Role;
use plastopack_common::db::users;
use plastopack_common::Error;
use serde::{Deserialize, Serialize};
use tracing::error;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
    pub credential: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct OtpResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<LoginResponse>) {
    let granted =
        match users::authenticate(&state.db, &req.user_id, &req.credential, req.role).await {
            Ok(granted) => granted,
            Err(e) => {
                error!("Authentication error for {}: {e}", req.user_id);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(LoginResponse {
                        success: false,
                        role: None,
                        name: None,
                        message: Some("Authentication failed due to a server error.".to_string()),
                    }),
                );
            }
        };

    if !granted {
        return (
            StatusCode::UNAUTHORIZED,
            Json(LoginResponse {
                success: false,
                role: None,
                name: None,
                message: Some("Invalid credentials.".to_string()),
            }),
        );
    }

    match users::get_role_and_name(&state.db, &req.user_id).await {
        Ok(Some((role, name))) => (
            StatusCode::OK,
            Json(LoginResponse {
                success: true,
                role: Some(role),
                name: Some(name),
                message: None,
            }),
        ),
        Ok(None) | Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(LoginResponse {
                success: false,
                role: None,
                name: None,
                message: Some("Authenticated user could not be loaded.".to_string()),
            }),
        ),
    }
}

/// POST /api/v1/auth/otp
///
/// Issue a fresh OTP for an employee. The OTP is returned to the
/// caller (an admin hands it to the employee out of band).
pub async fn generate_otp(
    State(state): State<AppState>,
    Json(req): Json<OtpRequest>,
) -> (StatusCode, Json<OtpResponse>) {
    match users::generate_and_store_otp(&state.db, &req.user_id).await {
        Ok(otp) => (
            StatusCode::OK,
            Json(OtpResponse {
                success: true,
                message: Some(format!("OTP generated: {otp}")),
                otp: Some(otp),
            }),
        ),
        Err(e @ (Error::NotFound(_) | Error::Validation(_))) => (
            StatusCode::BAD_REQUEST,
            Json(OtpResponse {
                success: false,
                otp: None,
                message: Some(e.to_string()),
            }),
        ),
        Err(e) => {
            error!("OTP generation failed for {}: {e}", req.user_id);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(OtpResponse {
                    success: false,
                    otp: None,
                    message: Some("Failed to generate OTP due to a database error.".to_string()),
                }),
            )
        }
    }
}

/// POST /api/v1/auth/otp/revoke
pub async fn revoke_otp(
    State(state): State<AppState>,
    Json(req): Json<OtpRequest>,
) -> (StatusCode, Json<OtpResponse>) {
    match users::revoke_otp(&state.db, &req.user_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(OtpResponse {
                success: true,
                otp: None,
                message: Some("OTP revoked.".to_string()),
            }),
        ),
        Err(e) => {
            error!("OTP revocation failed for {}: {e}", req.user_id);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(OtpResponse {
                    success: false,
                    otp: None,
                    message: Some("Failed to revoke OTP due to a database error.".to_string()),
                }),
            )
        }
    }
}
