//! Material rate and rate-history handlers
//!
//! `/rates` returns the store exactly as persisted — defaulting for
//! missing canonical keys is the consumer's job and happens in the
//! workflow and calculator layers, never here.

use crate::api::AppState;
use crate::workflow::{self, SubmitOutcome};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use plastopack_common::db::models::{Author, HistoryEntry, RateSnapshot};
use plastopack_common::db::{history, rates};
use plastopack_common::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::error;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RatesResponse {
    pub rates: RateSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRateRequest {
    pub key: String,
    pub value: f64,
    pub author: Author,
}

#[derive(Debug, Deserialize)]
pub struct RecordHistoryRequest {
    pub author: Author,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Number of entries to return, newest first
    #[serde(default = "default_history_limit")]
    pub limit: i64,
}

fn default_history_limit() -> i64 {
    3
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRatesRequest {
    /// Entered values for the fields the operator changed, keyed by
    /// rate key. Values arrive string-typed, exactly as the form holds
    /// them.
    pub changes: BTreeMap<String, String>,
    pub author: Author,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/rates
pub async fn get_rates(
    State(state): State<AppState>,
) -> Result<Json<RatesResponse>, (StatusCode, Json<ActionResponse>)> {
    match rates::get_all(&state.db).await {
        Ok(rates) => Ok(Json(RatesResponse { rates })),
        Err(e) => {
            error!("Failed to fetch rates: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ActionResponse {
                    success: false,
                    message: Some("Failed to fetch current rates.".to_string()),
                }),
            ))
        }
    }
}

/// POST /api/v1/rates/update
///
/// Single-key upsert. A value identical to the stored one is reported
/// as "no change" but still succeeds.
pub async fn update_rate(
    State(state): State<AppState>,
    Json(req): Json<UpdateRateRequest>,
) -> (StatusCode, Json<ActionResponse>) {
    if !req.author.is_identified() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ActionResponse {
                success: false,
                message: Some("User performing the change must be identified.".to_string()),
            }),
        );
    }

    match rates::upsert(&state.db, &req.key, req.value).await {
        Ok(rates::UpsertOutcome::Changed) => (
            StatusCode::OK,
            Json(ActionResponse {
                success: true,
                message: None,
            }),
        ),
        Ok(rates::UpsertOutcome::Unchanged) => (
            StatusCode::OK,
            Json(ActionResponse {
                success: true,
                message: Some("No change detected for this rate.".to_string()),
            }),
        ),
        Err(Error::Validation(message)) => (
            StatusCode::BAD_REQUEST,
            Json(ActionResponse {
                success: false,
                message: Some(message),
            }),
        ),
        Err(e) => {
            error!("Failed to update rate {}: {e}", req.key);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ActionResponse {
                    success: false,
                    message: Some(format!(
                        "An error occurred while updating the rate for {}.",
                        req.key
                    )),
                }),
            )
        }
    }
}

/// POST /api/v1/rates/submit
///
/// Batched rate update: validate everything, persist per key with
/// independent outcomes, record history if anything landed, and report
/// the lot.
pub async fn submit_rates(
    State(state): State<AppState>,
    Json(req): Json<SubmitRatesRequest>,
) -> Result<Json<SubmitOutcome>, (StatusCode, Json<ActionResponse>)> {
    let changes: Vec<(String, String)> = req.changes.into_iter().collect();

    match workflow::apply_batch(&state.db, &changes, &req.author).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => {
            error!("Rate submission failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ActionResponse {
                    success: false,
                    message: Some("There was an error updating the material rates.".to_string()),
                }),
            ))
        }
    }
}

/// POST /api/v1/rates/history
///
/// Record the complete current rate store as one audit entry.
pub async fn record_history(
    State(state): State<AppState>,
    Json(req): Json<RecordHistoryRequest>,
) -> (StatusCode, Json<ActionResponse>) {
    match history::record(&state.db, &req.author).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ActionResponse {
                success: true,
                message: None,
            }),
        ),
        Err(Error::EmptyStore) => (
            StatusCode::CONFLICT,
            Json(ActionResponse {
                success: false,
                message: Some("No rates found to record.".to_string()),
            }),
        ),
        Err(Error::Validation(message)) => (
            StatusCode::BAD_REQUEST,
            Json(ActionResponse {
                success: false,
                message: Some(message),
            }),
        ),
        Err(e) => {
            error!("History recording failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ActionResponse {
                    success: false,
                    message: Some("An error occurred while recording rate history.".to_string()),
                }),
            )
        }
    }
}

/// GET /api/v1/rates/history?limit=N
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, (StatusCode, Json<ActionResponse>)> {
    match history::list_recent(&state.db, query.limit).await {
        Ok(entries) => Ok(Json(HistoryResponse { entries })),
        Err(e) => {
            error!("Failed to fetch rate history: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ActionResponse {
                    success: false,
                    message: Some("Failed to fetch rate history.".to_string()),
                }),
            ))
        }
    }
}
