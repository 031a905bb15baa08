//! Pricing engine handler
//!
//! This is the presentation-side caller of the pure engine: it fetches
//! the persisted rates, discards keys it does not understand, fills
//! canonical defaults for anything missing, and only then invokes the
//! computation. The engine itself never sees the database.

use crate::api::AppState;
use crate::pricing::{self, CalcInput, CostSheet};
use axum::{extract::State, http::StatusCode, Json};
use plastopack_common::db::rates;
use plastopack_common::rates::{fill_missing_defaults, retain_canonical};
use serde::Serialize;
use tracing::{error, warn};

#[derive(Debug, Serialize)]
pub struct CalculationError {
    pub error: String,
}

/// POST /api/v1/calculate
pub async fn calculate(
    State(state): State<AppState>,
    Json(input): Json<CalcInput>,
) -> Result<Json<CostSheet>, (StatusCode, Json<CalculationError>)> {
    let mut snapshot = match rates::get_all(&state.db).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("Failed to fetch rates for calculation: {e}");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CalculationError {
                    error: "Failed to fetch current rates.".to_string(),
                }),
            ));
        }
    };

    for key in retain_canonical(&mut snapshot) {
        warn!("Ignoring unexpected rate key from store: {key}");
    }
    for key in fill_missing_defaults(&mut snapshot) {
        warn!("Rate key {key} missing from store, using default for calculation");
    }

    match pricing::compute(&input, &snapshot) {
        Ok(sheet) => Ok(Json(sheet)),
        Err(failure) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(CalculationError {
                error: failure.to_string(),
            }),
        )),
    }
}
