//! Rate store operations
//!
//! A pure key/value mapping over the `material_rates` table. The store
//! never defaults missing keys and never drops keys it holds; filling
//! in canonical defaults is the caller's job (see `crate::rates`).

use crate::db::models::RateSnapshot;
use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::debug;

/// Outcome of an upsert. An `Unchanged` write found the identical value
/// already stored; callers treat it as a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Changed,
    Unchanged,
}

/// Fetch every stored rate.
///
/// Returns exactly what the table holds — no default filling, no key
/// filtering.
pub async fn get_all(pool: &SqlitePool) -> Result<RateSnapshot> {
    let rows: Vec<(String, f64)> = sqlx::query_as("SELECT key, value FROM material_rates")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().collect())
}

/// Insert or replace one rate.
///
/// `value` must be a finite number >= 0; anything else is rejected
/// before touching storage. Last write per key wins — there is no
/// optimistic-concurrency check between sessions.
pub async fn upsert(pool: &SqlitePool, key: &str, value: f64) -> Result<UpsertOutcome> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Validation(format!(
            "Invalid or negative value provided for {key}: {value}"
        )));
    }

    let result = sqlx::query(
        "INSERT INTO material_rates (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value
         WHERE material_rates.value <> excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        debug!("No change needed for rate {key} (value {value} already stored)");
        Ok(UpsertOutcome::Unchanged)
    } else {
        debug!("Stored rate {key} = {value}");
        Ok(UpsertOutcome::Changed)
    }
}
