//! Rate history ledger operations
//!
//! Append-only audit log of full rate-table snapshots. Entries are
//! written only on explicit request, after a batch of rate updates
//! succeeds; nothing here fires automatically per field update.

use crate::db::models::{Author, HistoryEntry, RateSnapshot};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Record the complete current rate store as one immutable history
/// entry attributed to `author`.
///
/// Read-snapshot-then-insert runs inside a single transaction so a
/// concurrent rate write cannot produce a torn snapshot. Recording an
/// empty store is refused with `Error::EmptyStore` — an audit entry
/// with nothing in it is meaningless.
pub async fn record(pool: &SqlitePool, author: &Author) -> Result<i64> {
    if !author.is_identified() {
        return Err(Error::Validation(
            "User performing the change must be identified.".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let rows: Vec<(String, f64)> = sqlx::query_as("SELECT key, value FROM material_rates")
        .fetch_all(&mut *tx)
        .await?;

    if rows.is_empty() {
        // Dropping the transaction rolls back; the ledger stays unchanged.
        warn!("History recording refused: no rates found in the store");
        return Err(Error::EmptyStore);
    }

    let snapshot: RateSnapshot = rows.into_iter().collect();
    let snapshot_json = serde_json::to_string(&snapshot)
        .map_err(|e| Error::Internal(format!("Failed to serialize rate snapshot: {e}")))?;

    let changed_at = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO material_rates_history
             (changed_at, changed_by_id, changed_by_name, rates_snapshot)
         VALUES (?, ?, ?, ?)",
    )
    .bind(&changed_at)
    .bind(&author.id)
    .bind(&author.name)
    .bind(&snapshot_json)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let entry_id = result.last_insert_rowid();
    info!(
        "Recorded rate history entry {entry_id} ({} keys) by {} ({})",
        snapshot.len(),
        author.name,
        author.id
    );
    Ok(entry_id)
}

/// Fetch the most recent history entries, newest first.
///
/// `limit` bounds the count. Diffing adjacent snapshots is the
/// caller's job; the ledger stores full snapshots only.
pub async fn list_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<HistoryEntry>> {
    let rows: Vec<(i64, String, String, String, String)> = sqlx::query_as(
        "SELECT id, changed_at, changed_by_id, changed_by_name, rates_snapshot
         FROM material_rates_history
         ORDER BY changed_at DESC, id DESC
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for (id, changed_at, changed_by_id, changed_by_name, snapshot_json) in rows {
        let changed_at = DateTime::parse_from_rfc3339(&changed_at)
            .map_err(|e| Error::Internal(format!("Bad timestamp on history entry {id}: {e}")))?
            .with_timezone(&Utc);

        let snapshot: RateSnapshot = match serde_json::from_str(&snapshot_json) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // A corrupt blob should not hide the rest of the ledger.
                warn!("Failed to parse snapshot for history entry {id}: {e}");
                RateSnapshot::new()
            }
        };

        entries.push(HistoryEntry {
            id,
            changed_at,
            changed_by_id,
            changed_by_name,
            snapshot,
        });
    }

    Ok(entries)
}
