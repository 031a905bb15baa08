//! Rate update workflow
//!
//! One interactive edit session over the material rates: a baseline is
//! fetched at session start, edits are tracked per key by string
//! comparison against that baseline, and submission runs
//! validate-everything → persist-per-key → record-history → refetch.
//!
//! Persistence is a batch of independent writes, not one transaction:
//! each key's upsert succeeds or fails on its own, successful writes
//! stand even when siblings fail, and a history-recording failure is
//! surfaced separately without rolling anything back. Every submit
//! ends by refetching the store and resetting the baseline, so the
//! session never drifts from persisted truth.

use plastopack_common::db::models::Author;
use plastopack_common::db::{history, rates};
use plastopack_common::rates::{fill_missing_defaults, retain_canonical};
use plastopack_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// One edited field: the key with its baseline and entered values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditedRate {
    pub key: String,
    pub previous: String,
    pub entered: String,
}

/// A single key whose write failed, with the reason preserved.
#[derive(Debug, Clone, Serialize)]
pub struct FailedUpdate {
    pub key: String,
    pub reason: String,
}

/// Whether the audit entry for a batch landed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum HistoryOutcome {
    /// Snapshot recorded after the batch
    Recorded,
    /// Writes stand, but the audit trail is incomplete for this batch
    Failed(String),
    /// No write succeeded, so nothing was recorded
    Skipped,
}

/// Result of one submission.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// No field differed from the baseline; nothing was written
    NoChanges,
    /// At least one entered value failed validation; the whole batch
    /// was refused and nothing was persisted
    Rejected { problems: Vec<String> },
    /// The batch was admitted; per-key outcomes and the history status
    Applied(BatchReport),
}

/// Per-key accounting for an admitted batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Keys whose write succeeded (a write that found the identical
    /// value already stored counts here too)
    pub updated: Vec<String>,
    /// Keys whose write failed, each with its own reason
    pub failed: Vec<FailedUpdate>,
    pub history: HistoryOutcome,
}

/// Apply a batch of entered values.
///
/// Admission is all-or-nothing: every entered value is validated first
/// and a single bad field blocks the entire batch, with all problems
/// reported at once. Admitted writes are dispatched concurrently and
/// tracked independently; history is recorded iff at least one write
/// succeeded.
pub async fn apply_batch(
    pool: &SqlitePool,
    changes: &[(String, String)],
    author: &Author,
) -> Result<SubmitOutcome> {
    if changes.is_empty() {
        info!("Rate submission with no modified fields; nothing to do");
        return Ok(SubmitOutcome::NoChanges);
    }

    if !author.is_identified() {
        return Ok(SubmitOutcome::Rejected {
            problems: vec!["User performing the change must be identified.".to_string()],
        });
    }

    // Validate every entered value before touching storage.
    let mut problems = Vec::new();
    let mut admitted: Vec<(String, f64)> = Vec::new();
    for (key, entered) in changes {
        match entered.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => {
                admitted.push((key.clone(), value));
            }
            _ => problems.push(format!(
                "Invalid or negative value entered for {key}: {entered}. \
                 Please enter a non-negative number."
            )),
        }
    }
    if !problems.is_empty() {
        warn!("Rate submission rejected: {} invalid field(s)", problems.len());
        return Ok(SubmitOutcome::Rejected { problems });
    }

    // Dispatch one independent write per key; collect outcomes in the
    // order the fields were edited.
    let handles: Vec<_> = admitted
        .into_iter()
        .map(|(key, value)| {
            let pool = pool.clone();
            let task_key = key.clone();
            (
                key,
                tokio::spawn(async move { rates::upsert(&pool, &task_key, value).await }),
            )
        })
        .collect();

    let mut updated = Vec::new();
    let mut failed = Vec::new();
    for (key, handle) in handles {
        match handle.await {
            Ok(Ok(_)) => updated.push(key),
            Ok(Err(e)) => {
                error!("Rate update failed for {key}: {e}");
                failed.push(FailedUpdate {
                    key,
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                error!("Rate update task for {key} did not complete: {e}");
                failed.push(FailedUpdate {
                    key,
                    reason: format!("Update task did not complete: {e}"),
                });
            }
        }
    }

    // Record history only when something was written. A failure here
    // does not undo the writes; it is reported on its own channel.
    let history = if updated.is_empty() {
        HistoryOutcome::Skipped
    } else {
        match history::record(pool, author).await {
            Ok(_) => HistoryOutcome::Recorded,
            Err(e) => {
                error!("History recording failed after rate updates: {e}");
                HistoryOutcome::Failed(e.to_string())
            }
        }
    };

    info!(
        "Rate batch applied: {} updated, {} failed",
        updated.len(),
        failed.len()
    );
    Ok(SubmitOutcome::Applied(BatchReport {
        updated,
        failed,
        history,
    }))
}

/// One operator's edit session: the baseline fetched at start and the
/// live values, both string-typed the way the form holds them.
///
/// Baseline and current are separate maps — never aliases — so dirty
/// tracking is a pure per-key comparison.
#[derive(Debug, Clone)]
pub struct RateEditSession {
    baseline: BTreeMap<String, String>,
    current: BTreeMap<String, String>,
}

impl RateEditSession {
    /// Start a session from the current store contents.
    pub async fn begin(pool: &SqlitePool) -> Result<Self> {
        let fetched = fetch_form_rates(pool).await?;
        Ok(RateEditSession {
            baseline: fetched.clone(),
            current: fetched,
        })
    }

    /// Current (possibly edited) value for a key.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.current.get(key).map(String::as_str)
    }

    /// Enter a value for a canonical key. Unknown keys are ignored —
    /// the form only shows the canonical set.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        if self.current.contains_key(key) {
            self.current.insert(key.to_string(), value.into());
        } else {
            warn!("Ignoring edit for unexpected rate key: {key}");
        }
    }

    /// Whether this key's value differs from the baseline.
    pub fn is_changed(&self, key: &str) -> bool {
        self.baseline.get(key) != self.current.get(key)
    }

    /// Every edited field with its old and new values.
    pub fn edited(&self) -> Vec<EditedRate> {
        self.current
            .iter()
            .filter(|(key, value)| self.baseline.get(*key) != Some(*value))
            .map(|(key, value)| EditedRate {
                key: key.clone(),
                previous: self.baseline.get(key).cloned().unwrap_or_default(),
                entered: value.clone(),
            })
            .collect()
    }

    /// Discard all in-session edits, reverting to the baseline.
    /// Storage is untouched.
    pub fn reset(&mut self) {
        self.current = self.baseline.clone();
    }

    /// Submit the edited fields, then refetch the store and reset the
    /// baseline regardless of how the batch fared.
    pub async fn submit(&mut self, pool: &SqlitePool, author: &Author) -> Result<SubmitOutcome> {
        let changes: Vec<(String, String)> = self
            .edited()
            .into_iter()
            .map(|edit| (edit.key, edit.entered))
            .collect();

        let outcome = apply_batch(pool, &changes, author).await;

        // Refetch persisted truth even when the batch (or part of it)
        // failed, so the form never shows values the store rejected.
        let fetched = fetch_form_rates(pool).await?;
        self.baseline = fetched.clone();
        self.current = fetched;

        outcome
    }
}

/// Fetch the store for form display: canonical keys only, string
/// values, defaults filled for anything the store is missing. The
/// defaulting happens here, on the consumer side — the store itself
/// returns only what it holds.
async fn fetch_form_rates(pool: &SqlitePool) -> Result<BTreeMap<String, String>> {
    let mut stored = rates::get_all(pool).await?;

    for key in retain_canonical(&mut stored) {
        warn!("Ignoring unexpected rate key from store: {key}");
    }
    for key in fill_missing_defaults(&mut stored) {
        warn!("Rate key {key} missing from store, using default");
    }

    Ok(stored
        .into_iter()
        .map(|(key, value)| (key, value.to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use plastopack_common::db::init::create_schema;
    use plastopack_common::rates::DEFAULT_RATES;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        // Single connection: the in-memory database must be visible to
        // every concurrently dispatched write.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        create_schema(&pool).await.unwrap();
        for (key, value) in DEFAULT_RATES {
            rates::upsert(&pool, key, value).await.unwrap();
        }
        pool
    }

    fn author() -> Author {
        Author {
            id: "admin".to_string(),
            name: "Admin User".to_string(),
        }
    }

    async fn history_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM material_rates_history")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn session_starts_clean_with_all_canonical_keys() {
        let pool = setup_test_db().await;
        let session = RateEditSession::begin(&pool).await.unwrap();

        assert_eq!(session.edited().len(), 0);
        assert_eq!(session.value("BOPP_FILM_RATE"), Some("118"));
        for (key, _) in DEFAULT_RATES {
            assert!(session.value(key).is_some(), "{key} missing from session");
        }
    }

    #[tokio::test]
    async fn missing_keys_are_defaulted_for_the_form_not_the_store() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        create_schema(&pool).await.unwrap();
        rates::upsert(&pool, "PROFIT", 15.0).await.unwrap();

        let session = RateEditSession::begin(&pool).await.unwrap();
        // Fetched value wins, absent keys fall back to defaults
        assert_eq!(session.value("PROFIT"), Some("15"));
        assert_eq!(session.value("PACKING_COST"), Some("220"));

        // The store itself was not back-filled
        let stored = rates::get_all(&pool).await.unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn diff_tracks_individual_keys_with_old_and_new() {
        let pool = setup_test_db().await;
        let mut session = RateEditSession::begin(&pool).await.unwrap();

        session.set("PROFIT", "14");
        session.set("PACKING_COST", "230");
        assert!(session.is_changed("PROFIT"));
        assert!(!session.is_changed("COATING_EXP"));

        let edited = session.edited();
        assert_eq!(edited.len(), 2);
        let profit = edited.iter().find(|e| e.key == "PROFIT").unwrap();
        assert_eq!(profit.previous, "12");
        assert_eq!(profit.entered, "14");
    }

    #[tokio::test]
    async fn reset_discards_edits_without_touching_storage() {
        let pool = setup_test_db().await;
        let mut session = RateEditSession::begin(&pool).await.unwrap();

        session.set("PROFIT", "99");
        session.reset();

        assert!(!session.is_changed("PROFIT"));
        assert_eq!(session.value("PROFIT"), Some("12"));
        let stored = rates::get_all(&pool).await.unwrap();
        assert_eq!(stored["PROFIT"], 12.0);
    }

    #[tokio::test]
    async fn no_op_submit_writes_nothing_and_is_informational() {
        let pool = setup_test_db().await;
        let mut session = RateEditSession::begin(&pool).await.unwrap();

        let outcome = session.submit(&pool, &author()).await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::NoChanges));
        assert_eq!(history_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn one_invalid_field_blocks_the_whole_batch() {
        let pool = setup_test_db().await;
        let mut session = RateEditSession::begin(&pool).await.unwrap();

        session.set("PROFIT", "abc");
        session.set("PACKING_COST", "-2");
        session.set("COATING_EXP", "15");

        let outcome = session.submit(&pool, &author()).await.unwrap();

        match outcome {
            SubmitOutcome::Rejected { problems } => {
                assert_eq!(problems.len(), 2, "both bad fields reported: {problems:?}");
                assert!(problems.iter().any(|p| p.contains("PROFIT")));
                assert!(problems.iter().any(|p| p.contains("PACKING_COST")));
            }
            other => panic!("expected rejection, got {other:?}"),
        }

        // Nothing persisted - including the valid COATING_EXP edit
        let stored = rates::get_all(&pool).await.unwrap();
        assert_eq!(stored["COATING_EXP"], 12.0);
        assert_eq!(stored["PROFIT"], 12.0);
        assert_eq!(history_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn successful_submit_persists_records_history_and_resets_baseline() {
        let pool = setup_test_db().await;
        let mut session = RateEditSession::begin(&pool).await.unwrap();

        session.set("PROFIT", "14");
        session.set("BOPP_FILM_RATE", "121.5");

        let outcome = session.submit(&pool, &author()).await.unwrap();

        match outcome {
            SubmitOutcome::Applied(report) => {
                assert_eq!(report.updated.len(), 2);
                assert!(report.failed.is_empty());
                assert!(matches!(report.history, HistoryOutcome::Recorded));
            }
            other => panic!("expected applied batch, got {other:?}"),
        }

        let stored = rates::get_all(&pool).await.unwrap();
        assert_eq!(stored["PROFIT"], 14.0);
        assert_eq!(stored["BOPP_FILM_RATE"], 121.5);

        let entries = history::list_recent(&pool, 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].snapshot["PROFIT"], 14.0);

        // Baseline reset to persisted truth
        assert!(!session.is_changed("PROFIT"));
        assert_eq!(session.value("PROFIT"), Some("14"));
    }

    #[tokio::test]
    async fn rewriting_the_same_value_still_counts_and_records_history() {
        // "12" -> "12.0" differs as a string but lands on the stored
        // value; the write reports no change yet counts as a success,
        // so the batch still gates history recording open.
        let pool = setup_test_db().await;
        let mut session = RateEditSession::begin(&pool).await.unwrap();

        session.set("PROFIT", "12.0");
        let outcome = session.submit(&pool, &author()).await.unwrap();

        match outcome {
            SubmitOutcome::Applied(report) => {
                assert_eq!(report.updated, vec!["PROFIT".to_string()]);
                assert!(matches!(report.history, HistoryOutcome::Recorded));
            }
            other => panic!("expected applied batch, got {other:?}"),
        }
        assert_eq!(history_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn partial_failure_keeps_successful_writes_and_still_records() {
        let pool = setup_test_db().await;

        // Make writes to one key fail at the storage layer
        sqlx::query(
            "CREATE TRIGGER coating_write_fails
             BEFORE UPDATE ON material_rates
             WHEN NEW.key = 'COATING_EXP'
             BEGIN SELECT RAISE(ABORT, 'simulated storage failure'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let mut session = RateEditSession::begin(&pool).await.unwrap();
        session.set("PROFIT", "14");
        session.set("COATING_EXP", "15");

        let outcome = session.submit(&pool, &author()).await.unwrap();

        match outcome {
            SubmitOutcome::Applied(report) => {
                assert_eq!(report.updated, vec!["PROFIT".to_string()]);
                assert_eq!(report.failed.len(), 1);
                assert_eq!(report.failed[0].key, "COATING_EXP");
                // One success is enough to gate history open
                assert!(matches!(report.history, HistoryOutcome::Recorded));
            }
            other => panic!("expected applied batch, got {other:?}"),
        }

        // The successful write stands; the failed key kept its value
        let stored = rates::get_all(&pool).await.unwrap();
        assert_eq!(stored["PROFIT"], 14.0);
        assert_eq!(stored["COATING_EXP"], 12.0);

        // Session resynced to persisted truth after the partial failure
        assert_eq!(session.value("COATING_EXP"), Some("12"));
        assert!(!session.is_changed("COATING_EXP"));
    }

    #[tokio::test]
    async fn anonymous_author_is_rejected_before_any_write() {
        let pool = setup_test_db().await;
        let anonymous = Author {
            id: String::new(),
            name: String::new(),
        };

        let outcome = apply_batch(
            &pool,
            &[("PROFIT".to_string(), "14".to_string())],
            &anonymous,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));
        let stored = rates::get_all(&pool).await.unwrap();
        assert_eq!(stored["PROFIT"], 12.0);
    }
}
