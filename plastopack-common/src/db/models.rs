//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete set of material rates at one instant, keyed by rate name.
///
/// Serves both as "current rates" (pricing input) and as the payload of
/// a history entry. Ordering is irrelevant; BTreeMap keeps serialized
/// snapshots stable for comparison.
pub type RateSnapshot = BTreeMap<String, f64>;

/// Account role. Admins log in with a password, employees with a
/// short-lived OTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "employee" => Some(Role::Employee),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user row as exposed to the dashboard. The stored credential and
/// any live OTP never leave the database layer; only the OTP issue
/// time is surfaced so the UI can show pending logins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub otp_created_at: Option<String>,
}

/// Attribution for a rate change: who performed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
}

impl Author {
    /// Both fields must be present; anonymous rate changes are refused.
    pub fn is_identified(&self) -> bool {
        !self.id.trim().is_empty() && !self.name.trim().is_empty()
    }
}

/// One immutable entry of the rate-history ledger: a full snapshot of
/// the rate store, tagged with author and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub changed_at: DateTime<Utc>,
    pub changed_by_id: String,
    pub changed_by_name: String,
    pub snapshot: RateSnapshot,
}
