//! Database initialization
//!
//! Creates the database on first run, applies the schema idempotently,
//! and seeds default rates and the two protected accounts.

use crate::db::models::Role;
use crate::rates::DEFAULT_RATES;
use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Placeholder credential stored for employee accounts; employees
/// authenticate with an OTP, never with this value.
pub const EMPLOYEE_PASSWORD_PLACEHOLDER: &str = "employee_otp_login";

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use sqlite options to create database if it doesn't exist
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_connection(&pool).await?;
    create_schema(&pool).await?;
    seed_default_rates(&pool).await?;
    seed_default_users(&pool).await?;

    Ok(pool)
}

/// Session PRAGMAs: foreign keys on, WAL for concurrent readers during
/// rate-update bursts, short busy timeout so storage calls fail fast
/// instead of hanging.
async fn configure_connection(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;
    Ok(())
}

/// Create all tables (idempotent - safe to call multiple times)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_rates_table(pool).await?;
    create_rates_history_table(pool).await?;
    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            password TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('admin', 'employee')),
            otp TEXT,
            otp_created_at TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the material rates table
///
/// One row per rate key; values are overwritten in place (last write
/// wins), rows are never deleted.
pub async fn create_rates_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS material_rates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT NOT NULL UNIQUE,
            value REAL NOT NULL,
            CHECK (value >= 0.0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the rate history ledger table
///
/// Append-only; each row holds the complete rate table as a JSON blob.
/// No update or delete path exists anywhere in the codebase.
pub async fn create_rates_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS material_rates_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            changed_at TEXT NOT NULL,
            changed_by_id TEXT NOT NULL,
            changed_by_name TEXT NOT NULL,
            rates_snapshot TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_rates_history_changed_at
         ON material_rates_history(changed_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Seed the 16 canonical rates on first run (existing values are left
/// untouched)
async fn seed_default_rates(pool: &SqlitePool) -> Result<()> {
    for (key, value) in DEFAULT_RATES {
        sqlx::query("INSERT OR IGNORE INTO material_rates (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(pool)
            .await?;
    }

    info!("Default material rates checked/inserted");
    Ok(())
}

/// Seed the protected admin and employee accounts
async fn seed_default_users(pool: &SqlitePool) -> Result<()> {
    let defaults = [
        ("admin", "Admin User", "admin", Role::Admin),
        (
            "employee",
            "Employee User",
            EMPLOYEE_PASSWORD_PLACEHOLDER,
            Role::Employee,
        ),
    ];

    for (id, name, password, role) in defaults {
        sqlx::query(
            "INSERT OR IGNORE INTO users (id, name, password, role, otp, otp_created_at)
             VALUES (?, ?, ?, ?, NULL, NULL)",
        )
        .bind(id)
        .bind(name)
        .bind(password)
        .bind(role.as_str())
        .execute(pool)
        .await?;
    }

    info!("Default users checked/inserted");
    Ok(())
}
