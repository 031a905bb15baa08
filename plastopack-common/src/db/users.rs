//! User store operations
//!
//! Admins authenticate with a password, employees with a one-time
//! password valid for five minutes after issuance. OTP expiry is a
//! timestamp comparison at read time; there is no background sweeper.
//! Credentials are stored as-is — hardening the authentication scheme
//! is outside this system's scope.

use crate::db::init::EMPLOYEE_PASSWORD_PLACEHOLDER;
use crate::db::models::{Role, UserRecord};
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// How long an issued OTP stays valid.
pub fn otp_validity() -> Duration {
    Duration::minutes(5)
}

/// Seeded accounts that must never be deleted.
const PROTECTED_USER_IDS: [&str; 2] = ["admin", "employee"];

/// Verify a credential for `id` under the given role.
///
/// Admins: plain password comparison. Employees: OTP comparison; an
/// expired OTP is cleared and the attempt denied, a matching OTP is
/// consumed (cleared) on success so it cannot be replayed.
pub async fn authenticate(
    pool: &SqlitePool,
    id: &str,
    credential: &str,
    role: Role,
) -> Result<bool> {
    match role {
        Role::Admin => {
            let row: Option<(String, String)> =
                sqlx::query_as("SELECT password, role FROM users WHERE id = ?")
                    .bind(id)
                    .fetch_optional(pool)
                    .await?;

            match row {
                Some((password, stored_role))
                    if stored_role == Role::Admin.as_str() && password == credential =>
                {
                    info!("Admin authentication successful for user {id}");
                    Ok(true)
                }
                _ => {
                    warn!("Admin authentication failed for user {id}");
                    Ok(false)
                }
            }
        }
        Role::Employee => {
            let row: Option<(Option<String>, Option<String>, String)> =
                sqlx::query_as("SELECT otp, otp_created_at, role FROM users WHERE id = ?")
                    .bind(id)
                    .fetch_optional(pool)
                    .await?;

            let Some((otp, otp_created_at, stored_role)) = row else {
                warn!("OTP authentication failed for {id}: user not found");
                return Ok(false);
            };
            if stored_role != Role::Employee.as_str() {
                warn!("OTP authentication failed for {id}: not an employee");
                return Ok(false);
            }
            let (Some(otp), Some(created_at)) = (otp, otp_created_at) else {
                warn!("OTP authentication failed for {id}: no active OTP");
                return Ok(false);
            };

            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| Error::Internal(format!("Bad OTP timestamp for {id}: {e}")))?
                .with_timezone(&Utc);

            if Utc::now() - created_at > otp_validity() {
                warn!("OTP authentication failed for {id}: OTP expired");
                clear_otp(pool, id).await?;
                return Ok(false);
            }

            if otp == credential {
                info!("OTP authentication successful for user {id}");
                clear_otp(pool, id).await?;
                Ok(true)
            } else {
                warn!("OTP authentication failed for {id}: wrong OTP");
                Ok(false)
            }
        }
    }
}

/// Generate a fresh OTP for an employee and store it with the issue
/// time. Returns the OTP so the admin can hand it to the employee.
pub async fn generate_and_store_otp(pool: &SqlitePool, id: &str) -> Result<String> {
    let row: Option<(String,)> = sqlx::query_as("SELECT role FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        None => Err(Error::NotFound(format!("User '{id}' not found"))),
        Some((role,)) if role != Role::Employee.as_str() => Err(Error::Validation(
            "OTP can only be generated for employees.".to_string(),
        )),
        Some(_) => {
            let otp = generate_otp();
            let now = Utc::now().to_rfc3339();

            sqlx::query("UPDATE users SET otp = ?, otp_created_at = ? WHERE id = ?")
                .bind(&otp)
                .bind(&now)
                .bind(id)
                .execute(pool)
                .await?;

            info!("Generated OTP for user {id}");
            Ok(otp)
        }
    }
}

/// Clear any active OTP for `id`. Clearing an absent OTP still
/// succeeds — the desired state (no OTP) is reached either way.
pub async fn revoke_otp(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = clear_otp(pool, id).await?;
    if result == 0 {
        info!("No active OTP to revoke for user {id}");
    } else {
        info!("Revoked OTP for user {id}");
    }
    Ok(())
}

async fn clear_otp(pool: &SqlitePool, id: &str) -> Result<u64> {
    let result = sqlx::query("UPDATE users SET otp = NULL, otp_created_at = NULL WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Create a new user. Admins need a password; employees get a
/// placeholder credential and log in by OTP.
pub async fn add_user(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    password: Option<&str>,
    role: Role,
) -> Result<()> {
    if id.trim().is_empty() || name.trim().is_empty() {
        return Err(Error::Validation(
            "User ID and name are required.".to_string(),
        ));
    }

    let password = match role {
        Role::Admin => password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::Validation("Password is required for admin role.".to_string()))?,
        Role::Employee => EMPLOYEE_PASSWORD_PLACEHOLDER,
    };

    let result = sqlx::query(
        "INSERT OR IGNORE INTO users (id, name, password, role, otp, otp_created_at)
         VALUES (?, ?, ?, ?, NULL, NULL)",
    )
    .bind(id)
    .bind(name)
    .bind(password)
    .bind(role.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        warn!("Add user refused: user ID '{id}' already exists");
        return Err(Error::Validation("User ID already exists.".to_string()));
    }

    info!("Added user {id} ({name}, {role})");
    Ok(())
}

/// Delete a user. The seeded admin/employee accounts are protected.
pub async fn delete_user(pool: &SqlitePool, id: &str) -> Result<()> {
    if PROTECTED_USER_IDS.contains(&id) {
        warn!("Refused to delete protected user {id}");
        return Err(Error::Validation(format!(
            "The user '{id}' is protected and cannot be deleted."
        )));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "User '{id}' not found or already deleted"
        )));
    }

    info!("Deleted user {id}");
    Ok(())
}

/// All users for the dashboard, admins first, then by name.
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<UserRecord>> {
    let rows: Vec<(String, String, String, Option<String>)> = sqlx::query_as(
        "SELECT id, name, role, otp_created_at FROM users ORDER BY role DESC, name ASC",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(id, name, role, otp_created_at)| {
            let role = Role::parse(&role)
                .ok_or_else(|| Error::Internal(format!("Unknown role '{role}' for user {id}")))?;
            Ok(UserRecord {
                id,
                name,
                role,
                otp_created_at,
            })
        })
        .collect()
}

/// Whether `id` still exists. The presentation layer re-validates a
/// remembered login with this after users may have been deleted.
pub async fn user_exists(pool: &SqlitePool, id: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Role and display name for `id`, or `None` if unknown.
pub async fn get_role_and_name(pool: &SqlitePool, id: &str) -> Result<Option<(Role, String)>> {
    let row: Option<(String, String)> = sqlx::query_as("SELECT role, name FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        None => Ok(None),
        Some((role, name)) => {
            let role = Role::parse(&role)
                .ok_or_else(|| Error::Internal(format!("Unknown role '{role}' for user {id}")))?;
            Ok(Some((role, name)))
        }
    }
}

/// Update an admin's display name and, optionally, password.
pub async fn update_admin_details(
    pool: &SqlitePool,
    id: &str,
    new_name: &str,
    new_password: Option<&str>,
) -> Result<()> {
    if new_name.trim().is_empty() {
        return Err(Error::Validation(
            "User ID and new name are required.".to_string(),
        ));
    }

    match get_role_and_name(pool, id).await? {
        None => return Err(Error::NotFound(format!("User '{id}' not found"))),
        Some((Role::Employee, _)) => {
            return Err(Error::Validation(
                "User is not an administrator.".to_string(),
            ))
        }
        Some((Role::Admin, _)) => {}
    }

    match new_password.filter(|p| !p.is_empty()) {
        Some(password) => {
            sqlx::query("UPDATE users SET name = ?, password = ? WHERE id = ?")
                .bind(new_name)
                .bind(password)
                .bind(id)
                .execute(pool)
                .await?;
        }
        None => {
            sqlx::query("UPDATE users SET name = ? WHERE id = ?")
                .bind(new_name)
                .bind(id)
                .execute(pool)
                .await?;
        }
    }

    info!("Updated details for admin {id}");
    Ok(())
}

/// Three random bytes as six upper-case hex characters.
fn generate_otp() -> String {
    let bytes: [u8; 3] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}
