//! Integration tests for database initialization
//!
//! First-run behavior: the database file is created automatically, the
//! schema comes up idempotently, and canonical rates plus the two
//! protected accounts are seeded exactly once.

use plastopack_common::db::init_database;
use plastopack_common::rates::DEFAULT_RATES;

#[tokio::test]
async fn database_created_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("plastopack.sqlite");
    assert!(!db_path.exists());

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "database file was not created");
}

#[tokio::test]
async fn database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("plastopack.sqlite");

    let pool1 = init_database(&db_path).await.unwrap();
    drop(pool1);

    // Second open must succeed and must not disturb seeded data
    let pool2 = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM material_rates")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(count, DEFAULT_RATES.len() as i64);
}

#[tokio::test]
async fn canonical_rates_seeded_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("plastopack.sqlite");
    let pool = init_database(&db_path).await.unwrap();

    for (key, default) in DEFAULT_RATES {
        let value: Option<f64> =
            sqlx::query_scalar("SELECT value FROM material_rates WHERE key = ?")
                .bind(key)
                .fetch_optional(&pool)
                .await
                .unwrap();
        assert_eq!(value, Some(default), "seed mismatch for {key}");
    }
}

#[tokio::test]
async fn seeding_does_not_overwrite_operator_changes() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("plastopack.sqlite");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query("UPDATE material_rates SET value = 133.0 WHERE key = 'BOPP_FILM_RATE'")
        .execute(&pool)
        .await
        .unwrap();
    drop(pool);

    let pool = init_database(&db_path).await.unwrap();
    let value: f64 = sqlx::query_scalar("SELECT value FROM material_rates WHERE key = 'BOPP_FILM_RATE'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(value, 133.0, "re-init must not reset edited rates");
}

#[tokio::test]
async fn protected_accounts_seeded() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("plastopack.sqlite");
    let pool = init_database(&db_path).await.unwrap();

    let roles: Vec<(String, String)> =
        sqlx::query_as("SELECT id, role FROM users ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();

    assert_eq!(
        roles,
        vec![
            ("admin".to_string(), "admin".to_string()),
            ("employee".to_string(), "employee".to_string()),
        ]
    );
}
