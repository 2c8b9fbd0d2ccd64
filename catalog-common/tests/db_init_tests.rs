//! Tests for database initialization
//!
//! - Automatic database creation on first run
//! - Re-opening an existing database
//! - Default settings initialization and NULL repair
//! - Unique constraints backing the per-user integrity rules

use catalog_common::db::init::{get_int_setting, init_database, init_memory_database};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("catalog.db");

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());

    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("catalog.db");

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let pool = init_memory_database().await.unwrap();

    assert_eq!(get_int_setting(&pool, "session_timeout_seconds", 0).await.unwrap(), 1_209_600);
    assert_eq!(get_int_setting(&pool, "items_page_size", 0).await.unwrap(), 12);
    assert_eq!(get_int_setting(&pool, "index_top_categories", 0).await.unwrap(), 5);
}

#[tokio::test]
async fn test_null_setting_reset_to_default() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("catalog.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query("UPDATE settings SET value = NULL WHERE key = 'items_page_size'")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();
    assert_eq!(get_int_setting(&pool, "items_page_size", 0).await.unwrap(), 12);
}

#[tokio::test]
async fn test_missing_setting_uses_fallback() {
    let pool = init_memory_database().await.unwrap();
    assert_eq!(get_int_setting(&pool, "no_such_setting", 42).await.unwrap(), 42);
}

#[tokio::test]
async fn test_visit_date_is_unique() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query("INSERT INTO visit_counts (date, count) VALUES ('2024-01-01', 1)")
        .execute(&pool)
        .await
        .unwrap();
    let duplicate = sqlx::query("INSERT INTO visit_counts (date, count) VALUES ('2024-01-01', 1)")
        .execute(&pool)
        .await;

    assert!(duplicate.is_err(), "visit_counts.date must be unique");
}

#[tokio::test]
async fn test_visit_count_cannot_go_negative() {
    let pool = init_memory_database().await.unwrap();

    let result = sqlx::query("INSERT INTO visit_counts (date, count) VALUES ('2024-01-01', -1)")
        .execute(&pool)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_item_condition_checked() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query("INSERT INTO categories (name, slug) VALUES ('Coins', 'coins')")
        .execute(&pool)
        .await
        .unwrap();

    let result = sqlx::query(
        r#"
        INSERT INTO items (name, slug, description, country, condition, category_id, created_at, updated_at)
        VALUES ('Coin', 'coin', 'd', 'c', 'MINT', 1, '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')
        "#,
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "condition outside the grading scale must be rejected");
}
