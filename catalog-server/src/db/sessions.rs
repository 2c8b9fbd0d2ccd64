//! Server-side session rows
//!
//! Session data is a JSON object stored as text. Rows past `expires_at` are
//! treated as absent and purged on startup.

use catalog_common::db::DEFAULT_SESSION_TIMEOUT_SECONDS;
use catalog_common::{time, Result};
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Session data for `session_key`, or `None` if unknown or expired
pub async fn load_session(
    pool: &SqlitePool,
    session_key: &str,
) -> Result<Option<Map<String, Value>>> {
    let row: Option<(String, DateTime<Utc>)> =
        sqlx::query_as("SELECT data, expires_at FROM sessions WHERE session_key = ?")
            .bind(session_key)
            .fetch_optional(pool)
            .await?;

    let Some((data, expires_at)) = row else {
        return Ok(None);
    };

    if expires_at <= time::now() {
        return Ok(None);
    }

    match serde_json::from_str::<Value>(&data) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) | Err(_) => {
            warn!("Discarding unreadable session data");
            Ok(None)
        }
    }
}

/// Create or replace a session row, extending its expiry
pub async fn save_session(
    pool: &SqlitePool,
    session_key: &str,
    data: &Map<String, Value>,
    timeout_seconds: i64,
) -> Result<()> {
    let expires_at = expiry_from(time::now(), timeout_seconds);
    let data = Value::Object(data.clone()).to_string();

    sqlx::query(
        r#"
        INSERT INTO sessions (session_key, data, expires_at)
        VALUES (?, ?, ?)
        ON CONFLICT(session_key) DO UPDATE SET
            data = excluded.data,
            expires_at = excluded.expires_at
        "#,
    )
    .bind(session_key)
    .bind(data)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// `now` plus the timeout, falling back to the default timeout when the
/// configured value is negative or out of range
fn expiry_from(now: DateTime<Utc>, timeout_seconds: i64) -> DateTime<Utc> {
    let timeout = Duration::try_seconds(timeout_seconds)
        .filter(|timeout| *timeout >= Duration::zero())
        .and_then(|timeout| now.checked_add_signed(timeout));

    match timeout {
        Some(expires_at) => expires_at,
        None => {
            warn!(
                "Session timeout {}s out of range, using {}s",
                timeout_seconds, DEFAULT_SESSION_TIMEOUT_SECONDS
            );
            now + Duration::seconds(DEFAULT_SESSION_TIMEOUT_SECONDS)
        }
    }
}

pub async fn delete_session(pool: &SqlitePool, session_key: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE session_key = ?")
        .bind(session_key)
        .execute(pool)
        .await?;

    Ok(())
}

/// Remove expired sessions, returning how many were deleted
pub async fn purge_expired(pool: &SqlitePool) -> Result<u64> {
    let purged = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(time::now())
        .execute(pool)
        .await?
        .rows_affected();

    if purged > 0 {
        info!("Purged {} expired sessions", purged);
    }
    Ok(purged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_common::db::init_memory_database;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let pool = init_memory_database().await.unwrap();
        let map = data(json!({"user_id": 4, "visited_day_2024-05-01": true}));

        save_session(&pool, "abc", &map, 60).await.unwrap();

        assert_eq!(load_session(&pool, "abc").await.unwrap(), Some(map));
        assert_eq!(load_session(&pool, "missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let pool = init_memory_database().await.unwrap();
        save_session(&pool, "abc", &data(json!({"a": 1})), 60).await.unwrap();
        save_session(&pool, "abc", &data(json!({"b": 2})), 60).await.unwrap();

        let loaded = load_session(&pool, "abc").await.unwrap().unwrap();
        assert!(loaded.get("a").is_none());
        assert_eq!(loaded.get("b"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_expired_session_ignored_and_purged() {
        let pool = init_memory_database().await.unwrap();
        save_session(&pool, "old", &data(json!({"a": 1})), 0).await.unwrap();
        save_session(&pool, "fresh", &data(json!({"a": 1})), 3600).await.unwrap();

        assert_eq!(load_session(&pool, "old").await.unwrap(), None);
        assert_eq!(purge_expired(&pool).await.unwrap(), 1);
        assert!(load_session(&pool, "fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_corrupt_data_treated_as_missing() {
        let pool = init_memory_database().await.unwrap();
        save_session(&pool, "abc", &Map::new(), 60).await.unwrap();
        sqlx::query("UPDATE sessions SET data = 'not json' WHERE session_key = 'abc'")
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(load_session(&pool, "abc").await.unwrap(), None);
    }

    #[test]
    fn test_expiry_handles_out_of_range_timeouts() {
        let now = time::now();
        let default = now + Duration::seconds(DEFAULT_SESSION_TIMEOUT_SECONDS);

        assert_eq!(expiry_from(now, 60), now + Duration::seconds(60));
        assert_eq!(expiry_from(now, 0), now);
        assert_eq!(expiry_from(now, -5), default);
        assert_eq!(expiry_from(now, i64::MAX), default);
        assert_eq!(expiry_from(now, i64::MAX / 1000), default);
    }

    #[tokio::test]
    async fn test_save_with_huge_timeout() {
        let pool = init_memory_database().await.unwrap();
        save_session(&pool, "abc", &data(json!({"a": 1})), i64::MAX).await.unwrap();
        assert!(load_session(&pool, "abc").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_session() {
        let pool = init_memory_database().await.unwrap();
        save_session(&pool, "abc", &Map::new(), 60).await.unwrap();
        delete_session(&pool, "abc").await.unwrap();
        assert_eq!(load_session(&pool, "abc").await.unwrap(), None);
    }
}
