//! Database schema migrations
//!
//! Versioned migrations tracked in the `schema_version` table. Each migration
//! is idempotent so a partially-applied upgrade can simply be re-run.
//!
//! Released migrations are never edited; a schema change gets a new
//! version number and a new `migrate_vN`.

use crate::Result;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Highest migration this build knows about
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Latest applied version, 0 for a fresh or pre-versioning database
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let tracked: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
    )
    .fetch_one(pool)
    .await?;

    if !tracked {
        return Ok(0);
    }

    let version: Option<i32> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;

    Ok(version.unwrap_or(0))
}

async fn record_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

async fn apply(pool: &SqlitePool, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(pool).await,
        2 => migrate_v2(pool).await,
        _ => Ok(()),
    }
}

/// Apply every migration newer than the recorded version, in order
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let from = get_schema_version(pool).await?;

    if from > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema v{} is newer than this build (v{}); leaving it alone",
            from, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    for version in (from + 1)..=CURRENT_SCHEMA_VERSION {
        apply(pool, version).await?;
        record_version(pool, version).await?;
        info!("Applied schema migration v{}", version);
    }

    debug!("Database schema at v{}", CURRENT_SCHEMA_VERSION);
    Ok(())
}

/// Migration v1: lookup indexes for foreign keys and session expiry
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    let statements = [
        "CREATE INDEX IF NOT EXISTS idx_items_category ON items(category_id)",
        "CREATE INDEX IF NOT EXISTS idx_comments_item ON comments(item_id)",
        "CREATE INDEX IF NOT EXISTS idx_poll_options_poll ON poll_options(poll_id)",
        "CREATE INDEX IF NOT EXISTS idx_poll_votes_option ON poll_votes(option_id)",
        "CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at)",
    ];

    for sql in statements {
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}

/// Migration v2: add avatar column to profiles
///
/// Early databases created profiles with bio only.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    // Empty when the table is missing or the column already exists
    let columns: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info('profiles')")
        .fetch_all(pool)
        .await?;

    if columns.is_empty() || columns.iter().any(|c| c == "avatar") {
        return Ok(());
    }

    match sqlx::query("ALTER TABLE profiles ADD COLUMN avatar TEXT")
        .execute(pool)
        .await
    {
        Ok(_) => {
            info!("Added avatar column to profiles");
            Ok(())
        }
        // Another process won the race
        Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    async fn create_schema_version(pool: &SqlitePool) {
        sqlx::query(
            "CREATE TABLE schema_version (version INTEGER PRIMARY KEY, applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)",
        )
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_get_schema_version_no_table() {
        let pool = setup_test_db().await;
        assert_eq!(get_schema_version(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_and_get_schema_version() {
        let pool = setup_test_db().await;
        create_schema_version(&pool).await;

        record_version(&pool, 1).await.unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_migrate_v2_no_table() {
        let pool = setup_test_db().await;
        migrate_v2(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_migrate_v2_adds_avatar_once() {
        let pool = setup_test_db().await;
        sqlx::query(
            "CREATE TABLE profiles (user_id INTEGER PRIMARY KEY, bio TEXT NOT NULL DEFAULT '')",
        )
        .execute(&pool)
        .await
        .unwrap();

        migrate_v2(&pool).await.unwrap();
        migrate_v2(&pool).await.unwrap();

        let has_column: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('profiles') WHERE name = 'avatar'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(has_column, 1);
    }

    #[tokio::test]
    async fn test_run_migrations_reaches_current_version() {
        let pool = crate::db::init_memory_database().await.unwrap();
        assert_eq!(
            get_schema_version(&pool).await.unwrap(),
            CURRENT_SCHEMA_VERSION
        );

        // Second run is a no-op
        run_migrations(&pool).await.unwrap();
        assert_eq!(
            get_schema_version(&pool).await.unwrap(),
            CURRENT_SCHEMA_VERSION
        );
    }
}
