//! Database operations for catalog-server
//!
//! Schema creation lives in `catalog_common::db`; this module holds the
//! queries behind each HTTP feature.

pub mod catalog;
pub mod collections;
pub mod comments;
pub mod hits;
pub mod polls;
pub mod sessions;
pub mod users;
pub mod visits;
pub mod votes;

use catalog_common::db::{
    get_int_setting, DEFAULT_INDEX_TOP_CATEGORIES, DEFAULT_ITEMS_PAGE_SIZE,
    DEFAULT_SESSION_TIMEOUT_SECONDS,
};
use catalog_common::Result;
use sqlx::SqlitePool;

/// Runtime settings read from the `settings` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub session_timeout_seconds: i64,
    pub items_page_size: i64,
    pub index_top_categories: i64,
}

impl RuntimeSettings {
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        Ok(Self {
            session_timeout_seconds: get_int_setting(
                pool,
                "session_timeout_seconds",
                DEFAULT_SESSION_TIMEOUT_SECONDS,
            )
            .await?,
            items_page_size: get_int_setting(pool, "items_page_size", DEFAULT_ITEMS_PAGE_SIZE)
                .await?,
            index_top_categories: get_int_setting(
                pool,
                "index_top_categories",
                DEFAULT_INDEX_TOP_CATEGORIES,
            )
            .await?,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use catalog_common::db::init_memory_database;

    #[tokio::test]
    async fn test_runtime_settings_defaults() {
        let pool = init_memory_database().await.unwrap();
        let settings = RuntimeSettings::load(&pool).await.unwrap();

        assert_eq!(settings.session_timeout_seconds, DEFAULT_SESSION_TIMEOUT_SECONDS);
        assert_eq!(settings.items_page_size, DEFAULT_ITEMS_PAGE_SIZE);
        assert_eq!(settings.index_top_categories, DEFAULT_INDEX_TOP_CATEGORIES);
    }

    #[tokio::test]
    async fn test_runtime_settings_reads_overrides() {
        let pool = init_memory_database().await.unwrap();
        sqlx::query("UPDATE settings SET value = '3' WHERE key = 'items_page_size'")
            .execute(&pool)
            .await
            .unwrap();

        let settings = RuntimeSettings::load(&pool).await.unwrap();
        assert_eq!(settings.items_page_size, 3);
    }
}
