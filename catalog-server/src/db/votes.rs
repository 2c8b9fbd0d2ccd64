//! Like/dislike votes on items
//!
//! At most one vote per (item, user). Voting again overwrites the stored
//! value in place via `ON CONFLICT ... DO UPDATE`, so there is no window in
//! which a second row could appear.

use catalog_common::{time, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

/// Like and dislike totals for one item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VoteCounts {
    pub likes: i64,
    pub dislikes: i64,
}

/// Create or overwrite `user_id`'s vote on `item_id`, returning fresh counts
pub async fn set_vote(
    pool: &SqlitePool,
    item_id: i64,
    user_id: i64,
    value: bool,
) -> Result<VoteCounts> {
    sqlx::query(
        r#"
        INSERT INTO votes (item_id, user_id, value, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(item_id, user_id) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(item_id)
    .bind(user_id)
    .bind(value)
    .bind(time::now())
    .execute(pool)
    .await?;

    debug!(
        "User {} {} item {}",
        user_id,
        if value { "liked" } else { "disliked" },
        item_id
    );

    vote_counts(pool, item_id).await
}

pub async fn vote_counts(pool: &SqlitePool, item_id: i64) -> Result<VoteCounts> {
    let (likes, dislikes): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN value = 1 THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN value = 0 THEN 1 ELSE 0 END), 0)
        FROM votes
        WHERE item_id = ?
        "#,
    )
    .bind(item_id)
    .fetch_one(pool)
    .await?;

    Ok(VoteCounts { likes, dislikes })
}

/// The user's current vote on an item, if any
pub async fn user_vote(pool: &SqlitePool, item_id: i64, user_id: i64) -> Result<Option<bool>> {
    let value = sqlx::query_scalar("SELECT value FROM votes WHERE item_id = ? AND user_id = ?")
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_item, seed_user};
    use catalog_common::db::init_memory_database;

    async fn vote_rows(pool: &SqlitePool, item_id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM votes WHERE item_id = ?")
            .bind(item_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_vote_creates_row() {
        let pool = init_memory_database().await.unwrap();
        let user = seed_user(&pool, "alice").await;
        let item = seed_item(&pool, "Silver Dollar").await;

        let counts = set_vote(&pool, item, user, true).await.unwrap();

        assert_eq!(counts, VoteCounts { likes: 1, dislikes: 0 });
        assert_eq!(user_vote(&pool, item, user).await.unwrap(), Some(true));
    }

    #[tokio::test]
    async fn test_revote_overwrites_in_place() {
        let pool = init_memory_database().await.unwrap();
        let user = seed_user(&pool, "alice").await;
        let item = seed_item(&pool, "Silver Dollar").await;

        set_vote(&pool, item, user, true).await.unwrap();
        let counts = set_vote(&pool, item, user, false).await.unwrap();

        assert_eq!(counts, VoteCounts { likes: 0, dislikes: 1 });
        assert_eq!(vote_rows(&pool, item).await, 1);
        assert_eq!(user_vote(&pool, item, user).await.unwrap(), Some(false));
    }

    #[tokio::test]
    async fn test_same_vote_twice_is_idempotent() {
        let pool = init_memory_database().await.unwrap();
        let user = seed_user(&pool, "alice").await;
        let item = seed_item(&pool, "Silver Dollar").await;

        set_vote(&pool, item, user, true).await.unwrap();
        let counts = set_vote(&pool, item, user, true).await.unwrap();

        assert_eq!(counts, VoteCounts { likes: 1, dislikes: 0 });
        assert_eq!(vote_rows(&pool, item).await, 1);
    }

    #[tokio::test]
    async fn test_counts_across_users() {
        let pool = init_memory_database().await.unwrap();
        let item = seed_item(&pool, "Penny Black").await;

        for (name, value) in [("a", true), ("b", true), ("c", false)] {
            let user = seed_user(&pool, name).await;
            set_vote(&pool, item, user, value).await.unwrap();
        }

        assert_eq!(
            vote_counts(&pool, item).await.unwrap(),
            VoteCounts { likes: 2, dislikes: 1 }
        );
    }

    #[tokio::test]
    async fn test_no_votes() {
        let pool = init_memory_database().await.unwrap();
        let user = seed_user(&pool, "alice").await;
        let item = seed_item(&pool, "Penny Black").await;

        assert_eq!(vote_counts(&pool, item).await.unwrap(), VoteCounts::default());
        assert_eq!(user_vote(&pool, item, user).await.unwrap(), None);
    }
}
