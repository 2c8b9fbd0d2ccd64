//! Personal collections
//!
//! Each call to `toggle_membership` flips whether an item is in the user's
//! collection. The delete runs first and its affected-row count decides the
//! branch, so the result never depends on a stale read.

use catalog_common::db::CollectionEntry;
use catalog_common::{time, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

/// Membership after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipState {
    Added,
    Removed,
}

impl MembershipState {
    pub fn message(&self) -> &'static str {
        match self {
            MembershipState::Added => "Item added to your collection",
            MembershipState::Removed => "Item removed from your collection",
        }
    }
}

/// Add the item if absent, remove it if present
pub async fn toggle_membership(
    pool: &SqlitePool,
    user_id: i64,
    item_id: i64,
) -> Result<MembershipState> {
    let removed = sqlx::query("DELETE FROM user_collections WHERE user_id = ? AND item_id = ?")
        .bind(user_id)
        .bind(item_id)
        .execute(pool)
        .await?
        .rows_affected();

    if removed > 0 {
        debug!("Removed item {} from user {}'s collection", item_id, user_id);
        return Ok(MembershipState::Removed);
    }

    // DO NOTHING: a concurrent toggle that inserted first leaves one row
    sqlx::query(
        r#"
        INSERT INTO user_collections (user_id, item_id, added_at)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id, item_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(item_id)
    .bind(time::now())
    .execute(pool)
    .await?;

    debug!("Added item {} to user {}'s collection", item_id, user_id);
    Ok(MembershipState::Added)
}

pub async fn is_in_collection(pool: &SqlitePool, user_id: i64, item_id: i64) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM user_collections WHERE user_id = ? AND item_id = ?)",
    )
    .bind(user_id)
    .bind(item_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// The user's collection, most recently added first
pub async fn list_collection(pool: &SqlitePool, user_id: i64) -> Result<Vec<CollectionEntry>> {
    let entries = sqlx::query_as(
        r#"
        SELECT uc.id, uc.item_id, i.name AS item_name, i.slug AS item_slug, uc.notes, uc.added_at
        FROM user_collections uc
        JOIN items i ON i.id = uc.item_id
        WHERE uc.user_id = ?
        ORDER BY uc.added_at DESC, uc.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
