//! Per-item view counts
//!
//! Each browser session adds at most one hit to an item: the session keeps a
//! `viewed_item_<id>` mark once the hit has been counted. Marks live as long
//! as the session does.

use catalog_common::Result;
use sqlx::SqlitePool;
use tracing::debug;

use super::visits::SessionMarks;

/// Session key marking that `item_id` has been counted for this session
pub fn hit_mark_for(item_id: i64) -> String {
    format!("viewed_item_{}", item_id)
}

/// Count a view of `item_id` unless this session already viewed it
///
/// Returns whether the hit was counted.
pub async fn record_hit<S>(pool: &SqlitePool, item_id: i64, session: &mut S) -> Result<bool>
where
    S: SessionMarks + ?Sized,
{
    let mark = hit_mark_for(item_id);
    if session.has_mark(&mark) {
        return Ok(false);
    }

    sqlx::query(
        r#"
        INSERT INTO item_hits (item_id, hits) VALUES (?, 1)
        ON CONFLICT(item_id) DO UPDATE SET hits = hits + 1
        "#,
    )
    .bind(item_id)
    .execute(pool)
    .await?;

    session.set_mark(&mark);
    debug!("Counted view of item {}", item_id);

    Ok(true)
}

/// Views counted for `item_id` (0 when never viewed)
pub async fn hit_count(pool: &SqlitePool, item_id: i64) -> Result<i64> {
    let hits: Option<i64> = sqlx::query_scalar("SELECT hits FROM item_hits WHERE item_id = ?")
        .bind(item_id)
        .fetch_optional(pool)
        .await?;

    Ok(hits.unwrap_or(0))
}
