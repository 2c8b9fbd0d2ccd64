//! Item comments

use catalog_common::db::Comment;
use catalog_common::{time, Error, Result};
use sqlx::SqlitePool;
use tracing::debug;

/// Attach a comment to an item; blank text is rejected without writing
pub async fn add_comment(
    pool: &SqlitePool,
    item_id: i64,
    user_id: i64,
    text: &str,
) -> Result<Comment> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::InvalidInput("Comment text is required".to_string()));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO comments (item_id, user_id, text, created_at) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(item_id)
    .bind(user_id)
    .bind(text)
    .bind(time::now())
    .fetch_one(pool)
    .await?;

    let comment = sqlx::query_as(
        r#"
        SELECT c.id, c.item_id, c.user_id, u.username, c.text, c.created_at
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.id = ?
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    debug!("User {} commented on item {}", user_id, item_id);
    Ok(comment)
}

/// Comments on an item with author usernames, newest first
pub async fn list_for_item(pool: &SqlitePool, item_id: i64) -> Result<Vec<Comment>> {
    let comments = sqlx::query_as(
        r#"
        SELECT c.id, c.item_id, c.user_id, u.username, c.text, c.created_at
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.item_id = ?
        ORDER BY c.created_at DESC, c.id DESC
        "#,
    )
    .bind(item_id)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}
