//! Polls: one vote per user per poll, and result tallies
//!
//! A user moves from "not voted" to "voted" exactly once per poll. The
//! existence check gives the friendly answer in the common case; the
//! `UNIQUE (poll_id, user_id)` constraint is the real guard, and a violation
//! on insert is reported as `AlreadyVoted` as well.

use catalog_common::db::{Poll, PollOption};
use catalog_common::{time, Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Result of a vote attempt on an active poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOutcome {
    Success,
    AlreadyVoted,
    InvalidOption,
}

impl VoteOutcome {
    /// User-facing notification text
    pub fn message(&self) -> &'static str {
        match self {
            VoteOutcome::Success => "Your vote has been counted!",
            VoteOutcome::AlreadyVoted => "You have already voted in this poll",
            VoteOutcome::InvalidOption => "Invalid poll option",
        }
    }
}

/// Votes and rounded share for one option
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionTally {
    pub option_id: i64,
    pub text: String,
    pub votes: i64,
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollTally {
    pub poll_id: i64,
    pub question: String,
    pub total_votes: i64,
    /// Highest vote count first
    pub options: Vec<OptionTally>,
}

/// Create a poll with its options
pub async fn create_poll(
    pool: &SqlitePool,
    question: &str,
    options: &[&str],
    is_active: bool,
) -> Result<Poll> {
    let question = question.trim();
    if question.is_empty() {
        return Err(Error::InvalidInput("Poll question is required".to_string()));
    }

    let mut tx = pool.begin().await?;

    let poll: Poll = sqlx::query_as(
        r#"
        INSERT INTO polls (question, is_active, created_at)
        VALUES (?, ?, ?)
        RETURNING id, question, is_active, created_at
        "#,
    )
    .bind(question)
    .bind(is_active)
    .bind(time::now())
    .fetch_one(&mut *tx)
    .await?;

    for text in options {
        sqlx::query("INSERT INTO poll_options (poll_id, text) VALUES (?, ?)")
            .bind(poll.id)
            .bind(text.trim())
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    info!("Created poll {} with {} options", poll.id, options.len());
    Ok(poll)
}

/// Look up a poll that is open for voting
pub async fn get_active_poll(pool: &SqlitePool, poll_id: i64) -> Result<Option<Poll>> {
    let poll = sqlx::query_as(
        "SELECT id, question, is_active, created_at FROM polls WHERE id = ? AND is_active = 1",
    )
    .bind(poll_id)
    .fetch_optional(pool)
    .await?;

    Ok(poll)
}

/// Newest active poll, shown on the index page
pub async fn latest_active_poll(pool: &SqlitePool) -> Result<Option<Poll>> {
    let poll = sqlx::query_as(
        r#"
        SELECT id, question, is_active, created_at FROM polls
        WHERE is_active = 1
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(poll)
}

pub async fn find_poll_by_question(pool: &SqlitePool, question: &str) -> Result<Option<Poll>> {
    let poll = sqlx::query_as(
        "SELECT id, question, is_active, created_at FROM polls WHERE question = ? ORDER BY id LIMIT 1",
    )
    .bind(question)
    .fetch_optional(pool)
    .await?;

    Ok(poll)
}

pub async fn set_poll_active(pool: &SqlitePool, poll_id: i64, is_active: bool) -> Result<()> {
    let updated = sqlx::query("UPDATE polls SET is_active = ? WHERE id = ?")
        .bind(is_active)
        .bind(poll_id)
        .execute(pool)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(Error::NotFound(format!("Poll {}", poll_id)));
    }
    Ok(())
}

pub async fn poll_options(pool: &SqlitePool, poll_id: i64) -> Result<Vec<PollOption>> {
    let options = sqlx::query_as(
        "SELECT id, poll_id, text FROM poll_options WHERE poll_id = ? ORDER BY id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;

    Ok(options)
}

pub async fn has_voted(pool: &SqlitePool, poll_id: i64, user_id: i64) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM poll_votes WHERE poll_id = ? AND user_id = ?)",
    )
    .bind(poll_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Record `user_id`'s vote for `option_id` in an active poll
///
/// Returns `Error::NotFound` when the poll does not exist or is inactive.
/// A second vote is `AlreadyVoted` whether caught by the existence check
/// or by the unique constraint; an option from another poll is
/// `InvalidOption`. Neither creates a row.
pub async fn cast_vote(
    pool: &SqlitePool,
    poll_id: i64,
    user_id: i64,
    option_id: i64,
) -> Result<VoteOutcome> {
    if get_active_poll(pool, poll_id).await?.is_none() {
        return Err(Error::NotFound(format!("Poll {}", poll_id)));
    }

    if has_voted(pool, poll_id, user_id).await? {
        debug!("User {} already voted in poll {}", user_id, poll_id);
        return Ok(VoteOutcome::AlreadyVoted);
    }

    let option_belongs: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM poll_options WHERE id = ? AND poll_id = ?)",
    )
    .bind(option_id)
    .bind(poll_id)
    .fetch_one(pool)
    .await?;

    if !option_belongs {
        debug!("Option {} does not belong to poll {}", option_id, poll_id);
        return Ok(VoteOutcome::InvalidOption);
    }

    let inserted = sqlx::query(
        "INSERT INTO poll_votes (poll_id, option_id, user_id, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(poll_id)
    .bind(option_id)
    .bind(user_id)
    .bind(time::now())
    .execute(pool)
    .await
    .map_err(Error::from);

    match inserted {
        Ok(_) => {
            info!("User {} voted for option {} in poll {}", user_id, option_id, poll_id);
            Ok(VoteOutcome::Success)
        }
        Err(e) if e.is_unique_violation() => {
            warn!(
                "Concurrent duplicate vote by user {} in poll {} rejected by constraint",
                user_id, poll_id
            );
            Ok(VoteOutcome::AlreadyVoted)
        }
        Err(e) => Err(e),
    }
}

/// Share of `total` as a whole percentage, 0 when there are no votes
///
/// Each option is rounded on its own (half to even), so the shares of a
/// poll are not forced to add up to exactly 100.
pub fn percentage(count: i64, total: i64) -> i64 {
    if total > 0 {
        (count as f64 / total as f64 * 100.0).round_ties_even() as i64
    } else {
        0
    }
}

/// Per-option vote counts and percentages
pub async fn tally(pool: &SqlitePool, poll_id: i64) -> Result<PollTally> {
    let question: Option<String> = sqlx::query_scalar("SELECT question FROM polls WHERE id = ?")
        .bind(poll_id)
        .fetch_optional(pool)
        .await?;
    let question = question.ok_or_else(|| Error::NotFound(format!("Poll {}", poll_id)))?;

    let rows: Vec<(i64, String, i64)> = sqlx::query_as(
        r#"
        SELECT o.id, o.text, COUNT(v.id) AS vote_count
        FROM poll_options o
        LEFT JOIN poll_votes v ON v.option_id = o.id
        WHERE o.poll_id = ?
        GROUP BY o.id, o.text
        ORDER BY vote_count DESC, o.id ASC
        "#,
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;

    let total_votes: i64 = rows.iter().map(|(_, _, votes)| votes).sum();

    let options = rows
        .into_iter()
        .map(|(option_id, text, votes)| OptionTally {
            option_id,
            text,
            votes,
            percentage: percentage(votes, total_votes),
        })
        .collect();

    Ok(PollTally {
        poll_id,
        question,
        total_votes,
        options,
    })
}
