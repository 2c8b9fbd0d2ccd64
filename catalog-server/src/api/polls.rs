//! Poll voting and results

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::auth::CurrentUser;
use crate::db::polls::{self, PollTally, VoteOutcome};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PollVoteRequest {
    pub option: i64,
}

/// Every outcome is a 200; only a missing poll is an error
#[derive(Debug, Serialize)]
pub struct PollVoteResponse {
    pub outcome: VoteOutcome,
    pub message: &'static str,
}

/// POST /poll/:poll_id/vote/
pub async fn vote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(poll_id): Path<i64>,
    Json(request): Json<PollVoteRequest>,
) -> ApiResult<Json<PollVoteResponse>> {
    let outcome = polls::cast_vote(&state.db, poll_id, user.id, request.option).await?;

    Ok(Json(PollVoteResponse {
        outcome,
        message: outcome.message(),
    }))
}

/// GET /poll/:poll_id/results/
pub async fn results(
    State(state): State<AppState>,
    Path(poll_id): Path<i64>,
) -> ApiResult<Json<PollTally>> {
    if polls::get_active_poll(&state.db, poll_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Poll {}", poll_id)));
    }
    Ok(Json(polls::tally(&state.db, poll_id).await?))
}
