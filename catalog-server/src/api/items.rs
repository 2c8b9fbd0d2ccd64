//! Item actions for logged-in users: comment, vote, collect

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use catalog_common::db::{CollectionEntry, Comment, Item};
use serde::{Deserialize, Serialize};

use crate::api::auth::CurrentUser;
use crate::db::collections::{self, MembershipState};
use crate::db::votes::{self, VoteCounts};
use crate::db::{catalog, comments};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

async fn find_item(state: &AppState, slug: &str) -> ApiResult<Item> {
    catalog::item_by_slug(&state.db, slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item '{}'", slug)))
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub message: &'static str,
    pub comment: Comment,
}

/// POST /item/:slug/comment/
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    Json(request): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    let item = find_item(&state, &slug).await?;
    let comment = comments::add_comment(&state.db, item.id, user.id, &request.text).await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            message: "Comment added",
            comment,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub value: bool,
}

/// POST /item/:slug/vote/
pub async fn vote_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    Json(request): Json<VoteRequest>,
) -> ApiResult<Json<VoteCounts>> {
    let item = find_item(&state, &slug).await?;
    Ok(Json(votes::set_vote(&state.db, item.id, user.id, request.value).await?))
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub state: MembershipState,
    pub message: &'static str,
}

/// POST /item/:slug/collection/
pub async fn toggle_collection(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> ApiResult<Json<ToggleResponse>> {
    let item = find_item(&state, &slug).await?;
    let membership = collections::toggle_membership(&state.db, user.id, item.id).await?;

    Ok(Json(ToggleResponse {
        state: membership,
        message: membership.message(),
    }))
}

/// GET /collection/
pub async fn my_collection(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<CollectionEntry>>> {
    Ok(Json(collections::list_collection(&state.db, user.id).await?))
}
