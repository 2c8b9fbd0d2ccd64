//! Index page, category and item browsing

use axum::{
    extract::{Path, Query, State},
    Json,
};
use catalog_common::db::{Category, CategorySummary, Comment, Item, Poll, PollOption};
use catalog_common::time;
use serde::{Deserialize, Serialize};

use crate::api::auth::MaybeUser;
use crate::db::visits::{visit_stats, VisitStats};
use crate::db::{catalog, collections, comments, hits, polls, votes};
use crate::error::{ApiError, ApiResult};
use crate::pagination::Pagination;
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

/// Active poll as shown on the index page
#[derive(Debug, Serialize)]
pub struct IndexPoll {
    #[serde(flatten)]
    pub poll: Poll,
    pub options: Vec<PollOption>,
    /// Present only for logged-in users
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_voted: Option<bool>,
    /// Present once the logged-in user has voted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<polls::PollTally>,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub latest_items: Vec<Item>,
    pub pagination: Pagination,
    pub top_categories: Vec<CategorySummary>,
    pub poll: Option<IndexPoll>,
    pub visits: VisitStats,
}

/// GET /
pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<IndexResponse>> {
    let page = catalog::latest_items(
        &state.db,
        query.page.unwrap_or(1),
        state.settings.items_page_size,
    )
    .await?;
    let top_categories =
        catalog::top_categories(&state.db, state.settings.index_top_categories).await?;

    let poll = match polls::latest_active_poll(&state.db).await? {
        Some(poll) => {
            let options = polls::poll_options(&state.db, poll.id).await?;
            let user_voted = match &user {
                Some(user) => Some(polls::has_voted(&state.db, poll.id, user.id).await?),
                None => None,
            };
            let results = match user_voted {
                Some(true) => Some(polls::tally(&state.db, poll.id).await?),
                _ => None,
            };
            Some(IndexPoll {
                poll,
                options,
                user_voted,
                results,
            })
        }
        None => None,
    };

    Ok(Json(IndexResponse {
        latest_items: page.items,
        pagination: page.pagination,
        top_categories,
        poll,
        visits: visit_stats(&state.db, time::today()).await?,
    }))
}

/// GET /categories/
pub async fn list_categories(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<CategorySummary>>> {
    Ok(Json(catalog::list_categories(&state.db).await?))
}

#[derive(Debug, Serialize)]
pub struct CategoryDetail {
    pub category: Category,
    pub items: Vec<Item>,
}

/// GET /category/:slug/
pub async fn category_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<CategoryDetail>> {
    let category = catalog::category_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Category '{}'", slug)))?;
    let items = catalog::items_in_category(&state.db, category.id).await?;

    Ok(Json(CategoryDetail { category, items }))
}

#[derive(Debug, Serialize)]
pub struct ItemDetail {
    pub item: Item,
    pub category: Option<Category>,
    pub comments: Vec<Comment>,
    pub likes: i64,
    pub dislikes: i64,
    /// Distinct sessions that have viewed the item
    pub views: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_collection: Option<bool>,
    /// `Some(None)` is a logged-in user who has not voted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_vote: Option<Option<bool>>,
}

/// GET /item/:slug/
///
/// Counts one view per session.
pub async fn item_detail(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    mut session: Session,
    Path(slug): Path<String>,
) -> ApiResult<Json<ItemDetail>> {
    let item = catalog::item_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item '{}'", slug)))?;

    hits::record_hit(&state.db, item.id, &mut session).await?;
    let views = hits::hit_count(&state.db, item.id).await?;

    let category = catalog::category_by_id(&state.db, item.category_id).await?;
    let comments = comments::list_for_item(&state.db, item.id).await?;
    let counts = votes::vote_counts(&state.db, item.id).await?;

    let (in_collection, user_vote) = match &user {
        Some(user) => (
            Some(collections::is_in_collection(&state.db, user.id, item.id).await?),
            Some(votes::user_vote(&state.db, item.id, user.id).await?),
        ),
        None => (None, None),
    };

    Ok(Json(ItemDetail {
        item,
        category,
        comments,
        likes: counts.likes,
        dislikes: counts.dislikes,
        views,
        in_collection,
        user_vote,
    }))
}
