//! Visit-counting middleware and statistics endpoint

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Json,
};
use catalog_common::time;

use crate::db::visits::{record_visit, visit_stats, VisitStats};
use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use crate::AppState;

/// Requests sent by `XMLHttpRequest`-style clients
pub fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == "XMLHttpRequest")
}

/// Count the visit before handing the request on
///
/// Must run inside `session_middleware`.
pub async fn visit_counter(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let mut session = request
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| ApiError::Internal("Session layer is not installed".to_string()))?;

    record_visit(
        &state.db,
        request.uri().path(),
        request.method().as_str(),
        is_ajax(request.headers()),
        &mut session,
        time::today(),
    )
    .await?;

    Ok(next.run(request).await)
}

/// GET /api/stats/visits
pub async fn get_visit_stats(State(state): State<AppState>) -> ApiResult<Json<VisitStats>> {
    Ok(Json(visit_stats(&state.db, time::today()).await?))
}
