//! catalog-server library: collectible catalog JSON service
//!
//! Serves categories and items, comments, likes, personal collections,
//! polls and site-wide visit statistics over HTTP.

use axum::Router;
use sqlx::SqlitePool;

pub mod api;
pub mod cli;
pub mod db;
pub mod error;
pub mod pagination;
pub mod seed;
pub mod session;

pub use error::{ApiError, ApiResult};

use db::RuntimeSettings;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Values from the `settings` table, read once at startup
    pub settings: RuntimeSettings,
}

impl AppState {
    pub fn new(db: SqlitePool, settings: RuntimeSettings) -> Self {
        Self { db, settings }
    }

    /// Read runtime settings from the database and build state
    pub async fn load(db: SqlitePool) -> catalog_common::Result<Self> {
        let settings = RuntimeSettings::load(&db).await?;
        Ok(Self::new(db, settings))
    }
}

/// Build application router
///
/// Catalog and user routes pass the session layer, then the visit counter.
/// Service endpoints (`/health`, `/api/*`) bypass both so monitoring never
/// creates sessions or counts as a visit.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};
    use tower_http::trace::TraceLayer;

    let catalog = Router::new()
        .route("/", get(api::catalog::index))
        .route("/categories/", get(api::catalog::list_categories))
        .route("/category/:slug/", get(api::catalog::category_detail))
        .route("/item/:slug/", get(api::catalog::item_detail))
        .route("/item/:slug/comment/", post(api::items::add_comment))
        .route("/item/:slug/vote/", post(api::items::vote_item))
        .route("/item/:slug/collection/", post(api::items::toggle_collection))
        .route("/collection/", get(api::items::my_collection))
        .route("/poll/:poll_id/vote/", post(api::polls::vote))
        .route("/poll/:poll_id/results/", get(api::polls::results));

    let users = Router::new()
        .route("/users/signup/", post(api::users::signup))
        .route("/users/login/", post(api::users::login))
        .route("/users/logout/", post(api::users::logout))
        .route(
            "/users/profile/",
            get(api::users::get_profile).post(api::users::update_profile),
        );

    let service = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/api/stats/visits", get(api::get_visit_stats))
        .merge(api::health_routes());

    Router::new()
        .merge(catalog)
        .merge(users)
        // Layers wrap outward: visit counter runs inside the session layer
        .layer(middleware::from_fn_with_state(state.clone(), api::visit_counter))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ))
        .merge(service)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
