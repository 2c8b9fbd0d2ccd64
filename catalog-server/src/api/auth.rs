//! Logged-in user extractors
//!
//! The session stores only the user id; it is resolved against `users` on
//! every request, so a deleted account reads as logged out.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use catalog_common::db::User;

use crate::db::users;
use crate::error::ApiError;
use crate::session::Session;
use crate::AppState;

/// The logged-in user, if any
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

/// The logged-in user; rejects anonymous requests with 401
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;

        let Some(user_id) = session.user_id() else {
            return Ok(MaybeUser(None));
        };

        Ok(MaybeUser(users::get_user(&state.db, user_id).await?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await? {
            MaybeUser(Some(user)) => Ok(CurrentUser(user)),
            MaybeUser(None) => Err(ApiError::Unauthorized("Login required".to_string())),
        }
    }
}
