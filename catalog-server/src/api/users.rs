//! Signup, login, logout and profile

use axum::{extract::State, http::StatusCode, Json};
use catalog_common::db::User;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::auth::CurrentUser;
use crate::db::users::{self, NewUser, ProfileUpdate, ProfileView};
use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: User,
}

/// POST /users/signup/
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let user = users::create_user(&state.db, &form).await?;
    session.set_user_id(user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Account created",
            user,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /users/login/
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = users::authenticate(&state.db, &request.username, &request.password)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    session.set_user_id(user.id);
    info!("User '{}' logged in", user.username);

    Ok(Json(AuthResponse {
        message: "Logged in",
        user,
    }))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /users/logout/
pub async fn logout(session: Session) -> Json<MessageResponse> {
    session.flush();
    Json(MessageResponse { message: "Logged out" })
}

/// GET /users/profile/
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ProfileView>> {
    Ok(Json(users::profile_view(&state.db, user.id).await?))
}

/// POST /users/profile/
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<ProfileView>> {
    Ok(Json(users::update_profile(&state.db, user.id, &update).await?))
}
