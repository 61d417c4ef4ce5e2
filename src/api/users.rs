use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AccessClaims;
use super::forms::FormData;
use super::validation::{validate_password, validate_username};
use super::{ApiError, ApiResponse, AppState, MessageResponse, SearchQuery};
use crate::models::{Account, AccountProfile, Post};
use crate::services::AccountChanges;

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// GET /users/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
) -> Result<Json<ApiResponse<AccountProfile>>, ApiError> {
    let profile = state
        .shared
        .identity
        .current_account(&claims.user_data)
        .await?;

    Ok(Json(ApiResponse::success(profile)))
}

/// PATCH /users/me
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
    Json(changes): Json<AccountChanges>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    if let Some(username) = &changes.username {
        validate_username(username)?;
    }

    let account = state
        .shared
        .identity
        .update_fields(&claims.user_data, changes)
        .await?;

    Ok(Json(ApiResponse::success(account)))
}

/// PUT /users/me/avatar (multipart)
pub async fn update_avatar(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let form = FormData::collect(multipart, "image").await?;
    let image = form
        .file
        .ok_or_else(|| ApiError::validation("Missing field: image"))?;

    let account = state
        .shared
        .identity
        .update_profile_image(&claims.user_data, image)
        .await?;

    Ok(Json(ApiResponse::success(account)))
}

/// PUT /users/me/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let new_password = validate_password(&payload.new_password)?;

    state
        .shared
        .identity
        .change_password(&claims.user_data, &payload.old_password, new_password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated",
    ))))
}

/// DELETE /users/me
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.shared.identity.delete_account(&claims.user_data).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Account deleted",
    ))))
}

/// GET /users/search?q=
pub async fn search(
    State(state): State<Arc<AppState>>,
    AccessClaims(_): AccessClaims,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<Account>>>, ApiError> {
    let accounts = state.shared.identity.search_accounts(&query.q).await?;
    Ok(Json(ApiResponse::success(accounts)))
}

/// GET /users/{username}/posts
pub async fn posts_of(
    State(state): State<Arc<AppState>>,
    AccessClaims(_): AccessClaims,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<Vec<Post>>>, ApiError> {
    let posts = state.shared.posts.posts_of(&username).await?;
    Ok(Json(ApiResponse::success(posts)))
}

/// POST /users/{username}/follow
pub async fn follow(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .shared
        .relationships
        .follow(claims.user_data.uid, &username)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Now following {username}"
    )))))
}

/// DELETE /users/{username}/follow
pub async fn unfollow(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .shared
        .relationships
        .unfollow(claims.user_data.uid, &username)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Unfollowed {username}"
    )))))
}
