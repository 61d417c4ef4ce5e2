use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::auth::AccessClaims;
use super::forms::FormData;
use super::{
    ApiError, ApiResponse, AppState, CommentRequest, MessageResponse, ReplaceTagsRequest,
    TagNameRequest,
};
use crate::models::{Comment, LikeOutcome, PostDetail, Share};
use crate::services::{NewPost, PostChanges};

#[derive(Serialize)]
pub struct LikeResponse {
    pub status: LikeOutcome,
}

#[derive(Serialize)]
pub struct AttachTagResponse {
    pub linked: bool,
}

/// POST /posts (multipart: image, caption, tags)
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = FormData::collect(multipart, "image").await?;

    let new = NewPost {
        caption: form.text("caption").unwrap_or_default().trim().to_string(),
        tags: form.list("tags").unwrap_or_default(),
        image: form
            .file
            .ok_or_else(|| ApiError::validation("Missing field: image"))?,
    };

    let post = state.shared.posts.create_post(&claims.user_data, new).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(post))))
}

/// GET /posts/{id}
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    AccessClaims(_): AccessClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PostDetail>>, ApiError> {
    let post = state.shared.posts.get_post(id).await?;
    Ok(Json(ApiResponse::success(post)))
}

/// PATCH /posts/{id} (multipart: optional image, caption, tags)
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<PostDetail>>, ApiError> {
    let form = FormData::collect(multipart, "image").await?;

    let changes = PostChanges {
        caption: form.text("caption").map(|c| c.trim().to_string()),
        tags: form.list("tags"),
        image: form.file,
    };

    let post = state
        .shared
        .posts
        .update_post(&claims.user_data, id, changes)
        .await?;

    Ok(Json(ApiResponse::success(post)))
}

/// DELETE /posts/{id}
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.shared.posts.delete_post(&claims.user_data, id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Post deleted",
    ))))
}

/// POST /posts/{id}/like
pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LikeResponse>>, ApiError> {
    let status = state
        .shared
        .relationships
        .toggle_like(claims.user_data.uid, id)
        .await?;

    Ok(Json(ApiResponse::success(LikeResponse { status })))
}

/// POST /posts/{id}/share
pub async fn share(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let share: Share = state
        .shared
        .relationships
        .share(claims.user_data.uid, id)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(share))))
}

/// POST /posts/{id}/tags
pub async fn attach_tag(
    State(state): State<Arc<AppState>>,
    AccessClaims(_): AccessClaims,
    Path(id): Path<Uuid>,
    Json(payload): Json<TagNameRequest>,
) -> Result<Json<ApiResponse<AttachTagResponse>>, ApiError> {
    let linked = state
        .shared
        .relationships
        .attach_tag(id, &payload.name)
        .await?;

    Ok(Json(ApiResponse::success(AttachTagResponse { linked })))
}

/// PUT /posts/{id}/tags
pub async fn replace_tags(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReplaceTagsRequest>,
) -> Result<Json<ApiResponse<PostDetail>>, ApiError> {
    let post = state.shared.posts.get_post(id).await?;
    if post.post.account_id != claims.user_data.uid {
        return Err(ApiError::Conflict("not the owner of this post".to_string()));
    }

    state
        .shared
        .relationships
        .replace_tags(id, &payload.tags)
        .await?;

    let post = state.shared.posts.get_post(id).await?;
    Ok(Json(ApiResponse::success(post)))
}

/// POST /posts/{id}/comments
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment: Comment = state
        .shared
        .posts
        .add_comment(&claims.user_data, id, &payload.body)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(comment))))
}
