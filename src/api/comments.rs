use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use uuid::Uuid;

use super::auth::AccessClaims;
use super::{ApiError, ApiResponse, AppState, CommentRequest, MessageResponse};
use crate::models::Comment;

/// PATCH /comments/{id}
pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<ApiResponse<Comment>>, ApiError> {
    let comment = state
        .shared
        .posts
        .update_comment(&claims.user_data, id, &payload.body)
        .await?;

    Ok(Json(ApiResponse::success(comment)))
}

/// DELETE /comments/{id}
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .shared
        .posts
        .delete_comment(&claims.user_data, id)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Comment deleted",
    ))))
}
