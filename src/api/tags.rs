use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::AccessClaims;
use super::{ApiError, ApiResponse, AppState, TagNameRequest, TagQuery};
use crate::models::Post;

/// POST /tags
pub async fn create_tag(
    State(state): State<Arc<AppState>>,
    AccessClaims(_): AccessClaims,
    Json(payload): Json<TagNameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state.shared.relationships.create_tag(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(tag))))
}

/// GET /tags/posts?name=
pub async fn posts_by_tag(
    State(state): State<Arc<AppState>>,
    AccessClaims(_): AccessClaims,
    Query(query): Query<TagQuery>,
) -> Result<Json<ApiResponse<Vec<Post>>>, ApiError> {
    let posts = state.shared.relationships.posts_by_tag(&query.name).await?;
    Ok(Json(ApiResponse::success(posts)))
}
