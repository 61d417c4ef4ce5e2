use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use uuid::Uuid;

use super::auth::AccessClaims;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::models::Share;

/// GET /shares/me
pub async fn my_shares(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
) -> Result<Json<ApiResponse<Vec<Share>>>, ApiError> {
    let shares = state
        .shared
        .relationships
        .shares_of(claims.user_data.uid)
        .await?;

    Ok(Json(ApiResponse::success(shares)))
}

/// DELETE /shares/{id}
pub async fn unshare(
    State(state): State<Arc<AppState>>,
    AccessClaims(claims): AccessClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .shared
        .relationships
        .unshare(claims.user_data.uid, id)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Share removed",
    ))))
}
