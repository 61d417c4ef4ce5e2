use axum::{
    Json,
    extract::{FromRequestParts, Multipart, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::forms::FormData;
use super::validation::{
    parse_dob, parse_gender, validate_email, validate_full_name, validate_otp_code,
    validate_password, validate_username,
};
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::services::{Claims, NewAccount, TokenKind, TokenPair};

// ============================================================================
// Extractors
// ============================================================================

/// Claims of a verified access token from `Authorization: Bearer`.
pub struct AccessClaims(pub Claims);

/// Claims of a verified refresh token from `Authorization: Bearer`.
pub struct RefreshClaims(pub Claims);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
}

fn authenticate(
    parts: &Parts,
    state: &Arc<AppState>,
    kind: TokenKind,
) -> Result<Claims, ApiError> {
    let claims = state
        .shared
        .tokens
        .authenticate(bearer_token(&parts.headers), kind)?;

    tracing::Span::current().record("user_id", claims.user_data.username.as_str());
    Ok(claims)
}

impl FromRequestParts<Arc<AppState>> for AccessClaims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state, TokenKind::Access).map(Self)
    }
}

impl FromRequestParts<Arc<AppState>> for RefreshClaims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state, TokenKind::Refresh).map(Self)
    }
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register (multipart)
pub async fn register(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = FormData::collect(multipart, "image").await?;

    let new = NewAccount {
        full_name: validate_full_name(form.required("full_name")?)?.to_string(),
        email: validate_email(form.required("email")?)?.to_string(),
        username: validate_username(form.required("username")?)?.to_string(),
        password: validate_password(form.required("password")?)?.to_string(),
        gender: parse_gender(form.required("gender")?)?,
        about: form.text("about").map(str::to_string),
        dob: parse_dob(form.required("dob")?)?,
        image: form.file,
    };

    let account = state.shared.identity.register(new).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(account))))
}

/// POST /auth/verify-otp
pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let code = validate_otp_code(&payload.otp)?;
    state.shared.identity.verify_otp(&payload.email, code).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Email verified",
    ))))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let pair = state
        .shared
        .identity
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(pair)))
}

/// POST /auth/forgot-password
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .shared
        .identity
        .request_password_reset(&payload.email)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "OTP sent to your email",
    ))))
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let password = validate_password(&payload.new_password)?;
    let account = state
        .shared
        .identity
        .reset_password(&payload.email, password)
        .await?;

    Ok(Json(ApiResponse::success(account)))
}

/// POST /auth/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    RefreshClaims(claims): RefreshClaims,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let pair = state.shared.identity.refresh_session(&claims).await?;
    Ok(Json(ApiResponse::success(pair)))
}
