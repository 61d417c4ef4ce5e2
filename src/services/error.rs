//! Error type shared by the identity, relationship and post services.

use std::fmt;
use thiserror::Error;

/// The unique attribute behind an [`ServiceError::AlreadyExists`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Email,
    Username,
    Tag,
}

impl Field {
    /// Maps a driver constraint message (e.g. `UNIQUE constraint failed:
    /// accounts.username`) to the attribute it guards.
    #[must_use]
    pub fn from_constraint(message: &str) -> Self {
        if message.contains("username") {
            Self::Username
        } else if message.contains("tags") {
            Self::Tag
        } else {
            Self::Email
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Email => "email",
            Self::Username => "username",
            Self::Tag => "tag",
        })
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("An account with this {0} already exists")]
    AlreadyExists(Field),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired OTP")]
    InvalidOtp,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Access token required")]
    AccessTokenRequired,

    #[error("Refresh token required")]
    RefreshTokenRequired,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Already following this account")]
    AlreadyFollowed,

    #[error("{0}")]
    InvalidOperation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidOperation(reason.into())
    }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
