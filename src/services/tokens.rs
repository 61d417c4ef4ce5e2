//! Signed session tokens.
//!
//! Access and refresh tokens share one claim shape and are told apart by the
//! `refresh` flag.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::services::error::{ServiceError, ServiceResult};

/// The account a token speaks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub uid: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_data: Subject,
    pub exp: i64,
    pub iat: i64,
    pub refresh: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &SecurityConfig) -> ServiceResult<Self> {
        let algorithm = Algorithm::from_str(&config.jwt_algorithm)
            .map_err(|e| ServiceError::Internal(format!("Unknown JWT algorithm: {e}")))?;
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(ServiceError::Internal(format!(
                "Unsupported JWT algorithm {algorithm:?}"
            )));
        }

        let secret = config.jwt_secret.as_bytes();
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            algorithm,
            access_ttl: Duration::from_secs(config.access_token_ttl_seconds),
            refresh_ttl: Duration::from_secs(config.refresh_token_ttl_seconds),
        })
    }

    /// Signs a token for `subject`; `lifetime` defaults to the access lifetime.
    pub fn issue(
        &self,
        subject: &Subject,
        lifetime: Option<Duration>,
        is_refresh: bool,
    ) -> ServiceResult<String> {
        let now = chrono::Utc::now().timestamp();
        let lifetime = i64::try_from(lifetime.unwrap_or(self.access_ttl).as_secs())
            .map_err(|_| ServiceError::Internal("Token lifetime out of range".to_string()))?;

        self.sign(&Claims {
            user_data: subject.clone(),
            exp: now.saturating_add(lifetime),
            iat: now,
            refresh: is_refresh,
        })
    }

    pub fn issue_pair(&self, subject: &Subject) -> ServiceResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue(subject, None, false)?,
            refresh_token: self.issue(subject, Some(self.refresh_ttl), true)?,
            token_type: "bearer".to_string(),
        })
    }

    pub fn sign(&self, claims: &Claims) -> ServiceResult<String> {
        encode(&Header::new(self.algorithm), claims, &self.encoding)
            .map_err(|e| ServiceError::Internal(format!("Failed to sign token: {e}")))
    }

    pub fn verify(&self, token: &str) -> ServiceResult<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ServiceError::ExpiredToken,
                ErrorKind::InvalidKeyFormat
                | ErrorKind::InvalidRsaKey(_)
                | ErrorKind::InvalidEcdsaKey
                | ErrorKind::RsaFailedSigning
                | ErrorKind::MissingAlgorithm
                | ErrorKind::Crypto(_) => ServiceError::Internal(format!("Token key error: {e}")),
                _ => ServiceError::InvalidToken,
            })
    }

    pub fn verify_access(&self, token: &str) -> ServiceResult<Claims> {
        let claims = self.verify(token)?;
        if claims.refresh {
            return Err(ServiceError::AccessTokenRequired);
        }
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> ServiceResult<Claims> {
        let claims = self.verify(token)?;
        if !claims.refresh {
            return Err(ServiceError::RefreshTokenRequired);
        }
        Ok(claims)
    }

    /// Verifies a bearer credential of the given kind; `None` means no credential was sent.
    pub fn authenticate(&self, bearer: Option<&str>, kind: TokenKind) -> ServiceResult<Claims> {
        let token = bearer
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ServiceError::Unauthenticated)?;

        match kind {
            TokenKind::Access => self.verify_access(token),
            TokenKind::Refresh => self.verify_refresh(token),
        }
    }
}
