use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;
use tracing::warn;

use crate::config::SecurityConfig;
use crate::services::error::{ServiceError, ServiceResult};

/// Argon2id password hashing. All work runs on the blocking pool.
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(config: &SecurityConfig) -> ServiceResult<Self> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| ServiceError::Internal(format!("Invalid Argon2 params: {e}")))?;

        Ok(Self { params })
    }

    fn argon2(params: Params) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }

    /// Returns a PHC string with a fresh random salt.
    pub async fn hash(&self, password: &str) -> ServiceResult<String> {
        let password = password.to_string();
        let params = self.params.clone();

        task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Self::argon2(params)
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| ServiceError::Internal(format!("Failed to hash password: {e}")))
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("Password hashing task failed: {e}")))?
    }

    /// `false` on mismatch, on a malformed hash and on a failed task.
    pub async fn verify(&self, password: &str, hash: &str) -> bool {
        let password = password.to_string();
        let hash = hash.to_string();
        let params = self.params.clone();

        let result = task::spawn_blocking(move || {
            PasswordHash::new(&hash).is_ok_and(|parsed| {
                Self::argon2(params)
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
        })
        .await;

        result.unwrap_or_else(|e| {
            warn!(error = %e, "Password verification task failed");
            false
        })
    }
}
