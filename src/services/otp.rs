use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::TransientStore;
use crate::config::OtpConfig;
use crate::services::error::ServiceResult;

pub const OTP_SUBJECT: &str = "Your OTP verification Code";

/// Six decimal digits, zero-padded.
#[must_use]
pub fn generate_code() -> String {
    let code: u32 = rand::rng().random_range(0..1_000_000);
    format!("{code:06}")
}

#[must_use]
pub fn registration_body(code: &str) -> String {
    format!(
        "Hey welcome to our app <br> your otp code is: <b>{code}</b><br>\
         This code will expire in 2 minutes."
    )
}

#[must_use]
pub fn password_reset_body(code: &str) -> String {
    format!(
        "Hey don't worry <br> your otp code to change password is: <b>{code}</b><br>\
         This code will expire in 2 minutes."
    )
}

/// One live challenge per email, kept in the transient store.
#[derive(Clone)]
pub struct OtpChallenges {
    store: Arc<dyn TransientStore>,
    key_prefix: String,
    ttl: Duration,
}

impl OtpChallenges {
    pub fn new(store: Arc<dyn TransientStore>, config: &OtpConfig) -> Self {
        Self {
            store,
            key_prefix: config.key_prefix.clone(),
            ttl: Duration::from_secs(config.ttl_seconds),
        }
    }

    fn key(&self, email: &str) -> String {
        format!("{}{email}", self.key_prefix)
    }

    /// Stores a fresh code for `email`, replacing any earlier one.
    pub async fn issue(&self, email: &str) -> ServiceResult<String> {
        let code = generate_code();
        self.store.put(&self.key(email), &code, self.ttl).await?;
        Ok(code)
    }

    /// Consumes the challenge when `code` matches; `false` otherwise.
    pub async fn consume(&self, email: &str, code: &str) -> ServiceResult<bool> {
        let key = self.key(email);
        let Some(expected) = self.store.get(&key).await? else {
            return Ok(false);
        };

        if expected != code {
            return Ok(false);
        }

        self.store.delete(&key).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MemoryStore;

    #[test]
    fn test_code_shape() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_consume_is_single_use() {
        let challenges = OtpChallenges::new(Arc::new(MemoryStore::new()), &OtpConfig::default());
        let code = challenges.issue("a@example.com").await.unwrap();

        assert!(!challenges.consume("a@example.com", "abcdef").await.unwrap());
        assert!(challenges.consume("a@example.com", &code).await.unwrap());
        assert!(!challenges.consume("a@example.com", &code).await.unwrap());
    }

    #[tokio::test]
    async fn test_reissue_invalidates_previous_code() {
        let challenges = OtpChallenges::new(Arc::new(MemoryStore::new()), &OtpConfig::default());
        let first = challenges.issue("a@example.com").await.unwrap();
        let mut second = challenges.issue("a@example.com").await.unwrap();
        while second == first {
            second = challenges.issue("a@example.com").await.unwrap();
        }

        assert!(!challenges.consume("a@example.com", &first).await.unwrap());
        assert!(challenges.consume("a@example.com", &second).await.unwrap());
    }
}
