//! Domain service for accounts and sessions.
//!
//! Covers registration behind a one-time code, login and token refresh,
//! password reset and the profile operations of the signed-in account.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::{Account, AccountProfile, Gender};
use crate::services::error::ServiceResult;
use crate::services::tokens::{Claims, Subject, TokenPair};

/// Folder profile images are stored under.
pub const PROFILE_FOLDER: &str = "users/profile";

/// Folder a user's post images are stored under.
#[must_use]
pub fn post_folder(username: &str) -> String {
    format!("users/{username}/posts")
}

/// Raw image bytes plus the file extension to store them with.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub extension: String,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub gender: Gender,
    pub about: Option<String>,
    pub dob: NaiveDate,
    pub image: Option<Upload>,
}

/// Profile edits; `None` leaves the field as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountChanges {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub gender: Option<Gender>,
    pub about: Option<String>,
    pub dob: Option<NaiveDate>,
}

#[async_trait::async_trait]
pub trait IdentityService: Send + Sync {
    /// Creates an unverified account and sends it a one-time code.
    ///
    /// # Errors
    ///
    /// [`ServiceError::AlreadyExists`](crate::services::ServiceError::AlreadyExists)
    /// when the email (checked first) or the username is taken.
    async fn register(&self, new: NewAccount) -> ServiceResult<Account>;

    /// Consumes the live one-time code for `email` and marks the account verified.
    async fn verify_otp(&self, email: &str, code: &str) -> ServiceResult<()>;

    async fn request_password_reset(&self, email: &str) -> ServiceResult<()>;

    async fn reset_password(&self, email: &str, new_password: &str) -> ServiceResult<Account>;

    /// Unknown email and wrong password both yield `InvalidCredentials`.
    async fn login(&self, email: &str, password: &str) -> ServiceResult<TokenPair>;

    /// `claims` must come from an already verified refresh token.
    async fn refresh_session(&self, claims: &Claims) -> ServiceResult<TokenPair>;

    async fn current_account(&self, identity: &Subject) -> ServiceResult<AccountProfile>;

    async fn update_profile_image(
        &self,
        identity: &Subject,
        image: Upload,
    ) -> ServiceResult<Account>;

    async fn update_fields(
        &self,
        identity: &Subject,
        changes: AccountChanges,
    ) -> ServiceResult<Account>;

    async fn change_password(
        &self,
        identity: &Subject,
        old_password: &str,
        new_password: &str,
    ) -> ServiceResult<()>;

    async fn delete_account(&self, identity: &Subject) -> ServiceResult<()>;

    /// Case-insensitive prefix match on the display name.
    async fn search_accounts(&self, prefix: &str) -> ServiceResult<Vec<Account>>;
}
