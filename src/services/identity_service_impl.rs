//! `SeaORM` implementation of the `IdentityService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::{AssetStore, Notifier};
use crate::db::{AccountUpdate, NewAccountRow, Outcome, Store};
use crate::entities::accounts;
use crate::models::{Account, AccountProfile, Post, normalize_handle};
use crate::services::credentials::CredentialHasher;
use crate::services::error::{Field, ServiceError, ServiceResult};
use crate::services::identity_service::{
    AccountChanges, IdentityService, NewAccount, PROFILE_FOLDER, Upload,
};
use crate::services::otp::{self, OtpChallenges};
use crate::services::tokens::{Claims, Subject, TokenPair, TokenService};

#[derive(Debug, Clone)]
pub struct IdentitySettings {
    pub default_profile_url: String,
    pub require_verified_email: bool,
    pub search_limit: u64,
}

pub struct SeaOrmIdentityService {
    store: Store,
    hasher: CredentialHasher,
    tokens: Arc<TokenService>,
    otp: OtpChallenges,
    assets: Arc<dyn AssetStore>,
    notifier: Arc<dyn Notifier>,
    settings: IdentitySettings,
}

impl SeaOrmIdentityService {
    #[must_use]
    pub fn new(
        store: Store,
        hasher: CredentialHasher,
        tokens: Arc<TokenService>,
        otp: OtpChallenges,
        assets: Arc<dyn AssetStore>,
        notifier: Arc<dyn Notifier>,
        settings: IdentitySettings,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            otp,
            assets,
            notifier,
            settings,
        }
    }

    async fn resolve(&self, identity: &Subject) -> ServiceResult<Option<accounts::Model>> {
        Ok(self
            .store
            .get_account_by_username(&normalize_handle(&identity.username))
            .await?)
    }

    async fn by_email(&self, email: &str) -> ServiceResult<accounts::Model> {
        self.store
            .get_account_by_email(&normalize_handle(email))
            .await?
            .ok_or_else(|| ServiceError::not_found("Account"))
    }

    fn notify(&self, to: String, subject: &'static str, body: String) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.send(&to, subject, &body).await {
                warn!(to = %to, error = %e, "Failed to deliver notification");
            }
        });
    }

    /// Removes `url` unless it is the shared default avatar or lives elsewhere.
    async fn discard_profile_image(&self, url: &str) {
        if url == self.settings.default_profile_url || !self.assets.owns(url) {
            return;
        }
        if let Err(e) = self.assets.delete(url).await {
            warn!(url, error = %e, "Failed to remove profile image");
        }
    }
}

#[async_trait]
impl IdentityService for SeaOrmIdentityService {
    async fn register(&self, new: NewAccount) -> ServiceResult<Account> {
        let email = normalize_handle(&new.email);
        let username = normalize_handle(&new.username);

        if email.is_empty() || username.is_empty() || new.password.is_empty() {
            return Err(ServiceError::invalid(
                "email, username and password are required",
            ));
        }

        if self.store.get_account_by_email(&email).await?.is_some() {
            return Err(ServiceError::AlreadyExists(Field::Email));
        }
        if self.store.get_account_by_username(&username).await?.is_some() {
            return Err(ServiceError::AlreadyExists(Field::Username));
        }

        let password_hash = self.hasher.hash(&new.password).await?;

        let profile_url = match new.image {
            Some(image) => {
                self.assets
                    .upload(image.bytes, PROFILE_FOLDER, &image.extension)
                    .await?
            }
            None => self.settings.default_profile_url.clone(),
        };

        let code = self.otp.issue(&email).await?;

        let row = NewAccountRow {
            full_name: new.full_name.trim().to_string(),
            email: email.clone(),
            username,
            password_hash,
            gender: new.gender.as_str().to_string(),
            about: new.about.unwrap_or_default(),
            profile_url: profile_url.clone(),
            dob: new.dob,
        };

        let account = match self.store.insert_account(row).await {
            Ok(Outcome::Done(account)) => account,
            Ok(Outcome::Conflict(constraint)) => {
                self.discard_profile_image(&profile_url).await;
                return Err(ServiceError::AlreadyExists(Field::from_constraint(
                    &constraint,
                )));
            }
            Err(e) => {
                self.discard_profile_image(&profile_url).await;
                return Err(e.into());
            }
        };

        self.notify(email, otp::OTP_SUBJECT, otp::registration_body(&code));

        metrics::counter!("accounts_registered_total").increment(1);
        info!(account_id = %account.id, username = %account.username, "Account registered");

        Ok(account.into())
    }

    async fn verify_otp(&self, email: &str, code: &str) -> ServiceResult<()> {
        let account = self.by_email(email).await?;

        if !self.otp.consume(&account.email, code).await? {
            return Err(ServiceError::InvalidOtp);
        }

        if !account.is_verified {
            self.store
                .update_account(
                    account.id,
                    AccountUpdate {
                        is_verified: Some(true),
                        ..AccountUpdate::default()
                    },
                )
                .await?;
        }

        info!(account_id = %account.id, "Email verified");
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> ServiceResult<()> {
        let account = self.by_email(email).await?;

        let code = self.otp.issue(&account.email).await?;
        self.notify(account.email, otp::OTP_SUBJECT, otp::password_reset_body(&code));

        Ok(())
    }

    async fn reset_password(&self, email: &str, new_password: &str) -> ServiceResult<Account> {
        let account = self.by_email(email).await?;

        let password_hash = self.hasher.hash(new_password).await?;
        let updated = self
            .store
            .update_account(
                account.id,
                AccountUpdate {
                    password_hash: Some(password_hash),
                    ..AccountUpdate::default()
                },
            )
            .await?;

        match updated {
            Outcome::Done(account) => {
                info!(account_id = %account.id, "Password reset");
                Ok(account.into())
            }
            Outcome::Conflict(c) => Err(ServiceError::Internal(c)),
        }
    }

    async fn login(&self, email: &str, password: &str) -> ServiceResult<TokenPair> {
        let Some(account) = self
            .store
            .get_account_by_email(&normalize_handle(email))
            .await?
        else {
            return Err(ServiceError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &account.password_hash).await {
            return Err(ServiceError::InvalidCredentials);
        }

        if self.settings.require_verified_email && !account.is_verified {
            return Err(ServiceError::invalid("email not verified"));
        }

        metrics::counter!("logins_total").increment(1);

        self.tokens.issue_pair(&Subject {
            uid: account.id,
            username: account.username,
        })
    }

    async fn refresh_session(&self, claims: &Claims) -> ServiceResult<TokenPair> {
        if !claims.refresh {
            return Err(ServiceError::RefreshTokenRequired);
        }
        if claims.user_data.username.trim().is_empty() {
            return Err(ServiceError::InvalidToken);
        }

        let account = self
            .resolve(&claims.user_data)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        self.tokens.issue_pair(&Subject {
            uid: account.id,
            username: account.username,
        })
    }

    async fn current_account(&self, identity: &Subject) -> ServiceResult<AccountProfile> {
        let account = self
            .resolve(identity)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        let followers = self.store.followers_of(account.id).await?;
        let following = self.store.following_of(account.id).await?;
        let posts = self.store.posts_of_account(account.id).await?;

        Ok(AccountProfile {
            account: account.into(),
            followers: followers.into_iter().map(Account::from).collect(),
            following: following.into_iter().map(Account::from).collect(),
            posts: posts.into_iter().map(Post::from).collect(),
        })
    }

    async fn update_profile_image(
        &self,
        identity: &Subject,
        image: Upload,
    ) -> ServiceResult<Account> {
        let account = self
            .resolve(identity)
            .await?
            .ok_or_else(|| ServiceError::not_found("Account"))?;

        let new_url = self
            .assets
            .upload(image.bytes, PROFILE_FOLDER, &image.extension)
            .await?;

        let updated = self
            .store
            .update_account(
                account.id,
                AccountUpdate {
                    profile_url: Some(new_url.clone()),
                    ..AccountUpdate::default()
                },
            )
            .await;

        let updated = match updated {
            Ok(Outcome::Done(updated)) => updated,
            Ok(Outcome::Conflict(c)) => {
                self.discard_profile_image(&new_url).await;
                return Err(ServiceError::Internal(c));
            }
            Err(e) => {
                self.discard_profile_image(&new_url).await;
                return Err(e.into());
            }
        };

        self.discard_profile_image(&account.profile_url).await;

        Ok(updated.into())
    }

    async fn update_fields(
        &self,
        identity: &Subject,
        changes: AccountChanges,
    ) -> ServiceResult<Account> {
        let account = self
            .resolve(identity)
            .await?
            .ok_or_else(|| ServiceError::not_found("Account"))?;

        let mut update = AccountUpdate {
            full_name: changes
                .full_name
                .map(|v| v.trim().to_string())
                .filter(|v| *v != account.full_name),
            gender: changes
                .gender
                .map(|g| g.as_str().to_string())
                .filter(|g| *g != account.gender),
            about: changes.about.filter(|v| *v != account.about),
            dob: changes.dob.filter(|d| *d != account.dob),
            ..AccountUpdate::default()
        };

        if let Some(name) = &update.full_name
            && name.is_empty()
        {
            return Err(ServiceError::invalid("full name cannot be blank"));
        }

        if let Some(username) = changes.username.map(|u| normalize_handle(&u))
            && username != account.username
        {
            if username.is_empty() {
                return Err(ServiceError::invalid("username cannot be blank"));
            }
            if let Some(other) = self.store.get_account_by_username(&username).await?
                && other.id != account.id
            {
                return Err(ServiceError::AlreadyExists(Field::Username));
            }
            update.username = Some(username);
        }

        if update.is_empty() {
            return Ok(account.into());
        }

        match self.store.update_account(account.id, update).await? {
            Outcome::Done(updated) => Ok(updated.into()),
            Outcome::Conflict(constraint) => Err(ServiceError::AlreadyExists(
                Field::from_constraint(&constraint),
            )),
        }
    }

    async fn change_password(
        &self,
        identity: &Subject,
        old_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        let account = self
            .resolve(identity)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        if !self.hasher.verify(old_password, &account.password_hash).await {
            return Err(ServiceError::InvalidCredentials);
        }

        if self.hasher.verify(new_password, &account.password_hash).await {
            return Ok(());
        }

        let password_hash = self.hasher.hash(new_password).await?;
        self.store
            .update_account(
                account.id,
                AccountUpdate {
                    password_hash: Some(password_hash),
                    ..AccountUpdate::default()
                },
            )
            .await?;

        info!(account_id = %account.id, "Password changed");
        Ok(())
    }

    async fn delete_account(&self, identity: &Subject) -> ServiceResult<()> {
        let account = self
            .resolve(identity)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        let post_images = self
            .store
            .delete_account(account.id)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        self.discard_profile_image(&account.profile_url).await;

        for url in post_images.iter().filter(|url| self.assets.owns(url)) {
            if let Err(e) = self.assets.delete(url).await {
                warn!(url = %url, error = %e, "Failed to remove post image");
            }
        }

        metrics::counter!("accounts_deleted_total").increment(1);
        info!(account_id = %account.id, "Account deleted");
        Ok(())
    }

    async fn search_accounts(&self, prefix: &str) -> ServiceResult<Vec<Account>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Ok(vec![]);
        }

        let accounts = self
            .store
            .search_accounts(prefix, self.settings.search_limit)
            .await?;

        Ok(accounts.into_iter().map(Account::from).collect())
    }
}

