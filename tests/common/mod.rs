#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tempfile::TempDir;

use olofooto::clients::{DiskAssetStore, LogMailer, MemoryStore, Notifier, TransientStore};
use olofooto::config::{Config, EngagementScope};
use olofooto::db::Store;
use olofooto::models::{Account, Gender, PostDetail};
use olofooto::services::{
    IdentityService, NewAccount, NewPost, PostService, Subject, TokenPair, Upload,
};
use olofooto::state::{Collaborators, SharedState};

pub const PASSWORD: &str = "correct horse battery";

pub struct TestApp {
    pub state: Arc<SharedState>,
    pub otp: Arc<MemoryStore>,
    pub config: Config,
    pub media: TempDir,
}

pub fn test_config(media: &TempDir) -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.security.argon2_memory_cost_kib = 64;
    config.security.argon2_time_cost = 1;
    config.security.jwt_secret = "integration-test-secret-0123456789abcdef".to_string();
    config.assets.root_path = media.path().display().to_string();
    config.assets.public_base_url = "http://localhost:8000/media".to_string();
    config.observability.metrics_enabled = false;
    config
}

/// A mail transport that is always down.
pub struct FailingMailer;

#[async_trait]
impl Notifier for FailingMailer {
    async fn send(&self, _to: &str, _subject: &str, _html_body: &str) -> anyhow::Result<()> {
        anyhow::bail!("smtp unavailable")
    }
}

pub async fn spawn_custom(
    configure: impl FnOnce(&mut Config),
    notifier: Arc<dyn Notifier>,
) -> TestApp {
    let media = tempfile::tempdir().unwrap();
    let mut config = test_config(&media);
    configure(&mut config);

    let store = Store::new(&config.general.database_path).await.unwrap();
    let otp = Arc::new(MemoryStore::new());

    let collaborators = Collaborators {
        transient: otp.clone(),
        assets: Arc::new(DiskAssetStore::new(
            media.path(),
            &config.assets.public_base_url,
        )),
        notifier,
    };

    let state = SharedState::with_collaborators(config.clone(), store, collaborators).unwrap();

    TestApp {
        state: Arc::new(state),
        otp,
        config,
        media,
    }
}

pub async fn spawn_with(scope: EngagementScope) -> TestApp {
    spawn_custom(
        |config| config.social.engagement_scope = scope,
        Arc::new(LogMailer),
    )
    .await
}

pub async fn spawn() -> TestApp {
    spawn_with(EngagementScope::Account).await
}

pub fn image() -> Upload {
    Upload {
        bytes: b"\x89PNG\r\n\x1a\nnot really a png".to_vec(),
        extension: "png".to_string(),
    }
}

pub fn new_account(email: &str, username: &str) -> NewAccount {
    NewAccount {
        full_name: format!("{username} tester"),
        email: email.to_string(),
        username: username.to_string(),
        password: PASSWORD.to_string(),
        gender: Gender::Other,
        about: None,
        dob: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        image: None,
    }
}

pub fn subject(account: &Account) -> Subject {
    Subject {
        uid: account.id,
        username: account.username.clone(),
    }
}

impl TestApp {
    pub async fn register(&self, email: &str, username: &str) -> Account {
        self.state
            .identity
            .register(new_account(email, username))
            .await
            .unwrap()
    }

    pub async fn otp_for(&self, email: &str) -> Option<String> {
        let key = format!("{}{email}", self.config.otp.key_prefix);
        self.otp.get(&key).await.unwrap()
    }

    pub async fn login(&self, email: &str) -> TokenPair {
        self.state.identity.login(email, PASSWORD).await.unwrap()
    }

    pub async fn post_by(&self, account: &Account, tags: &[&str]) -> PostDetail {
        self.state
            .posts
            .create_post(
                &subject(account),
                NewPost {
                    caption: "sunset".to_string(),
                    image: image(),
                    tags: tags.iter().map(ToString::to_string).collect(),
                },
            )
            .await
            .unwrap()
    }
}
