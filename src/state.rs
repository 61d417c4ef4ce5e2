use std::sync::Arc;
use tracing::info;

use crate::clients::{
    AssetStore, DiskAssetStore, LogMailer, MemoryStore, Notifier, RedisStore, SmtpMailer,
    TransientStore,
};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    CredentialHasher, IdentityService, IdentitySettings, OtpChallenges, PostService,
    RelationshipService, SeaOrmIdentityService, SeaOrmPostService, SeaOrmRelationshipService,
    TokenService,
};

/// External collaborators the services are built on.
pub struct Collaborators {
    pub transient: Arc<dyn TransientStore>,
    pub assets: Arc<dyn AssetStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    /// Redis and SMTP when enabled, in-process fallbacks otherwise.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let transient: Arc<dyn TransientStore> = if config.redis.enabled {
            Arc::new(RedisStore::connect(&config.redis.url).await?)
        } else {
            info!("Redis disabled, keeping OTP codes in memory");
            Arc::new(MemoryStore::new())
        };

        let notifier: Arc<dyn Notifier> = if config.email.enabled {
            Arc::new(SmtpMailer::new(&config.email)?)
        } else {
            info!("Email disabled, notifications will be logged");
            Arc::new(LogMailer)
        };

        let assets = Arc::new(DiskAssetStore::new(
            &config.assets.root_path,
            &config.assets.public_base_url,
        ));

        Ok(Self {
            transient,
            assets,
            notifier,
        })
    }
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub tokens: Arc<TokenService>,

    pub identity: Arc<dyn IdentityService>,

    pub relationships: Arc<dyn RelationshipService>,

    pub posts: Arc<dyn PostService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let collaborators = Collaborators::from_config(&config).await?;
        Self::with_collaborators(config, store, collaborators)
    }

    pub fn with_collaborators(
        config: Config,
        store: Store,
        collaborators: Collaborators,
    ) -> anyhow::Result<Self> {
        let tokens = Arc::new(TokenService::new(&config.security)?);
        let hasher = CredentialHasher::new(&config.security)?;
        let otp = OtpChallenges::new(collaborators.transient, &config.otp);

        let identity = Arc::new(SeaOrmIdentityService::new(
            store.clone(),
            hasher,
            tokens.clone(),
            otp,
            collaborators.assets.clone(),
            collaborators.notifier,
            IdentitySettings {
                default_profile_url: config.assets.default_profile_url.clone(),
                require_verified_email: config.security.require_verified_email,
                search_limit: config.social.search_limit,
            },
        )) as Arc<dyn IdentityService>;

        let relationships = Arc::new(SeaOrmRelationshipService::new(
            store.clone(),
            config.social.engagement_scope,
        )) as Arc<dyn RelationshipService>;

        let posts = Arc::new(SeaOrmPostService::new(store.clone(), collaborators.assets))
            as Arc<dyn PostService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            identity,
            relationships,
            posts,
        })
    }
}
