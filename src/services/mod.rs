pub mod credentials;
pub mod error;
pub mod otp;
pub mod tokens;

pub use credentials::CredentialHasher;
pub use error::{Field, ServiceError, ServiceResult};
pub use otp::OtpChallenges;
pub use tokens::{Claims, Subject, TokenKind, TokenPair, TokenService};

pub mod identity_service;
pub mod identity_service_impl;
pub use identity_service::{AccountChanges, IdentityService, NewAccount, Upload};
pub use identity_service_impl::{IdentitySettings, SeaOrmIdentityService};

pub mod relationship_service;
pub mod relationship_service_impl;
pub use relationship_service::RelationshipService;
pub use relationship_service_impl::SeaOrmRelationshipService;

pub mod post_service;
pub mod post_service_impl;
pub use post_service::{NewPost, PostChanges, PostService};
pub use post_service_impl::SeaOrmPostService;
