pub mod assets;
pub mod mailer;
pub mod otp_store;

pub use assets::{AssetStore, DiskAssetStore};
pub use mailer::{LogMailer, Notifier, SmtpMailer};
pub use otp_store::{MemoryStore, RedisStore, TransientStore};
