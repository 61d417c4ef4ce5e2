pub mod account;
pub mod post;

pub use account::{Account, AccountProfile, Gender, normalize_handle};
pub use post::{Comment, Like, LikeOutcome, Post, PostDetail, Share, Tag, normalize_tag};
