pub use super::accounts::Entity as Accounts;
pub use super::comments::Entity as Comments;
pub use super::follows::Entity as Follows;
pub use super::likes::Entity as Likes;
pub use super::post_tags::Entity as PostTags;
pub use super::posts::Entity as Posts;
pub use super::shares::Entity as Shares;
pub use super::tags::Entity as Tags;
