pub mod prelude;

pub mod accounts;
pub mod comments;
pub mod follows;
pub mod likes;
pub mod post_tags;
pub mod posts;
pub mod shares;
pub mod tags;
