pub mod account;
pub mod comment;
pub mod engagement;
pub mod follow;
pub mod post;
pub mod tag;
