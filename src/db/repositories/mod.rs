pub mod album;
pub mod engagement;
pub mod friend;
pub mod image;
pub mod notification;
pub mod push_token;
pub mod user;
