pub mod prelude;

pub mod album_guests;
pub mod album_requests;
pub mod albums;
pub mod comments;
pub mod engagements;
pub mod friend_requests;
pub mod friendships;
pub mod images;
pub mod notifications;
pub mod push_tokens;
pub mod users;
