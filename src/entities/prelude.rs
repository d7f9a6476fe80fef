pub use super::album_guests::Entity as AlbumGuests;
pub use super::album_requests::Entity as AlbumRequests;
pub use super::albums::Entity as Albums;
pub use super::comments::Entity as Comments;
pub use super::engagements::Entity as Engagements;
pub use super::friend_requests::Entity as FriendRequests;
pub use super::friendships::Entity as Friendships;
pub use super::images::Entity as Images;
pub use super::notifications::Entity as Notifications;
pub use super::push_tokens::Entity as PushTokens;
pub use super::users::Entity as Users;
