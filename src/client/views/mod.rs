pub mod chats;
pub mod conversation;
pub mod feed;
pub mod moderation;
pub mod notifications;
pub mod post_detail;
pub mod profile;
