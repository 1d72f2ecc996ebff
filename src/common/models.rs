use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::timestamp;

/// Author snapshot embedded in posts, comments, stories and notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_artist: bool,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl UserSnapshot {
    /// Name shown in lists, falling back to the handle when no display name is set
    pub fn shown_name(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }
}

/// A post as returned by the feed, profile tabs and post lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub user: UserSnapshot,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub comments_count: u64,
    #[serde(default)]
    pub reposts_count: u64,
    #[serde(default)]
    pub views_count: u64,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub reposted: bool,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A comment on a post; `parent_id == None` marks a root comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub user: UserSnapshot,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub liked: bool,
    /// The post author liked this comment
    #[serde(default)]
    pub is_author_like: bool,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A direct message between two accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub reply_to_id: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default, with = "timestamp")]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    /// The counterpart of `viewer_id` in this message's conversation
    pub fn partner_of(&self, viewer_id: &str) -> &str {
        if self.sender_id == viewer_id {
            &self.receiver_id
        } else {
            &self.sender_id
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
    FollowRequest,
    FollowAccepted,
    Verification,
    Message,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub from_user: Option<UserSnapshot>,
}

/// Relationship between the viewer and another account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum FollowStatus {
    #[default]
    None,
    Pending,
    Accepted,
}

impl From<Option<String>> for FollowStatus {
    fn from(value: Option<String>) -> Self {
        // "removed" and "rejected" rows read as no relationship
        match value.as_deref() {
            Some("pending") => FollowStatus::Pending,
            Some("accepted") => FollowStatus::Accepted,
            _ => FollowStatus::None,
        }
    }
}

impl From<FollowStatus> for Option<String> {
    fn from(value: FollowStatus) -> Self {
        match value {
            FollowStatus::None => None,
            FollowStatus::Pending => Some("pending".to_string()),
            FollowStatus::Accepted => Some("accepted".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Avatar {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub is_primary: bool,
}

/// Public profile of an account as seen by the viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_artist: bool,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub posts_count: u64,
    #[serde(default)]
    pub avatars: Vec<Avatar>,
    #[serde(default)]
    pub is_following: bool,
    #[serde(default)]
    pub follow_status: FollowStatus,
}

impl Avatar {
    /// Removed avatars stay in the list with this placeholder url
    pub fn is_removed(&self) -> bool {
        self.url == "removed"
    }
}

impl Profile {
    pub fn primary_avatar(&self) -> Option<&Avatar> {
        self.avatars.iter().find(|a| a.is_primary && !a.is_removed())
    }

    /// The gallery as shown to visitors
    pub fn gallery(&self) -> impl Iterator<Item = &Avatar> {
        self.avatars.iter().filter(|a| !a.is_removed())
    }
}

/// The signed-in account returned by the auth service `me` action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_artist: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub block_count: u32,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub avatars: Vec<Avatar>,
}

/// One row of the conversation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub partner_id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_artist: bool,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub last_message: String,
    #[serde(default, with = "timestamp")]
    pub last_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unread: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub image_url: String,
    #[serde(default)]
    pub visibility: String,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: UserSnapshot,
}

/// Who may see a story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryVisibility {
    #[default]
    All,
    Followers,
    Mutual,
}

impl StoryVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryVisibility::All => "all",
            StoryVisibility::Followers => "followers",
            StoryVisibility::Mutual => "mutual",
        }
    }
}

/// A user report waiting for a moderator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    /// "post", "comment" or "user"
    #[serde(default)]
    pub target_type: String,
    #[serde(default)]
    pub target_id: Option<String>,
    /// Username of whoever filed it
    #[serde(default)]
    pub reporter: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A pending request for a verified (or artist) badge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub status: String,
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A blocked account asking to be let back in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appeal {
    pub id: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub status: String,
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Token and minimal account returned by login and register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthGrant {
    pub token: String,
    pub user: AuthGrantUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthGrantUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn follow_status_reads_removed_as_none() {
        let profile: Profile = serde_json::from_value(json!({
            "id": "u1",
            "username": "alice",
            "follow_status": "removed"
        }))
        .unwrap();
        assert_eq!(profile.follow_status, FollowStatus::None);

        let profile: Profile = serde_json::from_value(json!({
            "id": "u1",
            "username": "alice",
            "follow_status": "pending"
        }))
        .unwrap();
        assert_eq!(profile.follow_status, FollowStatus::Pending);
    }

    #[test]
    fn unknown_notification_type_is_tolerated() {
        let n: Notification = serde_json::from_value(json!({
            "id": "n1",
            "type": "release_published",
            "content": "new album",
            "is_read": false,
            "created_at": null
        }))
        .unwrap();
        assert_eq!(n.kind, NotificationKind::Unknown);
    }

    #[test]
    fn message_partner_is_the_other_side() {
        let m: Message = serde_json::from_value(json!({
            "id": "m1",
            "sender_id": "me",
            "receiver_id": "them",
            "content": "hi",
            "created_at": "2024-03-01T10:00:00"
        }))
        .unwrap();
        assert_eq!(m.partner_of("me"), "them");
        assert_eq!(m.partner_of("them"), "me");
        assert!(m.created_at.is_some());
        assert!(!m.is_edited());
    }
}
