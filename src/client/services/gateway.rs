use std::sync::Arc;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::task::JoinHandle;

use crate::client::services::transport::Transport;
use crate::common::error::Result;
use crate::common::models::{
    Appeal, ChatSummary, Comment, FollowStatus, Message, Notification, Post, Profile, Report,
    Story, StoryVisibility, UserSnapshot, VerificationRequest,
};

/// Which way a toggle goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Apply,
    Revert,
}

impl Polarity {
    /// Polarity of the request that leads to `next_active`
    pub fn towards(next_active: bool) -> Self {
        if next_active {
            Polarity::Apply
        } else {
            Polarity::Revert
        }
    }
}

/// Every paired action the domain API exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleKind {
    LikePost,
    Repost,
    LikeComment,
    Follow,
    /// Accept (apply) or reject (revert) an incoming follow request
    FollowRequest,
    Block,
}

impl ToggleKind {
    pub fn action(&self, polarity: Polarity) -> &'static str {
        use Polarity::*;
        match (self, polarity) {
            (ToggleKind::LikePost, Apply) => "like_post",
            (ToggleKind::LikePost, Revert) => "unlike_post",
            (ToggleKind::Repost, Apply) => "repost",
            (ToggleKind::Repost, Revert) => "unrepost",
            (ToggleKind::LikeComment, Apply) => "like_comment",
            (ToggleKind::LikeComment, Revert) => "unlike_comment",
            (ToggleKind::Follow, Apply) => "follow",
            (ToggleKind::Follow, Revert) => "unfollow",
            (ToggleKind::FollowRequest, Apply) => "accept_follow",
            (ToggleKind::FollowRequest, Revert) => "reject_follow",
            (ToggleKind::Block, Apply) => "block_user",
            (ToggleKind::Block, Revert) => "unblock_user",
        }
    }

    /// Body field naming the target entity
    pub fn target_field(&self) -> &'static str {
        match self {
            ToggleKind::LikePost | ToggleKind::Repost => "post_id",
            ToggleKind::LikeComment => "comment_id",
            ToggleKind::Follow | ToggleKind::FollowRequest | ToggleKind::Block => "user_id",
        }
    }
}

/// A single toggle request, produced by the overlay and sent by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub kind: ToggleKind,
    pub target_id: String,
    pub polarity: Polarity,
}

impl Mutation {
    pub fn new(kind: ToggleKind, target_id: impl Into<String>, polarity: Polarity) -> Self {
        Self {
            kind,
            target_id: target_id.into(),
            polarity,
        }
    }

    pub fn action(&self) -> &'static str {
        self.kind.action(self.polarity)
    }

    pub fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("action".into(), Value::from(self.action()));
        body.insert(self.kind.target_field().into(), Value::from(self.target_id.clone()));
        Value::Object(body)
    }
}

/// Acknowledgement of a write; most actions only answer `{ok: true}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub ok: bool,
    /// Id of a created entity (message, comment, post)
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Ack {
    fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Relationship the server recorded for a follow request
    pub fn follow_status(&self) -> Option<FollowStatus> {
        self.status.clone().map(|s| FollowStatus::from(Some(s)))
    }
}

/// Post lists shown on a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostTab {
    #[default]
    Posts,
    Likes,
    Reposts,
}

impl PostTab {
    fn action(&self) -> &'static str {
        match self {
            PostTab::Posts => "user_posts",
            PostTab::Likes => "user_likes",
            PostTab::Reposts => "user_reposts",
        }
    }
}

/// Account lists reachable from a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    Followers,
    Following,
    Friends,
}

impl ConnectionKind {
    fn action(&self) -> &'static str {
        match self {
            ConnectionKind::Followers => "followers",
            ConnectionKind::Following => "following",
            ConnectionKind::Friends => "friends",
        }
    }
}

/// Entities that can be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportTarget {
    Post,
    Comment,
    User,
}

impl ReportTarget {
    fn as_str(&self) -> &'static str {
        match self {
            ReportTarget::Post => "post",
            ReportTarget::Comment => "comment",
            ReportTarget::User => "user",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "post" => Some(ReportTarget::Post),
            "comment" => Some(ReportTarget::Comment),
            "user" => Some(ReportTarget::User),
            _ => None,
        }
    }
}

/// Moderator decision on a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportResolution {
    /// Take the reported post or account down
    Block,
    Dismiss,
}

impl ReportResolution {
    fn as_str(&self) -> &'static str {
        match self {
            ReportResolution::Block => "block",
            ReportResolution::Dismiss => "dismiss",
        }
    }
}

/// Moderator decision on a block appeal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppealResolution {
    Approve,
    Reject,
}

impl AppealResolution {
    fn as_str(&self) -> &'static str {
        match self {
            AppealResolution::Approve => "approve",
            AppealResolution::Reject => "reject",
        }
    }
}

/// Typed face of the domain API.
///
/// Stateless: views hold a clone each and every call is a single round
/// trip through the shared transport.
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn read<T: DeserializeOwned>(&self, action: &str, params: &[(&str, &str)]) -> Result<T> {
        let mut query = Vec::with_capacity(params.len() + 1);
        query.push(("action", action));
        query.extend_from_slice(params);
        let value = self.transport.get(&query).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Reads the API exposes as POST-only (the moderation queues)
    async fn post_read<T: DeserializeOwned>(&self, action: &str) -> Result<T> {
        let value = self.transport.post(with_action(action, Value::Null)).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn write(&self, action: &str, fields: Value) -> Result<Ack> {
        let value = self.transport.post(with_action(action, fields)).await?;
        Ok(Ack::from_value(value))
    }

    // ----- toggles -----

    pub async fn dispatch(&self, mutation: &Mutation) -> Result<Ack> {
        debug!("[GATEWAY] {} {}", mutation.action(), mutation.target_id);
        let value = self.transport.post(mutation.body()).await?;
        Ok(Ack::from_value(value))
    }

    /// Sends a toggle in the background. The handle only matters to callers
    /// that want to surface a failure; the overlay never waits on it.
    pub fn fire(&self, mutation: Mutation) -> JoinHandle<Result<Ack>> {
        let gateway = self.clone();
        tokio::spawn(async move {
            let result = gateway.dispatch(&mutation).await;
            if let Err(e) = &result {
                warn!(
                    "[GATEWAY] {} {} failed: {}",
                    mutation.action(),
                    mutation.target_id,
                    e
                );
            }
            result
        })
    }

    // ----- reads -----

    pub async fn feed(&self, offset: usize) -> Result<Vec<Post>> {
        let offset = offset.to_string();
        self.read("feed", &[("offset", &offset)]).await
    }

    pub async fn post(&self, post_id: &str) -> Result<Post> {
        self.read("post", &[("id", post_id)]).await
    }

    pub async fn comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        self.read("comments", &[("post_id", post_id)]).await
    }

    pub async fn profile(&self, username: &str) -> Result<Profile> {
        self.read("profile", &[("username", username)]).await
    }

    pub async fn user_posts(&self, tab: PostTab, user_id: &str) -> Result<Vec<Post>> {
        self.read(tab.action(), &[("user_id", user_id)]).await
    }

    pub async fn connections(&self, kind: ConnectionKind, user_id: &str) -> Result<Vec<UserSnapshot>> {
        self.read(kind.action(), &[("user_id", user_id)]).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<UserSnapshot>> {
        self.read("search", &[("q", query)]).await
    }

    pub async fn stories(&self) -> Result<Vec<Story>> {
        self.read("stories", &[]).await
    }

    pub async fn notifications(&self) -> Result<Vec<Notification>> {
        self.read("notifications", &[]).await
    }

    pub async fn chats(&self) -> Result<Vec<ChatSummary>> {
        self.read("messages", &[]).await
    }

    /// Most recent window of a conversation, oldest first
    pub async fn conversation(&self, partner_id: &str) -> Result<Vec<Message>> {
        self.read("conversation", &[("partner_id", partner_id)]).await
    }

    // ----- writes -----

    pub async fn create_post(&self, content: &str, image_url: Option<&str>) -> Result<Ack> {
        self.write("create_post", json!({ "content": content, "image_url": image_url }))
            .await
    }

    pub async fn add_comment(&self, post_id: &str, content: &str, parent_id: Option<&str>) -> Result<Ack> {
        self.write(
            "comment",
            json!({ "post_id": post_id, "content": content, "parent_id": parent_id }),
        )
        .await
    }

    /// Author-side delete of a post
    pub async fn hide_post(&self, post_id: &str) -> Result<Ack> {
        self.write("hide_post", json!({ "post_id": post_id })).await
    }

    /// Author-side delete of a comment
    pub async fn hide_comment(&self, comment_id: &str) -> Result<Ack> {
        self.write("hide_comment", json!({ "comment_id": comment_id })).await
    }

    /// Moderation hide, admin sessions only
    pub async fn admin_hide_post(&self, post_id: &str) -> Result<Ack> {
        self.write("admin_hide_post", json!({ "post_id": post_id })).await
    }

    pub async fn report(&self, target: ReportTarget, target_id: &str, reason: &str) -> Result<Ack> {
        self.write(
            "report",
            json!({ "target_type": target.as_str(), "target_id": target_id, "reason": reason }),
        )
        .await
    }

    pub async fn view_post(&self, post_id: &str) -> Result<Ack> {
        self.write("view_post", json!({ "post_id": post_id })).await
    }

    pub async fn send_message(&self, receiver_id: &str, content: &str, reply_to_id: Option<&str>) -> Result<Ack> {
        self.write(
            "send_message",
            json!({ "receiver_id": receiver_id, "content": content, "reply_to_id": reply_to_id }),
        )
        .await
    }

    pub async fn edit_message(&self, message_id: &str, content: &str) -> Result<Ack> {
        self.write("edit_message", json!({ "message_id": message_id, "content": content }))
            .await
    }

    pub async fn pin_message(&self, message_id: &str, pinned: bool) -> Result<Ack> {
        self.write("pin_message", json!({ "message_id": message_id, "pinned": pinned }))
            .await
    }

    /// Marks everything `sender_id` sent to the viewer as read
    pub async fn mark_read(&self, sender_id: &str) -> Result<Ack> {
        self.write("mark_read", json!({ "sender_id": sender_id })).await
    }

    pub async fn read_notifications(&self) -> Result<Ack> {
        self.write("read_notifications", Value::Null).await
    }

    pub async fn create_story(&self, image_url: &str, visibility: StoryVisibility) -> Result<Ack> {
        self.write(
            "create_story",
            json!({ "image_url": image_url, "visibility": visibility.as_str() }),
        )
        .await
    }

    pub async fn upload_avatar(&self, url: &str) -> Result<Ack> {
        self.write("upload_avatar", json!({ "url": url })).await
    }

    pub async fn request_verification(&self, kind: &str) -> Result<Ack> {
        self.write("request_verification", json!({ "type": kind })).await
    }

    pub async fn appeal(&self, reason: &str) -> Result<Ack> {
        self.write("appeal", json!({ "reason": reason })).await
    }

    pub async fn set_primary_avatar(&self, avatar_id: &str) -> Result<Ack> {
        self.write("set_primary_avatar", json!({ "avatar_id": avatar_id })).await
    }

    pub async fn remove_avatar(&self, avatar_id: &str) -> Result<Ack> {
        self.write("remove_avatar", json!({ "avatar_id": avatar_id })).await
    }

    // ----- moderation -----

    pub async fn admin_reports(&self) -> Result<Vec<Report>> {
        self.post_read("admin_get_reports").await
    }

    pub async fn admin_verifications(&self) -> Result<Vec<VerificationRequest>> {
        self.post_read("admin_get_verifications").await
    }

    pub async fn admin_appeals(&self) -> Result<Vec<Appeal>> {
        self.post_read("admin_get_appeals").await
    }

    pub async fn admin_verify(&self, request_id: &str) -> Result<Ack> {
        self.write("admin_verify", json!({ "request_id": request_id })).await
    }

    pub async fn admin_reject_verify(&self, request_id: &str) -> Result<Ack> {
        self.write("admin_reject_verify", json!({ "request_id": request_id })).await
    }

    pub async fn admin_block_user(&self, user_id: &str) -> Result<Ack> {
        self.write("admin_block_user", json!({ "user_id": user_id })).await
    }

    pub async fn admin_unblock_user(&self, user_id: &str) -> Result<Ack> {
        self.write("admin_unblock_user", json!({ "user_id": user_id })).await
    }

    pub async fn admin_resolve_report(&self, report_id: &str, resolution: ReportResolution) -> Result<Ack> {
        self.write(
            "admin_resolve_report",
            json!({ "report_id": report_id, "resolve_action": resolution.as_str() }),
        )
        .await
    }

    pub async fn admin_resolve_appeal(&self, appeal_id: &str, resolution: AppealResolution) -> Result<Ack> {
        self.write(
            "admin_resolve_appeal",
            json!({ "appeal_id": appeal_id, "resolve_action": resolution.as_str() }),
        )
        .await
    }
}

/// Adds the `action` discriminator to a write body
fn with_action(action: &str, fields: Value) -> Value {
    let mut body = match fields {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    body.insert("action".into(), Value::from(action));
    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeTransport;
    use crate::common::error::ClientError;

    #[test]
    fn toggle_pairs_name_both_directions() {
        let like = Mutation::new(ToggleKind::LikePost, "p1", Polarity::Apply);
        assert_eq!(like.body(), json!({"action": "like_post", "post_id": "p1"}));

        let unfollow = Mutation::new(ToggleKind::Follow, "u9", Polarity::towards(false));
        assert_eq!(unfollow.body(), json!({"action": "unfollow", "user_id": "u9"}));

        let reject = Mutation::new(ToggleKind::FollowRequest, "u2", Polarity::Revert);
        assert_eq!(reject.action(), "reject_follow");
        assert_eq!(ToggleKind::LikeComment.target_field(), "comment_id");
    }

    #[test]
    fn ack_tolerates_bare_and_empty_answers() {
        assert_eq!(Ack::from_value(Value::Null), Ack::default());
        let ack = Ack::from_value(json!({"status": "pending"}));
        assert_eq!(ack.follow_status(), Some(FollowStatus::Pending));
        assert!(Ack::from_value(json!({"ok": true})).follow_status().is_none());
    }

    #[tokio::test]
    async fn reads_carry_action_and_parameters() {
        let fake = FakeTransport::new();
        fake.respond("feed", json!([]));
        let gateway = Gateway::new(fake.clone());

        let posts = gateway.feed(20).await.unwrap();
        assert!(posts.is_empty());

        let call = &fake.calls()[0];
        assert_eq!(call.method, "GET");
        assert_eq!(call.action, "feed");
        assert_eq!(call.payload, json!({"action": "feed", "offset": "20"}));
    }

    #[tokio::test]
    async fn writes_send_optional_fields_as_null() {
        let fake = FakeTransport::new();
        fake.respond("send_message", json!({"id": "m7"}));
        let gateway = Gateway::new(fake.clone());

        let ack = gateway.send_message("u2", "hello", None).await.unwrap();
        assert_eq!(ack.id.as_deref(), Some("m7"));
        assert_eq!(
            fake.calls()[0].payload,
            json!({"action": "send_message", "receiver_id": "u2", "content": "hello", "reply_to_id": null})
        );
    }

    #[tokio::test]
    async fn not_found_lookup_surfaces_as_not_found() {
        let fake = FakeTransport::new();
        fake.fail("profile", 404, json!({"error": "User not found"}));
        let gateway = Gateway::new(fake);

        let err = gateway.profile("ghost").await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn fired_toggle_reports_failure_through_handle() {
        let fake = FakeTransport::new();
        fake.fail("repost", 500, json!({"error": "boom"}));
        let gateway = Gateway::new(fake.clone());

        let handle = gateway.fire(Mutation::new(ToggleKind::Repost, "p1", Polarity::Apply));
        assert!(handle.await.unwrap().is_err());
        assert_eq!(fake.count("repost"), 1);
    }
}
