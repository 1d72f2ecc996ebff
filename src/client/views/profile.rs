use tokio::task::JoinHandle;

use crate::client::models::overlay::{FollowOverlay, PostOverlays};
use crate::client::models::session::SessionReader;
use crate::client::models::ui_state::{or_empty, ViewState};
use crate::client::services::gateway::{
    Ack, ConnectionKind, Gateway, Mutation, Polarity, PostTab, ToggleKind,
};
use crate::common::error::{ClientError, Result};
use crate::common::models::{Avatar, FollowStatus, Post, Profile, UserSnapshot};

/// Someone's profile page with its post tabs
pub struct ProfileView {
    gateway: Gateway,
    username: String,
    state: ViewState<Profile>,
    follow: Option<FollowOverlay>,
    tab: PostTab,
    posts: Vec<Post>,
    overlays: PostOverlays,
}

impl ProfileView {
    pub fn new(gateway: Gateway, username: &str) -> Self {
        Self {
            gateway,
            username: username.to_string(),
            state: ViewState::Loading,
            follow: None,
            tab: PostTab::Posts,
            posts: Vec::new(),
            overlays: PostOverlays::default(),
        }
    }

    pub async fn load(&mut self) {
        self.refresh_profile().await;
        self.tab = PostTab::Posts;
        self.load_tab().await;
    }

    async fn refresh_profile(&mut self) {
        self.state = ViewState::from_lookup(self.gateway.profile(&self.username).await);
        self.follow = self.state.ready().map(FollowOverlay::from_profile);
    }

    pub async fn select_tab(&mut self, tab: PostTab) {
        self.tab = tab;
        self.load_tab().await;
    }

    async fn load_tab(&mut self) {
        self.overlays.clear();
        let Some(user_id) = self.state.ready().map(|p| p.id.clone()) else {
            self.posts.clear();
            return;
        };
        self.posts = or_empty("profile posts", self.gateway.user_posts(self.tab, &user_id).await);
        self.overlays.reconcile(&self.posts);
    }

    pub fn state(&self) -> &ViewState<Profile> {
        &self.state
    }

    pub fn tab(&self) -> PostTab {
        self.tab
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.iter().map(|p| self.overlays.project(p)).collect()
    }

    pub fn is_own(&self, viewer: &dyn SessionReader) -> bool {
        match (viewer.current_user_id(), self.state.ready()) {
            (Some(viewer_id), Some(profile)) => profile.id == viewer_id,
            _ => false,
        }
    }

    pub fn follow_status(&self) -> FollowStatus {
        self.follow.as_ref().map(|f| f.status()).unwrap_or_default()
    }

    /// Follower count including a follow or unfollow still in flight
    pub fn followers(&self) -> u64 {
        self.follow.as_ref().map(|f| f.followers()).unwrap_or_default()
    }

    /// Caption of the follow button
    pub fn follow_label(&self) -> &'static str {
        let private = self.state.ready().is_some_and(|p| p.is_private);
        match self.follow_status() {
            FollowStatus::Accepted => "Unfollow",
            FollowStatus::Pending => "Request sent",
            FollowStatus::None if private => "Request to follow",
            FollowStatus::None => "Follow",
        }
    }

    pub fn toggle_follow(&mut self) -> Option<JoinHandle<Result<Ack>>> {
        let mutation = self.follow.as_mut()?.toggle();
        Some(self.gateway.fire(mutation))
    }

    pub fn toggle_like(&mut self, post_id: &str) -> Option<JoinHandle<Result<Ack>>> {
        let mutation = self.overlays.toggle_like(post_id)?;
        Some(self.gateway.fire(mutation))
    }

    pub fn toggle_repost(&mut self, post_id: &str) -> Option<JoinHandle<Result<Ack>>> {
        let mutation = self.overlays.toggle_repost(post_id)?;
        Some(self.gateway.fire(mutation))
    }

    pub async fn set_blocked(&self, blocked: bool) -> Result<Ack> {
        let Some(profile) = self.state.ready() else {
            return Ok(Ack::default());
        };
        let mutation = Mutation::new(ToggleKind::Block, profile.id.clone(), Polarity::towards(blocked));
        self.gateway.dispatch(&mutation).await
    }

    /// Avatar gallery without removed entries
    pub fn avatars(&self) -> Vec<&Avatar> {
        self.state.ready().map(|p| p.gallery().collect()).unwrap_or_default()
    }

    pub async fn set_primary_avatar(&mut self, viewer: &dyn SessionReader, avatar_id: &str) -> Result<()> {
        self.require_own(viewer)?;
        self.gateway.set_primary_avatar(avatar_id).await?;
        self.refresh_profile().await;
        Ok(())
    }

    pub async fn remove_avatar(&mut self, viewer: &dyn SessionReader, avatar_id: &str) -> Result<()> {
        self.require_own(viewer)?;
        self.gateway.remove_avatar(avatar_id).await?;
        self.refresh_profile().await;
        Ok(())
    }

    fn require_own(&self, viewer: &dyn SessionReader) -> Result<()> {
        if self.is_own(viewer) {
            Ok(())
        } else {
            Err(ClientError::Forbidden("only the owner manages avatars".to_string()))
        }
    }

    pub async fn connections(&self, kind: ConnectionKind) -> Vec<UserSnapshot> {
        match self.state.ready() {
            Some(profile) => or_empty("connections", self.gateway.connections(kind, &profile.id).await),
            None => Vec::new(),
        }
    }
}
