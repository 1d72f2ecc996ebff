use std::collections::HashMap;

use tokio::task::JoinHandle;

use crate::client::models::overlay::{CommentOverlay, PostOverlay};
use crate::client::models::session::SessionReader;
use crate::client::models::thread::CommentThread;
use crate::client::models::ui_state::{or_empty, ViewState};
use crate::client::services::gateway::{Ack, Gateway, ReportTarget};
use crate::common::error::Result;
use crate::common::models::{Comment, Post};

/// Comment input under a post; replying pre-fills the mention
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentComposer {
    pub text: String,
    pub reply_to: Option<String>,
}

impl CommentComposer {
    pub fn reply_to(&mut self, comment: &Comment) {
        self.reply_to = Some(comment.id.clone());
        self.text = format!("@{} ", comment.user.username);
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.reply_to = None;
    }
}

/// A single post with its threaded comments
pub struct PostDetailView {
    gateway: Gateway,
    post_id: String,
    state: ViewState<Post>,
    post_overlay: Option<PostOverlay>,
    comments: Vec<Comment>,
    comment_overlays: HashMap<String, CommentOverlay>,
    pub composer: CommentComposer,
}

impl PostDetailView {
    pub fn new(gateway: Gateway, post_id: &str) -> Self {
        Self {
            gateway,
            post_id: post_id.to_string(),
            state: ViewState::Loading,
            post_overlay: None,
            comments: Vec::new(),
            comment_overlays: HashMap::new(),
            composer: CommentComposer::default(),
        }
    }

    pub async fn load(&mut self) {
        self.state = ViewState::from_lookup(self.gateway.post(&self.post_id).await);
        self.post_overlay = self.state.ready().map(PostOverlay::from_post);
        self.comments = if self.state.ready().is_some() {
            or_empty("comments", self.gateway.comments(&self.post_id).await)
        } else {
            Vec::new()
        };
        self.comment_overlays = self
            .comments
            .iter()
            .map(|c| (c.id.clone(), CommentOverlay::from_comment(c)))
            .collect();
    }

    pub fn state(&self) -> &ViewState<Post> {
        &self.state
    }

    /// The post with any pending like or repost applied
    pub fn post(&self) -> Option<Post> {
        let post = self.state.ready()?;
        Some(match &self.post_overlay {
            Some(overlay) => overlay.project(post),
            None => post.clone(),
        })
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    pub fn thread(&self) -> CommentThread<'_> {
        CommentThread::build(&self.comments)
    }

    /// Like state of a comment as the viewer should see it
    pub fn comment_like(&self, comment_id: &str) -> Option<(bool, u64)> {
        self.comment_overlays
            .get(comment_id)
            .map(|o| (o.like.active(), o.like.count()))
    }

    pub fn toggle_like(&mut self) -> Option<JoinHandle<Result<Ack>>> {
        let mutation = self.post_overlay.as_mut()?.toggle_like();
        Some(self.gateway.fire(mutation))
    }

    pub fn toggle_repost(&mut self) -> Option<JoinHandle<Result<Ack>>> {
        let mutation = self.post_overlay.as_mut()?.toggle_repost();
        Some(self.gateway.fire(mutation))
    }

    pub fn toggle_comment_like(&mut self, comment_id: &str) -> Option<JoinHandle<Result<Ack>>> {
        let mutation = self.comment_overlays.get_mut(comment_id)?.toggle_like();
        Some(self.gateway.fire(mutation))
    }

    pub fn start_reply(&mut self, comment_id: &str) -> bool {
        match self.comments.iter().find(|c| c.id == comment_id) {
            Some(comment) => {
                self.composer.reply_to(comment);
                true
            }
            None => false,
        }
    }

    /// Sends the composer text; `Ok(false)` when there was nothing to send
    pub async fn submit_comment(&mut self) -> Result<bool> {
        let text = self.composer.text.trim().to_string();
        if text.is_empty() {
            return Ok(false);
        }
        self.gateway
            .add_comment(&self.post_id, &text, self.composer.reply_to.as_deref())
            .await?;
        self.composer.clear();
        self.load().await;
        Ok(true)
    }

    /// Comment authors and the post author may delete a comment
    pub fn can_delete_comment(&self, viewer: &dyn SessionReader, comment: &Comment) -> bool {
        let Some(viewer_id) = viewer.current_user_id() else {
            return false;
        };
        comment.user.id == viewer_id
            || self.state.ready().is_some_and(|p| p.user.id == viewer_id)
    }

    pub async fn delete_comment(&mut self, comment_id: &str) -> Result<()> {
        self.gateway.hide_comment(comment_id).await?;
        self.load().await;
        Ok(())
    }

    pub fn is_own_post(&self, viewer: &dyn SessionReader) -> bool {
        match (viewer.current_user_id(), self.state.ready()) {
            (Some(viewer_id), Some(post)) => post.user.id == viewer_id,
            _ => false,
        }
    }

    /// Moderators may hide other people's posts
    pub fn can_admin_hide(&self, viewer: &dyn SessionReader) -> bool {
        viewer.is_admin() && self.state.ready().is_some() && !self.is_own_post(viewer)
    }

    pub async fn delete_post(&mut self) -> Result<()> {
        self.gateway.hide_post(&self.post_id).await?;
        self.state = ViewState::NotFound;
        Ok(())
    }

    pub async fn admin_hide(&mut self) -> Result<()> {
        self.gateway.admin_hide_post(&self.post_id).await?;
        self.load().await;
        Ok(())
    }

    pub async fn report(&self, reason: &str) -> Result<Ack> {
        self.gateway.report(ReportTarget::Post, &self.post_id, reason).await
    }
}
