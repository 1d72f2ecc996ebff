//! Optimistic interaction state.
//!
//! Toggles flip locally and hand back the request to send. Nothing here
//! waits for the server or rolls back; the next refetch of the underlying
//! record is the only reconciliation point.

use std::collections::HashMap;

use crate::client::services::gateway::{Mutation, Polarity, ToggleKind};
use crate::common::models::{Comment, FollowStatus, Post, Profile};

/// A viewer-scoped flag with its public counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToggleCounter {
    active: bool,
    count: u64,
}

impl ToggleCounter {
    pub fn new(active: bool, count: u64) -> Self {
        Self { active, count }
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Flips the flag and moves the counter one step; the counter never
    /// goes below zero
    pub fn toggle(&mut self) -> Polarity {
        if self.active {
            self.active = false;
            self.count = self.count.saturating_sub(1);
        } else {
            self.active = true;
            self.count = self.count.saturating_add(1);
        }
        Polarity::towards(self.active)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostOverlay {
    post_id: String,
    pub like: ToggleCounter,
    pub repost: ToggleCounter,
}

impl PostOverlay {
    pub fn from_post(post: &Post) -> Self {
        Self {
            post_id: post.id.clone(),
            like: ToggleCounter::new(post.liked, post.likes_count),
            repost: ToggleCounter::new(post.reposted, post.reposts_count),
        }
    }

    pub fn toggle_like(&mut self) -> Mutation {
        let polarity = self.like.toggle();
        Mutation::new(ToggleKind::LikePost, self.post_id.clone(), polarity)
    }

    pub fn toggle_repost(&mut self) -> Mutation {
        let polarity = self.repost.toggle();
        Mutation::new(ToggleKind::Repost, self.post_id.clone(), polarity)
    }

    /// The post as the viewer should currently see it
    pub fn project(&self, post: &Post) -> Post {
        Post {
            liked: self.like.active(),
            likes_count: self.like.count(),
            reposted: self.repost.active(),
            reposts_count: self.repost.count(),
            ..post.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentOverlay {
    comment_id: String,
    pub like: ToggleCounter,
}

impl CommentOverlay {
    pub fn from_comment(comment: &Comment) -> Self {
        Self {
            comment_id: comment.id.clone(),
            like: ToggleCounter::new(comment.liked, comment.likes_count),
        }
    }

    pub fn toggle_like(&mut self) -> Mutation {
        let polarity = self.like.toggle();
        Mutation::new(ToggleKind::LikeComment, self.comment_id.clone(), polarity)
    }
}

/// Follow relationship towards one profile
#[derive(Debug, Clone, PartialEq)]
pub struct FollowOverlay {
    target_id: String,
    target_is_private: bool,
    status: FollowStatus,
    followers: u64,
}

impl FollowOverlay {
    pub fn from_profile(profile: &Profile) -> Self {
        // older backends only send the boolean
        let status = if profile.follow_status == FollowStatus::None && profile.is_following {
            FollowStatus::Accepted
        } else {
            profile.follow_status
        };
        Self {
            target_id: profile.id.clone(),
            target_is_private: profile.is_private,
            status,
            followers: profile.followers_count,
        }
    }

    pub fn status(&self) -> FollowStatus {
        self.status
    }

    pub fn followers(&self) -> u64 {
        self.followers
    }

    /// Follow from none (pending for private targets), unfollow from
    /// pending or accepted
    pub fn toggle(&mut self) -> Mutation {
        let polarity = match self.status {
            FollowStatus::None => {
                if self.target_is_private {
                    self.status = FollowStatus::Pending;
                } else {
                    self.status = FollowStatus::Accepted;
                    self.followers = self.followers.saturating_add(1);
                }
                Polarity::Apply
            }
            FollowStatus::Pending => {
                self.status = FollowStatus::None;
                Polarity::Revert
            }
            FollowStatus::Accepted => {
                self.status = FollowStatus::None;
                self.followers = self.followers.saturating_sub(1);
                Polarity::Revert
            }
        };
        Mutation::new(ToggleKind::Follow, self.target_id.clone(), polarity)
    }
}

/// Overlays for every post currently on screen, keyed by id
#[derive(Debug, Default)]
pub struct PostOverlays {
    posts: HashMap<String, PostOverlay>,
}

impl PostOverlays {
    /// Replaces overlay state with freshly fetched server values
    pub fn reconcile(&mut self, posts: &[Post]) {
        for post in posts {
            self.posts.insert(post.id.clone(), PostOverlay::from_post(post));
        }
    }

    pub fn clear(&mut self) {
        self.posts.clear();
    }

    pub fn get(&self, post_id: &str) -> Option<&PostOverlay> {
        self.posts.get(post_id)
    }

    pub fn toggle_like(&mut self, post_id: &str) -> Option<Mutation> {
        self.posts.get_mut(post_id).map(PostOverlay::toggle_like)
    }

    pub fn toggle_repost(&mut self, post_id: &str) -> Option<Mutation> {
        self.posts.get_mut(post_id).map(PostOverlay::toggle_repost)
    }

    pub fn project(&self, post: &Post) -> Post {
        match self.posts.get(&post.id) {
            Some(overlay) => overlay.project(post),
            None => post.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::post_json;

    fn post(likes: u64, liked: bool) -> Post {
        serde_json::from_value(post_json("p1", "bob", likes, liked)).unwrap()
    }

    fn profile(is_private: bool, followers: u64) -> Profile {
        serde_json::from_value(serde_json::json!({
            "id": "u2",
            "username": "bob",
            "is_private": is_private,
            "followers_count": followers,
            "follow_status": null
        }))
        .unwrap()
    }

    #[test]
    fn like_twice_restores_original_state() {
        let mut overlay = PostOverlay::from_post(&post(5, false));

        let first = overlay.toggle_like();
        assert_eq!(first.action(), "like_post");
        assert_eq!((overlay.like.active(), overlay.like.count()), (true, 6));

        let second = overlay.toggle_like();
        assert_eq!(second.action(), "unlike_post");
        assert_eq!((overlay.like.active(), overlay.like.count()), (false, 5));
    }

    #[test]
    fn counter_never_goes_negative() {
        let mut counter = ToggleCounter::new(true, 0);
        assert_eq!(counter.toggle(), Polarity::Revert);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn repost_projection_leaves_other_fields_alone() {
        let original = post(2, true);
        let mut overlay = PostOverlay::from_post(&original);
        overlay.toggle_repost();

        let shown = overlay.project(&original);
        assert!(shown.reposted);
        assert_eq!(shown.reposts_count, 1);
        assert!(shown.liked);
        assert_eq!(shown.content, original.content);
    }

    #[test]
    fn private_follow_goes_pending_without_counting() {
        let mut follow = FollowOverlay::from_profile(&profile(true, 10));
        let m = follow.toggle();
        assert_eq!(m.action(), "follow");
        assert_eq!(follow.status(), FollowStatus::Pending);
        assert_eq!(follow.followers(), 10);

        let m = follow.toggle();
        assert_eq!(m.action(), "unfollow");
        assert_eq!(follow.status(), FollowStatus::None);
    }

    #[test]
    fn public_follow_is_accepted_and_counted() {
        let mut follow = FollowOverlay::from_profile(&profile(false, 10));
        follow.toggle();
        assert_eq!(follow.status(), FollowStatus::Accepted);
        assert_eq!(follow.followers(), 11);
        follow.toggle();
        assert_eq!(follow.followers(), 10);
    }

    #[test]
    fn refetch_overwrites_local_guess() {
        let mut overlays = PostOverlays::default();
        overlays.reconcile(&[post(5, false)]);
        overlays.toggle_like("p1");
        assert!(overlays.get("p1").unwrap().like.active());

        // server still reports not liked
        overlays.reconcile(&[post(5, false)]);
        assert!(!overlays.get("p1").unwrap().like.active());
        assert!(overlays.toggle_like("missing").is_none());
    }
}
