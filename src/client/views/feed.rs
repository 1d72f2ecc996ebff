use futures_util::future::join_all;
use log::debug;
use tokio::task::JoinHandle;

use crate::client::models::overlay::PostOverlays;
use crate::client::models::stories::{group_by_author, StoryGroup};
use crate::client::models::ui_state::or_empty;
use crate::client::services::gateway::{Ack, Gateway};
use crate::common::error::Result;
use crate::common::models::{Post, Story};

/// Posts per feed page
pub const FEED_PAGE_SIZE: usize = 20;

/// Home feed with its stories strip
pub struct FeedView {
    gateway: Gateway,
    posts: Vec<Post>,
    stories: Vec<Story>,
    overlays: PostOverlays,
    exhausted: bool,
}

impl FeedView {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            posts: Vec::new(),
            stories: Vec::new(),
            overlays: PostOverlays::default(),
            exhausted: false,
        }
    }

    /// Reloads from the top; failures show an empty feed
    pub async fn load(&mut self) {
        let (posts, stories) = tokio::join!(self.gateway.feed(0), self.gateway.stories());
        self.posts = or_empty("feed", posts);
        self.stories = or_empty("stories", stories);
        self.exhausted = self.posts.len() < FEED_PAGE_SIZE;
        self.overlays.clear();
        self.overlays.reconcile(&self.posts);
        self.record_views(0).await;
    }

    /// Appends the next page; returns how many posts arrived
    pub async fn load_more(&mut self) -> usize {
        if self.exhausted {
            return 0;
        }
        let page = or_empty("feed page", self.gateway.feed(self.posts.len()).await);
        let start = self.posts.len();
        self.exhausted = page.len() < FEED_PAGE_SIZE;
        self.overlays.reconcile(&page);
        self.posts.extend(page);
        self.record_views(start).await;
        self.posts.len() - start
    }

    /// View counts are best effort
    async fn record_views(&self, from: usize) {
        let views = self.posts[from..].iter().map(|p| self.gateway.view_post(&p.id));
        let failed = join_all(views).await.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            debug!("[FEED] {} view records failed", failed);
        }
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.iter().map(|p| self.overlays.project(p)).collect()
    }

    pub fn story_groups(&self) -> Vec<StoryGroup<'_>> {
        group_by_author(&self.stories)
    }

    pub fn toggle_like(&mut self, post_id: &str) -> Option<JoinHandle<Result<Ack>>> {
        let mutation = self.overlays.toggle_like(post_id)?;
        Some(self.gateway.fire(mutation))
    }

    pub fn toggle_repost(&mut self, post_id: &str) -> Option<JoinHandle<Result<Ack>>> {
        let mutation = self.overlays.toggle_repost(post_id)?;
        Some(self.gateway.fire(mutation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{post_json, FakeTransport};
    use serde_json::json;

    #[tokio::test]
    async fn load_records_a_view_per_post() {
        let fake = FakeTransport::new();
        fake.respond("feed", json!([post_json("p1", "bob", 1, false), post_json("p2", "amy", 0, false)]));
        fake.respond("stories", json!([]));
        let mut feed = FeedView::new(Gateway::new(fake.clone()));

        feed.load().await;

        assert_eq!(feed.posts().len(), 2);
        assert_eq!(fake.count("view_post"), 2);
        // short page means no more to load
        assert_eq!(feed.load_more().await, 0);
        assert_eq!(fake.count("feed"), 1);
    }

    #[tokio::test]
    async fn failing_feed_degrades_to_empty() {
        let fake = FakeTransport::new();
        fake.fail("feed", 500, json!({"error": "down"}));
        fake.fail("stories", 500, json!({"error": "down"}));
        let mut feed = FeedView::new(Gateway::new(fake.clone()));

        feed.load().await;

        assert!(feed.posts().is_empty());
        assert!(feed.story_groups().is_empty());
    }

    #[tokio::test]
    async fn like_is_visible_before_the_server_answers() {
        let fake = FakeTransport::new();
        fake.respond("feed", json!([post_json("p1", "bob", 4, false)]));
        fake.fail("like_post", 500, json!({"error": "down"}));
        let mut feed = FeedView::new(Gateway::new(fake.clone()));
        feed.load().await;

        let handle = feed.toggle_like("p1").unwrap();
        assert!(feed.posts()[0].liked);
        assert_eq!(feed.posts()[0].likes_count, 5);

        // failure is reported but not rolled back
        assert!(handle.await.unwrap().is_err());
        assert!(feed.posts()[0].liked);
        assert!(feed.toggle_like("unknown").is_none());
    }

    #[tokio::test]
    async fn full_page_allows_loading_more() {
        let fake = FakeTransport::new();
        let page: Vec<_> = (0..FEED_PAGE_SIZE)
            .map(|i| post_json(&format!("p{i}"), "bob", 0, false))
            .collect();
        fake.respond("feed", json!(page));
        let mut feed = FeedView::new(Gateway::new(fake.clone()));
        feed.load().await;

        fake.respond("feed", json!([post_json("late", "amy", 0, false)]));
        assert_eq!(feed.load_more().await, 1);
        assert_eq!(fake.calls().iter().filter(|c| c.action == "feed").last().unwrap().payload["offset"], "20");
    }
}
