use crate::client::models::ui_state::or_empty;
use crate::client::services::gateway::Gateway;
use crate::common::models::{ChatSummary, UserSnapshot};

/// Conversation list plus the people search used to start a new one
pub struct ChatsView {
    gateway: Gateway,
    chats: Vec<ChatSummary>,
}

impl ChatsView {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            chats: Vec::new(),
        }
    }

    pub async fn load(&mut self) {
        self.chats = or_empty("chats", self.gateway.chats().await);
    }

    pub fn chats(&self) -> &[ChatSummary] {
        &self.chats
    }

    pub fn total_unread(&self) -> u64 {
        self.chats.iter().map(|c| c.unread).sum()
    }

    /// Resolves a handle typed by the user to a chat partner id
    pub fn partner_by_username(&self, username: &str) -> Option<&ChatSummary> {
        let wanted = username.trim_start_matches('@');
        self.chats
            .iter()
            .find(|c| c.username.eq_ignore_ascii_case(wanted))
    }

    pub async fn search(&self, query: &str) -> Vec<UserSnapshot> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        or_empty("search", self.gateway.search(query).await)
    }
}
