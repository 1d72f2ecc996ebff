use log::warn;

use crate::client::models::notifications::{project_all, unread_count, DisplayIntent};
use crate::client::models::ui_state::or_empty;
use crate::client::services::gateway::{Gateway, Mutation, Polarity, ToggleKind};
use crate::common::error::Result;
use crate::common::models::Notification;

/// Notification list. Loading it marks everything read.
pub struct NotificationsView {
    gateway: Gateway,
    items: Vec<Notification>,
}

impl NotificationsView {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            items: Vec::new(),
        }
    }

    /// Fetches the list, then acknowledges all of it in one call
    pub async fn load(&mut self) {
        match self.gateway.notifications().await {
            Ok(items) => {
                self.items = items;
                if let Err(e) = self.gateway.read_notifications().await {
                    warn!("[NOTIFICATIONS] mark all read failed: {}", e);
                }
            }
            Err(e) => self.items = or_empty("notifications", Err(e)),
        }
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn intents(&self) -> Vec<DisplayIntent<'_>> {
        project_all(&self.items)
    }

    /// Unread count as delivered, before this visit acknowledged them
    pub fn unread(&self) -> usize {
        unread_count(&self.items)
    }

    pub async fn accept(&mut self, from_user_id: &str) -> Result<()> {
        self.answer_request(from_user_id, Polarity::Apply).await
    }

    pub async fn reject(&mut self, from_user_id: &str) -> Result<()> {
        self.answer_request(from_user_id, Polarity::Revert).await
    }

    /// The request disappears from the list only through the refetch
    async fn answer_request(&mut self, from_user_id: &str, polarity: Polarity) -> Result<()> {
        let mutation = Mutation::new(ToggleKind::FollowRequest, from_user_id, polarity);
        let result = self.gateway.dispatch(&mutation).await;
        self.load().await;
        result.map(|_| ())
    }
}
