use std::time::Duration;

use log::warn;
use tokio::sync::{mpsc, watch};

use crate::client::models::conversation::{Conversation, Submission};
use crate::client::services::gateway::Gateway;
use crate::client::services::poller::{ConversationPoller, PollEvent};
use crate::common::error::{ClientError, Result};

/// An open direct conversation.
///
/// Opening starts the poller; closing or dropping the view stops it.
pub struct ConversationView {
    gateway: Gateway,
    conversation: Conversation,
    poller: ConversationPoller,
    events: mpsc::UnboundedReceiver<PollEvent>,
    last_error: Option<String>,
    closed: bool,
}

impl ConversationView {
    pub fn open(
        gateway: Gateway,
        viewer_id: &str,
        partner_id: &str,
        interval: Duration,
        signed_in: watch::Receiver<bool>,
    ) -> Self {
        let (poller, events) = ConversationPoller::spawn(gateway.clone(), partner_id, interval, signed_in);
        Self {
            gateway,
            conversation: Conversation::new(viewer_id, partner_id),
            poller,
            events,
            last_error: None,
            closed: false,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    pub fn partner_id(&self) -> &str {
        self.conversation.partner_id()
    }

    /// Error of the last failed refresh, cleared by the next success
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Waits for the next poll result and applies it; `None` once closed
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        if self.closed {
            return None;
        }
        let event = self.events.recv().await?;
        if self.closed {
            return None;
        }
        self.apply(&event);
        Some(event)
    }

    fn apply(&mut self, event: &PollEvent) {
        match event {
            PollEvent::Refreshed(messages) => {
                self.conversation.apply_fetch(messages.clone());
                self.last_error = None;
            }
            PollEvent::FetchFailed(message) => self.last_error = Some(message.clone()),
        }
    }

    /// Sends or edits per the composer mode, then asks for a refresh
    pub async fn submit(&mut self) -> Result<bool> {
        let Some(submission) = self.conversation.composer().submission() else {
            return Ok(false);
        };
        match submission {
            Submission::Send { content, reply_to_id } => {
                let local_id = self.conversation.enqueue(&content, reply_to_id.clone());
                let sent = self
                    .gateway
                    .send_message(self.conversation.partner_id(), &content, reply_to_id.as_deref())
                    .await;
                match sent {
                    Ok(ack) => self.conversation.mark_sent(local_id, ack.id),
                    Err(e) => {
                        self.conversation.discard(local_id);
                        return Err(e);
                    }
                }
            }
            Submission::Edit { message_id, content } => {
                self.gateway.edit_message(&message_id, &content).await?;
            }
        }
        self.conversation.composer_mut().cancel();
        self.poller.refresh_now();
        Ok(true)
    }

    /// Flips the pin flag of a loaded message; the banner follows the refetch
    pub async fn toggle_pin(&mut self, message_id: &str) -> Result<()> {
        let pinned = self
            .conversation
            .find(message_id)
            .map(|m| m.is_pinned)
            .ok_or_else(|| ClientError::NotFound(format!("message {}", message_id)))?;
        self.gateway.pin_message(message_id, !pinned).await?;
        self.poller.refresh_now();
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        !self.closed && self.poller.is_running()
    }

    /// Stops polling and drops any result that already arrived
    pub fn close(&mut self) {
        self.closed = true;
        self.poller.stop();
        self.events.close();
        while self.events.try_recv().is_ok() {}
        if !self.conversation.pending().is_empty() {
            warn!(
                "[CONVERSATION] closing {} with {} unsettled message(s)",
                self.partner_id(),
                self.conversation.pending().len()
            );
        }
    }
}
