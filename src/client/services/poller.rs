use std::time::Duration;

use log::{debug, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::client::services::gateway::Gateway;
use crate::common::models::Message;

/// Default refresh period of an open conversation
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// Authoritative replacement of the conversation window
    Refreshed(Vec<Message>),
    /// A tick failed; the previous window stays on screen
    FetchFailed(String),
}

/// Background refresh of one open conversation.
///
/// Fetches immediately, then once per interval. A tick never overlaps the
/// previous one because the fetch is awaited inside the loop. After every
/// successful fetch the partner's messages are marked read. Stopping (or
/// dropping) the poller cancels any fetch in flight, so no event is
/// delivered after the view is gone.
pub struct ConversationPoller {
    partner_id: String,
    cancel: watch::Sender<bool>,
    refresh: mpsc::UnboundedSender<()>,
    handle: JoinHandle<()>,
}

impl ConversationPoller {
    /// `signed_in` stops the loop when the session ends
    pub fn spawn(
        gateway: Gateway,
        partner_id: &str,
        interval: Duration,
        signed_in: watch::Receiver<bool>,
    ) -> (Self, mpsc::UnboundedReceiver<PollEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(run_loop(
            gateway,
            partner_id.to_string(),
            interval,
            events_tx,
            cancel_rx,
            refresh_rx,
            signed_in,
        ));
        debug!("[POLLER] started for {}", partner_id);

        (
            Self {
                partner_id: partner_id.to_string(),
                cancel: cancel_tx,
                refresh: refresh_tx,
                handle,
            },
            events_rx,
        )
    }

    pub fn partner_id(&self) -> &str {
        &self.partner_id
    }

    /// Runs a fetch now instead of waiting for the next tick
    pub fn refresh_now(&self) {
        let _ = self.refresh.send(());
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(&self) {
        let _ = self.cancel.send(true);
        self.handle.abort();
    }
}

impl Drop for ConversationPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_loop(
    gateway: Gateway,
    partner_id: String,
    interval: Duration,
    events: mpsc::UnboundedSender<PollEvent>,
    mut cancel: watch::Receiver<bool>,
    mut refresh: mpsc::UnboundedReceiver<()>,
    mut signed_in: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.changed() => break,
            changed = signed_in.changed() => {
                if changed.is_err() || !*signed_in.borrow() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
            Some(()) = refresh.recv() => ticker.reset(),
        }

        let fetched = tokio::select! {
            biased;
            _ = cancel.changed() => break,
            result = gateway.conversation(&partner_id) => result,
        };

        match fetched {
            Ok(messages) => {
                if events.send(PollEvent::Refreshed(messages)).is_err() {
                    break;
                }
                if let Err(e) = gateway.mark_read(&partner_id).await {
                    warn!("[POLLER] mark_read for {} failed: {}", partner_id, e);
                }
            }
            Err(e) => {
                warn!("[POLLER] refresh of {} failed: {}", partner_id, e);
                if events.send(PollEvent::FetchFailed(e.to_string())).is_err() {
                    break;
                }
            }
        }
    }
    debug!("[POLLER] stopped for {}", partner_id);
}
