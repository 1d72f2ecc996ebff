use log::debug;
use uuid::Uuid;

use crate::common::models::Message;

/// Characters of a replied-to message shown in a quote
pub const REPLY_PREVIEW_CHARS: usize = 50;
/// Shown when a replied-to message is outside the loaded window
pub const UNRESOLVED_PREVIEW: &str = "...";

/// What the input box currently does. Reply and edit exclude each other.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ComposeMode {
    #[default]
    New,
    Reply { to: String },
    Edit { message_id: String },
}

/// What pressing send turns into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Send {
        content: String,
        reply_to_id: Option<String>,
    },
    Edit {
        message_id: String,
        content: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Composer {
    draft: String,
    mode: ComposeMode,
}

impl Composer {
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn mode(&self) -> &ComposeMode {
        &self.mode
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Quoting a message abandons any edit in progress, including its text
    pub fn start_reply(&mut self, message_id: &str) {
        if matches!(self.mode, ComposeMode::Edit { .. }) {
            self.draft.clear();
        }
        self.mode = ComposeMode::Reply {
            to: message_id.to_string(),
        };
    }

    /// Editing replaces any reply target and loads the message text
    pub fn start_edit(&mut self, message: &Message) {
        self.mode = ComposeMode::Edit {
            message_id: message.id.clone(),
        };
        self.draft = message.content.clone();
    }

    pub fn cancel(&mut self) {
        self.mode = ComposeMode::New;
        self.draft.clear();
    }

    /// The request the current draft stands for; blank drafts send nothing
    pub fn submission(&self) -> Option<Submission> {
        let content = self.draft.trim();
        if content.is_empty() {
            return None;
        }
        Some(match &self.mode {
            ComposeMode::New => Submission::Send {
                content: content.to_string(),
                reply_to_id: None,
            },
            ComposeMode::Reply { to } => Submission::Send {
                content: content.to_string(),
                reply_to_id: Some(to.clone()),
            },
            ComposeMode::Edit { message_id } => Submission::Edit {
                message_id: message_id.clone(),
                content: content.to_string(),
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// Request in flight
    Composed,
    /// Server acknowledged; waiting for the next fetch to include it
    Sent,
}

/// A message the viewer sent that the authoritative list has not caught up with
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub local_id: Uuid,
    pub server_id: Option<String>,
    pub content: String,
    pub reply_to_id: Option<String>,
    pub state: DeliveryState,
}

/// How a quoted message resolved against the loaded window
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplyRef<'a> {
    Resolved(&'a Message),
    Unresolved(&'a str),
}

impl ReplyRef<'_> {
    pub fn preview(&self) -> String {
        match self {
            ReplyRef::Resolved(message) => message.content.chars().take(REPLY_PREVIEW_CHARS).collect(),
            ReplyRef::Unresolved(_) => UNRESOLVED_PREVIEW.to_string(),
        }
    }
}

/// Client-side state of one direct conversation
#[derive(Debug, Clone)]
pub struct Conversation {
    viewer_id: String,
    partner_id: String,
    messages: Vec<Message>,
    outbox: Vec<OutgoingMessage>,
    composer: Composer,
    loaded: bool,
}

impl Conversation {
    pub fn new(viewer_id: impl Into<String>, partner_id: impl Into<String>) -> Self {
        Self {
            viewer_id: viewer_id.into(),
            partner_id: partner_id.into(),
            messages: Vec::new(),
            outbox: Vec::new(),
            composer: Composer::default(),
            loaded: false,
        }
    }

    pub fn partner_id(&self) -> &str {
        &self.partner_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    /// Replaces the window with a fresh fetch and settles acknowledged sends
    pub fn apply_fetch(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.loaded = true;
        let before = self.outbox.len();
        self.outbox.retain(|m| m.state == DeliveryState::Composed);
        if before != self.outbox.len() {
            debug!(
                "[CONVERSATION] {} sent message(s) settled by refresh",
                before - self.outbox.len()
            );
        }
    }

    pub fn enqueue(&mut self, content: &str, reply_to_id: Option<String>) -> Uuid {
        let local_id = Uuid::new_v4();
        self.outbox.push(OutgoingMessage {
            local_id,
            server_id: None,
            content: content.to_string(),
            reply_to_id,
            state: DeliveryState::Composed,
        });
        local_id
    }

    pub fn mark_sent(&mut self, local_id: Uuid, server_id: Option<String>) {
        let already_listed = server_id
            .as_deref()
            .is_some_and(|id| self.messages.iter().any(|m| m.id == id));
        if already_listed {
            self.outbox.retain(|m| m.local_id != local_id);
            return;
        }
        if let Some(entry) = self.outbox.iter_mut().find(|m| m.local_id == local_id) {
            entry.server_id = server_id;
            entry.state = DeliveryState::Sent;
        }
    }

    /// Forgets a send the server refused
    pub fn discard(&mut self, local_id: Uuid) {
        self.outbox.retain(|m| m.local_id != local_id);
    }

    pub fn pending(&self) -> &[OutgoingMessage] {
        &self.outbox
    }

    pub fn find(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    pub fn is_mine(&self, message: &Message) -> bool {
        message.sender_id == self.viewer_id
    }

    pub fn can_edit(&self, message: &Message) -> bool {
        self.is_mine(message)
    }

    /// Read receipts only decorate the viewer's own messages
    pub fn shows_read_receipt(&self, message: &Message) -> bool {
        self.is_mine(message) && message.is_read
    }

    /// The last pinned message of the loaded window
    pub fn pinned_banner(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_pinned)
    }

    pub fn resolve_reply<'a>(&'a self, message: &'a Message) -> Option<ReplyRef<'a>> {
        let target = message.reply_to_id.as_deref()?;
        Some(match self.find(target) {
            Some(found) => ReplyRef::Resolved(found),
            None => ReplyRef::Unresolved(target),
        })
    }

    /// Enters reply mode on a loaded message
    pub fn start_reply(&mut self, message_id: &str) -> bool {
        if self.find(message_id).is_none() {
            return false;
        }
        self.composer.start_reply(message_id);
        true
    }

    /// Enters edit mode; only the viewer's own messages qualify
    pub fn start_edit(&mut self, message_id: &str) -> bool {
        let Some(message) = self.find(message_id) else {
            return false;
        };
        if !self.can_edit(message) {
            return false;
        }
        let message = message.clone();
        self.composer.start_edit(&message);
        true
    }

    /// Banner above the input describing the active mode
    pub fn compose_banner(&self) -> Option<String> {
        match self.composer.mode() {
            ComposeMode::New => None,
            ComposeMode::Edit { .. } => Some("Editing message".to_string()),
            ComposeMode::Reply { to } => {
                let preview = match self.find(to) {
                    Some(m) => ReplyRef::Resolved(m).preview(),
                    None => ReplyRef::Unresolved(to).preview(),
                };
                Some(format!("Replying to: {}", preview))
            }
        }
    }
}
