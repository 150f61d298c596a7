//! Events published by the chat engine
//!
//! Front-ends subscribe to a broadcast channel of [`ChatEvent`]s instead of
//! polling the transcript. Every subscriber sees the same sequence.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::state::Readiness;
use crate::conversation::Message;

/// Default buffer size for the event broadcast channel
pub const EVENT_CHANNEL_SIZE: usize = 256;

/// Sender half of the event channel (owned by the chat controller)
pub type EventSender = broadcast::Sender<ChatEvent>;

/// Receiver half of the event channel (used by renderers)
pub type EventReceiver = broadcast::Receiver<ChatEvent>;

/// Events streamed FROM the chat engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatEvent {
    /// Readiness moved to a new state
    ReadinessChanged(Readiness),

    /// The whole transcript was replaced (fresh start, resume, bootstrap)
    TranscriptReplaced {
        /// Number of messages in the new transcript
        len: usize,
    },

    /// A user message was accepted and a turn began
    TurnStarted {
        /// Trimmed user text
        text: String,
    },

    /// Incremental agent text
    TextDelta(String),

    /// The agent reply for the current turn is complete
    TurnComplete {
        /// Full text of the agent message
        text: String,
        /// Whether the apology fallback was used
        fallback: bool,
    },

    /// A message was added outside the chat flow
    MessageInjected(Message),

    /// A reply finished while the chat view was not active
    UnreadReply,
}

impl ChatEvent {
    /// Create a text delta event
    pub fn text(text: impl Into<String>) -> Self {
        ChatEvent::TextDelta(text.into())
    }

    /// Check if this event ends a turn
    pub fn is_turn_end(&self) -> bool {
        matches!(self, ChatEvent::TurnComplete { .. })
    }
}

/// Create a new event broadcast channel
///
/// Returns the sender. Receivers are created by calling `sender.subscribe()`.
pub fn create_event_channel() -> EventSender {
    let (tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
    tx
}
