//! The ordered transcript and the reducer that grows it while streaming
//!
//! A transcript is replaced rather than mutated through shared references:
//! every transition takes the transcript by value and hands back the next
//! one. Ownership keeps that O(1) amortized per fragment since the vector and
//! the last message's buffer are reused.

use serde::{Deserialize, Serialize};

use super::message::Message;
use crate::core::ChatResult;

/// Ordered sequence of messages, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcript holding only the greeting
    pub fn seeded(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::agent(greeting)],
        }
    }

    /// Return the transcript with `message` appended
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Whether there is anything beyond the seed greeting worth resuming
    pub fn has_history(&self) -> bool {
        self.messages.len() > 1
    }

    /// Serialize to the persisted payload (JSON array of `{sender, text}`)
    pub fn to_json(&self) -> ChatResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a persisted payload
    pub fn from_json(json: &str) -> ChatResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Merge one streamed fragment into the transcript
///
/// The first fragment of a turn opens a new agent message; later fragments
/// extend that same message. A continuation that finds no agent message at
/// the end opens one rather than dropping text.
pub fn apply_fragment(mut transcript: Transcript, fragment: &str, is_first: bool) -> Transcript {
    if !is_first {
        if let Some(last) = transcript.messages.last_mut() {
            if last.is_agent() {
                last.text.push_str(fragment);
                return transcript;
            }
        }
        tracing::debug!("Continuation fragment without an agent message, opening one");
    }
    transcript.with_message(Message::agent(fragment))
}
