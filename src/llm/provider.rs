//! Agent gateway trait
//!
//! Abstracts the remote conversational agent so the chat engine can run
//! against Gemini, a scripted offline agent, or a test double.

use anyhow::Result;
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::conversation::Message;

/// Finite, non-restartable sequence of reply fragments for one message.
///
/// Dropping the stream cancels the underlying request.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Conversational context bound to a transcript snapshot
///
/// Holds the history the remote agent remembers. Clones share that history;
/// two handles opened separately never compare equal.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    history: Arc<Mutex<Vec<Message>>>,
}

impl SessionHandle {
    /// Open a handle seeded with prior messages
    pub fn new(prior: Vec<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            history: Arc::new(Mutex::new(prior)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Snapshot of what the remote agent remembers
    pub async fn history(&self) -> Vec<Message> {
        self.history.lock().await.clone()
    }

    /// Record a completed exchange in the agent's memory
    ///
    /// An empty reply (e.g. a blocked answer) leaves the memory untouched,
    /// so the exchange is not replayed as an empty model turn.
    pub async fn record_exchange(&self, user_text: &str, reply: &str) {
        if reply.trim().is_empty() {
            tracing::debug!("Empty reply, exchange not recorded");
            return;
        }
        let mut history = self.history.lock().await;
        history.push(Message::user(user_text));
        history.push(Message::agent(reply));
    }

    /// Whether `other` refers to this same session
    pub fn same_session(&self, other: &SessionHandle) -> bool {
        self.id == other.id
    }
}

/// Trait for remote agents the chat engine can talk to.
#[async_trait::async_trait]
pub trait AgentGateway: Send + Sync {
    /// Open a session whose memory starts with `prior`.
    fn create_session(&self, prior: &[Message]) -> SessionHandle {
        SessionHandle::new(prior.to_vec())
    }

    /// Send `text` on `handle` and stream the reply fragments.
    ///
    /// An `Err` here means the request was rejected before any fragment;
    /// an `Err` item inside the stream means it broke mid-reply. The stream
    /// may also end without yielding anything.
    async fn stream_reply(&self, handle: &SessionHandle, text: &str) -> Result<FragmentStream>;

    /// Get the current model name.
    fn model(&self) -> String;

    /// Get the provider name (e.g., "gemini", "scripted").
    fn provider_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handle_records_exchanges() {
        let handle = SessionHandle::new(vec![Message::agent("Hai")]);
        handle.record_exchange("Aku sedih", "Sepertinya kamu sedih.").await;

        let history = handle.history().await;
        assert_eq!(history.len(), 3);
        assert_eq!(history[1], Message::user("Aku sedih"));
        assert_eq!(history[2], Message::agent("Sepertinya kamu sedih."));
    }

    #[tokio::test]
    async fn test_empty_reply_not_recorded() {
        let handle = SessionHandle::new(vec![Message::agent("Hai")]);
        handle.record_exchange("halo", "").await;
        handle.record_exchange("halo", "  \n").await;

        assert_eq!(handle.history().await, vec![Message::agent("Hai")]);
    }

    #[test]
    fn test_handles_are_distinct() {
        let a = SessionHandle::new(vec![]);
        let b = SessionHandle::new(vec![]);
        assert!(a.same_session(&a.clone()));
        assert!(!a.same_session(&b));
    }
}
