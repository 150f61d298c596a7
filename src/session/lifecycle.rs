//! Session lifecycle: bootstrap, start fresh, resume, persist
//!
//! The lifecycle decides which transcript is live and opens the matching
//! session handle. It never surfaces store failures: a transcript that
//! cannot be read is treated as absent, and a failed write only costs
//! durability for that save point.

use std::sync::Arc;

use super::state::ChatState;
use crate::conversation::Transcript;
use crate::core::Readiness;
use crate::llm::AgentGateway;
use crate::persona::Locale;
use crate::store::{KeyValueStore, TRANSCRIPT_KEY};

/// Owns the store and gateway used to (re)establish sessions
pub struct SessionLifecycle {
    store: Arc<dyn KeyValueStore>,
    gateway: Arc<dyn AgentGateway>,
    locale: Locale,
    display_name: String,
}

impl SessionLifecycle {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        gateway: Arc<dyn AgentGateway>,
        locale: Locale,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            gateway,
            locale,
            display_name: display_name.into(),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Read the persisted transcript, `None` if absent or unreadable
    pub fn load_stored(&self) -> Option<Transcript> {
        let payload = match self.store.get(TRANSCRIPT_KEY) {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read chat history, starting new chat: {}", e);
                return None;
            }
        };

        match Transcript::from_json(&payload) {
            Ok(transcript) => Some(transcript),
            Err(e) => {
                tracing::warn!("Failed to parse chat history, starting new chat: {}", e);
                None
            }
        }
    }

    /// Inspect the store once, on mount
    ///
    /// A transcript with more than the greeting is shown and readiness
    /// moves to `Prompting`; anything else starts fresh.
    pub fn bootstrap(&self, state: &mut ChatState) {
        state.readiness = Readiness::Checking;

        match self.load_stored() {
            Some(stored) if stored.has_history() => {
                tracing::info!("Found {} stored messages, asking to resume", stored.len());
                state.transcript = stored;
                state.handle = None;
                state.loading = false;
                state.readiness = Readiness::Prompting;
            }
            _ => self.start_fresh(state),
        }
    }

    /// Discard any history and open a session seeded with the greeting
    pub fn start_fresh(&self, state: &mut ChatState) {
        if let Err(e) = self.store.remove(TRANSCRIPT_KEY) {
            tracing::warn!("Failed to clear stored chat history: {}", e);
        }

        let transcript = Transcript::seeded(self.locale.greeting_for(&self.display_name));
        state.handle = Some(self.gateway.create_session(transcript.messages()));
        state.transcript = transcript;
        state.loading = false;
        state.readiness = Readiness::Ready;

        tracing::info!("Started fresh chat for {}", self.display_name);
        self.persist(state);
    }

    /// Reopen the stored conversation, or start fresh if there is nothing
    /// beyond the greeting to reopen
    pub fn resume(&self, state: &mut ChatState) {
        match self.load_stored() {
            Some(stored) if stored.has_history() => {
                state.handle = Some(self.gateway.create_session(stored.messages()));
                tracing::info!("Resumed chat with {} messages", stored.len());
                state.transcript = stored;
                state.loading = false;
                state.readiness = Readiness::Ready;
                self.persist(state);
            }
            _ => self.start_fresh(state),
        }
    }

    /// Write the transcript if this is a save point
    ///
    /// Save points require a ready session that is not streaming and a
    /// non-empty transcript. Returns whether a write happened.
    pub fn persist(&self, state: &ChatState) -> bool {
        if !state.readiness.is_ready() || state.loading || state.transcript.is_empty() {
            return false;
        }

        let written = state
            .transcript
            .to_json()
            .and_then(|payload| self.store.set(TRANSCRIPT_KEY, &payload));

        match written {
            Ok(()) => {
                tracing::debug!("Saved {} messages", state.transcript.len());
                true
            }
            Err(e) => {
                tracing::warn!("Failed to save chat history: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Message;
    use crate::core::{ChatError, ChatResult};
    use crate::llm::ScriptedGateway;
    use crate::store::MemoryStore;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> ChatResult<Option<String>> {
            Err(ChatError::store("unavailable"))
        }
        fn set(&self, _key: &str, _value: &str) -> ChatResult<()> {
            Err(ChatError::store("read-only"))
        }
        fn remove(&self, _key: &str) -> ChatResult<()> {
            Err(ChatError::store("read-only"))
        }
    }

    fn lifecycle_with(store: Arc<dyn KeyValueStore>) -> SessionLifecycle {
        SessionLifecycle::new(store, Arc::new(ScriptedGateway::new()), Locale::default(), "Ana")
    }

    fn stored(store: &MemoryStore) -> Option<Transcript> {
        store
            .get(TRANSCRIPT_KEY)
            .unwrap()
            .map(|s| Transcript::from_json(&s).unwrap())
    }

    fn five_messages() -> Transcript {
        Transcript::seeded("Hai, Ana.")
            .with_message(Message::user("a"))
            .with_message(Message::agent("b"))
            .with_message(Message::user("c"))
            .with_message(Message::agent("d"))
    }

    #[test]
    fn test_bootstrap_empty_store_starts_fresh() {
        let store = MemoryStore::new();
        let lifecycle = lifecycle_with(Arc::new(store.clone()));
        let mut state = ChatState::default();

        lifecycle.bootstrap(&mut state);

        assert_eq!(state.readiness, Readiness::Ready);
        assert_eq!(state.transcript.len(), 1);
        assert!(state.transcript.messages()[0].text.starts_with("Hai, Ana."));
        assert!(state.handle.is_some());
        assert_eq!(stored(&store).unwrap().len(), 1);
    }

    #[test]
    fn test_bootstrap_with_history_prompts() {
        let store = MemoryStore::with_value(TRANSCRIPT_KEY, five_messages().to_json().unwrap());
        let lifecycle = lifecycle_with(Arc::new(store));
        let mut state = ChatState::default();

        lifecycle.bootstrap(&mut state);

        assert_eq!(state.readiness, Readiness::Prompting);
        assert_eq!(state.transcript.len(), 5);
        assert!(state.handle.is_none());
    }

    #[test]
    fn test_bootstrap_seed_only_starts_fresh() {
        let store = MemoryStore::with_value(
            TRANSCRIPT_KEY,
            Transcript::seeded("Hai, Budi.").to_json().unwrap(),
        );
        let lifecycle = lifecycle_with(Arc::new(store));
        let mut state = ChatState::default();

        lifecycle.bootstrap(&mut state);

        assert_eq!(state.readiness, Readiness::Ready);
        assert_eq!(state.transcript.len(), 1);
        assert!(state.transcript.messages()[0].text.starts_with("Hai, Ana."));
    }

    #[test]
    fn test_bootstrap_malformed_payload_starts_fresh() {
        let store = MemoryStore::with_value(TRANSCRIPT_KEY, "{oops");
        let lifecycle = lifecycle_with(Arc::new(store.clone()));
        let mut state = ChatState::default();

        lifecycle.bootstrap(&mut state);

        assert_eq!(state.readiness, Readiness::Ready);
        assert_eq!(stored(&store).unwrap().len(), 1);
    }

    #[test]
    fn test_start_fresh_from_prompting_discards_history() {
        let store = MemoryStore::with_value(TRANSCRIPT_KEY, five_messages().to_json().unwrap());
        let lifecycle = lifecycle_with(Arc::new(store.clone()));
        let mut state = ChatState::default();
        lifecycle.bootstrap(&mut state);

        lifecycle.start_fresh(&mut state);

        assert_eq!(state.readiness, Readiness::Ready);
        assert_eq!(state.transcript.len(), 1);
        assert_eq!(stored(&store).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resume_keeps_history_and_seeds_handle() {
        let store = MemoryStore::with_value(TRANSCRIPT_KEY, five_messages().to_json().unwrap());
        let lifecycle = lifecycle_with(Arc::new(store));
        let mut state = ChatState::default();
        lifecycle.bootstrap(&mut state);

        lifecycle.resume(&mut state);

        assert_eq!(state.readiness, Readiness::Ready);
        assert_eq!(state.transcript, five_messages());
        let handle = state.handle.as_ref().unwrap();
        assert_eq!(handle.history().await, five_messages().into_messages());
    }

    #[test]
    fn test_resume_seed_only_matches_fresh_start() {
        let seed_store = MemoryStore::with_value(
            TRANSCRIPT_KEY,
            Transcript::seeded("Hai, Ana. lama").to_json().unwrap(),
        );
        let resumed = {
            let lifecycle = lifecycle_with(Arc::new(seed_store));
            let mut state = ChatState::default();
            lifecycle.resume(&mut state);
            state
        };
        let fresh = {
            let lifecycle = lifecycle_with(Arc::new(MemoryStore::new()));
            let mut state = ChatState::default();
            lifecycle.start_fresh(&mut state);
            state
        };

        assert_eq!(resumed.transcript, fresh.transcript);
        assert_eq!(resumed.readiness, fresh.readiness);
    }

    #[test]
    fn test_resume_unreadable_store_starts_fresh() {
        let store = MemoryStore::with_value(TRANSCRIPT_KEY, "[{\"sender\":");
        let lifecycle = lifecycle_with(Arc::new(store));
        let mut state = ChatState::default();

        lifecycle.resume(&mut state);

        assert_eq!(state.readiness, Readiness::Ready);
        assert_eq!(state.transcript.len(), 1);
    }

    #[test]
    fn test_broken_store_is_never_fatal() {
        let lifecycle = lifecycle_with(Arc::new(BrokenStore));
        let mut state = ChatState::default();

        lifecycle.bootstrap(&mut state);

        assert_eq!(state.readiness, Readiness::Ready);
        assert_eq!(state.transcript.len(), 1);
        assert!(!lifecycle.persist(&state));
    }

    #[test]
    fn test_no_persist_while_loading_or_not_ready() {
        let store = MemoryStore::new();
        let lifecycle = lifecycle_with(Arc::new(store.clone()));
        let mut state = ChatState::default();
        state.transcript = Transcript::seeded("x");

        assert!(!lifecycle.persist(&state));

        state.readiness = Readiness::Ready;
        state.loading = true;
        assert!(!lifecycle.persist(&state));

        state.loading = false;
        assert!(lifecycle.persist(&state));
        assert_eq!(stored(&store).unwrap().len(), 1);
    }
}
