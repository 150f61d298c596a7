//! Lifted chat state

use serde::Serialize;

use crate::conversation::Transcript;
use crate::core::Readiness;
use crate::llm::SessionHandle;

/// Everything the chat view renders, plus the live session handle
#[derive(Debug, Default)]
pub struct ChatState {
    pub transcript: Transcript,
    /// True from an accepted send until its reply stream ends
    pub loading: bool,
    pub readiness: Readiness,
    /// The only handle sends may use; replaced on fresh start and resume
    pub handle: Option<SessionHandle>,
}

impl ChatState {
    /// Whether `handle` is still the live session
    pub fn is_current(&self, handle: &SessionHandle) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|live| live.same_session(handle))
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            transcript: self.transcript.clone(),
            loading: self.loading,
            readiness: self.readiness,
        }
    }
}

/// Read-only copy of the chat state for renderers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSnapshot {
    pub transcript: Transcript,
    pub loading: bool,
    pub readiness: Readiness,
}

impl ChatSnapshot {
    /// Whether the "thinking" indicator should show (waiting on the first fragment)
    pub fn awaiting_first_fragment(&self) -> bool {
        self.loading && self.transcript.last().is_some_and(|m| m.is_user())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Message;

    #[test]
    fn test_is_current_tracks_handle() {
        let handle = SessionHandle::new(vec![]);
        let mut state = ChatState::default();
        assert!(!state.is_current(&handle));

        state.handle = Some(handle.clone());
        assert!(state.is_current(&handle));

        state.handle = Some(SessionHandle::new(vec![]));
        assert!(!state.is_current(&handle));
    }

    #[test]
    fn test_thinking_indicator() {
        let mut state = ChatState {
            transcript: Transcript::seeded("Hai").with_message(Message::user("x")),
            loading: true,
            ..Default::default()
        };
        assert!(state.snapshot().awaiting_first_fragment());

        state.transcript = state.transcript.clone().with_message(Message::agent("y"));
        assert!(!state.snapshot().awaiting_first_fragment());
    }
}
