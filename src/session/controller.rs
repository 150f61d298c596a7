//! Chat controller
//!
//! Owns the lifted chat state and exposes the operations a front-end needs.
//! The state sits behind a mutex that is only held between suspension
//! points, so a front-end can read snapshots, navigate, or try (and be
//! refused) another send while a reply streams in.

use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::lifecycle::SessionLifecycle;
use super::reconciler::reconcile_reply;
use super::state::{ChatSnapshot, ChatState};
use crate::conversation::Message;
use crate::core::{create_event_channel, ChatEvent, EventReceiver, EventSender, Readiness};
use crate::llm::AgentGateway;
use crate::persona::Locale;
use crate::store::KeyValueStore;

/// Why a send was dropped without touching the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Input was empty or whitespace
    EmptyInput,
    /// Another turn is still streaming
    Busy,
    /// No session is open (still checking or prompting)
    NotReady,
}

/// Result of `send_message`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing happened
    Ignored(IgnoreReason),
    /// The turn finished and was saved
    Completed {
        /// The reply is the apology for a failed gateway call
        fallback: bool,
    },
    /// A fresh start or resume replaced the session mid-turn
    Superseded,
}

impl SendOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SendOutcome::Completed { .. })
    }
}

struct Inner {
    state: Mutex<ChatState>,
    lifecycle: SessionLifecycle,
    gateway: Arc<dyn AgentGateway>,
    locale: Locale,
    events: EventSender,
}

/// Cloneable handle to one user's chat
#[derive(Clone)]
pub struct ChatController {
    inner: Arc<Inner>,
}

impl ChatController {
    /// Create a controller; call [`bootstrap`](Self::bootstrap) before sending
    pub fn new(
        gateway: Arc<dyn AgentGateway>,
        store: Arc<dyn KeyValueStore>,
        locale: Locale,
        display_name: impl Into<String>,
    ) -> Self {
        let lifecycle = SessionLifecycle::new(store, gateway.clone(), locale.clone(), display_name);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ChatState::default()),
                lifecycle,
                gateway,
                locale,
                events: create_event_channel(),
            }),
        }
    }

    /// Subscribe to chat events
    pub fn subscribe(&self) -> EventReceiver {
        self.inner.events.subscribe()
    }

    pub fn locale(&self) -> &Locale {
        &self.inner.locale
    }

    pub fn display_name(&self) -> &str {
        self.inner.lifecycle.display_name()
    }

    /// Copy of the current transcript, loading flag and readiness
    pub async fn snapshot(&self) -> ChatSnapshot {
        self.inner.state.lock().await.snapshot()
    }

    pub async fn readiness(&self) -> Readiness {
        self.inner.state.lock().await.readiness
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.state.lock().await.loading
    }

    /// Inspect the store and either start fresh or wait for a resume decision
    pub async fn bootstrap(&self) -> Readiness {
        let mut state = self.inner.state.lock().await;
        self.inner.lifecycle.bootstrap(&mut state);
        self.announce_replaced(&state)
    }

    /// Drop any history and greet the user again
    pub async fn start_fresh(&self) -> Readiness {
        let mut state = self.inner.state.lock().await;
        if state.loading {
            tracing::info!("Starting fresh while a reply streams; the old turn is dropped");
        }
        self.inner.lifecycle.start_fresh(&mut state);
        self.announce_replaced(&state)
    }

    /// Continue the stored conversation
    pub async fn resume(&self) -> Readiness {
        let mut state = self.inner.state.lock().await;
        self.inner.lifecycle.resume(&mut state);
        self.announce_replaced(&state)
    }

    fn announce_replaced(&self, state: &ChatState) -> Readiness {
        self.emit(ChatEvent::TranscriptReplaced {
            len: state.transcript.len(),
        });
        self.emit(ChatEvent::ReadinessChanged(state.readiness));
        state.readiness
    }

    /// Send a user message and stream the reply into the transcript
    ///
    /// Returns once the reply is complete. Empty input, a second send while
    /// one is in flight, and sends before the session is ready are ignored.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored(IgnoreReason::EmptyInput);
        }

        let handle = {
            let mut state = self.inner.state.lock().await;
            if !state.readiness.is_ready() {
                return SendOutcome::Ignored(IgnoreReason::NotReady);
            }
            if state.loading {
                tracing::debug!("Send ignored, a reply is still streaming");
                return SendOutcome::Ignored(IgnoreReason::Busy);
            }
            let Some(handle) = state.handle.clone() else {
                return SendOutcome::Ignored(IgnoreReason::NotReady);
            };

            let transcript = std::mem::take(&mut state.transcript);
            state.transcript = transcript.with_message(Message::user(text));
            state.loading = true;
            handle
        };

        tracing::info!("Turn started ({} chars)", text.len());
        self.emit(ChatEvent::TurnStarted {
            text: text.to_string(),
        });

        let updates = reconcile_reply(
            self.inner.gateway.clone(),
            handle.clone(),
            text.to_string(),
            self.inner.locale.apology.clone(),
        );
        futures::pin_mut!(updates);

        let mut fallback = false;
        while let Some(update) = updates.next().await {
            {
                let mut state = self.inner.state.lock().await;
                if !state.is_current(&handle) {
                    tracing::info!("Session replaced mid-turn, dropping the rest of the reply");
                    return SendOutcome::Superseded;
                }
                let transcript = std::mem::take(&mut state.transcript);
                state.transcript = update.apply(transcript);
            }
            fallback |= update.fallback;
            self.emit(ChatEvent::TextDelta(update.text));
        }

        let reply = {
            let mut state = self.inner.state.lock().await;
            if !state.is_current(&handle) {
                return SendOutcome::Superseded;
            }
            state.loading = false;
            self.inner.lifecycle.persist(&state);
            state
                .transcript
                .last()
                .map(|m| m.text.clone())
                .unwrap_or_default()
        };

        tracing::info!("Turn complete ({} chars, fallback: {})", reply.len(), fallback);
        self.emit(ChatEvent::TurnComplete {
            text: reply,
            fallback,
        });
        SendOutcome::Completed { fallback }
    }

    /// Append an agent message outside the chat flow and save it
    ///
    /// Refused (returns false) while a reply streams or before the session
    /// is ready, so it can never split a streaming message.
    pub async fn inject_message(&self, text: impl Into<String>) -> bool {
        let message = Message::agent(text);
        {
            let mut state = self.inner.state.lock().await;
            if state.loading || !state.readiness.is_ready() {
                return false;
            }
            let transcript = std::mem::take(&mut state.transcript);
            state.transcript = transcript.with_message(message.clone());
            self.inner.lifecycle.persist(&state);
        }
        self.emit(ChatEvent::MessageInjected(message));
        true
    }

    /// "Ask an expert": add the referral message
    pub async fn ask_expert(&self) -> bool {
        let referral = self.inner.locale.expert_referral.clone();
        self.inject_message(referral).await
    }

    /// "Education article": send the canned article request
    pub async fn request_article(&self) -> SendOutcome {
        let prompt = self.inner.locale.article_prompt.clone();
        self.send_message(&prompt).await
    }

    /// Publish an event; having no subscribers is fine
    pub(crate) fn emit(&self, event: ChatEvent) {
        let _ = self.inner.events.send(event);
    }
}
