//! Streaming reconciler
//!
//! Normalizes whatever the gateway does for one outgoing message into a
//! sequence of [`FragmentUpdate`]s that always describes exactly one agent
//! message:
//!
//! - fragments pass through in arrival order, the first flagged `is_first`
//! - a stream that ends without fragments yields one empty fragment
//! - a rejected request, or a stream that breaks, yields the apology once
//!   and ends
//!
//! Folding the updates through [`apply_fragment`] is then all a caller
//! needs to keep the transcript well formed.

use futures::stream::Stream;
use futures::StreamExt;
use std::sync::Arc;

use crate::conversation::{apply_fragment, Message, Transcript};
use crate::llm::{AgentGateway, SessionHandle};

/// One transcript mutation for the in-flight turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentUpdate {
    pub text: String,
    /// Opens the agent message instead of extending it
    pub is_first: bool,
    /// This is the apology standing in for a failed reply
    pub fallback: bool,
}

impl FragmentUpdate {
    /// Fold this update into `transcript`
    pub fn apply(&self, transcript: Transcript) -> Transcript {
        apply_fragment(transcript, &self.text, self.is_first)
    }
}

/// Stream the reconciled updates for `user_text` on `handle`
pub fn reconcile_reply(
    gateway: Arc<dyn AgentGateway>,
    handle: SessionHandle,
    user_text: String,
    apology: String,
) -> impl Stream<Item = FragmentUpdate> + Send {
    async_stream::stream! {
        let mut is_first = true;

        let failure = match gateway.stream_reply(&handle, &user_text).await {
            Ok(mut fragments) => {
                let mut failure = None;
                while let Some(item) = fragments.next().await {
                    match item {
                        Ok(text) => {
                            tracing::debug!("Fragment ({} chars)", text.len());
                            yield FragmentUpdate { text, is_first, fallback: false };
                            is_first = false;
                        }
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
                failure
            }
            Err(e) => Some(e),
        };

        match failure {
            Some(e) => {
                tracing::error!(
                    "Error streaming reply from {}: {:#}",
                    gateway.provider_name(),
                    e
                );
                yield FragmentUpdate { text: apology, is_first, fallback: true };
            }
            None if is_first => {
                tracing::debug!("Reply stream ended without fragments");
                yield FragmentUpdate { text: String::new(), is_first: true, fallback: false };
            }
            None => {}
        }
    }
}

/// Run one whole turn against an owned transcript
///
/// Appends the trimmed user message and the reconciled agent reply.
/// Whitespace-only input returns the transcript unchanged. This is the
/// lock-free form of a turn; `ChatController::send_message` drives the same
/// [`reconcile_reply`] stream and [`FragmentUpdate::apply`] step, but over
/// shared state it re-checks between fragments.
pub async fn send_turn(
    gateway: Arc<dyn AgentGateway>,
    handle: &SessionHandle,
    user_text: &str,
    transcript: Transcript,
    apology: &str,
) -> Transcript {
    let text = user_text.trim();
    if text.is_empty() {
        return transcript;
    }

    let transcript = transcript.with_message(Message::user(text));
    reconcile_reply(gateway, handle.clone(), text.to_string(), apology.to_string())
        .fold(transcript, |t, update| async move { update.apply(t) })
        .await
}
