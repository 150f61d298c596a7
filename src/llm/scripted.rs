//! Scripted agent gateway
//!
//! Replays queued replies instead of calling a remote model. Used for the
//! offline mode of the terminal app and as the gateway in tests.

use anyhow::Result;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::provider::{AgentGateway, FragmentStream, SessionHandle};

/// Reply used once the script runs out
const DEFAULT_REPLY: &str =
    "Terima kasih sudah bercerita. Bolehkah ViVeka tahu apa yang sedang kamu rasakan saat ini?";

/// One scripted reply
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Stream these fragments, then complete
    Fragments(Vec<String>),
    /// Reject the request before streaming anything
    Reject(String),
    /// Stream these fragments, then break with an error
    FailAfter(Vec<String>, String),
}

impl ScriptedReply {
    pub fn fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedReply::Fragments(fragments.into_iter().map(Into::into).collect())
    }
}

/// Gateway that replays a script
#[derive(Clone)]
pub struct ScriptedGateway {
    script: Arc<Mutex<VecDeque<ScriptedReply>>>,
    sent: Arc<Mutex<Vec<String>>>,
    fragment_delay: Option<Duration>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            fragment_delay: None,
        }
    }

    /// Queue replies in order
    pub fn with_replies(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        let gateway = Self::new();
        for reply in replies {
            gateway.push(reply);
        }
        gateway
    }

    /// Sleep between fragments to mimic network pacing
    pub fn with_fragment_delay(mut self, delay: Duration) -> Self {
        self.fragment_delay = Some(delay);
        self
    }

    pub fn push(&self, reply: ScriptedReply) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
    }

    /// Texts received so far, in order
    pub fn sent_messages(&self) -> Vec<String> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn next_reply(&self) -> ScriptedReply {
        self.script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_else(|| {
                let words: Vec<String> = DEFAULT_REPLY
                    .split_inclusive(' ')
                    .map(str::to_string)
                    .collect();
                ScriptedReply::Fragments(words)
            })
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AgentGateway for ScriptedGateway {
    async fn stream_reply(&self, handle: &SessionHandle, text: &str) -> Result<FragmentStream> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(text.to_string());
        }

        let (fragments, failure) = match self.next_reply() {
            ScriptedReply::Reject(reason) => {
                tracing::debug!("[Scripted] Rejecting request: {}", reason);
                anyhow::bail!(reason);
            }
            ScriptedReply::Fragments(fragments) => (fragments, None),
            ScriptedReply::FailAfter(fragments, reason) => (fragments, Some(reason)),
        };

        let delay = self.fragment_delay;
        let handle = handle.clone();
        let user_text = text.to_string();

        let stream = async_stream::try_stream! {
            let mut reply = String::new();
            for fragment in fragments {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                reply.push_str(&fragment);
                yield fragment;
            }
            if let Some(reason) = failure {
                Err(anyhow::anyhow!(reason))?;
            }
            handle.record_exchange(&user_text, &reply).await;
        };

        Ok(Box::pin(stream))
    }

    fn model(&self) -> String {
        "scripted".to_string()
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Message;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_replays_fragments_and_records_history() {
        let gateway = ScriptedGateway::with_replies([ScriptedReply::fragments(["a", "b"])]);
        let handle = gateway.create_session(&[Message::agent("Hai")]);

        let stream = gateway.stream_reply(&handle, "halo").await.unwrap();
        let fragments: Vec<String> = stream.map(|r| r.unwrap()).collect().await;

        assert_eq!(fragments, vec!["a", "b"]);
        assert_eq!(gateway.sent_messages(), vec!["halo"]);
        assert_eq!(handle.history().await.len(), 3);
    }

    #[tokio::test]
    async fn test_reject_fails_before_streaming() {
        let gateway = ScriptedGateway::with_replies([ScriptedReply::Reject("offline".into())]);
        let handle = gateway.create_session(&[]);
        assert!(gateway.stream_reply(&handle, "x").await.is_err());
    }

    #[tokio::test]
    async fn test_fail_after_breaks_mid_stream() {
        let gateway = ScriptedGateway::with_replies([ScriptedReply::FailAfter(
            vec!["part".into()],
            "reset".into(),
        )]);
        let handle = gateway.create_session(&[]);

        let items: Vec<Result<String>> = gateway
            .stream_reply(&handle, "x")
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "part");
        assert!(items[1].is_err());
        assert!(handle.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_default_reply_when_script_empty() {
        let gateway = ScriptedGateway::new();
        let handle = gateway.create_session(&[]);
        let text: String = gateway
            .stream_reply(&handle, "x")
            .await
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(text, DEFAULT_REPLY);
    }
}
