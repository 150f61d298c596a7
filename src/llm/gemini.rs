//! Gemini API gateway
//!
//! Streams ViVeka's replies from the Google Gemini `streamGenerateContent`
//! endpoint over server-sent events, translating between the transcript's
//! `{sender, text}` messages and Gemini's `contents` format.
//!
//! ```ignore
//! let gateway = GeminiGateway::new("AIza...")
//!     .with_model("gemini-2.5-flash")
//!     .with_system_instruction(VIVEKA_SYSTEM_PROMPT);
//! ```

use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use super::provider::{AgentGateway, FragmentStream, SessionHandle};
use crate::config::GeminiConfig;
use crate::conversation::Message;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

// ============================================================================
// Gemini-specific request/response types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

// ============================================================================
// SSE parsing
// ============================================================================

/// Outcome of one SSE line
#[derive(Debug, PartialEq)]
enum SseLine {
    /// Not a data line, or a data line without usable content
    Skip,
    /// Visible text parts in arrival order
    Text(Vec<String>),
    /// Text parts plus the finish reason that ends the reply
    Finished(Vec<String>, String),
}

/// Extract reply text from one `data: {...}` SSE line.
///
/// Thought parts are dropped; ViVeka only shows the visible answer.
fn parse_sse_line(line: &str) -> SseLine {
    let Some(data) = line.strip_prefix("data: ") else {
        return SseLine::Skip;
    };
    if data.is_empty() {
        return SseLine::Skip;
    }

    let response: GeminiResponse = match serde_json::from_str(data) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("[Gemini] Failed to parse streaming chunk: {}", e);
            return SseLine::Skip;
        }
    };

    let mut texts = Vec::new();
    let mut finish = None;
    for candidate in response.candidates.unwrap_or_default() {
        if let Some(content) = candidate.content {
            texts.extend(
                content
                    .parts
                    .into_iter()
                    .filter(|p| p.thought != Some(true))
                    .filter_map(|p| p.text)
                    .filter(|t| !t.is_empty()),
            );
        }
        if candidate.finish_reason.is_some() {
            finish = candidate.finish_reason;
        }
    }

    match finish {
        Some(reason) => SseLine::Finished(texts, reason),
        None if texts.is_empty() => SseLine::Skip,
        None => SseLine::Text(texts),
    }
}

// ============================================================================
// GeminiGateway
// ============================================================================

/// Google Gemini agent gateway
pub struct GeminiGateway {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
    api_base: String,
    system_instruction: Option<String>,
}

impl GeminiGateway {
    /// Create a new gateway with a specific API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: "gemini-2.5-flash".to_string(),
            max_tokens: 8192,
            temperature: None,
            api_base: DEFAULT_API_BASE.to_string(),
            system_instruction: None,
        }
    }

    /// Create a gateway from loaded configuration
    pub fn from_config(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .context("GEMINI_API_KEY is not set; run with --offline to chat without it")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        tracing::info!("Using model: {}", config.model);
        tracing::info!("Max tokens: {}", config.max_tokens);

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            api_base: config.api_base.clone(),
            system_instruction: None,
        })
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL (proxies, local test servers)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the persona instruction sent with every request
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Convert transcript messages to Gemini contents
    ///
    /// Empty messages are dropped; the API rejects empty text parts.
    fn convert_messages(messages: &[Message]) -> Vec<GeminiContent> {
        let contents = messages
            .iter()
            .filter(|msg| !msg.text.trim().is_empty())
            .map(|msg| GeminiContent {
                role: msg.sender.gemini_role().to_string(),
                parts: vec![GeminiPart {
                    text: Some(msg.text.clone()),
                    ..Default::default()
                }],
            });

        // Gemini requires alternating user/model turns - merge consecutive same-role messages
        let mut merged: Vec<GeminiContent> = Vec::new();
        for content in contents {
            if let Some(last) = merged.last_mut() {
                if last.role == content.role {
                    last.parts.extend(content.parts);
                    continue;
                }
            }
            merged.push(content);
        }
        merged
    }

    fn build_request(&self, history: &[Message], text: &str) -> GeminiRequest {
        let mut messages = history.to_vec();
        messages.push(Message::user(text));

        GeminiRequest {
            contents: Self::convert_messages(&messages),
            system_instruction: self.system_instruction.as_ref().map(|s| GeminiSystemInstruction {
                parts: vec![GeminiPart {
                    text: Some(s.clone()),
                    ..Default::default()
                }],
            }),
            generation_config: Some(GeminiGenerationConfig {
                max_output_tokens: Some(self.max_tokens),
                temperature: self.temperature,
            }),
        }
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.api_base, self.model
        )
    }
}

#[async_trait::async_trait]
impl AgentGateway for GeminiGateway {
    async fn stream_reply(&self, handle: &SessionHandle, text: &str) -> Result<FragmentStream> {
        let history = handle.history().await;
        tracing::info!("[Gemini] Streaming reply (history: {} messages)", history.len());

        let request = self.build_request(&history, text);
        let request_json = serde_json::to_string(&request)
            .context("Failed to serialize Gemini streaming request")?;
        tracing::debug!("[Gemini] Streaming request JSON: {}", request_json);

        let response = self
            .client
            .post(self.stream_url())
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .body(request_json)
            .send()
            .await
            .context("Failed to send streaming request to Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            tracing::error!("[Gemini] Streaming API error: {} - {}", status, error_text);
            anyhow::bail!("Gemini API error ({}): {}", status, error_text);
        }

        tracing::info!("[Gemini] Streaming response started");

        let byte_stream = response.bytes_stream();
        let stream_reader = StreamReader::new(
            byte_stream.map(|result| result.map_err(|e| std::io::Error::other(e.to_string()))),
        );
        let buf_reader = tokio::io::BufReader::new(stream_reader);
        let handle = handle.clone();
        let user_text = text.to_string();

        let stream = async_stream::try_stream! {
            let mut lines = buf_reader.lines();
            let mut reply = String::new();
            let mut chunk_count: usize = 0;

            while let Some(line) = lines.next_line().await? {
                match parse_sse_line(&line) {
                    SseLine::Skip => continue,
                    SseLine::Text(texts) => {
                        chunk_count += 1;
                        for fragment in texts {
                            reply.push_str(&fragment);
                            yield fragment;
                        }
                    }
                    SseLine::Finished(texts, reason) => {
                        chunk_count += 1;
                        for fragment in texts {
                            reply.push_str(&fragment);
                            yield fragment;
                        }
                        tracing::debug!("[Gemini] Stream finished: {}", reason);
                        break;
                    }
                }
            }

            tracing::info!("[Gemini] Stream ended after {} chunks ({} chars)", chunk_count, reply.len());
            handle.record_exchange(&user_text, &reply).await;
        };

        Ok(Box::pin(stream))
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ScriptedGateway, ScriptedReply};

    #[test]
    fn test_convert_maps_roles_and_merges() {
        let messages = vec![
            Message::agent("Hai, Ana."),
            Message::agent("Kamu ingin bicara lebih dalam?"),
            Message::user("Aku sedih"),
        ];
        let contents = GeminiGateway::convert_messages(&messages);

        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].role, "model");
        assert_eq!(contents[0].parts.len(), 2);
        assert_eq!(contents[1].role, "user");
    }

    #[test]
    fn test_convert_drops_empty_messages() {
        let messages = vec![
            Message::agent("Hai, Ana."),
            Message::user("halo"),
            Message::agent(""),
            Message::user("lagi"),
        ];
        let contents = GeminiGateway::convert_messages(&messages);

        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1].role, "user");
        assert_eq!(contents[1].parts.len(), 2);
        assert!(contents
            .iter()
            .flat_map(|c| &c.parts)
            .all(|p| p.text.as_deref().is_some_and(|t| !t.is_empty())));
    }

    #[tokio::test]
    async fn test_empty_reply_keeps_next_request_valid() {
        let scripted = ScriptedGateway::with_replies([ScriptedReply::Fragments(vec![])]);
        let handle = scripted.create_session(&[Message::agent("Hai, Ana.")]);
        let fragments: Vec<_> = scripted
            .stream_reply(&handle, "halo")
            .await
            .unwrap()
            .collect()
            .await;
        assert!(fragments.is_empty());

        let gateway = GeminiGateway::new("key");
        let request = gateway.build_request(&handle.history().await, "lagi");
        let json = serde_json::to_value(&request).unwrap();
        let contents = json["contents"].as_array().unwrap();

        let empty_parts = contents
            .iter()
            .flat_map(|c| c["parts"].as_array().unwrap())
            .filter(|p| p["text"] == "")
            .count();
        assert_eq!(empty_parts, 0);
        assert_eq!(contents.last().unwrap()["role"], "user");
        assert_eq!(contents.last().unwrap()["parts"][0]["text"], "lagi");
    }

    #[test]
    fn test_request_appends_user_text_and_instruction() {
        let gateway = GeminiGateway::new("key").with_system_instruction("persona");
        let request = gateway.build_request(&[Message::agent("Hai")], "Aku sedih");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][1]["role"], "user");
        assert_eq!(json["contents"][1]["parts"][0]["text"], "Aku sedih");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "persona");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn test_stream_url() {
        let gateway = GeminiGateway::new("key")
            .with_model("gemini-2.5-flash")
            .with_api_base("http://localhost:8000/v1beta");
        assert_eq!(
            gateway.stream_url(),
            "http://localhost:8000/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_parse_text_chunk() {
        let line = r#"data: {"candidates":[{"content":{"role":"model","parts":[{"text":"Sepertinya "}]}}]}"#;
        assert_eq!(parse_sse_line(line), SseLine::Text(vec!["Sepertinya ".into()]));
    }

    #[test]
    fn test_parse_finished_chunk() {
        let line = r#"data: {"candidates":[{"content":{"role":"model","parts":[{"text":"sedih."}]},"finishReason":"STOP"}]}"#;
        assert_eq!(
            parse_sse_line(line),
            SseLine::Finished(vec!["sedih.".into()], "STOP".into())
        );
    }

    #[test]
    fn test_parse_skips_thoughts_and_noise() {
        let thought = r#"data: {"candidates":[{"content":{"role":"model","parts":[{"text":"hmm","thought":true}]}}]}"#;
        assert_eq!(parse_sse_line(thought), SseLine::Skip);
        assert_eq!(parse_sse_line(""), SseLine::Skip);
        assert_eq!(parse_sse_line(": keep-alive"), SseLine::Skip);
        assert_eq!(parse_sse_line("data: {broken"), SseLine::Skip);
    }
}
