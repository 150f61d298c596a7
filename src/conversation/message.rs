use serde::{Deserialize, Serialize};

/// Who wrote a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    /// Stored as `"bot"` so older payloads restore unchanged
    #[serde(rename = "bot", alias = "agent")]
    Agent,
}

impl Sender {
    /// Role name the Gemini API expects for this sender
    pub fn gemini_role(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Agent => "model",
        }
    }
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    /// Create a new user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    /// Create a new agent message
    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Agent,
            text: text.into(),
        }
    }

    pub fn is_agent(&self) -> bool {
        self.sender == Sender::Agent
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}
