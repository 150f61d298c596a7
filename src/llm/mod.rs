pub mod gemini;
pub mod provider;
pub mod scripted;

pub use gemini::GeminiGateway;
pub use provider::{AgentGateway, FragmentStream, SessionHandle};
pub use scripted::{ScriptedGateway, ScriptedReply};
