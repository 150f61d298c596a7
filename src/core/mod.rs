//! Core types for the chat engine
//!
//! - `Readiness` - Whether the session accepts sends
//! - `ChatEvent` - Events streamed to front-ends
//! - `ChatError` - Error types

pub mod error;
pub mod output;
pub mod state;

pub use error::{ChatError, ChatResult};
pub use output::{create_event_channel, ChatEvent, EventReceiver, EventSender};
pub use state::Readiness;
