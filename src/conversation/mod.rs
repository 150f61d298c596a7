//! Transcript model
//!
//! `Message` is one entry, `Transcript` the ordered list, and
//! `apply_fragment` the reducer the streaming reconciler drives.

pub mod media;
pub mod message;
pub mod transcript;

pub use media::{extract_youtube_id, youtube_embed_url};
pub use message::{Message, Sender};
pub use transcript::{apply_fragment, Transcript};
