//! Persistent key-value store
//!
//! The chat engine only needs `get`, `set` and `remove` on string blobs, so
//! the backend is injected as a `KeyValueStore` trait object. `FileStore`
//! keeps one file per key on disk; `MemoryStore` is for tests and dry runs.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::core::ChatResult;

/// Key under which the chat transcript is persisted
///
/// Mood and journal data owned by other screens use their own keys.
pub const TRANSCRIPT_KEY: &str = "vivekaChatHistory";

/// String blob store scoped to one installation
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never set or was removed
    fn get(&self, key: &str) -> ChatResult<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> ChatResult<()>;

    /// Delete a value; removing a missing key is not an error
    fn remove(&self, key: &str) -> ChatResult<()>;
}
