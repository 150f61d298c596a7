//! Session readiness state

use serde::{Deserialize, Serialize};

/// Whether the chat session accepts sends yet
///
/// Moves `Checking -> Prompting -> Ready`, or straight from `Checking` to
/// `Ready` when there is no history worth resuming. `Ready` is re-entered,
/// never re-prompted, each time a fresh or resumed session is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    /// The store has not been inspected yet
    Checking,

    /// A prior transcript was found; waiting for resume or start fresh
    Prompting,

    /// A session handle is open and sends are permitted
    Ready,
}

impl Readiness {
    /// Check if sends are permitted
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }

    /// Check if the user has to choose between resume and start fresh
    pub fn is_prompting(&self) -> bool {
        matches!(self, Readiness::Prompting)
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Readiness::Checking
    }
}

impl std::fmt::Display for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Readiness::Checking => write!(f, "Checking"),
            Readiness::Prompting => write!(f, "Prompting"),
            Readiness::Ready => write!(f, "Ready"),
        }
    }
}
