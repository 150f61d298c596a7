//! Active view and the unread-reply marker

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::ChatError;

/// The screens the shell can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Chat,
    Education,
    Article,
    Mood,
    Journal,
    Quiz,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Chat,
        View::Mood,
        View::Journal,
        View::Quiz,
        View::Education,
        View::Article,
    ];

    /// Sidebar label
    pub fn title(&self) -> &'static str {
        match self {
            View::Chat => "Chat",
            View::Education => "Edukasi",
            View::Article => "Artikel",
            View::Mood => "Mood",
            View::Journal => "Catatan",
            View::Quiz => "Kuis",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Chat => "chat",
            View::Education => "education",
            View::Article => "article",
            View::Mood => "mood",
            View::Journal => "journal",
            View::Quiz => "quiz",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = ChatError;

    /// Accepts the view id or its sidebar label, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        View::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(wanted) || v.title().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ChatError::other(format!("Unknown view: {}", wanted)))
    }
}

/// Navigation state shared by the shell and whoever renders it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NavState {
    pub active: View,
    /// A reply finished while another view was showing
    pub unread: bool,
}

/// Shared, cloneable navigation state
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    state: Arc<RwLock<NavState>>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, NavState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, NavState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> NavState {
        *self.read()
    }

    pub fn active_view(&self) -> View {
        self.read().active
    }

    pub fn has_unread(&self) -> bool {
        self.read().unread
    }

    /// Switch views; opening the chat clears the unread marker
    ///
    /// Never touches an in-flight turn.
    pub fn navigate(&self, view: View) {
        let mut state = self.write();
        if view == View::Chat {
            state.unread = false;
        }
        if state.active != view {
            tracing::debug!("Navigate {} -> {}", state.active, view);
            state.active = view;
        }
    }

    /// Close the marker without leaving the current view
    pub fn dismiss_notification(&self) {
        self.write().unread = false;
    }

    /// Clicking the marker opens the chat
    pub fn open_notification(&self) {
        self.navigate(View::Chat);
    }

    /// Record that a reply finished streaming
    ///
    /// Reads the view that is active right now. Returns true when the
    /// marker was raised.
    pub fn reply_completed(&self) -> bool {
        let mut state = self.write();
        if state.active == View::Chat {
            return false;
        }
        state.unread = true;
        true
    }
}
