//! Chat session management
//!
//! `ChatController` owns the live transcript, the loading flag and the
//! gateway session handle. `SessionLifecycle` decides between a fresh start
//! and a resume, and the reconciler turns a gateway reply stream into
//! transcript updates.

pub mod controller;
pub mod lifecycle;
pub mod reconciler;
pub mod state;

pub use controller::{ChatController, IgnoreReason, SendOutcome};
pub use lifecycle::SessionLifecycle;
pub use reconciler::{reconcile_reply, send_turn, FragmentUpdate};
pub use state::{ChatSnapshot, ChatState};
