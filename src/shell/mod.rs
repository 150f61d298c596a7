//! Navigation shell: login, views, and the unread-reply marker

pub mod app;
pub mod login;
pub mod navigation;

pub use app::{App, ReplyNotifier, SilentNotifier};
pub use login::normalize_display_name;
pub use navigation::{NavState, Navigator, View};
