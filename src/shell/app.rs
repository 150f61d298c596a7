//! The navigation shell around one chat

use std::sync::Arc;

use super::navigation::{NavState, Navigator, View};
use crate::core::{ChatEvent, EventReceiver};
use crate::session::{ChatController, ChatSnapshot, SendOutcome};

/// Something that can get the user's attention when a reply lands off-screen
pub trait ReplyNotifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Notifier that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl ReplyNotifier for SilentNotifier {
    fn notify(&self, _title: &str, _body: &str) {}
}

/// Chat controller plus navigation
///
/// Clones share the same chat and the same navigation state, so a front-end
/// can run a turn on a spawned task and keep navigating.
#[derive(Clone)]
pub struct App {
    chat: ChatController,
    navigator: Navigator,
    notifier: Arc<dyn ReplyNotifier>,
}

impl App {
    pub fn new(chat: ChatController) -> Self {
        Self {
            chat,
            navigator: Navigator::new(),
            notifier: Arc::new(SilentNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ReplyNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn chat(&self) -> &ChatController {
        &self.chat
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.chat.subscribe()
    }

    pub fn nav_state(&self) -> NavState {
        self.navigator.state()
    }

    pub async fn snapshot(&self) -> ChatSnapshot {
        self.chat.snapshot().await
    }

    pub fn navigate(&self, view: View) {
        self.navigator.navigate(view);
    }

    /// Send through the chat and raise the marker if the user has moved on
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let outcome = self.chat.send_message(text).await;
        self.after_turn(outcome);
        outcome
    }

    /// "Artikel Edukasi" shortcut
    pub async fn request_article(&self) -> SendOutcome {
        let outcome = self.chat.request_article().await;
        self.after_turn(outcome);
        outcome
    }

    /// "Tanya Pakar" shortcut
    pub async fn ask_expert(&self) -> bool {
        self.chat.ask_expert().await
    }

    fn after_turn(&self, outcome: SendOutcome) {
        if !outcome.is_completed() || !self.navigator.reply_completed() {
            return;
        }
        let locale = self.chat.locale();
        tracing::info!("Reply arrived while {} view active", self.navigator.active_view());
        self.notifier
            .notify(&locale.notification_title, &locale.notification_hint);
        self.chat.emit(ChatEvent::UnreadReply);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ScriptedGateway, ScriptedReply};
    use crate::persona::Locale;
    use crate::store::MemoryStore;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<(String, String)>>,
    }

    impl ReplyNotifier for RecordingNotifier {
        fn notify(&self, title: &str, body: &str) {
            self.seen
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
        }
    }

    fn app(gateway: ScriptedGateway) -> (App, Arc<RecordingNotifier>) {
        let chat = ChatController::new(
            Arc::new(gateway),
            Arc::new(MemoryStore::new()),
            Locale::default(),
            "Ana",
        );
        let notifier = Arc::new(RecordingNotifier::default());
        let app = App::new(chat).with_notifier(notifier.clone());
        (app, notifier)
    }

    #[tokio::test]
    async fn test_reply_on_chat_view_no_marker() {
        let (app, notifier) = app(ScriptedGateway::with_replies([ScriptedReply::fragments(["ok"])]));
        app.chat().bootstrap().await;

        assert!(app.send_message("halo").await.is_completed());

        assert!(!app.nav_state().unread);
        assert!(notifier.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_navigating_away_mid_turn_raises_marker() {
        let gateway = ScriptedGateway::with_replies([ScriptedReply::fragments(["a", "b"])])
            .with_fragment_delay(Duration::from_millis(20));
        let (app, notifier) = app(gateway);
        app.chat().bootstrap().await;
        let mut events = app.subscribe();

        let turn = {
            let app = app.clone();
            tokio::spawn(async move { app.send_message("halo").await })
        };
        while !app.chat().is_loading().await {
            tokio::task::yield_now().await;
        }
        app.navigate(View::Mood);

        assert!(turn.await.unwrap().is_completed());
        assert!(app.nav_state().unread);
        assert_eq!(
            notifier.seen.lock().unwrap().as_slice(),
            &[(
                "Pesan baru dari ViVeka".to_string(),
                "Klik untuk melihat".to_string()
            )]
        );

        let mut saw_unread = false;
        while let Ok(event) = events.try_recv() {
            saw_unread |= matches!(event, ChatEvent::UnreadReply);
        }
        assert!(saw_unread);

        // the turn itself was not disturbed by navigation
        assert_eq!(app.snapshot().await.transcript.last().unwrap().text, "ab");

        app.navigate(View::Chat);
        assert!(!app.nav_state().unread);
    }

    #[tokio::test]
    async fn test_returning_before_completion_no_marker() {
        let gateway = ScriptedGateway::with_replies([ScriptedReply::fragments(["a", "b"])])
            .with_fragment_delay(Duration::from_millis(20));
        let (app, notifier) = app(gateway);
        app.chat().bootstrap().await;

        app.navigate(View::Quiz);
        let turn = {
            let app = app.clone();
            tokio::spawn(async move { app.send_message("halo").await })
        };
        while !app.chat().is_loading().await {
            tokio::task::yield_now().await;
        }
        app.navigate(View::Chat);

        assert!(turn.await.unwrap().is_completed());
        assert!(!app.nav_state().unread);
        assert!(notifier.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ignored_send_never_notifies() {
        let (app, notifier) = app(ScriptedGateway::new());
        app.chat().bootstrap().await;
        app.navigate(View::Journal);

        assert!(!app.send_message("   ").await.is_completed());
        assert!(!app.nav_state().unread);
        assert!(notifier.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_article_shortcut_off_chat_notifies() {
        let (app, _notifier) = app(ScriptedGateway::with_replies([ScriptedReply::fragments([
            "Overthinking...",
        ])]));
        app.chat().bootstrap().await;
        app.navigate(View::Education);

        assert!(app.request_article().await.is_completed());
        assert!(app.nav_state().unread);
    }
}
