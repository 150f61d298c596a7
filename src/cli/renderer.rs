//! Console Renderer - drives an [`App`] from the terminal
//!
//! The renderer owns two loops:
//! - an input loop that reads stdin lines and turns them into commands
//! - an event loop that subscribes to the chat and streams replies to the
//!   terminal while the chat view is active
//!
//! Turns run on their own task, so the user can keep navigating while a
//! reply streams in.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::console::Console;
use crate::core::{ChatEvent, EventReceiver, Readiness};
use crate::session::{IgnoreReason, SendOutcome};
use crate::shell::{App, View};

/// A parsed line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    New,
    Expert,
    Article,
    Chat,
    Dismiss,
    Help,
    View(View),
    Unknown(String),
    Say(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Say(line.to_string());
        };

        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next().unwrap_or_default().trim();

        match name.as_str() {
            "exit" | "quit" => Command::Exit,
            "new" => Command::New,
            "expert" => Command::Expert,
            "article" => Command::Article,
            "chat" => Command::Chat,
            "dismiss" => Command::Dismiss,
            "help" => Command::Help,
            "view" => match arg.parse::<View>() {
                Ok(view) => Command::View(view),
                Err(_) => Command::Unknown(line.to_string()),
            },
            _ => Command::Unknown(line.to_string()),
        }
    }
}

/// How much of the streaming reply is on screen
///
/// Shared by the event loop and by chat reprints, so a reply that was
/// partly reprinted keeps a single `ViVeka:` line and no text shows twice.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ReplyCursor {
    /// The agent line for this reply has been started
    open: bool,
    /// Bytes of the reply already printed
    printed: usize,
    /// Bytes of the reply received so far
    received: usize,
}

/// What to print for one delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DeltaPrint {
    prefix: bool,
    /// Leading bytes of the delta already on screen
    skip: usize,
}

impl ReplyCursor {
    fn start_turn(&mut self) {
        *self = Self::default();
    }

    /// The chat was reprinted; `streaming` is the length of a still-growing
    /// agent message shown at the bottom, if any
    fn reprinted(&mut self, streaming: Option<usize>) {
        match streaming {
            Some(shown) => {
                self.open = true;
                self.printed = shown;
            }
            None => self.open = false,
        }
    }

    fn on_delta(&mut self, len: usize, on_chat: bool) -> Option<DeltaPrint> {
        let start = self.received;
        self.received += len;
        if !on_chat || self.printed >= self.received {
            return None;
        }

        let skip = self.printed.saturating_sub(start).min(len);
        let prefix = !self.open;
        self.open = true;
        self.printed = self.received;
        Some(DeltaPrint { prefix, skip })
    }

    /// End the reply; returns whether its line was open
    fn close(&mut self) -> bool {
        std::mem::take(&mut self.open)
    }
}

type SharedCursor = Arc<Mutex<ReplyCursor>>;

fn lock_cursor(cursor: &SharedCursor) -> MutexGuard<'_, ReplyCursor> {
    cursor.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Console renderer for one user's app
pub struct ConsoleRenderer {
    app: App,
    console: Arc<Console>,
    cursor: SharedCursor,
}

impl ConsoleRenderer {
    /// Create a new console renderer
    pub fn new(app: App, console: Arc<Console>) -> Self {
        Self {
            app,
            console,
            cursor: SharedCursor::default(),
        }
    }

    /// Run until the user exits or stdin closes
    pub async fn run(&self) -> io::Result<()> {
        let chat = self.app.chat();
        self.console.print_banner(chat.display_name());

        let events = self.spawn_event_loop(self.app.subscribe());

        let readiness = chat.bootstrap().await;
        self.console.print_transcript(&chat.snapshot().await.transcript);
        if readiness == Readiness::Prompting {
            self.console.print_resume_prompt(chat.locale());
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut turn: Option<JoinHandle<()>> = None;

        loop {
            self.console.print_prompt();
            let Some(line) = lines.next_line().await? else {
                break;
            };

            if chat.readiness().await.is_prompting() {
                self.answer_resume(&line).await;
                continue;
            }

            match Command::parse(&line) {
                Command::Exit => break,
                Command::Help => self.console.print_help(),
                Command::New => {
                    chat.start_fresh().await;
                    self.console.print_transcript(&chat.snapshot().await.transcript);
                }
                Command::Expert => {
                    if self.app.ask_expert().await {
                        self.show_view(View::Chat).await;
                    } else {
                        self.console.print_system("Tunggu ViVeka selesai menjawab dulu.");
                    }
                }
                Command::Article => {
                    if self.app.nav_state().active != View::Chat {
                        self.show_view(View::Chat).await;
                    }
                    turn = Some(self.spawn_turn(None));
                }
                Command::Chat => self.show_view(View::Chat).await,
                Command::View(view) => self.show_view(view).await,
                Command::Dismiss => self.app.navigator().dismiss_notification(),
                Command::Unknown(input) => {
                    self.console
                        .print_system(&format!("Perintah tidak dikenal: {} (lihat /help)", input));
                }
                Command::Say(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    if self.app.nav_state().active != View::Chat {
                        self.console.print_system("Buka /chat untuk mengirim pesan.");
                        continue;
                    }
                    turn = Some(self.spawn_turn(Some(text)));
                }
            }
        }

        if let Some(turn) = turn {
            if !turn.is_finished() {
                tracing::info!("Exiting with a reply still streaming");
                turn.abort();
            }
        }
        events.abort();
        self.console.print_system("Sampai jumpa.");
        Ok(())
    }

    async fn answer_resume(&self, line: &str) {
        let chat = self.app.chat();
        match line.trim().to_lowercase().as_str() {
            "y" | "ya" | "yes" => {
                chat.resume().await;
            }
            "n" | "tidak" | "no" => {
                chat.start_fresh().await;
            }
            _ => {
                self.console.print_resume_prompt(chat.locale());
                return;
            }
        }
        self.console.print_transcript(&chat.snapshot().await.transcript);
    }

    async fn show_view(&self, view: View) {
        self.app.navigate(view);
        self.console.print_views(&self.app.nav_state());
        if view == View::Chat {
            let snapshot = self.app.snapshot().await;
            let streaming = snapshot
                .transcript
                .last()
                .filter(|m| snapshot.loading && m.is_agent())
                .map(|m| m.text.len());

            let mut cursor = lock_cursor(&self.cursor);
            if streaming.is_some() {
                self.console.print_streaming_transcript(&snapshot.transcript);
            } else {
                self.console.print_transcript(&snapshot.transcript);
            }
            cursor.reprinted(streaming);
            drop(cursor);

            if snapshot.awaiting_first_fragment() {
                self.console.print_system(&self.app.chat().locale().thinking);
            }
        } else {
            self.console.print_view_placeholder(view);
        }
    }

    /// Run a turn in the background; `None` sends the article shortcut
    fn spawn_turn(&self, text: Option<String>) -> JoinHandle<()> {
        let app = self.app.clone();
        let console = self.console.clone();
        tokio::spawn(async move {
            let outcome = match text {
                Some(text) => app.send_message(&text).await,
                None => app.request_article().await,
            };
            match outcome {
                SendOutcome::Ignored(IgnoreReason::Busy) => {
                    console.print_system("ViVeka masih menjawab, tunggu sebentar.");
                }
                SendOutcome::Ignored(IgnoreReason::NotReady) => {
                    console.print_system("Sesi belum siap.");
                }
                SendOutcome::Superseded => {
                    tracing::debug!("Turn superseded by a new session");
                }
                SendOutcome::Ignored(IgnoreReason::EmptyInput) | SendOutcome::Completed { .. } => {}
            }
        })
    }

    /// Stream chat events to the terminal
    fn spawn_event_loop(&self, mut rx: EventReceiver) -> JoinHandle<()> {
        let app = self.app.clone();
        let console = self.console.clone();
        let cursor = self.cursor.clone();

        tokio::spawn(async move {
            let thinking = app.chat().locale().thinking.clone();
            let mut showing_thinking = false;

            loop {
                let event = match rx.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!("Renderer lagged, skipped {} events", n);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                let on_chat = app.nav_state().active == View::Chat;

                match event {
                    ChatEvent::TurnStarted { .. } => {
                        lock_cursor(&cursor).start_turn();
                        if on_chat {
                            console.print_thinking(&thinking);
                            showing_thinking = true;
                        }
                    }
                    ChatEvent::TextDelta(text) => {
                        let mut cursor = lock_cursor(&cursor);
                        let Some(print) = cursor.on_delta(text.len(), on_chat) else {
                            continue;
                        };
                        if showing_thinking {
                            console.clear_thinking(&thinking);
                            showing_thinking = false;
                        }
                        if print.prefix {
                            console.print_agent_prefix();
                        }
                        console.print_agent_chunk(text.get(print.skip..).unwrap_or_default());
                    }
                    ChatEvent::TurnComplete { text, .. } => {
                        if showing_thinking {
                            console.clear_thinking(&thinking);
                            showing_thinking = false;
                        }
                        let was_open = lock_cursor(&cursor).close();
                        if on_chat && was_open {
                            console.println();
                            console.print_video_link(&text);
                        }
                    }
                    ChatEvent::MessageInjected(message) => {
                        tracing::debug!("Injected message: {}", message.text);
                    }
                    ChatEvent::ReadinessChanged(readiness) => {
                        tracing::debug!("Readiness: {}", readiness);
                    }
                    ChatEvent::TranscriptReplaced { len } => {
                        lock_cursor(&cursor).start_turn();
                        showing_thinking = false;
                        tracing::debug!("Transcript replaced ({} messages)", len);
                    }
                    ChatEvent::UnreadReply => {
                        console.print_views(&app.nav_state());
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/exit"), Command::Exit);
        assert_eq!(Command::parse("/QUIT"), Command::Exit);
        assert_eq!(Command::parse("/new"), Command::New);
        assert_eq!(Command::parse("/expert"), Command::Expert);
        assert_eq!(Command::parse("/article"), Command::Article);
        assert_eq!(Command::parse("/view mood"), Command::View(View::Mood));
        assert_eq!(Command::parse("/view  Kuis "), Command::View(View::Quiz));
        assert_eq!(Command::parse("/chat"), Command::Chat);
    }

    #[test]
    fn test_plain_text_is_said_trimmed() {
        assert_eq!(Command::parse("  aku cemas  "), Command::Say("aku cemas".into()));
        assert_eq!(Command::parse(""), Command::Say(String::new()));
    }

    #[test]
    fn test_cursor_streams_one_agent_line() {
        let mut cursor = ReplyCursor::default();
        cursor.start_turn();

        assert_eq!(cursor.on_delta(11, true), Some(DeltaPrint { prefix: true, skip: 0 }));
        assert_eq!(cursor.on_delta(5, true), Some(DeltaPrint { prefix: false, skip: 0 }));
        assert!(cursor.close());
        assert!(!cursor.close());
    }

    #[test]
    fn test_cursor_return_to_chat_mid_stream_keeps_one_prefix() {
        let mut cursor = ReplyCursor::default();
        cursor.start_turn();
        assert!(cursor.on_delta(11, true).is_some());

        // left the chat; this delta is not shown
        assert_eq!(cursor.on_delta(5, false), None);

        // back on chat: the partial reply (16 bytes) was reprinted
        cursor.reprinted(Some(16));
        assert_eq!(cursor.on_delta(6, true), Some(DeltaPrint { prefix: false, skip: 0 }));
    }

    #[test]
    fn test_cursor_skips_deltas_already_reprinted() {
        let mut cursor = ReplyCursor::default();
        cursor.start_turn();

        // left before the first fragment, came back after it was applied
        // but before its event was rendered
        assert_eq!(cursor.on_delta(0, false), None);
        cursor.reprinted(Some(11));
        assert_eq!(cursor.on_delta(11, true), None);
        assert_eq!(cursor.on_delta(4, true), Some(DeltaPrint { prefix: false, skip: 0 }));
    }

    #[test]
    fn test_cursor_reprint_without_reply_starts_new_line() {
        let mut cursor = ReplyCursor::default();
        cursor.start_turn();
        cursor.reprinted(None);
        assert_eq!(cursor.on_delta(3, true), Some(DeltaPrint { prefix: true, skip: 0 }));
    }

    #[test]
    fn test_unknown_commands() {
        assert!(matches!(Command::parse("/view settings"), Command::Unknown(_)));
        assert!(matches!(Command::parse("/foo"), Command::Unknown(_)));
    }
}
