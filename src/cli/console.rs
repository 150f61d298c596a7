use colored::*;
use std::io::{self, Write};

use crate::conversation::{extract_youtube_id, youtube_embed_url, Message, Sender, Transcript};
use crate::persona::Locale;
use crate::shell::{NavState, ReplyNotifier, View};

/// Console handles all terminal output with colored formatting
#[derive(Debug, Clone)]
pub struct Console {
    user_color: Color,
    agent_color: Color,
    accent_color: Color,
}

impl Console {
    /// Create a new Console with default colors
    pub fn new() -> Self {
        Self {
            user_color: Color::Cyan,
            agent_color: Color::Blue,
            accent_color: Color::Magenta,
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }

    /// Print a user message with colored formatting
    pub fn print_user(&self, message: &str) {
        println!("{} {}", "Kamu:".color(self.user_color).bold(), message);
    }

    /// Print the agent prefix (without newline)
    pub fn print_agent_prefix(&self) {
        print!("{} ", "ViVeka:".color(self.agent_color).bold());
        self.flush();
    }

    /// Print a chunk of agent text (for streaming)
    pub fn print_agent_chunk(&self, chunk: &str) {
        print!("{}", chunk.color(self.agent_color));
        self.flush();
    }

    /// Print a complete agent message
    pub fn print_agent(&self, message: &str) {
        println!(
            "{} {}",
            "ViVeka:".color(self.agent_color).bold(),
            message.color(self.agent_color)
        );
        self.print_video_link(message);
    }

    /// Print an embed link if the text mentions a YouTube video
    pub fn print_video_link(&self, text: &str) {
        if let Some(id) = extract_youtube_id(text) {
            println!("  {} {}", "▶ Video:".color(self.accent_color), youtube_embed_url(id).underline());
        }
    }

    pub fn print_message(&self, message: &Message) {
        match message.sender {
            Sender::User => self.print_user(&message.text),
            Sender::Agent => self.print_agent(&message.text),
        }
    }

    /// Print a whole transcript
    pub fn print_transcript(&self, transcript: &Transcript) {
        self.print_separator();
        for message in transcript.messages() {
            self.print_message(message);
        }
        self.print_separator();
    }

    /// Print a transcript whose last agent message is still streaming
    ///
    /// The last message is left open so further chunks continue its line.
    pub fn print_streaming_transcript(&self, transcript: &Transcript) {
        self.print_separator();
        let Some((last, earlier)) = transcript.messages().split_last() else {
            return;
        };
        for message in earlier {
            self.print_message(message);
        }
        self.print_agent_prefix();
        self.print_agent_chunk(&last.text);
    }

    /// Print a newline
    pub fn println(&self) {
        println!();
    }

    /// Print a system message (hints, state changes)
    pub fn print_system(&self, message: &str) {
        println!("{} {}", "·".yellow().bold(), message.bright_black());
    }

    /// Print an error message
    pub fn print_error(&self, error: &str) {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }

    /// Print the input prompt
    pub fn print_prompt(&self) {
        print!("{} ", ">".color(self.user_color).bold());
        self.flush();
    }

    /// Print the thinking indicator
    pub fn print_thinking(&self, text: &str) {
        print!("{}", text.bright_black().italic());
        self.flush();
    }

    /// Clear the thinking indicator
    pub fn clear_thinking(&self, text: &str) {
        print!("\r{}\r", " ".repeat(text.chars().count() + 1));
        self.flush();
    }

    /// Print a welcome banner
    pub fn print_banner(&self, name: &str) {
        println!("{}", "=".repeat(60).bright_blue());
        println!("{}", "  ViVeka - teman cerita untuk kesehatan mentalmu".bright_blue().bold());
        println!("{}", "=".repeat(60).bright_blue());
        println!();
        println!("Masuk sebagai {}. Ketik /help untuk daftar perintah.", name.bold());
        println!();
    }

    /// Print a separator line
    pub fn print_separator(&self) {
        println!("{}", "-".repeat(60).bright_black());
    }

    /// Ask whether to continue the stored conversation
    pub fn print_resume_prompt(&self, locale: &Locale) {
        println!("{}", locale.resume_prompt.yellow().bold());
        println!("  [y] {}", locale.resume_yes);
        println!("  [n] {}", locale.resume_no);
    }

    /// Print the sidebar with the active view and the unread marker
    pub fn print_views(&self, nav: &NavState) {
        let items: Vec<String> = View::ALL
            .iter()
            .map(|view| {
                let mut label = view.title().to_string();
                if *view == View::Chat && nav.unread {
                    label.push('*');
                }
                if *view == nav.active {
                    format!("[{}]", label).color(self.accent_color).bold().to_string()
                } else {
                    label
                }
            })
            .collect();
        println!("{}", items.join("  "));
    }

    /// Placeholder for the screens that only exist in the graphical app
    pub fn print_view_placeholder(&self, view: View) {
        self.print_separator();
        println!("{}", view.title().color(self.accent_color).bold());
        println!("{}", "Layar ini belum tersedia di terminal. Kembali dengan /chat.".bright_black());
        self.print_separator();
    }

    pub fn print_help(&self) {
        println!("{}", "Perintah:".yellow().bold());
        println!("  /new            mulai percakapan baru");
        println!("  /expert         tanya pakar");
        println!("  /article        minta artikel edukasi");
        println!("  /view <nama>    pindah tampilan (chat, mood, journal, quiz, education, article)");
        println!("  /chat           kembali ke chat");
        println!("  /dismiss        tutup notifikasi");
        println!("  /exit           keluar");
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyNotifier for Console {
    /// Ring the terminal bell and show a one-line toast
    fn notify(&self, title: &str, body: &str) {
        println!();
        println!(
            "\x07{} {} {}",
            "●".color(self.accent_color),
            title.bold(),
            format!("({}: /chat)", body).bright_black()
        );
        self.flush();
    }
}
