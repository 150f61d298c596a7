//! Embedded media detection in agent replies

use std::sync::OnceLock;

use regex::Regex;

const YOUTUBE_PATTERN: &str = r"(?:https?://)?(?:www\.)?(?:youtube\.com/(?:[^/\n\s]+/\S+/|(?:v|e(?:mbed)?)/|\S*?[?&]v=)|youtu\.be/)([a-zA-Z0-9_-]{11})";

fn youtube_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(YOUTUBE_PATTERN).ok()).as_ref()
}

/// Extract the first YouTube video id mentioned in `text`
pub fn extract_youtube_id(text: &str) -> Option<&str> {
    youtube_regex()?
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Embed URL for a video id
pub fn youtube_embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{}", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url() {
        let text = "Coba tonton ini: https://www.youtube.com/watch?v=dQw4w9WgXcQ ya.";
        assert_eq!(extract_youtube_id(text), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_short_url() {
        assert_eq!(extract_youtube_id("youtu.be/abcdefghijk"), Some("abcdefghijk"));
    }

    #[test]
    fn test_embed_url() {
        assert_eq!(
            extract_youtube_id("https://youtube.com/embed/A1b2C3d4E5f"),
            Some("A1b2C3d4E5f")
        );
    }

    #[test]
    fn test_no_video() {
        assert_eq!(extract_youtube_id("Sepertinya kamu merasa sedih."), None);
        assert_eq!(extract_youtube_id("youtube.com"), None);
    }

    #[test]
    fn test_embed_link() {
        assert_eq!(
            youtube_embed_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/embed/dQw4w9WgXcQ"
        );
    }
}
