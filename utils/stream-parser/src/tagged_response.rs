//! One-shot extraction for complete (already accumulated) model responses.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;

use crate::rewrite_stream::CONTENT_CLOSE;

const DEFAULT_CHANGES_SUMMARY: &str = "Chat edit applied.";
const UNKNOWN_META_VALUE: &str = "UNKNOWN";

static CONTENT_SECTION_REGEX: Lazy<Regex> =
    Lazy::new(|| compile_section_regex(ResponseSection::Content.tag()));
static ORIGINAL_SECTION_REGEX: Lazy<Regex> =
    Lazy::new(|| compile_section_regex(ResponseSection::Original.tag()));
static META_SECTION_REGEX: Lazy<Regex> =
    Lazy::new(|| compile_section_regex(ResponseSection::Meta.tag()));

/// Tagged section of a complete response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSection {
    /// `<content>`: the rewritten song in a chat reply.
    Content,
    /// `<original>`: the cleaned-up input in a clean-up reply.
    Original,
    /// `<meta>`: `Title:` / `Artist:` lines in a clean-up reply.
    Meta,
}

impl ResponseSection {
    pub fn tag(self) -> &'static str {
        match self {
            ResponseSection::Content => "content",
            ResponseSection::Original => "original",
            ResponseSection::Meta => "meta",
        }
    }

    fn regex(self) -> &'static Regex {
        match self {
            ResponseSection::Content => &CONTENT_SECTION_REGEX,
            ResponseSection::Original => &ORIGINAL_SECTION_REGEX,
            ResponseSection::Meta => &META_SECTION_REGEX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatResponse {
    /// Updated song, or `None` when the model answered conversationally.
    pub content: Option<String>,
    pub explanation: String,
}

impl ChatResponse {
    /// Summary shown next to a new revision.
    pub fn changes_summary(&self) -> &str {
        if self.explanation.is_empty() {
            DEFAULT_CHANGES_SUMMARY
        } else {
            &self.explanation
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanResponse {
    pub original: String,
    pub title: Option<String>,
    pub artist: Option<String>,
}

/// Returns the trimmed text between `<tag>` and the first following `</tag>`.
pub fn extract_tagged_section(raw: &str, section: ResponseSection) -> Option<String> {
    section
        .regex()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|body| body.as_str().trim().to_string())
}

/// Split a complete chat reply into the updated song and the explanation that follows it.
pub fn parse_chat_response(raw: &str) -> ChatResponse {
    match extract_tagged_section(raw, ResponseSection::Content) {
        Some(content) => {
            let explanation = raw
                .split_once(CONTENT_CLOSE)
                .map(|(_, after)| after.trim())
                .unwrap_or_default();
            ChatResponse {
                content: Some(content),
                explanation: explanation.to_string(),
            }
        }
        None => ChatResponse {
            content: None,
            explanation: raw.trim().to_string(),
        },
    }
}

/// Parse a clean-up reply. Falls back to `fallback_original` when `<original>` is missing.
pub fn parse_clean_response(raw: &str, fallback_original: &str) -> CleanResponse {
    let (title, artist) = extract_tagged_section(raw, ResponseSection::Meta)
        .map(|meta| parse_meta_section(&meta))
        .unwrap_or_default();
    let original = extract_tagged_section(raw, ResponseSection::Original)
        .unwrap_or_else(|| fallback_original.to_string());
    CleanResponse {
        original,
        title,
        artist,
    }
}

fn parse_meta_section(meta: &str) -> (Option<String>, Option<String>) {
    let mut title = None;
    let mut artist = None;
    for line in meta.lines().map(str::trim) {
        if let Some(value) = strip_key(line, "title:") {
            title = known_value(value);
        } else if let Some(value) = strip_key(line, "artist:") {
            artist = known_value(value);
        }
    }
    (title, artist)
}

/// Case-insensitive `key:` prefix match returning the text after the colon.
fn strip_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let prefix = line.get(..key.len())?;
    prefix.eq_ignore_ascii_case(key).then_some(&line[key.len()..])
}

fn known_value(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.eq_ignore_ascii_case(UNKNOWN_META_VALUE)).then(|| value.to_string())
}

fn compile_section_regex(tag: &str) -> Regex {
    let pattern = format!(r"(?s)<{tag}>\s*(.*?)\s*</{tag}>");
    match Regex::new(&pattern) {
        Ok(regex) => regex,
        Err(err) => panic!("invalid section pattern `{pattern}`: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::ChatResponse;
    use super::CleanResponse;
    use super::ResponseSection;
    use super::extract_tagged_section;
    use super::parse_chat_response;
    use super::parse_clean_response;
    use pretty_assertions::assert_eq;

    #[test]
    fn chat_reply_with_content_and_explanation() {
        let raw = "<content>\nHi there world\nCatch ya moon\n</content>\nI changed 'see ya' to 'catch ya'.";

        assert_eq!(
            parse_chat_response(raw),
            ChatResponse {
                content: Some("Hi there world\nCatch ya moon".to_string()),
                explanation: "I changed 'see ya' to 'catch ya'.".to_string(),
            }
        );
    }

    #[test]
    fn chat_reply_without_explanation_uses_default_summary() {
        let response = parse_chat_response("<content>\nHello\n</content>");

        assert_eq!(response.content.as_deref(), Some("Hello"));
        assert_eq!(response.explanation, "");
        assert_eq!(response.changes_summary(), "Chat edit applied.");
    }

    #[test]
    fn conversational_chat_reply_has_no_content() {
        let response = parse_chat_response("  Maybe try a slower tempo?\n");

        assert_eq!(response.content, None);
        assert_eq!(response.explanation, "Maybe try a slower tempo?");
        assert_eq!(response.changes_summary(), "Maybe try a slower tempo?");
    }

    #[test]
    fn unterminated_content_is_not_a_section() {
        let response = parse_chat_response("<content>\nhalf a song");

        assert_eq!(response.content, None);
        assert_eq!(response.explanation, "<content>\nhalf a song");
    }

    #[test]
    fn section_extraction_stops_at_first_close_tag() {
        let raw = "<content>a</content> and <content>b</content>";

        assert_eq!(
            extract_tagged_section(raw, ResponseSection::Content),
            Some("a".to_string())
        );
        assert_eq!(extract_tagged_section(raw, ResponseSection::Meta), None);
    }

    #[test]
    fn clean_reply_with_meta_and_original() {
        let raw = "<meta>\nTitle: Wagon Wheel\nArtist: Old Crow\n</meta>\n<original>\nG  Am\nHello world\n</original>";

        assert_eq!(
            parse_clean_response(raw, "fallback"),
            CleanResponse {
                original: "G  Am\nHello world".to_string(),
                title: Some("Wagon Wheel".to_string()),
                artist: Some("Old Crow".to_string()),
            }
        );
    }

    #[test]
    fn unknown_meta_values_map_to_none() {
        let raw = "<meta>\ntitle: unknown\nARTIST: UNKNOWN\n</meta>\n<original>\nHello\n</original>";

        let response = parse_clean_response(raw, "fallback");

        assert_eq!(response.title, None);
        assert_eq!(response.artist, None);
        assert_eq!(response.original, "Hello");
    }

    #[test]
    fn meta_value_keeps_text_after_first_colon() {
        let raw = "<meta>\n  Title: Live: At The Ryman  \n</meta>";

        let response = parse_clean_response(raw, "fallback");

        assert_eq!(response.title.as_deref(), Some("Live: At The Ryman"));
        assert_eq!(response.artist, None);
    }

    #[test]
    fn clean_reply_without_tags_falls_back() {
        assert_eq!(
            parse_clean_response("Just some text without XML tags", "fallback original"),
            CleanResponse {
                original: "fallback original".to_string(),
                title: None,
                artist: None,
            }
        );
    }
}
