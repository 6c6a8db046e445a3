use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;
use tracing::trace;

use crate::StreamChunk;
use crate::StreamTextParser;

pub const CONTENT_OPEN: &str = "<content>";
pub const CONTENT_CLOSE: &str = "</content>";
pub const ORIGINAL_OPEN: &str = "<original_song>";
pub const ORIGINAL_CLOSE: &str = "</original_song>";

/// Markers watched in each phase, paired with the phase a complete match enters.
const BEFORE_MARKERS: &[(&str, Phase)] = &[
    (CONTENT_OPEN, Phase::InContent),
    (ORIGINAL_OPEN, Phase::InOriginal),
];
const IN_CONTENT_MARKERS: &[(&str, Phase)] = &[(CONTENT_CLOSE, Phase::Between)];
const BETWEEN_MARKERS: &[(&str, Phase)] = &[(ORIGINAL_OPEN, Phase::InOriginal)];
const IN_ORIGINAL_MARKERS: &[(&str, Phase)] = &[(ORIGINAL_CLOSE, Phase::After)];

/// Position of a [`RewriteStreamParser`] in the marker protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No marker seen yet; watching for either open marker.
    #[default]
    Before,
    InContent,
    /// Content closed; only `<original_song>` can open a new span.
    Between,
    InOriginal,
    /// Both spans are done. Nothing is watched any more.
    After,
}

impl Phase {
    /// Channel that receives characters not consumed by a marker in this phase.
    fn channel(self) -> Channel {
        match self {
            Phase::Before | Phase::Between | Phase::After => Channel::Chat,
            Phase::InContent => Channel::Content,
            Phase::InOriginal => Channel::Original,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Before => "before",
            Phase::InContent => "in_content",
            Phase::Between => "between",
            Phase::InOriginal => "in_original",
            Phase::After => "after",
        }
    }

    fn watched_markers(self) -> &'static [(&'static str, Phase)] {
        match self {
            Phase::Before => BEFORE_MARKERS,
            Phase::InContent => IN_CONTENT_MARKERS,
            Phase::Between => BETWEEN_MARKERS,
            Phase::InOriginal => IN_ORIGINAL_MARKERS,
            Phase::After => &[],
        }
    }

    fn is_capture(self) -> bool {
        matches!(self, Phase::InContent | Phase::InOriginal)
    }
}

/// One of the three output channels of a rewrite response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    /// Conversational text addressed to the user.
    Chat,
    /// The rewritten song.
    Content,
    /// A restatement of the original song, when the model chooses to send one.
    Original,
}

/// Text routed to each channel, either for a single pushed fragment or accumulated over a stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Channels {
    pub chat: String,
    pub content: String,
    pub original: String,
}

/// Per-fragment output of [`RewriteStreamParser::process`].
pub type ChannelDeltas = Channels;

impl Channels {
    fn push(&mut self, channel: Channel, ch: char) {
        match channel {
            Channel::Chat => self.chat.push(ch),
            Channel::Content => self.content.push(ch),
            Channel::Original => self.original.push(ch),
        }
    }
}

impl StreamChunk for Channels {
    fn append(&mut self, other: Self) {
        self.chat.push_str(&other.chat);
        self.content.push_str(&other.content);
        self.original.push_str(&other.original);
    }

    fn is_empty(&self) -> bool {
        self.chat.is_empty() && self.content.is_empty() && self.original.is_empty()
    }
}

/// Streaming parser that splits a rewrite response into chat, content and original channels.
///
/// Example:
/// - input: `hello <content>\nworld</content> bye`
/// - chat: `hello  bye`
/// - content: `world`
///
/// Markers are matched literally and may be split across any fragment boundary. A single
/// newline directly after an open marker is dropped. Nothing is ever an error: if a close marker
/// never arrives the parser stays in its capture phase for the rest of the stream.
///
/// One parser handles exactly one response stream; build a fresh one for the next stream.
#[derive(Debug, Default)]
pub struct RewriteStreamParser {
    phase: Phase,
    totals: Channels,
    pending: String,
    leading_newline_consumed: bool,
}

impl RewriteStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next fragment and return the text it added to each channel.
    pub fn process(&mut self, fragment: &str) -> ChannelDeltas {
        let mut out = ChannelDeltas::default();
        for ch in fragment.chars() {
            self.feed(ch, &mut out);
        }
        out
    }

    /// Flush a dangling partial marker into the active channel at end-of-stream.
    ///
    /// The phase is left untouched.
    pub fn finish(&mut self) -> ChannelDeltas {
        let mut out = ChannelDeltas::default();
        if self.pending.is_empty() {
            return out;
        }
        let pending = std::mem::take(&mut self.pending);
        debug!(
            phase = self.phase.as_str(),
            pending = %pending,
            "flushing unterminated marker prefix at end of stream"
        );
        for ch in pending.chars() {
            self.emit(ch, &mut out);
        }
        out
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn chat_text(&self) -> &str {
        &self.totals.chat
    }

    pub fn content_text(&self) -> &str {
        &self.totals.content
    }

    pub fn original_text(&self) -> &str {
        &self.totals.original
    }

    /// Characters held back because they might still start a marker.
    pub fn pending_marker(&self) -> &str {
        &self.pending
    }

    pub fn channels(&self) -> &Channels {
        &self.totals
    }

    pub fn into_channels(self) -> Channels {
        self.totals
    }

    fn feed(&mut self, ch: char, out: &mut ChannelDeltas) {
        let mut queue = VecDeque::from([ch]);
        while let Some(ch) = queue.pop_front() {
            if let Some(replay) = self.step(ch, out) {
                for replayed in replay.chars().rev() {
                    queue.push_front(replayed);
                }
            }
        }
    }

    /// Classify one character. Returns characters that must be classified again after a false
    /// start, in order.
    fn step(&mut self, ch: char, out: &mut ChannelDeltas) -> Option<String> {
        if self.phase.is_capture() && !self.leading_newline_consumed {
            self.leading_newline_consumed = true;
            if ch == '\n' {
                return None;
            }
        }

        let watched = self.phase.watched_markers();
        if watched.is_empty() {
            self.emit(ch, out);
            return None;
        }

        self.pending.push(ch);
        if let Some(&(marker, next)) = watched
            .iter()
            .find(|(marker, _)| *marker == self.pending.as_str())
        {
            self.pending.clear();
            self.enter(next, marker);
            return None;
        }
        if watched
            .iter()
            .any(|(marker, _)| marker.starts_with(self.pending.as_str()))
        {
            return None;
        }

        // The match starting at the first buffered char failed; any later char may still begin one.
        let rejected = std::mem::take(&mut self.pending);
        let mut chars = rejected.chars();
        if let Some(first) = chars.next() {
            self.emit(first, out);
        }
        let rest = chars.as_str();
        if rest.is_empty() {
            return None;
        }
        trace!(phase = self.phase.as_str(), rejected = %rejected, "marker false start");
        Some(rest.to_string())
    }

    fn enter(&mut self, next: Phase, marker: &str) {
        trace!(
            from = self.phase.as_str(),
            to = next.as_str(),
            marker,
            "rewrite stream phase transition"
        );
        self.phase = next;
        if next.is_capture() {
            self.leading_newline_consumed = false;
        }
    }

    fn emit(&mut self, ch: char, out: &mut ChannelDeltas) {
        let channel = self.phase.channel();
        out.push(channel, ch);
        self.totals.push(channel, ch);
    }
}

impl StreamTextParser for RewriteStreamParser {
    type Chunk = ChannelDeltas;

    fn push_str(&mut self, chunk: &str) -> Self::Chunk {
        self.process(chunk)
    }

    fn finish(&mut self) -> Self::Chunk {
        RewriteStreamParser::finish(self)
    }
}
