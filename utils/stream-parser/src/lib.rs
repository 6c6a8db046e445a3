//! Incremental parsers for streamed model responses in the song rewriting flow.

mod rewrite_stream;
mod stream_text;
mod tagged_response;
mod utf8_stream;

pub use rewrite_stream::CONTENT_CLOSE;
pub use rewrite_stream::CONTENT_OPEN;
pub use rewrite_stream::ChannelDeltas;
pub use rewrite_stream::Channels;
pub use rewrite_stream::ORIGINAL_CLOSE;
pub use rewrite_stream::ORIGINAL_OPEN;
pub use rewrite_stream::Phase;
pub use rewrite_stream::RewriteStreamParser;
pub use stream_text::StreamChunk;
pub use stream_text::StreamTextParser;
pub use tagged_response::ChatResponse;
pub use tagged_response::CleanResponse;
pub use tagged_response::ResponseSection;
pub use tagged_response::extract_tagged_section;
pub use tagged_response::parse_chat_response;
pub use tagged_response::parse_clean_response;
pub use utf8_stream::Utf8StreamParser;
pub use utf8_stream::Utf8StreamParserError;
