use std::str::Utf8Error;

use thiserror::Error;

use crate::StreamChunk;
use crate::StreamTextParser;

/// Error returned by [`Utf8StreamParser`] when streamed bytes are not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Utf8StreamParserError {
    /// The provided bytes contain an invalid UTF-8 sequence.
    #[error("invalid UTF-8 in streamed bytes at offset {valid_up_to} (error length {error_len})")]
    InvalidUtf8 {
        /// Byte offset in the parser's buffered bytes where decoding failed.
        valid_up_to: usize,
        /// Length in bytes of the invalid sequence.
        error_len: usize,
    },
    /// EOF was reached with a buffered partial UTF-8 code point.
    #[error("incomplete UTF-8 code point at end of stream")]
    IncompleteUtf8AtEof,
}

impl From<Utf8Error> for Utf8StreamParserError {
    fn from(err: Utf8Error) -> Self {
        match err.error_len() {
            Some(error_len) => Self::InvalidUtf8 {
                valid_up_to: err.valid_up_to(),
                error_len,
            },
            None => Self::IncompleteUtf8AtEof,
        }
    }
}

/// Wraps a [`StreamTextParser`] and accepts raw bytes, buffering partial UTF-8 code points.
///
/// Transports such as chunked HTTP bodies split on byte boundaries, so a code point may arrive
/// in two pieces (for example `0xC3` followed by `0xA9` for `é`). Only complete code points are
/// forwarded to the wrapped parser.
#[derive(Debug)]
pub struct Utf8StreamParser<P> {
    inner: P,
    pending_utf8: Vec<u8>,
}

impl<P> Utf8StreamParser<P>
where
    P: StreamTextParser,
{
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            pending_utf8: Vec::new(),
        }
    }

    /// Feed a raw byte chunk.
    ///
    /// On invalid UTF-8 the whole chunk is rolled back, so the wrapped parser never sees a
    /// partial prefix of a rejected chunk and the caller may keep pushing afterwards.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Result<P::Chunk, Utf8StreamParserError> {
        let old_len = self.pending_utf8.len();
        self.pending_utf8.extend_from_slice(chunk);

        let valid_up_to = match std::str::from_utf8(&self.pending_utf8) {
            Ok(text) => text.len(),
            Err(err) if err.error_len().is_some() => {
                self.pending_utf8.truncate(old_len);
                return Err(err.into());
            }
            Err(err) => err.valid_up_to(),
        };
        if valid_up_to == 0 {
            return Ok(P::Chunk::default());
        }

        let text = std::str::from_utf8(&self.pending_utf8[..valid_up_to])?;
        let out = self.inner.push_str(text);
        self.pending_utf8.drain(..valid_up_to);
        Ok(out)
    }

    /// Flush the wrapped parser at end-of-stream.
    pub fn finish(&mut self) -> Result<P::Chunk, Utf8StreamParserError> {
        let mut out = if self.pending_utf8.is_empty() {
            P::Chunk::default()
        } else {
            let text = std::str::from_utf8(&self.pending_utf8)?;
            let out = self.inner.push_str(text);
            self.pending_utf8.clear();
            out
        };
        out.append(self.inner.finish());
        Ok(out)
    }

    pub fn get_ref(&self) -> &P {
        &self.inner
    }

    /// Return the wrapped parser if no undecoded UTF-8 bytes are buffered.
    pub fn into_inner(self) -> Result<P, Utf8StreamParserError> {
        if !self.pending_utf8.is_empty() {
            std::str::from_utf8(&self.pending_utf8)?;
        }
        Ok(self.inner)
    }

    /// Return the wrapped parser, dropping any buffered partial code point.
    pub fn into_inner_lossy(self) -> P {
        self.inner
    }
}
