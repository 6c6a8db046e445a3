/// Output of one pushed chunk that can be merged with the output of later pushes.
pub trait StreamChunk: Default {
    /// Append `other` after the text already held by `self`.
    fn append(&mut self, other: Self);

    /// Returns true when the chunk carries no text at all.
    fn is_empty(&self) -> bool;
}

/// Trait for parsers that consume streamed text and route it into output channels.
pub trait StreamTextParser {
    /// Per-push output produced by this parser (for example per-channel deltas).
    type Chunk: StreamChunk;

    /// Feed a new text chunk.
    fn push_str(&mut self, chunk: &str) -> Self::Chunk;

    /// Flush any buffered state at end-of-stream.
    fn finish(&mut self) -> Self::Chunk;
}
