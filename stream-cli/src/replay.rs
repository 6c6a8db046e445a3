use std::io::Write;

use anyhow::Context;
use anyhow::Result;
use serde::Serialize;
use songsmith_utils_stream_parser::ChannelDeltas;
use songsmith_utils_stream_parser::Channels;
use songsmith_utils_stream_parser::Phase;
use songsmith_utils_stream_parser::RewriteStreamParser;
use songsmith_utils_stream_parser::StreamChunk;
use songsmith_utils_stream_parser::Utf8StreamParser;
use tracing::info;
use tracing::warn;

use crate::ReplayConfig;

/// One JSONL line written by [`replay_stream`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    /// Text the parser routed to each channel for one chunk.
    Delta(ChannelDeltas),
    /// Final parser state after end-of-stream.
    Completed {
        phase: Phase,
        #[serde(flatten)]
        channels: Channels,
    },
}

/// Push `input` through a fresh parser in `config.chunk_bytes`-sized byte chunks.
pub fn replay_stream<W: Write>(input: &[u8], config: &ReplayConfig, out: &mut W) -> Result<()> {
    config.validate()?;
    let mut parser = Utf8StreamParser::new(RewriteStreamParser::new());

    for (index, chunk) in input.chunks(config.chunk_bytes).enumerate() {
        let deltas = parser
            .push_bytes(chunk)
            .inspect_err(|err| warn!(chunk = index, error = %err, "rejecting chunk"))
            .with_context(|| format!("chunk {index} is not valid UTF-8"))?;
        write_delta(out, deltas, config.emit_empty)?;
    }

    let tail = parser
        .finish()
        .context("stream ended inside a UTF-8 code point")?;
    write_delta(out, tail, config.emit_empty)?;

    let parser = parser.into_inner()?;
    let phase = parser.phase();
    info!(
        bytes = input.len(),
        chunk_bytes = config.chunk_bytes,
        phase = phase.as_str(),
        "replayed response stream"
    );
    write_event(
        out,
        &ReplayEvent::Completed {
            phase,
            channels: parser.into_channels(),
        },
    )?;
    out.flush()?;
    Ok(())
}

fn write_delta<W: Write>(out: &mut W, deltas: ChannelDeltas, emit_empty: bool) -> Result<()> {
    if deltas.is_empty() && !emit_empty {
        return Ok(());
    }
    write_event(out, &ReplayEvent::Delta(deltas))
}

fn write_event<W: Write>(out: &mut W, event: &ReplayEvent) -> Result<()> {
    serde_json::to_writer(&mut *out, event)?;
    writeln!(out)?;
    Ok(())
}
