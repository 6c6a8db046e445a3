use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

/// Inspect how rewrite responses are split into chat, content and original channels.
#[derive(Debug, Parser)]
#[command(name = "songsmith-stream", version)]
pub struct Cli {
    /// Config file to use instead of `$SONGSMITH_HOME/config.toml`.
    #[arg(long = "config", short = 'c', value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a recorded response through the streaming parser, printing JSONL deltas.
    Replay(ReplayCommand),
    /// Parse a complete response in one shot and print the result as JSON.
    Extract(ExtractCommand),
}

#[derive(Debug, Clone, Args)]
pub struct ReplayCommand {
    /// Bytes delivered to the parser per chunk. Overrides `chunk_bytes` from the config.
    #[arg(long = "chunk-bytes", value_name = "N")]
    pub chunk_bytes: Option<usize>,

    /// Print a delta line even for chunks that produced no channel text.
    #[arg(long = "emit-empty", default_value_t = false)]
    pub emit_empty: bool,

    /// Recorded response. Reads stdin when omitted or `-`.
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct ExtractCommand {
    /// Which reply format the input follows.
    #[arg(long, value_enum)]
    pub kind: ResponseKind,

    /// Original text to report when a clean-up reply has no `<original>` section.
    #[arg(long = "fallback-original", value_name = "TEXT", default_value = "")]
    pub fallback_original: String,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,

    /// Complete response. Reads stdin when omitted or `-`.
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResponseKind {
    /// Chat edit reply: optional `<content>` followed by an explanation.
    Chat,
    /// Clean-up reply: `<meta>` and `<original>` sections.
    Clean,
}
