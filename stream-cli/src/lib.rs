//! Command-line driver for the streaming rewrite-response parser.

mod cli;
mod config;
mod extract;
mod replay;

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub use cli::Cli;
pub use cli::Command;
pub use cli::ExtractCommand;
pub use cli::ReplayCommand;
pub use cli::ResponseKind;
pub use config::CONFIG_FILE_NAME;
pub use config::ConfigError;
pub use config::ReplayConfig;
pub use extract::extract_response;
pub use replay::ReplayEvent;
pub use replay::replay_stream;

const FALLBACK_LOG_LEVEL: &str = "error";

pub fn run_main(cli: Cli) -> Result<()> {
    let Cli { config, command } = cli;
    let mut replay_config = ReplayConfig::load(config.as_deref())?;
    init_tracing(&replay_config.log_level);

    match command {
        Command::Replay(cmd) => {
            if let Some(chunk_bytes) = cmd.chunk_bytes {
                replay_config.chunk_bytes = chunk_bytes;
            }
            replay_config.emit_empty |= cmd.emit_empty;
            replay_config.validate()?;

            let input = read_input(cmd.input.as_deref())?;
            let mut stdout = std::io::stdout().lock();
            replay_stream(&input, &replay_config, &mut stdout)
        }
        Command::Extract(cmd) => {
            let input = read_input(cmd.input.as_deref())?;
            let raw = String::from_utf8(input).context("response is not valid UTF-8")?;
            let json = extract_response(&raw, &cmd)?;
            println!("{json}");
            Ok(())
        }
    }
}

fn init_tracing(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_LOG_LEVEL));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

/// Read the whole input from `path`, or from stdin when `path` is absent or `-`.
fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) if path != Path::new("-") => {
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}
