use clap::Parser;
use songsmith_stream::Cli;
use songsmith_stream::run_main;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_main(cli)
}
