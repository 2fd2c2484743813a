use clap::Parser;
use tracing_subscriber::EnvFilter;

mod catalog;
mod cli;
mod core;
mod parsing;
mod stats;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("contig_stats=debug,info")
    } else {
        EnvFilter::new("contig_stats=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Stats(args) => {
            cli::stats::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Reads(args) => {
            cli::reads::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
