mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // stdout carries JSON; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Route => commands::route::run(),
        Commands::Run(args) => commands::run::run(&args),
        Commands::Init { force } => commands::init::run(force),
        Commands::Config => commands::config::run(),
        Commands::Stats { json } => commands::stats::run(json),
        Commands::Version => commands::version::run(),
    }
}
