use clap::{Args, Parser, Subcommand};
use hybridai_core::ProcessingStrategy;

#[derive(Parser)]
#[command(name = "hybridai")]
#[command(version)]
#[command(about = "Hybrid local/remote inference orchestration for wearable assistants")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Route one request (JSON on stdin) and print the decision
    Route,

    /// Dispatch newline-delimited requests from stdin through simulated backends
    Run(RunArgs),

    /// Write the default configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Config,

    /// Summarise recorded dispatch telemetry
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print version information
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Simulated local processing latency
    #[arg(long, default_value_t = 150)]
    pub local_latency_ms: u64,

    /// Simulated remote processing latency
    #[arg(long, default_value_t = 1500)]
    pub remote_latency_ms: u64,

    /// Override the configured remote timeout
    #[arg(long)]
    pub remote_timeout_ms: Option<u64>,

    /// Treat the remote backend as not loaded
    #[arg(long)]
    pub remote_offline: bool,

    /// Identity the simulated recognizer reports on every image
    #[arg(long)]
    pub known_face: Option<String>,

    /// Force one strategy for every request instead of routing
    #[arg(long, value_parser = parse_strategy)]
    pub strategy: Option<ProcessingStrategy>,

    /// Append one dispatch record per request to the telemetry log
    #[arg(long)]
    pub record: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            local_latency_ms: 150,
            remote_latency_ms: 1500,
            remote_timeout_ms: None,
            remote_offline: false,
            known_face: None,
            strategy: None,
            record: false,
        }
    }
}

fn parse_strategy(value: &str) -> Result<ProcessingStrategy, String> {
    ProcessingStrategy::parse(value).ok_or_else(|| {
        format!(
            "unknown strategy '{value}' (expected local_only, remote_only, parallel, \
             sequential_local_first or sequential_remote_first)"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_version() {
        let cli = Cli::try_parse_from(["hybridai", "version"]);
        assert!(cli.is_ok());
        assert!(matches!(cli.unwrap().command, Commands::Version));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::try_parse_from(["hybridai", "init", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Init { force: true }));
    }

    #[test]
    fn test_cli_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "hybridai",
            "run",
            "--remote-latency-ms",
            "20",
            "--remote-timeout-ms",
            "500",
            "--remote-offline",
            "--strategy",
            "sequential-local-first",
            "--record",
        ])
        .unwrap();

        if let Commands::Run(args) = cli.command {
            assert_eq!(args.local_latency_ms, 150);
            assert_eq!(args.remote_latency_ms, 20);
            assert_eq!(args.remote_timeout_ms, Some(500));
            assert!(args.remote_offline);
            assert!(args.record);
            assert_eq!(args.strategy, Some(ProcessingStrategy::SequentialLocalFirst));
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_rejects_unknown_strategy() {
        let cli = Cli::try_parse_from(["hybridai", "run", "--strategy", "both"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_all_commands() {
        for command in ["route", "run", "init", "config", "stats", "version"] {
            let cli = Cli::try_parse_from(["hybridai", command]);
            assert!(cli.is_ok(), "Failed to parse {}", command);
        }
    }
}
