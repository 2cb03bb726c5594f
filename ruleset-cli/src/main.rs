use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use ruleset_core::{logging, RulesetConfig};

mod commands;
mod output;

use commands::{AggregateRequest, CliError};

#[derive(Parser)]
#[command(name = "ruleset")]
#[command(about = "Bypass ruleset aggregation - merge, prune and export domain rules", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "RULESET_LOG_LEVEL")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate the three rule layers and write the exported artifacts
    Aggregate(AggregateArgs),
    /// Print the highest of the given dotted versions
    Highest {
        /// Candidate versions, e.g. 4.2.1.8 4.2.10.0
        versions: Vec<String>,
    },
    /// Show version information
    Version,
}

#[derive(Args)]
struct AggregateArgs {
    /// Base rules (JSON converted from the extension's sites.js)
    #[arg(long)]
    base: PathBuf,
    /// Updated overlay rules
    #[arg(long)]
    updated: PathBuf,
    /// Custom overlay rules
    #[arg(long)]
    custom: PathBuf,
    /// Directory receiving the aggregated artifacts
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Version of the extension release that shipped the base rules
    #[arg(long)]
    sites_version: Option<String>,
    /// Version declared by the remote repository manifest
    #[arg(long)]
    manifest_version: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = logging::init_tracing(cli.log_level.as_deref()) {
        eprintln!("failed to initialise tracing: {err}");
    }

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            output::print_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    match cli.command {
        Commands::Aggregate(args) => {
            let config = RulesetConfig::from_env()?;
            let request = AggregateRequest {
                base: args.base,
                updated: args.updated,
                custom: args.custom,
                out_dir: args.out_dir,
                sites_version: args.sites_version,
                manifest_version: args.manifest_version,
            };
            let summary = commands::aggregate(&request, &config)?;
            output::print_aggregate_summary(&summary);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Highest { versions } => match commands::highest(&versions) {
            Some(version) => {
                println!("{}", version);
                Ok(ExitCode::SUCCESS)
            }
            None => {
                output::print_warning("no usable version supplied");
                Ok(ExitCode::FAILURE)
            }
        },
        Commands::Version => {
            println!("Bypass ruleset v{}", env!("CARGO_PKG_VERSION"));
            println!("Layered rule aggregation with JSON and YAML export");
            Ok(ExitCode::SUCCESS)
        }
    }
}
