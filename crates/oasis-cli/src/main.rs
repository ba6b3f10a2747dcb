//! oasis CLI - discrete-time social-media agent simulator.
//!
//! Entry point for the `oasis` binary. Parses CLI arguments, initializes
//! logging, and dispatches to subcommand handlers.
mod commands;

use clap::Parser;
use oasis_core::config::Config;
use tracing_subscriber::EnvFilter;

/// Discrete-time social-media agent simulator
#[derive(Parser)]
#[command(name = "oasis")]
#[command(version)]
#[command(about = "Discrete-time social-media agent simulator")]
#[command(after_help = "\
Quick start:
  1. oasis validate -c config.toml                            — check a configuration file
  2. oasis run -c config.toml --profiles agents.csv --ticks 50 — run a simulation")]
struct Cli {
    /// Path to config.toml
    #[arg(short = 'c', long, global = true, default_value = "~/.oasis/config.toml")]
    config: String,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Check a configuration file for validity
    Validate(commands::ValidateArgs),
    /// Run a simulation from a configuration and a profile ingest file
    Run(commands::RunArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose/--quiet flags > default (info).
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("oasis=debug,oasis_core=debug,info")
    } else if cli.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::new("oasis=info,oasis_core=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.verbose)
        .compact()
        .init();

    // `validate` manages its own config lifecycle so it can report every
    // validation error at once instead of failing on the first one.
    if let Commands::Validate(args) = cli.command {
        return commands::validate::execute(&cli.config, args.show);
    }

    let config = Config::load(Some(&cli.config)).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load configuration: {e}\n\
             Hint: pass --config to point at a config.toml, or run 'oasis validate -c <path>' to see why it's rejected."
        )
    })?;
    config.validate().map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::anyhow!("Configuration failed validation:\n  - {}", messages.join("\n  - "))
    })?;

    match cli.command {
        Commands::Validate(_) => unreachable!(),
        Commands::Run(args) => {
            commands::run::execute(&config, &args).await?;
        }
    }

    Ok(())
}
