//! CLI subcommand argument definitions and implementations.
pub mod run;
pub mod validate;

use clap::Args;

/// Arguments for the `validate` subcommand.
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Print the resolved configuration after a successful validation
    #[arg(long)]
    pub show: bool,
}

/// Arguments for the `run` subcommand.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to the agent profile ingest file: a Twitter-mode CSV when
    /// `clock_mode` is `tick`, a Reddit-mode JSON array when it is `scaled`
    #[arg(long)]
    pub profiles: String,

    /// Number of timesteps to run
    #[arg(long, default_value = "10")]
    pub ticks: u64,

    /// Cap the number of agents loaded from the profile file (0 = no cap)
    #[arg(long, default_value = "0")]
    pub max_agents: usize,
}
