use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Seeded, branchable Markov chain trajectories.
#[derive(Parser)]
#[command(
    name = "markovtool",
    version,
    about = "Seeded, branchable Markov chain trajectories"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Walk a chain, branch it and report the distinct trajectories.
    Simulate(SimulateArgs),
    /// Write a random chain description as JSON.
    Generate(GenerateArgs),
    /// Estimate a chain from an observed state sequence.
    Fit(FitArgs),
}

/// Arguments for the `simulate` subcommand.
#[derive(clap::Args)]
pub struct SimulateArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "markovtool.toml")]
    pub config: PathBuf,

    /// Override report output path from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override chain seed from config.
    #[arg(short, long)]
    pub seed: Option<u64>,
}

/// Arguments for the `generate` subcommand.
#[derive(clap::Args)]
pub struct GenerateArgs {
    /// Number of states.
    #[arg(short, long)]
    pub dimension: usize,

    /// Seed for the matrix and for trajectories of the written chain.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Fixed initial state; uniform if omitted.
    #[arg(short, long)]
    pub initial: Option<usize>,

    /// Path for the JSON description.
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Arguments for the `fit` subcommand.
#[derive(clap::Args)]
pub struct FitArgs {
    /// Text file of state indices separated by whitespace or commas.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Number of states.
    #[arg(short, long)]
    pub dimension: usize,

    /// Dirichlet smoothing strength.
    #[arg(long, default_value_t = 1.0)]
    pub alpha: f64,

    /// Seed stored in the fitted description.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Start trajectories in the first observed state.
    #[arg(long)]
    pub initial_from_data: bool,

    /// Path for the JSON description.
    #[arg(short, long)]
    pub output: PathBuf,
}
