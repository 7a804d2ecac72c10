use std::path::PathBuf;

use crate::scenario::run_scenario_file;
use crate::server;
use beneficiary_fraud::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Beneficiary Fraud",
    about = "Evaluate identity checks and serve the beneficiary fraud pipeline",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate one identity check described in a JSON scenario file
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON file with the user accounts to load into the in-memory directory
    #[arg(long)]
    pub(crate) users: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Scenario file: users, optional evaluation time and the check to evaluate
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Print the verdict on a single line
    #[arg(long)]
    pub(crate) compact: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => run_scenario_file(&args.input, args.compact),
    }
}
