//! sls-tdd - test-driven development for Serverless Framework services
//!
//! Scaffolds tests and function handlers, and runs a service's tests with
//! mocha or jest under each function's environment.

use clap::Parser;
use serverless_tdd::{cli, commands, common::logging};
use commands::Commands;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sls-tdd", about = "Test-driven development for Serverless services")]
#[command(version, long_about = None)]
struct Cli {
    /// Directory holding serverless.yml
    #[arg(long, global = true, default_value = ".")]
    service_dir: PathBuf,

    /// Debug output (same as SLS_DEBUG=1)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.verbose);

    match cli::dispatch(cli.command, &cli.service_dir).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::debug!(category = ?e.category(), "command failed");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
