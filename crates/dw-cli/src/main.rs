//! dbwarden CLI - versioned SQL migrations with a ledger and a lock row

use anyhow::Result;
use clap::Parser;
use env_logger::Env;

mod cli;
mod commands;
mod context;

use cli::{Cli, Commands};
use commands::common::exit_code_for;
use commands::{history, init, lock, migrate, new, rollback, status, verify};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.global.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    match run(&cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            let message = format!("{err:#}");
            if !message.is_empty() {
                eprintln!("Error: {message}");
            }
            std::process::ExitCode::from(exit_code_for(&err) as u8)
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Init(args) => init::execute(args, &cli.global).await,
        Commands::New(args) => new::execute(args, &cli.global).await,
        Commands::Migrate(args) => migrate::execute(args, &cli.global).await,
        Commands::Rollback(args) => rollback::execute(args, &cli.global).await,
        Commands::Status(args) => status::execute(args, &cli.global).await,
        Commands::History(args) => history::execute(args, &cli.global).await,
        Commands::Verify(args) => verify::execute(args, &cli.global).await,
        Commands::LockStatus(args) => lock::status(args, &cli.global).await,
        Commands::Unlock => lock::unlock(&cli.global).await,
    }
}
