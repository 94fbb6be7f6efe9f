//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// dbwarden - versioned SQL migrations with a ledger and a lock row
#[derive(Parser, Debug)]
#[command(name = "dbwarden")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress progress bars and informational output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the database path from the config file
    #[arg(short, long, global = true, env = "DBWARDEN_DATABASE")]
    pub database: Option<String>,

    /// Override the database schema from the config file
    #[arg(short, long, global = true, env = "DBWARDEN_SCHEMA")]
    pub schema: Option<String>,

    /// Seconds to wait for the migration lock
    #[arg(long, global = true)]
    pub lock_timeout: Option<u64>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the migrations directory and a config file
    Init(InitArgs),

    /// Create a new migration file
    New(NewArgs),

    /// Apply pending migrations
    Migrate(RangeArgs),

    /// Revert applied migrations
    Rollback(RangeArgs),

    /// Show applied and pending migrations
    Status(OutputArgs),

    /// Show the full migration ledger
    History(OutputArgs),

    /// Check applied migrations against the files on disk
    Verify(OutputArgs),

    /// Show whether the migration lock is held
    LockStatus(OutputArgs),

    /// Force-release the migration lock
    Unlock,
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Database path written into the generated config
    #[arg(long, default_value = "warden.duckdb")]
    pub database_path: String,

    /// Only create the migrations directory
    #[arg(long)]
    pub no_config: bool,
}

/// Arguments for the new command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Short description, used in the filename
    pub description: String,

    /// Explicit version (default: next free major version)
    #[arg(long = "version", value_name = "VERSION", conflicts_with = "repeatable")]
    pub at_version: Option<String>,

    /// Create a repeatable migration instead of a versioned one
    #[arg(long, value_enum)]
    pub repeatable: Option<RepeatableKind>,
}

/// Repeatable migration kinds selectable from the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatableKind {
    /// Runs on every unbounded migrate
    Always,
    /// Runs when the file's checksum changes
    OnChange,
}

/// Bounds shared by migrate and rollback
#[derive(Args, Debug)]
pub struct RangeArgs {
    /// Number of versions to process
    #[arg(short = 'n', long, conflicts_with = "to_version")]
    pub count: Option<usize>,

    /// Process versions up to and including this one
    #[arg(short = 't', long)]
    pub to_version: Option<String>,
}

/// Arguments for read-only reporting commands
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Report output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned text columns
    Table,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
