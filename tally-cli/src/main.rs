//! Tally CLI - Bulk transaction migration in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{balance, logs, migrate, status};

/// Tally - bulk transaction migration and balance queries
#[derive(Parser)]
#[command(name = "tally", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate transactions from a CSV file
    Migrate {
        /// Path to CSV file with header id,user_id,amount,datetime
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a user's balance summary
    Balance {
        /// User ID to aggregate
        user_id: i64,
        /// RFC3339 lower bound (must end with Z)
        #[arg(long)]
        from: Option<String>,
        /// RFC3339 upper bound (must end with Z)
        #[arg(long)]
        to: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show stored transaction summary
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recent operational log entries
    Logs {
        /// Maximum entries to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Migrate { file, json } => migrate::run(&file, json),
        Commands::Balance {
            user_id,
            from,
            to,
            json,
        } => balance::run(user_id, from.as_deref(), to.as_deref(), json),
        Commands::Status { json } => status::run(json),
        Commands::Logs { limit, json } => logs::run(limit, json),
    }
}
