use std::io::{BufRead, Write};
use std::sync::Arc;

use bastille_core::{PruneConfig, RepositoryProvider, services::PrunerService};
use bastille_storage_sqlite::SqliteRepositoryProvider;
use clap::Parser;

/// Command line interface for Bastille
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database connection string
    #[arg(long)]
    db_url: String,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(clap::Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Prune old attempt logs and resolved lock records
    Prune {
        /// Days to retain attempt logs (overrides the default retention)
        #[arg(long)]
        days_logs: Option<i64>,

        /// Days to retain resolved lock records (overrides the default retention)
        #[arg(long)]
        days_locks: Option<i64>,

        /// Prune only attempt logs
        #[arg(long, conflicts_with = "only_locks")]
        only_logs: bool,

        /// Prune only lock records
        #[arg(long)]
        only_locks: bool,

        /// Do not ask for confirmation
        #[arg(long)]
        force: bool,
    },
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let provider = match SqliteRepositoryProvider::connect(&cli.db_url).await {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            eprintln!("Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Migrate => {
            if let Err(e) = provider.migrate().await {
                eprintln!("Migration failed: {e}");
                std::process::exit(1);
            }
            println!("Migrations applied.");
        }
        Commands::Prune {
            days_logs,
            days_locks,
            only_logs,
            only_locks,
            force,
        } => {
            let defaults = PruneConfig::default();
            let config = PruneConfig {
                enabled: true,
                attempt_logs_days: days_logs.unwrap_or(defaults.attempt_logs_days),
                lock_records_days: days_locks.unwrap_or(defaults.lock_records_days),
            };

            println!(
                "Prune configuration: attempt logs = {} days, lock records = {} days",
                config.attempt_logs_days, config.lock_records_days
            );

            if !force && !confirm("Proceed with pruning? This will permanently delete old records.")
            {
                println!("Aborted.");
                return;
            }

            let pruner = PrunerService::new(provider, config);
            let result = if only_logs {
                pruner.prune_attempt_logs().await.map(|deleted| {
                    println!("Pruned {deleted} attempt log entrie(s).");
                })
            } else if only_locks {
                pruner.prune_lock_records().await.map(|deleted| {
                    println!("Pruned {deleted} lock record(s).");
                })
            } else {
                pruner.run().await.map(|report| {
                    println!(
                        "Pruned {} attempt log entrie(s) and {} lock record(s).",
                        report.attempt_logs_deleted, report.lock_records_deleted
                    );
                })
            };

            if let Err(e) = result {
                eprintln!("An error occurred while pruning: {e}");
                std::process::exit(1);
            }
            println!("Pruning complete.");
        }
        Commands::Version => {
            println!("bastille {}", env!("CARGO_PKG_VERSION"));
        }
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }

    matches!(answer.trim(), "y" | "Y" | "yes")
}
