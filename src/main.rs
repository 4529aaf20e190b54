//! mailsweep CLI: scan an inbox for promotional mail, unsubscribe, delete.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use mailsweep::{ScanOptions, Sweeper};

#[derive(Parser)]
#[command(name = "mailsweep", version, about = "Inbox cleaner for promotional mail")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the inbox and list promotional senders.
    Scan {
        /// Account address, e.g. me@gmail.com.
        account: String,

        /// How many days back to search.
        #[arg(long, default_value = "30")]
        days: u32,

        /// Examine at most this many of the most recent messages.
        #[arg(long, default_value = "500")]
        limit: usize,

        /// Write a JSON report to this path.
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Scan, then unsubscribe from and/or delete what was found.
    Clean {
        /// Account address, e.g. me@gmail.com.
        account: String,

        /// How many days back to search.
        #[arg(long, default_value = "30")]
        days: u32,

        /// Examine at most this many of the most recent messages.
        #[arg(long, default_value = "500")]
        limit: usize,

        /// Visit every harvested unsubscribe link.
        #[arg(long)]
        unsubscribe: bool,

        /// Delete the promotional messages.
        #[arg(long)]
        delete: bool,

        /// Write a JSON report to this path.
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut progress = |text: &str, percent: u8| println!("[{percent:>3}%] {text}");

    match cli.command {
        Commands::Scan {
            account,
            days,
            limit,
            report,
        } => {
            let password = password_from_env()?;
            let options = ScanOptions {
                window_days: days,
                max_messages: limit,
            };

            let mut sweeper = Sweeper::new();
            sweeper.connect(&account, &password)?;
            let result = sweeper.scan(&options, &mut progress)?;

            println!(
                "{} promotional messages from {} senders",
                result.messages.len(),
                result.unique_senders()
            );
            for (address, count) in result.ranked_senders().into_iter().take(10) {
                println!("{count:>5}  {address}");
            }

            if let Some(path) = report {
                write_report(&sweeper, &path)?;
            }
            sweeper.disconnect();
        }

        Commands::Clean {
            account,
            days,
            limit,
            unsubscribe,
            delete,
            report,
        } => {
            let password = password_from_env()?;
            let options = ScanOptions {
                window_days: days,
                max_messages: limit,
            };

            let mut sweeper = Sweeper::new();
            sweeper.connect(&account, &password)?;
            let result = sweeper.scan(&options, &mut progress)?;
            println!(
                "{} promotional messages from {} senders",
                result.messages.len(),
                result.unique_senders()
            );

            if unsubscribe {
                let summary = sweeper.run_unsubscribe(&mut progress)?;
                println!(
                    "unsubscribed from {} of {} lists",
                    summary.succeeded,
                    summary.outcomes.len()
                );
            }

            if delete {
                let (_, summary) = sweeper.delete_scanned()?;
                println!("{summary}");
            }

            if let Some(path) = report {
                write_report(&sweeper, &path)?;
            }
            sweeper.disconnect();
        }
    }

    Ok(())
}

/// The account password comes from the environment, never from argv.
fn password_from_env() -> Result<String> {
    match std::env::var("MAILSWEEP_PASSWORD") {
        Ok(password) if !password.is_empty() => Ok(password),
        _ => miette::bail!(
            "MAILSWEEP_PASSWORD is not set; for Gmail, Yahoo and iCloud use an app-specific password"
        ),
    }
}

fn write_report(sweeper: &Sweeper, path: &Path) -> Result<()> {
    let report = sweeper.report();
    let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
    std::fs::write(path, json).into_diagnostic()?;
    println!("report written to {}", path.display());
    Ok(())
}
