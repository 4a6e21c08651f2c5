//! # Quotation Studio CLI Library
//!
//! Argument parsing, startup and output for the `quote` binary.
//!
//! ## Module Organization
//! ```text
//! quote_cli_lib/
//! ├── lib.rs          ◄─── You are here (CLI setup & run)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── document.rs ◄─── Working document (Arc<Mutex>)
//! │   └── config.rs   ◄─── Configuration state
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── document.rs ◄─── new / totals / apply
//! │   └── export.rs   ◄─── export to PDF
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod error;
pub mod state;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, Subscriber};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use error::ApiError;
use state::{ConfigState, DocumentState};

/// Quotation documents: totals and paginated export.
#[derive(Debug, Parser)]
#[command(name = "quote", version, about)]
pub struct Cli {
    /// Config file (defaults to config.toml in the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a starter document as JSON
    New {
        /// Quotation date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print the recomputed totals of a document
    Totals {
        /// Document JSON file
        document: PathBuf,
    },
    /// Apply actions to a document and print the result
    Apply {
        /// Document JSON file
        document: PathBuf,
        /// JSON file with one action or an array of actions
        actions: PathBuf,
    },
    /// Export a rendered document to a paginated PDF
    Export {
        /// Document JSON file
        document: PathBuf,
        /// Rendered document image (PNG or JPEG)
        #[arg(long)]
        surface: PathBuf,
        /// Output filename, defaults to <prefix>-<quotation id>.pdf
        #[arg(long)]
        filename: Option<String>,
    },
}

/// Runs the CLI.
///
/// ## Startup Sequence
/// 1. Initialize logging (stderr, so stdout stays clean JSON)
/// 2. Parse arguments
/// 3. Load configuration (export only)
/// 4. Run the command and print its JSON result
pub async fn run() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match execute(cli).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(code = ?e.code, "Command failed: {}", e.message);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs one parsed command and returns what should be printed.
pub async fn execute(cli: Cli) -> Result<String, ApiError> {
    match cli.command {
        Command::New { date } => {
            let today = date.unwrap_or_else(|| Local::now().date_naive());
            to_json(&commands::document::new_document(today))
        }
        Command::Totals { document } => {
            let doc = commands::document::load_document(&document).await?;
            let state = DocumentState::new(doc);
            to_json(&commands::document::get_totals(&state)?)
        }
        Command::Apply { document, actions } => {
            let doc = commands::document::load_document(&document).await?;
            let json = tokio::fs::read_to_string(&actions).await?;
            let actions = commands::document::parse_actions(&json)?;
            let state = DocumentState::new(doc);
            to_json(&commands::document::apply_actions(&state, actions)?)
        }
        Command::Export {
            document,
            surface,
            filename,
        } => {
            let config = ConfigState::load(cli.config)?;
            info!(
                output_dir = %config.output.directory.display(),
                "Configuration loaded"
            );
            let doc = commands::document::load_document(&document).await?;
            let state = DocumentState::new(doc);
            let report =
                commands::export::export_document(&state, &config, &surface, filename).await?;
            to_json(&report)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::internal(format!("cannot serialize output: {}", e)))
}

const DEFAULT_LOG_FILTER: &str = "info,quote_core=debug,quote_export=debug,quote_cli_lib=debug";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=quote_export=trace` - Trace the export pipeline only
/// - Default: INFO, DEBUG for the quote crates
fn init_tracing() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    subscriber(log_filter(directives.as_deref())).init();
}

/// `RUST_LOG`-style directives, falling back to the default when absent or
/// unparseable.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Formatting subscriber on stderr. The filter is the only level control.
fn subscriber(filter: EnvFilter) -> impl Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}
