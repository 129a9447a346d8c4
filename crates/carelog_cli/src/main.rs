//! CareLog CLI
//!
//! Command-line tools for a CareLog store.
//!
//! # Commands
//!
//! - `export` - Write an encrypted backup file
//! - `import` - Merge an encrypted backup file into the store
//! - `csv` - Write one text table per non-empty collection
//! - `inspect` - Display record counts and schema version

mod commands;

use carelog_core::CoreError;
use clap::{Parser, Subcommand};
use commands::inspect::OutputFormat;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// CareLog command-line tools.
#[derive(Parser)]
#[command(name = "carelog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long, env = "CARELOG_PATH")]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an encrypted backup of every collection
    Export {
        /// Backup file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Environment variable holding the passphrase
        #[arg(long, default_value = "CARELOG_PASSPHRASE")]
        passphrase_env: String,

        /// Read all collections under one lock
        #[arg(long)]
        consistent: bool,
    },

    /// Merge an encrypted backup into the store
    Import {
        /// Backup file to read
        #[arg(short, long)]
        input: PathBuf,

        /// Environment variable holding the passphrase
        #[arg(long, default_value = "CARELOG_PASSPHRASE")]
        passphrase_env: String,
    },

    /// Write `<collection>.csv` for each non-empty collection
    Csv {
        /// Directory to write the tables into
        #[arg(short, long)]
        output_dir: PathBuf,
    },

    /// Display record counts and schema version
    Inspect {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(err.as_ref());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Export {
            output,
            passphrase_env,
            consistent,
        } => {
            let path = cli.path.ok_or("Store path required for export")?;
            commands::backup::export(&path, &output, &passphrase_env, consistent).await?;
        }
        Commands::Import {
            input,
            passphrase_env,
        } => {
            let path = cli.path.ok_or("Store path required for import")?;
            commands::backup::import(&path, &input, &passphrase_env).await?;
        }
        Commands::Csv { output_dir } => {
            let path = cli.path.ok_or("Store path required for csv")?;
            commands::csv::run(&path, &output_dir).await?;
        }
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, format).await?;
        }
        Commands::Version => {
            println!("CareLog CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("CareLog Core v{}", carelog_core::VERSION);
            println!("Store schema v{}", carelog_core::SCHEMA_VERSION);
        }
    }

    Ok(())
}

/// Prints a failure without leaking why a backup could not be opened.
fn report(err: &(dyn std::error::Error + 'static)) {
    match err.downcast_ref::<CoreError>() {
        Some(core) => {
            tracing::debug!(error = %core, "command failed");
            eprintln!("Error: {}", core.user_message());
        }
        None => eprintln!("Error: {err}"),
    }
}
