//! Bookshop CLI - Browse the catalog, fill a basket and check out.
//!
//! # Usage
//!
//! ```bash
//! # Interactive shell (default)
//! bookshop --catalog books.json
//!
//! # Replay a script of shell commands
//! bookshop run order.txt
//!
//! # One-off catalog queries
//! bookshop search rust
//! bookshop show zyTCAlFPjgYC
//! ```
//!
//! Type `help` in the shell for the list of commands.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;

use bookshop_cli::{CliConfig, JsonCatalog, LogFormat, ShellCommand, Storefront};
use bookshop_core::SearchState;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bookshop")]
#[command(author, version, about = "Bookshop terminal storefront")]
struct Cli {
    /// JSON catalog file (overrides `BOOKSHOP_CATALOG_PATH`)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive shell
    Shell,
    /// Run shell commands from a file
    Run {
        /// Script with one command per line
        file: PathBuf,
    },
    /// Search the catalog and print the first page
    Search {
        /// Search terms
        terms: Vec<String>,
    },
    /// Show one book
    Show {
        /// Book ID
        id: String,
    },
}

fn init_tracing(format: LogFormat) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bookshop_cli=info,bookshop_core=info".into());

    // Logs go to stderr so they never interleave with shell output
    let json = (format == LogFormat::Json)
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(io::stderr));
    let pretty = (format == LogFormat::Pretty)
        .then(|| tracing_subscriber::fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(pretty)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let config = match CliConfig::from_env(cli.catalog.clone()) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::default());
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(config.log_format);

    if let Err(e) = run(cli, &config) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: &CliConfig) -> bookshop_cli::Result<()> {
    let catalog = JsonCatalog::open(&config.catalog_path, config.currency)?;
    let search = SearchState::new(&config.default_query, config.page_size);
    let mut storefront = Storefront::new(catalog, search, config.currency);
    let mut out = io::stdout().lock();

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            let stdin = io::stdin();
            let prompt = stdin.is_terminal();
            tracing::info!(catalog = %config.catalog_path.display(), "Shell started");
            storefront.run(stdin.lock(), &mut out, prompt)?;
        }
        Commands::Run { file } => {
            let script = BufReader::new(File::open(&file)?);
            tracing::info!(script = %file.display(), "Running script");
            storefront.run(script, &mut out, false)?;
        }
        Commands::Search { terms } => {
            storefront.execute(ShellCommand::Search { terms }, &mut out)?;
        }
        Commands::Show { id } => {
            storefront.execute(ShellCommand::Show { id }, &mut out)?;
        }
    }
    Ok(())
}
