use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jira2sheets::config::{self, DEFAULT_CONFIG_PATH};
use jira2sheets::credentials::Credentials;
use jira2sheets::import;
use jira2sheets::io::jira::DEFAULT_PAGE_SIZE;
use jira2sheets::{Result, ToolError};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Import(args) => execute_import(args),
    }
}

fn execute_import(args: ImportArgs) -> Result<()> {
    init_logging(args.verbose)?;
    debug!(config = %args.config.display(), "config path");

    let config = config::read_config(&args.config)?;
    debug!(
        spreadsheets = config.spreadsheets.len(),
        active_sprints = config.active_sprints().is_some(),
        "configuration loaded"
    );
    let credentials = Credentials::resolve(
        args.jira_pat.as_deref(),
        args.google_credentials_json.as_deref(),
    )?;

    let summary = import::import(&config, &credentials, args.page_size as usize)?;
    info!(
        sheets_written = summary.sheets_written,
        rows_written = summary.rows_written,
        "done"
    );
    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ToolError::Logging(err.to_string()))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Export JIRA filters into Google Sheets tabs."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one or more JIRA filters into Google Sheets.
    Import(ImportArgs),
}

#[derive(clap::Args)]
struct ImportArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Personal access token for JIRA.
    #[arg(long, env = "JIRA2SHEETS_JIRA_PAT", hide_env_values = true)]
    jira_pat: Option<String>,

    /// Google service-account key JSON, or an access token (raw or as `access_token` JSON).
    #[arg(
        long,
        env = "JIRA2SHEETS_GOOGLE_CREDENTIALS_JSON",
        hide_env_values = true
    )]
    google_credentials_json: Option<String>,

    /// Issues requested per export page.
    #[arg(
        long,
        default_value_t = DEFAULT_PAGE_SIZE as u32,
        value_parser = clap::value_parser!(u32).range(1..=1000)
    )]
    page_size: u32,
}
