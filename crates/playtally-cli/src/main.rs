use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::{config, export};
use playtally_config::{Config, PathManager};
use playtally_models::ExportKind;
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "playtally")]
#[command(about = "PlayTally - Export a Tautulli user's watch history as per-show and per-movie summaries")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format for the run summary
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export watch history to CSV (and optionally JSON)
    #[command(long_about = "Resolve the user, page through their Tautulli history and write one row per show and one row per movie. Flags override values from the config file.")]
    Export(ExportArgs),
    /// Show or change stored settings
    #[command(long_about = "Manage the config file and the stored Tautulli API key. Settings saved here become the defaults for 'playtally export'.")]
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Args)]
pub struct ExportArgs {
    /// Tautulli base URL, e.g. http://localhost:8181
    #[arg(long)]
    url: Option<String>,

    /// Tautulli API key (falls back to the credentials file, then a prompt)
    #[arg(long)]
    apikey: Option<String>,

    /// Username or friendly name to export
    #[arg(long)]
    user: Option<String>,

    /// Which history to export: series, movies or both
    #[arg(long, value_name = "KIND")]
    export: Option<ExportKind>,

    /// Series CSV path [default: watched_series_<user>.csv]
    #[arg(long, value_name = "PATH")]
    out_series: Option<PathBuf>,

    /// Movie CSV path [default: watched_movies_<user>.csv]
    #[arg(long, value_name = "PATH")]
    out_movies: Option<PathBuf>,

    /// Also write series and movies to one JSON file
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Percent complete at which a play counts as watched [default: 85]
    #[arg(long, value_name = "PERCENT")]
    watched_threshold: Option<f64>,

    /// History rows requested per page [default: 1000]
    #[arg(long, value_name = "ROWS")]
    page_size: Option<usize>,

    /// HTTP timeout in seconds [default: 30]
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Also write logs to this file, rotated daily
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks the API key)
    #[command(long_about = "Display the effective configuration and where it is stored. The API key is masked unless --full is given.")]
    Show {
        /// Show the API key unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Change stored settings
    #[command(long_about = "Update values in the config file. Pass --apikey without a value to be prompted for the key instead of leaving it in shell history.")]
    Set {
        /// Tautulli base URL
        #[arg(long)]
        url: Option<String>,

        /// Tautulli API key (prompts when given without a value)
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        apikey: Option<String>,

        /// Default user to export
        #[arg(long)]
        user: Option<String>,

        /// Default export selection: series, movies or both
        #[arg(long, value_name = "KIND")]
        export: Option<ExportKind>,

        /// Default watched threshold
        #[arg(long, value_name = "PERCENT")]
        watched_threshold: Option<f64>,

        /// Default history page size
        #[arg(long, value_name = "ROWS")]
        page_size: Option<usize>,

        /// Default HTTP timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Default log level
        #[arg(long, value_name = "LEVEL")]
        log_level: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let paths = PathManager::new().map_err(|e| eyre!("{}", e))?;
    let config_file = paths.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    let (log_level, log_file) = match &cli.command {
        Commands::Export(args) => (args.log_level.clone(), args.log_file.clone()),
        Commands::Config { .. } => (None, None),
    };
    let log_level = log_level.unwrap_or_else(|| config.logging.level.clone());
    logging::init_logging_with_file(cli.verbose, cli.quiet, &log_level, log_file)
        .map_err(|e| eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Export(args) => export::run_export(args, config, &paths, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, config, &paths, &output),
    }
}
