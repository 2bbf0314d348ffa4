use anyhow::Result;
use std::io;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// Builds the filter. Precedence: `-q`, then `-v`/`-vv`, then `RUST_LOG`,
/// then `level` (from `--log-level` or the config file).
fn build_filter(verbose_level: u8, quiet: bool, level: &str) -> Result<EnvFilter> {
    let level: LevelFilter = level
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid log level: {}. Use error, warn, info, debug or trace", level))?;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose_level > 0 {
        let filter_str = match verbose_level {
            // -v: debug, minus hyper's per-connection chatter
            1 => "debug,hyper::proto::h1=warn,hyper::client::pool=warn",
            _ => "trace",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()))
    };
    Ok(filter)
}

/// Structured JSON when stdout is not a terminal, unless `RUST_LOG_JSON` says otherwise
fn use_json() -> bool {
    std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or_else(|_| !io::stdout().is_terminal())
}

pub fn init_logging_with_file(verbose_level: u8, quiet: bool, level: &str, log_file: Option<PathBuf>) -> Result<()> {
    let filter = build_filter(verbose_level, quiet, level)?;
    let json = use_json();

    let stderr_layer = if json {
        fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr)
            .boxed()
    };

    // The file gets every event the filter lets through, next to stderr
    let file_layer = match log_file {
        Some(log_path) => {
            let log_dir = match log_path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            std::fs::create_dir_all(&log_dir)?;

            let log_filename = log_path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow::anyhow!("Invalid log filename: {}", log_path.display()))?;

            // "playtally.log" rotates to playtally.2026-10-19 and so on
            let log_prefix = log_filename.rsplitn(2, '.').nth(1).unwrap_or(log_filename);
            let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, log_prefix);

            let layer = if json {
                fmt::layer()
                    .json()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(file_appender)
                    .boxed()
            } else {
                fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(file_appender)
                    .boxed()
            };
            Some(layer)
        }
        None => None,
    };

    Registry::default()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
