use super::export_ui::ExportUI;
use super::prompts;
use crate::output::{Output, OutputFormat};
use crate::ExportArgs;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use playtally_config::{Config, CredentialStore, PathManager};
use playtally_core::pipeline::{default_movies_path, default_series_path};
use playtally_core::{format_elapsed, BranchOutcome, ExportOptions, ExportOrchestrator, ExportReport};
use playtally_sources::TautulliHttpClient;
use serde_json::{json, Value};
use std::time::Duration;

/// Layer the command line over the config file. Anything not given on
/// either keeps its built-in default.
fn effective_config(args: &ExportArgs, mut config: Config) -> Config {
    if let Some(url) = &args.url {
        config.server.url = Some(url.clone());
    }
    if let Some(timeout) = args.timeout {
        config.server.timeout_seconds = timeout;
    }
    if let Some(user) = &args.user {
        config.export.user = Some(user.clone());
    }
    if let Some(kind) = args.export {
        config.export.kind = kind;
    }
    if let Some(threshold) = args.watched_threshold {
        config.export.watched_threshold = threshold;
    }
    if let Some(page_size) = args.page_size {
        config.export.page_size = page_size;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    config
}

fn api_key(args: &ExportArgs, paths: &PathManager) -> Result<String> {
    if let Some(key) = args.apikey.as_deref().map(str::trim).filter(|key| !key.is_empty()) {
        return Ok(key.to_string());
    }

    let credentials_file = paths.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store
        .load()
        .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
    if let Some(key) = cred_store.tautulli_api_key() {
        return Ok(key.clone());
    }

    if prompts::can_prompt() {
        let key = prompts::prompt_api_key()?;
        if !key.is_empty() {
            return Ok(key);
        }
    }
    Err(eyre!(
        "No Tautulli API key. Pass --apikey or store one with 'playtally config set --apikey'"
    ))
}

pub async fn run_export(args: ExportArgs, config: Config, paths: &PathManager, output: &Output) -> Result<()> {
    tracing::debug!("Export command started");

    let config = effective_config(&args, config);
    config
        .validate()
        .map_err(|e| eyre!("Configuration validation failed: {}", e))?;

    // validate() guarantees both are set
    let url = config.server.url.clone().unwrap_or_default();
    let user = config.export.user.clone().unwrap_or_default();

    let key = api_key(&args, paths)?;
    let client = TautulliHttpClient::with_timeout(&url, key, Duration::from_secs(config.server.timeout_seconds))
        .map_err(|e| eyre!("Failed to create Tautulli client: {}", e))?;

    let options = ExportOptions {
        kind: config.export.kind,
        watched_threshold: config.export.watched_threshold,
        page_size: config.export.page_size,
        series_csv: args.out_series.clone().unwrap_or_else(|| default_series_path(&user)),
        movies_csv: args.out_movies.clone().unwrap_or_else(|| default_movies_path(&user)),
        json: args.json.clone(),
        user: user.clone(),
    };

    let ui = ExportUI::new(output.is_quiet() || output.format() != OutputFormat::Human);
    let report = ExportOrchestrator::new(&client, options)
        .with_progress(&ui)
        .run()
        .await
        .wrap_err_with(|| format!("Could not resolve user '{}'", user))?;

    print_report(&user, &report, output);
    Ok(())
}

fn print_report(user: &str, report: &ExportReport, output: &Output) {
    match output.format() {
        OutputFormat::Human => {
            print_branch("Series", "shows", &report.series, output);
            print_branch("Movies", "movies", &report.movies, output);
            print_branch("JSON", "rows", &report.json, output);
            output.info(format!("Export for '{}' finished in {}", user, format_elapsed(report.duration)));
        }
        OutputFormat::Json | OutputFormat::JsonPretty => output.json(&report_json(user, report)),
    }
}

fn print_branch(label: &str, unit: &str, outcome: &BranchOutcome, output: &Output) {
    match outcome {
        BranchOutcome::Skipped => {}
        BranchOutcome::Written { path, rows } => {
            output.success(format!("{}: {} ({} {})", label, path.display(), rows, unit));
        }
        BranchOutcome::Failed(e) => output.error(format!("{} export failed: {:#}", label, e)),
    }
}

fn branch_json(outcome: &BranchOutcome) -> Value {
    match outcome {
        BranchOutcome::Skipped => json!({ "status": "skipped" }),
        BranchOutcome::Written { path, rows } => json!({
            "status": "written",
            "path": path.display().to_string(),
            "rows": rows,
        }),
        BranchOutcome::Failed(e) => json!({
            "status": "failed",
            "error": format!("{:#}", e),
        }),
    }
}

fn report_json(user: &str, report: &ExportReport) -> Value {
    let success = [&report.series, &report.movies, &report.json]
        .iter()
        .all(|outcome| !outcome.is_failed());
    json!({
        "success": success,
        "user": user,
        "user_id": report.user_id,
        "series": branch_json(&report.series),
        "movies": branch_json(&report.movies),
        "json": branch_json(&report.json),
        "duration_seconds": report.duration.as_secs_f64(),
        "duration": format_elapsed(report.duration),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn parse_export(args: &[&str]) -> ExportArgs {
        let mut argv = vec!["playtally", "export"];
        argv.extend_from_slice(args);
        match crate::Cli::parse_from(argv).command {
            crate::Commands::Export(args) => args,
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.server.url = Some("http://from-config:8181".to_string());
        config.export.user = Some("config_user".to_string());
        config.export.page_size = 250;

        let args = parse_export(&["--user", "chucknorris99", "--export", "movies", "--watched-threshold", "90"]);
        let effective = effective_config(&args, config);

        assert_eq!(effective.server.url.as_deref(), Some("http://from-config:8181"));
        assert_eq!(effective.export.user.as_deref(), Some("chucknorris99"));
        assert_eq!(effective.export.kind, playtally_models::ExportKind::Movies);
        assert_eq!(effective.export.watched_threshold, 90.0);
        assert_eq!(effective.export.page_size, 250);
    }

    #[test]
    fn test_report_json() {
        let report = ExportReport {
            user_id: 42,
            series: BranchOutcome::Written {
                path: PathBuf::from("watched_series_chuck.csv"),
                rows: 3,
            },
            movies: BranchOutcome::Failed(anyhow::anyhow!("boom")),
            json: BranchOutcome::Skipped,
            duration: Duration::from_secs(125),
        };

        let value = report_json("chuck", &report);
        assert_eq!(value["success"], false);
        assert_eq!(value["user_id"], 42);
        assert_eq!(value["series"]["rows"], 3);
        assert_eq!(value["series"]["path"], "watched_series_chuck.csv");
        assert_eq!(value["movies"]["status"], "failed");
        assert_eq!(value["movies"]["error"], "boom");
        assert_eq!(value["json"]["status"], "skipped");
        assert_eq!(value["duration"], "2m 5s");
    }
}
