use crate::aggregate::{aggregate_movies, aggregate_series};
use crate::availability::{resolve_availability, AvailabilityProgress, NoProgress};
use crate::completion::DEFAULT_WATCHED_THRESHOLD;
use crate::export::{write_json, write_movies_csv, write_series_csv};
use crate::timing::format_elapsed;
use anyhow::Context;
use playtally_models::{ExportKind, MediaKind, MovieSummary, ShowSummary};
use playtally_sources::{fetch_history, resolve_user, SourceError, TautulliApi, DEFAULT_PAGE_SIZE};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// What to export and where to put it
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub user: String,
    pub kind: ExportKind,
    pub watched_threshold: f64,
    pub page_size: usize,
    pub series_csv: PathBuf,
    pub movies_csv: PathBuf,
    pub json: Option<PathBuf>,
}

impl ExportOptions {
    /// Defaults for `user`: both branches, CSVs named after the user in the
    /// working directory, no JSON
    pub fn new(user: impl Into<String>) -> Self {
        let user = user.into();
        Self {
            series_csv: default_series_path(&user),
            movies_csv: default_movies_path(&user),
            user,
            kind: ExportKind::Both,
            watched_threshold: DEFAULT_WATCHED_THRESHOLD,
            page_size: DEFAULT_PAGE_SIZE,
            json: None,
        }
    }
}

pub fn default_series_path(user: &str) -> PathBuf {
    PathBuf::from(format!("watched_series_{}.csv", user))
}

pub fn default_movies_path(user: &str) -> PathBuf {
    PathBuf::from(format!("watched_movies_{}.csv", user))
}

/// How one output branch of a run ended
#[derive(Debug)]
pub enum BranchOutcome {
    Skipped,
    Written { path: PathBuf, rows: usize },
    Failed(anyhow::Error),
}

impl BranchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, BranchOutcome::Failed(_))
    }
}

#[derive(Debug)]
pub struct ExportReport {
    pub user_id: i64,
    pub series: BranchOutcome,
    pub movies: BranchOutcome,
    pub json: BranchOutcome,
    pub duration: Duration,
}

/// Runs one export: resolve the user, then each requested branch in turn
/// (fetch, aggregate, enrich, write), then the optional JSON document.
///
/// Only a failed user lookup aborts the run. A failing branch is logged and
/// reported; the other branch and the JSON export still run with whatever
/// rows exist.
pub struct ExportOrchestrator<'a> {
    api: &'a dyn TautulliApi,
    options: ExportOptions,
    progress: &'a dyn AvailabilityProgress,
}

impl<'a> ExportOrchestrator<'a> {
    pub fn new(api: &'a dyn TautulliApi, options: ExportOptions) -> Self {
        Self {
            api,
            options,
            progress: &NoProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn AvailabilityProgress) -> Self {
        self.progress = progress;
        self
    }

    pub async fn run(&self) -> Result<ExportReport, SourceError> {
        let started = Instant::now();
        info!("Starting export for user '{}'", self.options.user);

        let phase = Instant::now();
        let user_id = resolve_user(self.api, &self.options.user).await?;
        info!("User resolved in {}", format_elapsed(phase.elapsed()));

        let mut series_rows = Vec::new();
        let series = if self.options.kind.includes_series() {
            match self.export_series(user_id, &mut series_rows).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Series export failed: {:#}", e);
                    BranchOutcome::Failed(e)
                }
            }
        } else {
            BranchOutcome::Skipped
        };

        let mut movie_rows = Vec::new();
        let movies = if self.options.kind.includes_movies() {
            match self.export_movies(user_id, &mut movie_rows).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Movie export failed: {:#}", e);
                    BranchOutcome::Failed(e)
                }
            }
        } else {
            BranchOutcome::Skipped
        };

        let json = match &self.options.json {
            None => BranchOutcome::Skipped,
            Some(path) => match write_json(path, &self.options.user, &series_rows, &movie_rows) {
                Ok(()) => {
                    info!("JSON exported: {}", path.display());
                    BranchOutcome::Written {
                        path: path.clone(),
                        rows: series_rows.len() + movie_rows.len(),
                    }
                }
                Err(e) => {
                    error!("JSON export failed: {}", e);
                    BranchOutcome::Failed(anyhow::Error::new(e).context(format!("writing {}", path.display())))
                }
            },
        };

        let duration = started.elapsed();
        info!("Finished in {}", format_elapsed(duration));
        Ok(ExportReport {
            user_id,
            series,
            movies,
            json,
            duration,
        })
    }

    /// Rows land in `rows` as soon as they exist so the JSON export can use
    /// them even when a later step of this branch fails
    async fn export_series(&self, user_id: i64, rows: &mut Vec<ShowSummary>) -> anyhow::Result<BranchOutcome> {
        let phase = Instant::now();
        let history = fetch_history(self.api, user_id, MediaKind::Episode, self.options.page_size)
            .await
            .context("fetching episode history")?;
        info!("Episode history loaded in {}", format_elapsed(phase.elapsed()));

        let phase = Instant::now();
        *rows = aggregate_series(&history, self.options.watched_threshold);
        info!(
            "Series aggregated in {} ({} shows)",
            format_elapsed(phase.elapsed()),
            rows.len()
        );

        let phase = Instant::now();
        resolve_availability(self.api, rows, self.progress).await;
        info!("Available episodes resolved in {}", format_elapsed(phase.elapsed()));

        let path = &self.options.series_csv;
        write_series_csv(path, rows).with_context(|| format!("writing {}", path.display()))?;
        info!("Series CSV: {} ({} shows)", path.display(), rows.len());

        Ok(BranchOutcome::Written {
            path: path.clone(),
            rows: rows.len(),
        })
    }

    async fn export_movies(&self, user_id: i64, rows: &mut Vec<MovieSummary>) -> anyhow::Result<BranchOutcome> {
        let phase = Instant::now();
        let history = fetch_history(self.api, user_id, MediaKind::Movie, self.options.page_size)
            .await
            .context("fetching movie history")?;
        info!("Movie history loaded in {}", format_elapsed(phase.elapsed()));

        let phase = Instant::now();
        *rows = aggregate_movies(&history, self.options.watched_threshold);
        info!(
            "Movies aggregated in {} ({} movies)",
            format_elapsed(phase.elapsed()),
            rows.len()
        );

        let path = &self.options.movies_csv;
        write_movies_csv(path, rows).with_context(|| format!("writing {}", path.display()))?;
        info!("Movie CSV: {} ({} movies)", path.display(), rows.len());

        Ok(BranchOutcome::Written {
            path: path.clone(),
            rows: rows.len(),
        })
    }
}
