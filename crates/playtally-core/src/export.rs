use playtally_models::{MovieSummary, ShowSummary};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

pub const SERIES_COLUMNS: [&str; 8] = [
    "show_title",
    "unique_episodes_watched",
    "episodes_partial",
    "available_episodes",
    "percent_watched_show",
    "avg_episode_percent",
    "first_watched",
    "last_watched",
];

pub const MOVIE_COLUMNS: [&str; 9] = [
    "movie_title",
    "year",
    "plays",
    "max_percent",
    "avg_percent",
    "last_percent",
    "completed_any",
    "first_watched",
    "last_watched",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Series CSV layout, in `SERIES_COLUMNS` order
#[derive(Serialize)]
struct SeriesCsvRow<'a> {
    show_title: &'a str,
    unique_episodes_watched: usize,
    episodes_partial: usize,
    available_episodes: u64,
    percent_watched_show: Option<f64>,
    avg_episode_percent: f64,
    first_watched: &'a str,
    last_watched: &'a str,
}

impl<'a> From<&'a ShowSummary> for SeriesCsvRow<'a> {
    fn from(row: &'a ShowSummary) -> Self {
        Self {
            show_title: &row.title,
            unique_episodes_watched: row.unique_episodes_watched,
            episodes_partial: row.episodes_partial,
            available_episodes: row.available_episodes,
            percent_watched_show: row.percent_watched_show,
            avg_episode_percent: row.avg_percent,
            first_watched: &row.first_watched,
            last_watched: &row.last_watched,
        }
    }
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    user: &'a str,
    series: &'a [ShowSummary],
    movies: &'a [MovieSummary],
}

/// Write the series CSV. The header row is written even with no rows.
pub fn write_series_csv(path: &Path, rows: &[ShowSummary]) -> Result<(), ExportError> {
    write_csv(path, &SERIES_COLUMNS, rows.iter().map(SeriesCsvRow::from))
}

/// Write the movie CSV. The header row is written even with no rows.
pub fn write_movies_csv(path: &Path, rows: &[MovieSummary]) -> Result<(), ExportError> {
    write_csv(path, &MOVIE_COLUMNS, rows.iter())
}

/// Write `{ "user", "series", "movies" }` as pretty printed JSON
pub fn write_json(path: &Path, user: &str, series: &[ShowSummary], movies: &[MovieSummary]) -> Result<(), ExportError> {
    let document = ExportDocument { user, series, movies };
    write_atomically(path, |file| {
        serde_json::to_writer_pretty(&mut *file, &document)?;
        file.write_all(b"\n")?;
        Ok(())
    })
}

fn write_csv<I, R>(path: &Path, columns: &[&str], rows: I) -> Result<(), ExportError>
where
    I: IntoIterator<Item = R>,
    R: Serialize,
{
    write_atomically(path, |file| {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(columns)?;
        let mut count = 0usize;
        for row in rows {
            writer.serialize(row)?;
            count += 1;
        }
        writer.flush()?;
        debug!("Wrote {} rows to {}", count, path.display());
        Ok(())
    })
}

/// Write into a temp file beside `path` and move it into place only once
/// everything was written, so a failed export never leaves a truncated file.
fn write_atomically<F>(path: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut NamedTempFile) -> Result<(), ExportError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    write(&mut file)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| ExportError::Io(e.error))?;
    Ok(())
}
