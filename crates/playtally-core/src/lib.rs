pub mod aggregate;
pub mod availability;
pub mod completion;
pub mod export;
pub mod pipeline;
pub mod timing;

pub use aggregate::{aggregate_movies, aggregate_series, MovieFold, SeriesFold};
pub use availability::{apply_availability, available_episode_count, resolve_availability, AvailabilityOrigin, AvailabilityProgress, EpisodeAvailability, NoProgress};
pub use completion::{is_watched, percent_complete, DEFAULT_WATCHED_THRESHOLD};
pub use export::{write_json, write_movies_csv, write_series_csv, ExportError, MOVIE_COLUMNS, SERIES_COLUMNS};
pub use pipeline::{BranchOutcome, ExportOptions, ExportOrchestrator, ExportReport};
pub use timing::format_elapsed;
