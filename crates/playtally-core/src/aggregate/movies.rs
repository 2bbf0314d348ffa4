use super::{round2, PercentMean, WatchSpan};
use crate::completion::{is_watched, percent_complete};
use playtally_models::{MovieSummary, PlayEvent};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct MovieAccumulator {
    title: String,
    year: String,
    plays: u32,
    mean: PercentMean,
    max_percent: f64,
    last_percent: Option<f64>,
    completed_any: bool,
    span: WatchSpan,
}

impl MovieAccumulator {
    fn record(&mut self, percent: Option<f64>, watched: bool, timestamp: &str) {
        self.plays += 1;
        if let Some(percent) = percent {
            self.mean.add(percent);
            self.max_percent = self.max_percent.max(percent);
            self.last_percent = Some(percent);
        }
        self.completed_any |= watched;
        self.span.observe(timestamp);
    }

    fn finish(self) -> MovieSummary {
        let (first_watched, last_watched) = self.span.into_parts();
        MovieSummary {
            title: self.title,
            year: self.year,
            plays: self.plays,
            max_percent: round2(self.max_percent),
            avg_percent: round2(self.mean.value()),
            last_percent: self.last_percent.map(round2),
            completed_any: self.completed_any,
            first_watched,
            last_watched,
        }
    }
}

/// Accumulator for [`aggregate_movies`].
///
/// Keyed by the movie's rating key, or `title (year)` without one. Every event
/// is a play; replays of the same movie are not deduplicated.
#[derive(Debug, Clone, Default)]
pub struct MovieFold {
    index: HashMap<String, usize>,
    movies: Vec<MovieAccumulator>,
}

impl MovieFold {
    pub fn step(mut self, event: &PlayEvent, threshold: f64) -> Self {
        let title = event.movie_title();
        let year = event.year_text();
        let bucket_key = event
            .movie_key()
            .unwrap_or_else(|| format!("{} ({})", title, year));

        let slot = match self.index.get(&bucket_key) {
            Some(&slot) => slot,
            None => {
                self.movies.push(MovieAccumulator {
                    title,
                    year,
                    ..MovieAccumulator::default()
                });
                self.index.insert(bucket_key, self.movies.len() - 1);
                self.movies.len() - 1
            }
        };

        let percent = percent_complete(event);
        self.movies[slot].record(percent, is_watched(percent, threshold), &event.watched_at());
        self
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Sorted by title ignoring case, then year
    pub fn finish(self) -> Vec<MovieSummary> {
        let mut rows: Vec<MovieSummary> = self.movies.into_iter().map(MovieAccumulator::finish).collect();
        rows.sort_by_cached_key(|row| (row.title.to_lowercase(), row.year.clone()));
        rows
    }
}

/// Aggregate movie plays into one row per movie
pub fn aggregate_movies(events: &[PlayEvent], threshold: f64) -> Vec<MovieSummary> {
    let fold = events
        .iter()
        .fold(MovieFold::default(), |fold, event| fold.step(event, threshold));
    debug!("Folded {} movie plays into {} movies", events.len(), fold.len());
    fold.finish()
}
