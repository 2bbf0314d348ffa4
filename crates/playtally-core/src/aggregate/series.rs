use super::{round2, PercentMean, WatchSpan};
use crate::completion::{is_watched, percent_complete};
use playtally_models::{PlayEvent, ShowSummary};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Everything tracked for one show while its plays are folded in.
///
/// An episode lives in at most one of `watched` and `partial`. A watched play
/// always wins: it moves the episode out of `partial`, and a later short play
/// never moves it back. Final membership therefore depends only on which
/// plays exist, not on their order.
#[derive(Debug, Clone, Default)]
pub struct ShowAccumulator {
    title: String,
    show_key: String,
    watched: HashSet<String>,
    partial: HashSet<String>,
    mean: PercentMean,
    plays: u32,
    span: WatchSpan,
}

impl ShowAccumulator {
    fn new(title: String, show_key: String) -> Self {
        Self {
            title,
            show_key,
            ..Self::default()
        }
    }

    fn record(&mut self, episode: Option<String>, percent: Option<f64>, watched: bool, timestamp: &str) {
        self.plays += 1;
        if let Some(percent) = percent {
            self.mean.add(percent);
        }

        if let Some(episode) = episode {
            if watched {
                self.partial.remove(&episode);
                self.watched.insert(episode);
            } else if !self.watched.contains(&episode) {
                self.partial.insert(episode);
            }
        }

        self.span.observe(timestamp);
    }

    pub fn watched_episodes(&self) -> &HashSet<String> {
        &self.watched
    }

    pub fn partial_episodes(&self) -> &HashSet<String> {
        &self.partial
    }

    /// All plays folded into this show, with or without a percentage
    pub fn plays(&self) -> u32 {
        self.plays
    }

    fn finish(self) -> ShowSummary {
        let (first_watched, last_watched) = self.span.into_parts();
        ShowSummary {
            title: self.title,
            show_key: self.show_key,
            unique_episodes_watched: self.watched.len(),
            episodes_partial: self.partial.len(),
            available_episodes: 0,
            percent_watched_show: None,
            avg_percent: round2(self.mean.value()),
            first_watched,
            last_watched,
        }
    }
}

/// Accumulator for [`aggregate_series`], keyed by show key (or title when the
/// show key is missing). Shows without a key that share a title end up in the
/// same bucket.
#[derive(Debug, Clone, Default)]
pub struct SeriesFold {
    index: HashMap<String, usize>,
    shows: Vec<ShowAccumulator>,
}

impl SeriesFold {
    /// Fold one episode play into the accumulator
    pub fn step(mut self, event: &PlayEvent, threshold: f64) -> Self {
        let show_key = event.show_key();
        let title = event.show_title();
        let bucket_key = show_key.clone().unwrap_or_else(|| title.clone());

        let slot = match self.index.get(&bucket_key) {
            Some(&slot) => slot,
            None => {
                self.shows
                    .push(ShowAccumulator::new(title, show_key.unwrap_or_default()));
                self.index.insert(bucket_key, self.shows.len() - 1);
                self.shows.len() - 1
            }
        };

        let percent = percent_complete(event);
        self.shows[slot].record(
            event.item_key(),
            percent,
            is_watched(percent, threshold),
            &event.watched_at(),
        );
        self
    }

    pub fn shows(&self) -> &[ShowAccumulator] {
        &self.shows
    }

    /// Collapse the episode sets to counts and sort by title, ignoring case
    pub fn finish(self) -> Vec<ShowSummary> {
        let mut rows: Vec<ShowSummary> = self.shows.into_iter().map(ShowAccumulator::finish).collect();
        rows.sort_by_cached_key(|row| row.title.to_lowercase());
        rows
    }
}

/// Aggregate episode plays into one row per show.
///
/// `available_episodes` is left at 0 and `percent_watched_show` unset; see
/// [`crate::availability`].
pub fn aggregate_series(events: &[PlayEvent], threshold: f64) -> Vec<ShowSummary> {
    let fold = events
        .iter()
        .fold(SeriesFold::default(), |fold, event| fold.step(event, threshold));
    debug!("Folded {} episode plays into {} shows", events.len(), fold.shows().len());
    fold.finish()
}
