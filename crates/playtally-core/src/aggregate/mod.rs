//! Folds raw history rows into per-show and per-movie summary rows.
//!
//! Both aggregators are plain folds: each step takes the accumulator by value
//! together with one event and returns the next accumulator. Buckets keep
//! first-seen order so sorting the finished rows is stable.

mod movies;
mod series;

pub use movies::{aggregate_movies, MovieFold};
pub use series::{aggregate_series, SeriesFold, ShowAccumulator};

/// Round to two decimals, ties to even.
///
/// A tie is decided on the exact binary value, so `2.675` (stored just below
/// the midpoint) rounds down while `0.125` (an exact midpoint) goes to `0.12`.
pub fn round2(value: f64) -> f64 {
    let floor = (value * 100.0).floor();
    // fused, so the distance to the midpoint carries no rounding error
    let from_midpoint = value.mul_add(100.0, -(floor + 0.5));
    let rounded = if from_midpoint < 0.0 {
        floor
    } else if from_midpoint > 0.0 || floor % 2.0 != 0.0 {
        floor + 1.0
    } else {
        floor
    };
    rounded / 100.0
}

/// Earliest and latest watch time seen for a bucket.
///
/// Timestamps are `YYYY-MM-DD HH:MM:SS` strings, so plain string ordering is
/// chronological. Empty timestamps are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct WatchSpan {
    first: String,
    last: String,
}

impl WatchSpan {
    pub(crate) fn observe(&mut self, timestamp: &str) {
        if timestamp.is_empty() {
            return;
        }
        if self.first.is_empty() || timestamp < self.first.as_str() {
            self.first = timestamp.to_string();
        }
        if self.last.is_empty() || timestamp > self.last.as_str() {
            self.last = timestamp.to_string();
        }
    }

    pub(crate) fn into_parts(self) -> (String, String) {
        (self.first, self.last)
    }
}

/// Running mean over the plays that reported a percentage
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct PercentMean {
    sum: f64,
    count: u32,
}

impl PercentMean {
    pub(crate) fn add(&mut self, percent: f64) {
        self.sum += percent;
        self.count += 1;
    }

    pub(crate) fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / f64::from(self.count)
        }
    }
}
