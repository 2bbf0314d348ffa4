use playtally_models::play_event::{is_truthy, number};
use playtally_models::PlayEvent;

pub use playtally_models::DEFAULT_WATCHED_THRESHOLD;

/// Offsets larger than this multiple of the duration are taken to be milliseconds
const OFFSET_MS_FACTOR: f64 = 5.0;
/// Durations above this many units are taken to be milliseconds
const DURATION_MS_LIMIT: f64 = 100_000.0;

/// How far through the item a play got, 0-100.
///
/// An explicit `percent_complete` is returned as reported. Otherwise the value
/// is derived from `view_offset` over `duration` (or `media_duration`), after
/// guessing whether either side is in milliseconds. `None` means unknown; it
/// is never collapsed to 0.
///
/// The millisecond guess is approximate: an offset just over five times the
/// duration, or a duration near 100000, can be misread.
pub fn percent_complete(event: &PlayEvent) -> Option<f64> {
    number(event.percent_complete.as_ref()).or_else(|| derived_percent(event))
}

fn derived_percent(event: &PlayEvent) -> Option<f64> {
    let mut offset = number(event.view_offset.as_ref())?;
    // `media_duration` only stands in when `duration` is empty or zero; a
    // present but unreadable `duration` leaves the percent unknown
    let raw_duration = event
        .duration
        .as_ref()
        .filter(|d| is_truthy(d))
        .or(event.media_duration.as_ref());
    let mut duration = number(raw_duration)?;
    if duration <= 0.0 {
        return None;
    }

    if offset > duration * OFFSET_MS_FACTOR {
        offset /= 1000.0;
    }
    if duration > DURATION_MS_LIMIT {
        duration /= 1000.0;
    }

    Some((offset / duration * 100.0).clamp(0.0, 100.0))
}

/// Unknown completion counts as watched
pub fn is_watched(percent: Option<f64>, threshold: f64) -> bool {
    percent.map_or(true, |p| p >= threshold)
}
