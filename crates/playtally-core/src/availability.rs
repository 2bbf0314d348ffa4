//! Total episode counts per show, used to turn watched episode counts into a
//! share of the whole show.

use crate::aggregate::round2;
use playtally_models::ShowSummary;
use playtally_sources::{SourceError, TautulliApi};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Show level fields that have carried the episode count across Tautulli versions
const LEAF_COUNT_FIELDS: [&str; 3] = ["leaf_count", "leafCount", "episode_count"];

/// Where an episode count came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityOrigin {
    /// Show metadata reported a leaf count
    Metadata,
    /// Counted season by season
    Traversal,
    /// Counting stopped on an error; the count covers the seasons read so far
    IncompleteTraversal,
    /// Row has no show key to look up
    NoShowKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeAvailability {
    pub episodes: u64,
    pub origin: AvailabilityOrigin,
}

/// Result of the show metadata lookup
#[derive(Debug)]
pub enum FastPath {
    Count(u64),
    Missing,
    Failed(SourceError),
}

/// Hooks for reporting per-show progress
pub trait AvailabilityProgress {
    fn start(&self, _total: usize) {}
    fn advance(&self, _row: &ShowSummary) {}
    fn finish(&self) {}

    /// True while a progress display owns the terminal. The per-show log
    /// lines then drop to debug so they do not tear through it.
    fn draws_progress(&self) -> bool {
        false
    }
}

/// Reports nothing
pub struct NoProgress;

impl AvailabilityProgress for NoProgress {}

/// Number of episodes the library holds for `show_key`.
///
/// Show metadata is asked first. When that fails or carries no count, the
/// show's seasons are listed and each season's episodes counted. An error
/// part way through the season walk returns the sum gathered so far; this
/// never fails.
pub async fn available_episode_count(api: &dyn TautulliApi, show_key: &str) -> EpisodeAvailability {
    match metadata_leaf_count(api, show_key).await {
        FastPath::Count(episodes) => {
            return EpisodeAvailability {
                episodes,
                origin: AvailabilityOrigin::Metadata,
            }
        }
        FastPath::Missing => debug!(show_key, "Show metadata has no leaf count, counting seasons"),
        FastPath::Failed(e) => debug!(show_key, "Show metadata lookup failed ({}), counting seasons", e),
    }

    count_season_episodes(api, show_key).await
}

/// `get_metadata` for the show, reading the first count field present
pub async fn metadata_leaf_count(api: &dyn TautulliApi, show_key: &str) -> FastPath {
    let metadata = match api
        .call("get_metadata", &[("rating_key", Some(show_key.to_string()))])
        .await
    {
        Ok(metadata) => metadata,
        Err(e) => return FastPath::Failed(e),
    };

    let Some(fields) = metadata.as_object() else {
        return FastPath::Missing;
    };
    let Some(raw) = LEAF_COUNT_FIELDS
        .iter()
        .filter_map(|field| fields.get(*field))
        .find(|value| !value.is_null())
    else {
        return FastPath::Missing;
    };

    match count_value(raw) {
        Some(count) => FastPath::Count(count),
        None => FastPath::Failed(SourceError::decode("get_metadata", format!("unreadable leaf count {}", raw))),
    }
}

async fn count_season_episodes(api: &dyn TautulliApi, show_key: &str) -> EpisodeAvailability {
    let mut total = 0u64;
    let incomplete = |total: u64, e: SourceError| {
        warn!(show_key, "Episode metadata unavailable, keeping partial count {}: {}", total, e);
        EpisodeAvailability {
            episodes: total,
            origin: AvailabilityOrigin::IncompleteTraversal,
        }
    };

    let seasons = match children(api, show_key, "show").await {
        Ok(seasons) => seasons,
        Err(e) => return incomplete(total, e),
    };

    for season in children_list(&seasons) {
        let Some(season_key) = ["rating_key", "ratingKey"]
            .iter()
            .filter_map(|field| season.get(*field))
            .find_map(key_text)
        else {
            continue;
        };

        let episodes = match children(api, &season_key, "season").await {
            Ok(episodes) => episodes,
            Err(e) => return incomplete(total, e),
        };

        match episode_count(&episodes) {
            Some(count) => total += count,
            None => {
                return incomplete(
                    total,
                    SourceError::decode("get_children_metadata", "unreadable children_count"),
                )
            }
        }
    }

    EpisodeAvailability {
        episodes: total,
        origin: AvailabilityOrigin::Traversal,
    }
}

async fn children(api: &dyn TautulliApi, rating_key: &str, media_type: &str) -> Result<Value, SourceError> {
    api.call(
        "get_children_metadata",
        &[
            ("rating_key", Some(rating_key.to_string())),
            ("media_type", Some(media_type.to_string())),
        ],
    )
    .await
}

/// `children_list` of a wrapper object, or a bare list
fn children_list(data: &Value) -> &[Value] {
    match data {
        Value::Object(fields) => fields
            .get("children_list")
            .and_then(|list| list.as_array())
            .map(|list| list.as_slice())
            .unwrap_or(&[]),
        Value::Array(list) => list.as_slice(),
        _ => &[],
    }
}

/// `children_count` when reported, otherwise the length of the child list
fn episode_count(data: &Value) -> Option<u64> {
    match data.get("children_count") {
        Some(count) if !count.is_null() => count_value(count),
        _ => Some(children_list(data).len() as u64),
    }
}

fn count_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) if s.is_empty() => Some(0),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Store the episode total on a row and derive the share watched.
/// A zero total leaves the share unset.
pub fn apply_availability(row: &mut ShowSummary, available_episodes: u64) {
    row.available_episodes = available_episodes;
    row.percent_watched_show = if available_episodes > 0 {
        Some(round2(
            row.unique_episodes_watched as f64 / available_episodes as f64 * 100.0,
        ))
    } else {
        None
    };
}

/// Fill in availability for every row, one show at a time in row order.
///
/// Runs after aggregation has finished. A lookup problem for one show only
/// affects that show's row.
pub async fn resolve_availability(
    api: &dyn TautulliApi,
    rows: &mut [ShowSummary],
    progress: &dyn AvailabilityProgress,
) {
    let total = rows.len();
    if total == 0 {
        return;
    }

    info!("Resolving available episodes for {} shows", total);
    progress.start(total);
    for (idx, row) in rows.iter_mut().enumerate() {
        let availability = if row.show_key.is_empty() {
            EpisodeAvailability {
                episodes: 0,
                origin: AvailabilityOrigin::NoShowKey,
            }
        } else {
            available_episode_count(api, &row.show_key).await
        };

        apply_availability(row, availability.episodes);
        if progress.draws_progress() {
            debug!(
                origin = ?availability.origin,
                "[{}/{}] {}: available={}, watched={}",
                idx + 1,
                total,
                row.title,
                row.available_episodes,
                row.unique_episodes_watched
            );
        } else {
            info!(
                origin = ?availability.origin,
                "[{}/{}] {}: available={}, watched={}",
                idx + 1,
                total,
                row.title,
                row.available_episodes,
                row.unique_episodes_watched
            );
        }
        progress.advance(row);
    }
    progress.finish();
}

#[cfg(test)]
mod tests {
    use super::*;
    use playtally_sources::testing::ScriptedApi;
    use serde_json::json;
    use std::cell::RefCell;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing::Level;

    fn show(title: &str, key: &str, watched: usize) -> ShowSummary {
        ShowSummary {
            title: title.to_string(),
            show_key: key.to_string(),
            unique_episodes_watched: watched,
            episodes_partial: 0,
            available_episodes: 0,
            percent_watched_show: None,
            avg_percent: 0.0,
            first_watched: String::new(),
            last_watched: String::new(),
        }
    }

    fn two_seasons(command: &str, params: &std::collections::HashMap<String, String>) -> Result<Value, SourceError> {
        match (command, params["rating_key"].as_str()) {
            ("get_metadata", _) => Err(ScriptedApi::api_error(command)),
            ("get_children_metadata", "show1") => Ok(json!({
                "children_count": 2,
                "children_list": [{"rating_key": "s1"}, {"ratingKey": 902}]
            })),
            ("get_children_metadata", "s1") => Ok(json!({"children_count": 5, "children_list": []})),
            ("get_children_metadata", "902") => Ok(json!({"children_list": [{}, {}, {}, {}]})),
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fast_path_leaf_count() {
        let api = ScriptedApi::new(|command, _| match command {
            "get_metadata" => Ok(json!({"title": "X", "leaf_count": 10})),
            other => panic!("fallback should not run: {other}"),
        });

        let availability = available_episode_count(&api, "1").await;
        assert_eq!(availability.episodes, 10);
        assert_eq!(availability.origin, AvailabilityOrigin::Metadata);
        assert_eq!(api.calls_for("get_children_metadata"), 0);
    }

    #[tokio::test]
    async fn test_fast_path_field_variants() {
        let api = ScriptedApi::new(|_, _| Ok(json!({"leaf_count": null, "leafCount": "12"})));
        assert_eq!(available_episode_count(&api, "1").await.episodes, 12);

        let api = ScriptedApi::new(|_, _| Ok(json!({"episode_count": 3})));
        assert_eq!(available_episode_count(&api, "1").await.episodes, 3);
    }

    #[tokio::test]
    async fn test_fallback_sums_seasons() {
        let api = ScriptedApi::new(two_seasons);
        let availability = available_episode_count(&api, "show1").await;
        assert_eq!(availability.episodes, 9);
        assert_eq!(availability.origin, AvailabilityOrigin::Traversal);

        let calls = api.calls();
        assert_eq!(calls[1].1["media_type"], "show");
        assert_eq!(calls[2].1["media_type"], "season");
    }

    #[tokio::test]
    async fn test_fallback_when_metadata_lacks_count() {
        let api = ScriptedApi::new(|command, params| match command {
            "get_metadata" => Ok(json!({"title": "No count here"})),
            _ if params["media_type"] == "show" => Ok(json!([{"rating_key": 1}, {"title": "no key"}])),
            _ => Ok(json!([{}, {}])),
        });
        let availability = available_episode_count(&api, "7").await;
        assert_eq!(availability.episodes, 2);
        assert_eq!(availability.origin, AvailabilityOrigin::Traversal);
        // the keyless season is skipped
        assert_eq!(api.calls_for("get_children_metadata"), 2);
    }

    #[tokio::test]
    async fn test_fallback_error_keeps_partial_sum() {
        let api = ScriptedApi::new(|command, params| match (command, params["rating_key"].as_str()) {
            ("get_metadata", _) => Ok(json!({})),
            (_, "show") => Ok(json!({"children_list": [{"rating_key": "a"}, {"rating_key": "b"}, {"rating_key": "c"}]})),
            (_, "a") => Ok(json!({"children_count": "6"})),
            (_, "b") => Err(ScriptedApi::api_error(command)),
            other => panic!("walk should stop at the failure: {:?}", other),
        });
        let availability = available_episode_count(&api, "show").await;
        assert_eq!(availability.episodes, 6);
        assert_eq!(availability.origin, AvailabilityOrigin::IncompleteTraversal);
    }

    #[tokio::test]
    async fn test_everything_failing_yields_zero() {
        let api = ScriptedApi::new(|command, _| Err(ScriptedApi::api_error(command)));
        let availability = available_episode_count(&api, "1").await;
        assert_eq!(availability.episodes, 0);
        assert_eq!(availability.origin, AvailabilityOrigin::IncompleteTraversal);
    }

    #[test]
    fn test_apply_availability() {
        let mut row = show("X", "1", 3);
        apply_availability(&mut row, 9);
        assert_eq!(row.available_episodes, 9);
        assert_eq!(row.percent_watched_show, Some(33.33));

        let mut one_of_many = show("Y", "2", 1);
        apply_availability(&mut one_of_many, 800);
        assert_eq!(one_of_many.percent_watched_show, Some(0.12));

        apply_availability(&mut row, 0);
        assert_eq!(row.available_episodes, 0);
        assert_eq!(row.percent_watched_show, None);
    }

    struct Recorder(RefCell<Vec<String>>);

    impl AvailabilityProgress for Recorder {
        fn start(&self, total: usize) {
            self.0.borrow_mut().push(format!("start {}", total));
        }
        fn advance(&self, row: &ShowSummary) {
            self.0.borrow_mut().push(row.title.clone());
        }
    }

    #[tokio::test]
    async fn test_resolve_availability_isolates_failures() {
        let api = ScriptedApi::new(|command, params| match (command, params["rating_key"].as_str()) {
            ("get_metadata", "good") => Ok(json!({"leaf_count": 4})),
            ("get_metadata", "bad") => Err(ScriptedApi::api_error(command)),
            ("get_children_metadata", "bad") => Err(ScriptedApi::api_error(command)),
            other => panic!("unexpected call {:?}", other),
        });
        let mut rows = vec![show("Bad", "bad", 2), show("Good", "good", 2), show("Keyless", "", 1)];
        let recorder = Recorder(RefCell::new(Vec::new()));

        resolve_availability(&api, &mut rows, &recorder).await;

        assert_eq!(rows[0].available_episodes, 0);
        assert_eq!(rows[0].percent_watched_show, None);
        assert_eq!(rows[1].available_episodes, 4);
        assert_eq!(rows[1].percent_watched_show, Some(50.0));
        assert_eq!(rows[2].available_episodes, 0);
        assert_eq!(
            recorder.0.into_inner(),
            vec!["start 3", "Bad", "Good", "Keyless"]
        );
        // keyless rows are never looked up
        assert_eq!(api.calls().len(), 3);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct DrawingBar;

    impl AvailabilityProgress for DrawingBar {
        fn draws_progress(&self) -> bool {
            true
        }
    }

    /// Info-level log output of one `resolve_availability` run
    async fn info_log(progress: &dyn AvailabilityProgress) -> String {
        let api = ScriptedApi::new(|_, _| Ok(json!({"leaf_count": 4})));
        let mut rows = vec![show("Good", "good", 2)];
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let _guard = tracing::subscriber::set_default(subscriber);
        resolve_availability(&api, &mut rows, progress).await;
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_per_show_lines_stay_below_info_under_a_progress_bar() {
        let plain = info_log(&NoProgress).await;
        assert!(plain.contains("[1/1] Good: available=4, watched=2"), "{plain}");

        let drawn = info_log(&DrawingBar).await;
        assert!(drawn.contains("Resolving available episodes for 1 shows"), "{drawn}");
        assert!(!drawn.contains("[1/1]"), "{drawn}");
    }
}
