use crate::error::SourceError;
use crate::traits::TautulliApi;
use playtally_models::{MediaKind, PlayEvent};
use serde_json::Value;
use tracing::{debug, info};

pub use playtally_models::DEFAULT_PAGE_SIZE;

/// Pull the complete `get_history` listing for one user and media kind,
/// oldest first.
///
/// Pages are requested with a growing `start` offset until a page comes back
/// empty or shorter than `page_size`. No retry: any failed page aborts the
/// whole fetch.
pub async fn fetch_history(
    api: &dyn TautulliApi,
    user_id: i64,
    kind: MediaKind,
    page_size: usize,
) -> Result<Vec<PlayEvent>, SourceError> {
    let page_size = page_size.max(1);
    let mut events = Vec::new();
    let mut start = 0usize;

    info!("Loading {} history", kind);
    loop {
        let data = api
            .call(
                "get_history",
                &[
                    ("user_id", Some(user_id.to_string())),
                    ("media_type", Some(kind.as_str().to_string())),
                    ("start", Some(start.to_string())),
                    ("length", Some(page_size.to_string())),
                    ("order_column", Some("date".to_string())),
                    ("order_dir", Some("asc".to_string())),
                ],
            )
            .await?;

        let rows = page_rows(data)?;
        if rows.is_empty() {
            break;
        }

        let fetched = rows.len();
        for row in rows {
            let event: PlayEvent = serde_json::from_value(row)
                .map_err(|e| SourceError::decode("get_history", e.to_string()))?;
            events.push(event);
        }
        start += fetched;
        debug!("Loaded {} {} history rows so far", events.len(), kind);

        if fetched < page_size {
            break;
        }
    }

    info!("Loaded {} {} history rows", events.len(), kind);
    Ok(events)
}

/// History rows come wrapped as `{"data": [...]}` or as a bare array
fn page_rows(data: Value) -> Result<Vec<Value>, SourceError> {
    match data {
        Value::Object(mut wrapper) if wrapper.contains_key("data") => match wrapper.remove("data") {
            Some(Value::Array(rows)) => Ok(rows),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(_) => Err(SourceError::decode("get_history", "'data' is not an array")),
        },
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        _ => Err(SourceError::decode("get_history", "history page is neither an array nor a data wrapper")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedApi;
    use serde_json::json;

    fn rows(range: std::ops::Range<usize>) -> Vec<Value> {
        range.map(|i| json!({"rating_key": i, "date": 1_700_000_000 + i})).collect()
    }

    #[tokio::test]
    async fn test_fetch_history_pages_until_short_page() {
        let api = ScriptedApi::new(|_, params| {
            let start: usize = params["start"].parse().unwrap();
            let page = match start {
                0 => rows(0..3),
                3 => rows(3..6),
                6 => rows(6..7),
                other => panic!("unexpected offset {other}"),
            };
            Ok(json!({"recordsFiltered": 7, "data": page}))
        });

        let events = fetch_history(&api, 42, MediaKind::Episode, 3).await.unwrap();
        assert_eq!(events.len(), 7);
        assert_eq!(events[6].item_key().as_deref(), Some("6"));

        let calls = api.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].1["user_id"], "42");
        assert_eq!(calls[0].1["media_type"], "episode");
        assert_eq!(calls[0].1["length"], "3");
        assert_eq!(calls[0].1["order_column"], "date");
        assert_eq!(calls[0].1["order_dir"], "asc");
        assert_eq!(calls[2].1["start"], "6");
    }

    #[tokio::test]
    async fn test_fetch_history_stops_on_empty_page() {
        let api = ScriptedApi::new(|_, params| {
            let start: usize = params["start"].parse().unwrap();
            if start == 0 {
                Ok(Value::Array(rows(0..2)))
            } else {
                Ok(json!([]))
            }
        });

        let events = fetch_history(&api, 1, MediaKind::Movie, 2).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(api.calls().len(), 2);
        assert_eq!(api.calls()[1].1["media_type"], "movie");
    }

    #[tokio::test]
    async fn test_fetch_history_propagates_page_failure() {
        let api = ScriptedApi::new(|_, params| {
            if params["start"] == "0" {
                Ok(json!({"data": rows(0..2)}))
            } else {
                Err(ScriptedApi::api_error("get_history"))
            }
        });

        let result = fetch_history(&api, 1, MediaKind::Episode, 2).await;
        assert!(matches!(result, Err(SourceError::Api { .. })));
    }

    #[test]
    fn test_page_rows_shapes() {
        assert_eq!(page_rows(json!({"data": null})).unwrap().len(), 0);
        assert_eq!(page_rows(Value::Null).unwrap().len(), 0);
        assert!(page_rows(json!("nope")).is_err());
        assert!(page_rows(json!({"data": "nope"})).is_err());
    }
}
