use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Format used for every rendered watch timestamp.
/// Zero padded so string ordering matches chronological ordering.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of Tautulli `get_history` output.
///
/// The API is loose about types (ids arrive as numbers or strings, percentages
/// as numbers, numeric strings or empty strings), so every field keeps the raw
/// JSON value and the accessors below do the interpretation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlayEvent {
    #[serde(default)]
    pub rating_key: Option<Value>,
    #[serde(default)]
    pub parent_rating_key: Option<Value>,
    #[serde(default)]
    pub grandparent_rating_key: Option<Value>,
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub full_title: Option<Value>,
    #[serde(default)]
    pub grandparent_title: Option<Value>,
    #[serde(default)]
    pub year: Option<Value>,
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default)]
    pub stopped: Option<Value>,
    #[serde(default)]
    pub started: Option<Value>,
    #[serde(default)]
    pub last_played: Option<Value>,
    #[serde(default)]
    pub percent_complete: Option<Value>,
    #[serde(default)]
    pub view_offset: Option<Value>,
    #[serde(default)]
    pub duration: Option<Value>,
    #[serde(default)]
    pub media_duration: Option<Value>,
}

impl PlayEvent {
    /// Identifier of the episode or movie that was played
    pub fn item_key(&self) -> Option<String> {
        key_text(self.rating_key.as_ref())
    }

    /// Identifier of the show an episode belongs to
    pub fn show_key(&self) -> Option<String> {
        key_text(self.grandparent_rating_key.as_ref())
    }

    /// Movie identifier, falling back to the parent key
    pub fn movie_key(&self) -> Option<String> {
        key_text(self.rating_key.as_ref()).or_else(|| key_text(self.parent_rating_key.as_ref()))
    }

    pub fn show_title(&self) -> String {
        first_text(&[&self.grandparent_title, &self.full_title, &self.title])
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn movie_title(&self) -> String {
        first_text(&[&self.title, &self.full_title]).unwrap_or_else(|| "Unknown".to_string())
    }

    /// Release year as text, empty when unknown
    pub fn year_text(&self) -> String {
        key_text(self.year.as_ref()).unwrap_or_default()
    }

    /// Watch time rendered as `YYYY-MM-DD HH:MM:SS` in local time.
    ///
    /// The first present field of `date`, `stopped`, `started`, `last_played`
    /// wins. Epoch seconds are formatted, strings pass through unchanged, and
    /// anything else renders as an empty string.
    pub fn watched_at(&self) -> String {
        let raw = [&self.date, &self.stopped, &self.started, &self.last_played]
            .into_iter()
            .filter_map(|field| field.as_ref())
            .find(|value| is_truthy(value));

        match raw {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .and_then(format_epoch)
                .unwrap_or_default(),
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        }
    }
}

/// Render epoch seconds in local time
pub fn format_epoch(seconds: i64) -> Option<String> {
    Local
        .timestamp_opt(seconds, 0)
        .single()
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
}

/// Parse a loosely typed numeric field (JSON number or numeric string)
pub fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn key_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(fields: &[&Option<Value>]) -> Option<String> {
    fields.iter().find_map(|field| key_text(field.as_ref()))
}

/// Null, false, zero and empty strings or containers are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: Value) -> PlayEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_keys_accept_numbers_and_strings() {
        let e = event(json!({"rating_key": 1234, "grandparent_rating_key": "77"}));
        assert_eq!(e.item_key().as_deref(), Some("1234"));
        assert_eq!(e.show_key().as_deref(), Some("77"));
    }

    #[test]
    fn test_empty_and_zero_keys_are_absent() {
        let e = event(json!({"rating_key": "", "grandparent_rating_key": 0}));
        assert_eq!(e.item_key(), None);
        assert_eq!(e.show_key(), None);
    }

    #[test]
    fn test_movie_key_falls_back_to_parent() {
        let e = event(json!({"rating_key": null, "parent_rating_key": 55}));
        assert_eq!(e.movie_key().as_deref(), Some("55"));
    }

    #[test]
    fn test_show_title_precedence() {
        let e = event(json!({"grandparent_title": "", "full_title": "Show - Ep", "title": "Ep"}));
        assert_eq!(e.show_title(), "Show - Ep");

        let e = event(json!({}));
        assert_eq!(e.show_title(), "Unknown");
        assert_eq!(e.movie_title(), "Unknown");
    }

    #[test]
    fn test_year_text() {
        assert_eq!(event(json!({"year": 1999})).year_text(), "1999");
        assert_eq!(event(json!({"year": "2004"})).year_text(), "2004");
        assert_eq!(event(json!({})).year_text(), "");
    }

    #[test]
    fn test_watched_at_string_passthrough() {
        let e = event(json!({"date": "2024-01-02 03:04:05"}));
        assert_eq!(e.watched_at(), "2024-01-02 03:04:05");
    }

    #[test]
    fn test_watched_at_skips_falsy_fields() {
        let e = event(json!({"date": 0, "stopped": null, "started": 1700000000}));
        assert_eq!(e.watched_at(), format_epoch(1700000000).unwrap());
    }

    #[test]
    fn test_watched_at_missing() {
        assert_eq!(event(json!({})).watched_at(), "");
    }

    #[test]
    fn test_number_parsing() {
        assert_eq!(number(Some(&json!(42))), Some(42.0));
        assert_eq!(number(Some(&json!(" 12.5 "))), Some(12.5));
        assert_eq!(number(Some(&json!(""))), None);
        assert_eq!(number(Some(&json!("abc"))), None);
        assert_eq!(number(Some(&json!(null))), None);
        assert_eq!(number(None), None);
    }
}
