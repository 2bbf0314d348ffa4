use serde::{Deserialize, Serialize};
use std::fmt;

/// History media kinds that can be exported
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Episode,
    Movie,
}

impl MediaKind {
    /// Value of the `media_type` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Episode => "episode",
            MediaKind::Movie => "movie",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Percent complete at or above which a play counts as watched
pub const DEFAULT_WATCHED_THRESHOLD: f64 = 85.0;

/// History rows requested per `get_history` page
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Which history branches an export run covers
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Series,
    Movies,
    #[default]
    Both,
}

impl ExportKind {
    pub fn includes_series(&self) -> bool {
        matches!(self, ExportKind::Series | ExportKind::Both)
    }

    pub fn includes_movies(&self) -> bool {
        matches!(self, ExportKind::Movies | ExportKind::Both)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Series => "series",
            ExportKind::Movies => "movies",
            ExportKind::Both => "both",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "series" => Ok(ExportKind::Series),
            "movies" => Ok(ExportKind::Movies),
            "both" => Ok(ExportKind::Both),
            _ => Err(format!("Invalid export kind: {}. Use 'series', 'movies' or 'both'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_kind_branches() {
        assert!(ExportKind::Both.includes_series() && ExportKind::Both.includes_movies());
        assert!(ExportKind::Series.includes_series() && !ExportKind::Series.includes_movies());
        assert!(!ExportKind::Movies.includes_series() && ExportKind::Movies.includes_movies());
    }

    #[test]
    fn test_export_kind_from_str() {
        assert_eq!("Movies".parse::<ExportKind>(), Ok(ExportKind::Movies));
        assert!("everything".parse::<ExportKind>().is_err());
        assert_eq!(MediaKind::Episode.to_string(), "episode");
    }
}
