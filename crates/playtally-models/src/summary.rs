use serde::{Deserialize, Serialize};

/// Per-show export row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShowSummary {
    #[serde(rename = "show_title")]
    pub title: String,
    #[serde(rename = "show_rating_key")]
    pub show_key: String,
    pub unique_episodes_watched: usize,
    pub episodes_partial: usize,
    /// Episodes present in the library, 0 until availability is resolved
    pub available_episodes: u64,
    /// `None` while `available_episodes` is 0
    pub percent_watched_show: Option<f64>,
    #[serde(rename = "avg_episode_percent")]
    pub avg_percent: f64,
    pub first_watched: String,
    pub last_watched: String,
}

/// Per-movie export row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    #[serde(rename = "movie_title")]
    pub title: String,
    pub year: String,
    pub plays: u32,
    pub max_percent: f64,
    pub avg_percent: f64,
    pub last_percent: Option<f64>,
    pub completed_any: bool,
    pub first_watched: String,
    pub last_watched: String,
}
