use serde::{Deserialize, Serialize};

use crate::tmdb::DiscoverFilters;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequest {
    pub seed: String,
    pub player_session_id: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub genres: Option<Vec<i32>>,
    #[serde(default)]
    pub watch_region: Option<String>,
    #[serde(default)]
    pub watch_providers: Option<Vec<i32>>,
}

impl RoomRequest {
    pub fn filters(&self) -> DiscoverFilters {
        DiscoverFilters {
            genres: self.genres.clone().unwrap_or_default(),
            watch_region: self
                .watch_region
                .clone()
                .filter(|r| !r.trim().is_empty()),
            watch_providers: self.watch_providers.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub seed: String,
    pub player_session_id: String,
    pub movie_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerQuery {
    pub player_session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedQuery {
    pub seed: String,
}

fn default_language() -> String {
    "en-US".to_string()
}
