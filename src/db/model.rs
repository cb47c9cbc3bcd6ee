use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tmdb::DiscoverFilters;

/// A room. Identified externally by the first seed of its sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub first_seed: String,
    pub genres: Vec<i32>,
    pub watch_region: Option<String>,
    pub watch_providers: Vec<i32>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl Session {
    pub fn filters(&self) -> DiscoverFilters {
        DiscoverFilters {
            genres: self.genres.clone(),
            watch_region: self.watch_region.clone(),
            watch_providers: self.watch_providers.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub player_session_id: String,
    pub session_id: Option<i64>,
    pub seed_index: i64,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

/// What recording a like did to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    AlreadyLiked,
    Recorded,
    /// Another player in the room liked the movie before; it is now a
    /// common like.
    Common,
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

pub type DbResult<T> = Result<T, DbError>;

pub(crate) fn join_ids(ids: &[i32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) fn split_ids(s: &str) -> Vec<i32> {
    s.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}

pub(crate) fn parse_timestamp(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}
