use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::*;
use crate::tmdb::DiscoverFilters;

#[async_trait]
pub trait SessionRepo: Send + Sync {
    /// Create a room with `first_seed` as its only seed, owned by a new
    /// player at seed index 0.
    async fn create_session(
        &self,
        first_seed: &str,
        filters: &DiscoverFilters,
        player_session_id: &str,
    ) -> DbResult<(Session, Player)>;
    async fn get_session_by_first_seed(&self, seed: &str) -> DbResult<Session>;
    async fn get_seed_sequence(&self, session_id: i64) -> DbResult<Vec<String>>;
    /// Set a player's seed index, appending `new_seed` to the room's
    /// sequence when given. Both writes commit together.
    async fn advance_player(
        &self,
        session_id: i64,
        player_id: i64,
        seed_index: i64,
        new_seed: Option<&str>,
    ) -> DbResult<()>;
    async fn get_common_likes(&self, session_id: i64) -> DbResult<Vec<i64>>;
    async fn touch_session(&self, session_id: i64) -> DbResult<()>;
    async fn delete_sessions_idle_since(&self, cutoff: DateTime<Utc>) -> DbResult<u64>;
}

#[async_trait]
pub trait PlayerRepo: Send + Sync {
    async fn get_player(&self, player_session_id: &str) -> DbResult<Player>;
    async fn create_player(&self, player_session_id: &str, session_id: i64) -> DbResult<Player>;
    async fn list_players_in_session(&self, session_id: i64) -> DbResult<Vec<Player>>;
    /// Put a player into another room, starting over at seed index 0 with
    /// no likes.
    async fn move_player(&self, player_id: i64, session_id: i64) -> DbResult<()>;
    async fn get_likes(&self, player_id: i64) -> DbResult<Vec<i64>>;
    /// Store a like, and the room's common like when another player in the
    /// room already liked the movie, in one transaction.
    async fn record_like(
        &self,
        session_id: i64,
        player_id: i64,
        movie_id: i64,
    ) -> DbResult<LikeOutcome>;
}
