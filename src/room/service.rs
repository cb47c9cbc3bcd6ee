use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use super::types::{LikeRequest, RoomRequest};
use crate::db::{
    DbError, LikeOutcome, Player, PlayerRepo, Session, SessionRepo, SqliteRepository,
};
use crate::error::ApiError;
use crate::seed;
use crate::tmdb::{MoviePicker, MovieResponse};

pub const MAX_PLAYERS: usize = 2;

/// Random seeds tried before giving up on finding an unused one.
const FREE_SEED_ATTEMPTS: usize = 20;

/// Room lifecycle and mutual-like detection.
///
/// Every operation that changes room state runs under one lock so that two
/// players acting at the same moment cannot both miss each other's like or
/// both claim the last place in a room. Catalog lookups happen after the
/// lock is released. Expiring idle rooms takes the same lock.
pub struct RoomService {
    db: Arc<SqliteRepository>,
    picker: Arc<MoviePicker>,
    lock: Mutex<()>,
}

impl RoomService {
    pub fn new(db: Arc<SqliteRepository>, picker: Arc<MoviePicker>) -> Self {
        Self {
            db,
            picker,
            lock: Mutex::new(()),
        }
    }

    pub async fn create_room(&self, req: &RoomRequest) -> Result<Vec<MovieResponse>, ApiError> {
        check_seed(&req.seed, &req.player_session_id)?;
        check_player_session_id(&req.player_session_id)?;
        let filters = req.filters();

        {
            let _guard = self.lock.lock().await;

            if self.find_player(&req.player_session_id).await?.is_some() {
                return Err(ApiError::PlayerSessionExists(req.player_session_id.clone()));
            }
            if self.find_session(&req.seed).await?.is_some() {
                return Err(ApiError::SeedExists {
                    seed: req.seed.clone(),
                    player: req.player_session_id.clone(),
                });
            }

            let (session, _) = self
                .db
                .create_session(&req.seed, &filters, &req.player_session_id)
                .await
                .map_err(|e| match e {
                    DbError::AlreadyExists(_) => ApiError::SeedExists {
                        seed: req.seed.clone(),
                        player: req.player_session_id.clone(),
                    },
                    e => e.into(),
                })?;

            info!(
                "Created room {} with seed {} for player {}",
                session.id, req.seed, req.player_session_id
            );
        }

        Ok(self.picker.pick(&req.seed, &req.language, &filters).await?)
    }

    pub async fn join_room(&self, req: &RoomRequest) -> Result<Vec<MovieResponse>, ApiError> {
        check_seed(&req.seed, &req.player_session_id)?;
        check_player_session_id(&req.player_session_id)?;

        let (deck_seed, session) = {
            let _guard = self.lock.lock().await;

            let session = self
                .find_session(&req.seed)
                .await?
                .ok_or_else(|| ApiError::SeedNotFound {
                    seed: req.seed.clone(),
                    player: req.player_session_id.clone(),
                })?;
            let existing = self.find_player(&req.player_session_id).await?;

            match existing {
                Some(player) if player.session_id == Some(session.id) => {
                    let sequence = self.db.get_seed_sequence(session.id).await?;
                    let deck_seed = usize::try_from(player.seed_index)
                        .ok()
                        .and_then(|i| sequence.get(i))
                        .or(sequence.last())
                        .cloned()
                        .unwrap_or_else(|| session.first_seed.clone());
                    self.db.touch_session(session.id).await?;
                    info!(
                        "Player {} rejoined room {} at seed {}",
                        req.player_session_id, session.id, deck_seed
                    );
                    (deck_seed, session)
                }
                existing => {
                    let players = self.db.list_players_in_session(session.id).await?;
                    if players.len() >= MAX_PLAYERS {
                        return Err(ApiError::TooManyPlayers {
                            seed: req.seed.clone(),
                            player: req.player_session_id.clone(),
                            count: players.len() + 1,
                        });
                    }

                    match existing {
                        Some(player) => {
                            info!(
                                "Player {} already exists, moving it to room {}",
                                req.player_session_id, session.id
                            );
                            self.db.move_player(player.id, session.id).await?;
                        }
                        None => {
                            self.db
                                .create_player(&req.player_session_id, session.id)
                                .await?;
                            info!(
                                "Added player {} to room {}",
                                req.player_session_id, session.id
                            );
                        }
                    }
                    self.db.touch_session(session.id).await?;
                    (session.first_seed.clone(), session)
                }
            }
        };

        Ok(self
            .picker
            .pick(&deck_seed, &req.language, &session.filters())
            .await?)
    }

    pub async fn fetch_more(&self, req: &RoomRequest) -> Result<Vec<MovieResponse>, ApiError> {
        check_seed(&req.seed, &req.player_session_id)?;

        let (next, session) = {
            let _guard = self.lock.lock().await;

            let (session, player) = self.membership(&req.seed, &req.player_session_id).await?;
            let sequence = self.db.get_seed_sequence(session.id).await?;
            let last = sequence.last().cloned().ok_or_else(|| {
                ApiError::Internal(format!("Room {} has no seeds", session.id))
            })?;

            let seed_index = player.seed_index + 1;
            let existing = usize::try_from(seed_index).ok().and_then(|i| sequence.get(i));
            let (next, generated) = match existing {
                Some(existing) => (existing.clone(), None),
                None => {
                    let generated = seed::next_seed(&last).ok_or_else(|| {
                        ApiError::Internal(format!("Last seed {} of room {} is invalid", last, session.id))
                    })?;
                    (generated.clone(), Some(generated))
                }
            };

            self.db
                .advance_player(session.id, player.id, seed_index, generated.as_deref())
                .await?;

            if generated.is_some() {
                info!(
                    "Player {} reached the end of the seed sequence, added seed {}",
                    player.player_session_id, next
                );
            } else {
                info!(
                    "Player {} is behind the seed sequence, reusing seed {}",
                    player.player_session_id, next
                );
            }
            (next, session)
        };

        Ok(self
            .picker
            .pick(&next, &req.language, &session.filters())
            .await?)
    }

    /// Record a like. Returns true when the other player in the room has
    /// already liked the same movie.
    pub async fn add_to_likes(&self, req: &LikeRequest) -> Result<bool, ApiError> {
        check_seed(&req.seed, &req.player_session_id)?;

        let _guard = self.lock.lock().await;

        let (session, player) = self.membership(&req.seed, &req.player_session_id).await?;

        match self.db.record_like(session.id, player.id, req.movie_id).await? {
            LikeOutcome::AlreadyLiked => {
                info!(
                    "Player {} already liked movie {}",
                    player.player_session_id, req.movie_id
                );
                Err(ApiError::AlreadyLiked)
            }
            LikeOutcome::Recorded => {
                info!("Player {} liked movie {}", player.player_session_id, req.movie_id);
                Ok(false)
            }
            LikeOutcome::Common => {
                info!(
                    "Player {} liked movie {}, now a common like in room {}",
                    player.player_session_id, req.movie_id, session.id
                );
                Ok(true)
            }
        }
    }

    pub async fn can_player_rejoin(&self, player_session_id: &str) -> Result<bool, ApiError> {
        match self.find_player(player_session_id).await? {
            Some(player) if player.session_id.is_some() => Ok(true),
            Some(_) => {
                info!("Player {} has no room, cannot rejoin", player_session_id);
                Ok(false)
            }
            None => {
                info!("Player {} not found, cannot rejoin", player_session_id);
                Ok(false)
            }
        }
    }

    pub async fn common_likes(&self, player_session_id: &str) -> Result<Vec<i64>, ApiError> {
        let player = self
            .find_player(player_session_id)
            .await?
            .ok_or_else(|| ApiError::PlayerNotFound(player_session_id.to_string()))?;

        match player.session_id {
            Some(session_id) => Ok(self.db.get_common_likes(session_id).await?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn player_likes(&self, player_session_id: &str) -> Result<Vec<i64>, ApiError> {
        let player = self
            .find_player(player_session_id)
            .await?
            .ok_or_else(|| ApiError::PlayerNotFound(player_session_id.to_string()))?;

        Ok(self.db.get_likes(player.id).await?)
    }

    pub async fn room_exists(&self, seed: &str) -> Result<bool, ApiError> {
        if !seed::is_valid(seed) {
            return Ok(false);
        }
        Ok(self.find_session(seed).await?.is_some())
    }

    /// A seed no room uses at the moment.
    pub async fn random_seed(&self) -> Result<String, ApiError> {
        for _ in 0..FREE_SEED_ATTEMPTS {
            let candidate = seed::random_seed();
            if self.find_session(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(ApiError::Internal("No unused seed found".to_string()))
    }

    /// Delete rooms nobody has touched for `max_idle`.
    pub async fn expire_idle(&self, max_idle: chrono::Duration) -> Result<u64, ApiError> {
        let _guard = self.lock.lock().await;
        Ok(self.db.delete_sessions_idle_since(Utc::now() - max_idle).await?)
    }

    /// Periodically expire idle rooms.
    pub fn start_background_tasks(self: Arc<Self>, max_idle: Duration, every: Duration) {
        tokio::spawn(async move {
            self.expire_loop(max_idle, every).await;
        });
    }

    async fn expire_loop(&self, max_idle: Duration, every: Duration) {
        let Ok(max_idle) = chrono::Duration::from_std(max_idle) else {
            error!("Room expiry interval out of range, not sweeping");
            return;
        };
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match self.expire_idle(max_idle).await {
                Ok(0) => {}
                Ok(n) => info!("Expired {} idle rooms", n),
                Err(e) => error!("Failed to expire idle rooms: {}", e),
            }
        }
    }

    /// The room a seed names, and the requesting player, who must be in it.
    async fn membership(&self, seed: &str, player_session_id: &str) -> Result<(Session, Player), ApiError> {
        let not_found = || ApiError::SessionNotFound {
            seed: seed.to_string(),
            player: player_session_id.to_string(),
        };

        let session = self.find_session(seed).await?.ok_or_else(not_found)?;
        let player = self
            .find_player(player_session_id)
            .await?
            .ok_or_else(|| ApiError::PlayerNotFound(player_session_id.to_string()))?;

        if player.session_id != Some(session.id) {
            return Err(not_found());
        }
        Ok((session, player))
    }

    async fn find_session(&self, seed: &str) -> Result<Option<Session>, ApiError> {
        match self.db.get_session_by_first_seed(seed).await {
            Ok(session) => Ok(Some(session)),
            Err(DbError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_player(&self, player_session_id: &str) -> Result<Option<Player>, ApiError> {
        match self.db.get_player(player_session_id).await {
            Ok(player) => Ok(Some(player)),
            Err(DbError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn check_seed(seed: &str, player_session_id: &str) -> Result<(), ApiError> {
    if seed::is_valid(seed) {
        return Ok(());
    }
    Err(ApiError::InvalidSeed {
        seed: seed.to_string(),
        player: player_session_id.to_string(),
    })
}

fn check_player_session_id(player_session_id: &str) -> Result<(), ApiError> {
    Uuid::parse_str(player_session_id)
        .map(|_| ())
        .map_err(|_| ApiError::InvalidPlayerSessionId(player_session_id.to_string()))
}
