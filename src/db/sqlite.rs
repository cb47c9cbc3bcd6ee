use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use super::model::*;
use super::repo::*;
use crate::tmdb::DiscoverFilters;

type SessionRow = (
    i64,
    String,
    String,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
);

type PlayerRow = (i64, String, Option<i64>, i64, Option<String>, Option<String>);

const SESSION_COLUMNS: &str =
    "id, first_seed, genres, watch_region, watch_providers, created, updated";
const PLAYER_COLUMNS: &str = "id, player_session_id, session_id, seed_index, created, updated";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(db_path: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(db_path)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database sees its own empty
        // database, so keep exactly one alive.
        let pool = if db_path.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let repo = Self { pool };

        repo.init_schema().await?;

        info!("Database initialized at {}", db_path);

        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::query(schema).execute(&self.pool).await?;
        Ok(())
    }
}

fn timestamp(dt: DateTime<Utc>) -> String {
    // Fixed width so that string comparison in SQL orders correctly.
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn now() -> String {
    timestamp(Utc::now())
}

fn session_from_row(r: SessionRow) -> Session {
    Session {
        id: r.0,
        first_seed: r.1,
        genres: split_ids(&r.2),
        watch_region: r.3,
        watch_providers: split_ids(&r.4),
        created: parse_timestamp(r.5),
        updated: parse_timestamp(r.6),
    }
}

fn player_from_row(r: PlayerRow) -> Player {
    Player {
        id: r.0,
        player_session_id: r.1,
        session_id: r.2,
        seed_index: r.3,
        created: parse_timestamp(r.4),
        updated: parse_timestamp(r.5),
    }
}

fn map_unique(e: sqlx::Error, what: String) -> DbError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => DbError::AlreadyExists(what),
        _ => DbError::Sqlx(e),
    }
}

#[async_trait]
impl SessionRepo for SqliteRepository {
    async fn create_session(
        &self,
        first_seed: &str,
        filters: &DiscoverFilters,
        player_session_id: &str,
    ) -> DbResult<(Session, Player)> {
        let created = now();
        let mut tx = self.pool.begin().await?;

        let session_id = sqlx::query(
            "INSERT INTO sessions (first_seed, genres, watch_region, watch_providers, created)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(first_seed)
        .bind(join_ids(&filters.genres))
        .bind(&filters.watch_region)
        .bind(join_ids(&filters.watch_providers))
        .bind(&created)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique(e, format!("Session with seed {}", first_seed)))?
        .last_insert_rowid();

        sqlx::query("INSERT INTO session_seeds (session_id, position, seed) VALUES (?, 0, ?)")
            .bind(session_id)
            .bind(first_seed)
            .execute(&mut *tx)
            .await?;

        let player_id = sqlx::query(
            "INSERT INTO players (player_session_id, session_id, seed_index, created)
             VALUES (?, ?, 0, ?)",
        )
        .bind(player_session_id)
        .bind(session_id)
        .bind(&created)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique(e, format!("Player {}", player_session_id)))?
        .last_insert_rowid();

        tx.commit().await?;

        let created = parse_timestamp(Some(created));
        let session = Session {
            id: session_id,
            first_seed: first_seed.to_string(),
            genres: filters.genres.clone(),
            watch_region: filters.watch_region.clone(),
            watch_providers: filters.watch_providers.clone(),
            created,
            updated: None,
        };
        let player = Player {
            id: player_id,
            player_session_id: player_session_id.to_string(),
            session_id: Some(session_id),
            seed_index: 0,
            created,
            updated: None,
        };
        Ok((session, player))
    }

    async fn get_session_by_first_seed(&self, seed: &str) -> DbResult<Session> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {} FROM sessions WHERE first_seed = ?",
            SESSION_COLUMNS
        ))
        .bind(seed)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("Session not found: {}", seed)),
            _ => DbError::Sqlx(e),
        })?;

        Ok(session_from_row(row))
    }

    async fn get_seed_sequence(&self, session_id: i64) -> DbResult<Vec<String>> {
        let results = sqlx::query_as::<_, (String,)>(
            "SELECT seed FROM session_seeds WHERE session_id = ? ORDER BY position",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results.into_iter().map(|r| r.0).collect())
    }

    async fn advance_player(
        &self,
        session_id: i64,
        player_id: i64,
        seed_index: i64,
        new_seed: Option<&str>,
    ) -> DbResult<()> {
        let updated = now();
        let mut tx = self.pool.begin().await?;

        let moved = sqlx::query(
            "UPDATE players SET seed_index = ?, updated = ? WHERE id = ? AND session_id = ?",
        )
        .bind(seed_index)
        .bind(&updated)
        .bind(player_id)
        .bind(session_id)
        .execute(&mut *tx)
        .await?;
        if moved.rows_affected() == 0 {
            return Err(DbError::NotFound(format!(
                "Player {} in session {}",
                player_id, session_id
            )));
        }

        if let Some(seed) = new_seed {
            let next = sqlx::query_as::<_, (Option<i64>,)>(
                "SELECT MAX(position) FROM session_seeds WHERE session_id = ?",
            )
            .bind(session_id)
            .fetch_one(&mut *tx)
            .await?
            .0
            .map_or(0, |p| p + 1);

            sqlx::query("INSERT INTO session_seeds (session_id, position, seed) VALUES (?, ?, ?)")
                .bind(session_id)
                .bind(next)
                .bind(seed)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE sessions SET updated = ? WHERE id = ?")
            .bind(&updated)
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_common_likes(&self, session_id: i64) -> DbResult<Vec<i64>> {
        let results = sqlx::query_as::<_, (i64,)>(
            "SELECT movie_id FROM common_likes WHERE session_id = ? ORDER BY created, rowid",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results.into_iter().map(|r| r.0).collect())
    }

    async fn touch_session(&self, session_id: i64) -> DbResult<()> {
        sqlx::query("UPDATE sessions SET updated = ? WHERE id = ?")
            .bind(now())
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_sessions_idle_since(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE COALESCE(updated, created) < ?")
            .bind(timestamp(cutoff))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl PlayerRepo for SqliteRepository {
    async fn get_player(&self, player_session_id: &str) -> DbResult<Player> {
        let row = sqlx::query_as::<_, PlayerRow>(&format!(
            "SELECT {} FROM players WHERE player_session_id = ?",
            PLAYER_COLUMNS
        ))
        .bind(player_session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                DbError::NotFound(format!("Player not found: {}", player_session_id))
            }
            _ => DbError::Sqlx(e),
        })?;

        Ok(player_from_row(row))
    }

    async fn create_player(&self, player_session_id: &str, session_id: i64) -> DbResult<Player> {
        let created = now();
        let id = sqlx::query(
            "INSERT INTO players (player_session_id, session_id, seed_index, created)
             VALUES (?, ?, 0, ?)",
        )
        .bind(player_session_id)
        .bind(session_id)
        .bind(&created)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, format!("Player {}", player_session_id)))?
        .last_insert_rowid();

        Ok(Player {
            id,
            player_session_id: player_session_id.to_string(),
            session_id: Some(session_id),
            seed_index: 0,
            created: parse_timestamp(Some(created)),
            updated: None,
        })
    }

    async fn list_players_in_session(&self, session_id: i64) -> DbResult<Vec<Player>> {
        let results = sqlx::query_as::<_, PlayerRow>(&format!(
            "SELECT {} FROM players WHERE session_id = ? ORDER BY id",
            PLAYER_COLUMNS
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results.into_iter().map(player_from_row).collect())
    }

    async fn move_player(&self, player_id: i64, session_id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE players SET session_id = ?, seed_index = 0, updated = ? WHERE id = ?",
        )
        .bind(session_id)
        .bind(now())
        .bind(player_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM player_likes WHERE player_id = ?")
            .bind(player_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_likes(&self, player_id: i64) -> DbResult<Vec<i64>> {
        let results = sqlx::query_as::<_, (i64,)>(
            "SELECT movie_id FROM player_likes WHERE player_id = ? ORDER BY rowid",
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results.into_iter().map(|r| r.0).collect())
    }

    async fn record_like(
        &self,
        session_id: i64,
        player_id: i64,
        movie_id: i64,
    ) -> DbResult<LikeOutcome> {
        let created = now();
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO player_likes (player_id, movie_id, created) VALUES (?, ?, ?)",
        )
        .bind(player_id)
        .bind(movie_id)
        .bind(&created)
        .execute(&mut *tx)
        .await?;
        if inserted.rows_affected() == 0 {
            return Ok(LikeOutcome::AlreadyLiked);
        }

        sqlx::query("UPDATE players SET updated = ? WHERE id = ?")
            .bind(&created)
            .bind(player_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE sessions SET updated = ? WHERE id = ?")
            .bind(&created)
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        let (others,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM player_likes l JOIN players p ON p.id = l.player_id
             WHERE p.session_id = ? AND p.id <> ? AND l.movie_id = ?",
        )
        .bind(session_id)
        .bind(player_id)
        .bind(movie_id)
        .fetch_one(&mut *tx)
        .await?;

        let outcome = if others > 0 {
            sqlx::query(
                "INSERT OR IGNORE INTO common_likes (session_id, movie_id, created) VALUES (?, ?, ?)",
            )
            .bind(session_id)
            .bind(movie_id)
            .bind(&created)
            .execute(&mut *tx)
            .await?;
            LikeOutcome::Common
        } else {
            LikeOutcome::Recorded
        };

        tx.commit().await?;
        Ok(outcome)
    }
}
