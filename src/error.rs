use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::db::DbError;
use crate::tmdb::TmdbError;

/// Errors returned by request handlers. Rendered as a plain-text body.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid seed {seed} provided by player session id {player}")]
    InvalidSeed { seed: String, player: String },

    #[error("Invalid player session id {0}")]
    InvalidPlayerSessionId(String),

    #[error("First seed {seed} provided by player session id {player} already exists")]
    SeedExists { seed: String, player: String },

    #[error("Player session id {0} already exists")]
    PlayerSessionExists(String),

    #[error("First seed {seed} provided by player session id {player} does not exist")]
    SeedNotFound { seed: String, player: String },

    #[error("Session with seed {seed} requested by player session id {player} not found")]
    SessionNotFound { seed: String, player: String },

    #[error("Session with seed {seed} requested by player session id {player} has too many players ({count})")]
    TooManyPlayers {
        seed: String,
        player: String,
        count: usize,
    },

    #[error("Player with session id {0} not found")]
    PlayerNotFound(String),

    #[error("Movie already liked")]
    AlreadyLiked,

    #[error("{0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Catalog(#[from] TmdbError),

    #[error("{0}")]
    Database(#[from] DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidSeed { .. }
            | ApiError::InvalidPlayerSessionId(_)
            | ApiError::SeedExists { .. }
            | ApiError::PlayerSessionExists(_)
            | ApiError::TooManyPlayers { .. }
            | ApiError::AlreadyLiked
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::SeedNotFound { .. }
            | ApiError::SessionNotFound { .. }
            | ApiError::PlayerNotFound(_)
            | ApiError::NotFound(_)
            | ApiError::Catalog(TmdbError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Catalog(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }

        (status, self.to_string()).into_response()
    }
}
