use axum::{
    extract::{Query, State},
    Json,
};

use super::types::*;
use crate::error::ApiError;
use crate::server::AppState;
use crate::tmdb::MovieResponse;

pub async fn create_room(
    State(state): State<AppState>,
    Json(req): Json<RoomRequest>,
) -> Result<Json<Vec<MovieResponse>>, ApiError> {
    Ok(Json(state.rooms.create_room(&req).await?))
}

pub async fn join_room(
    State(state): State<AppState>,
    Json(req): Json<RoomRequest>,
) -> Result<Json<Vec<MovieResponse>>, ApiError> {
    Ok(Json(state.rooms.join_room(&req).await?))
}

pub async fn fetch_more(
    State(state): State<AppState>,
    Json(req): Json<RoomRequest>,
) -> Result<Json<Vec<MovieResponse>>, ApiError> {
    Ok(Json(state.rooms.fetch_more(&req).await?))
}

pub async fn add_to_likes(
    State(state): State<AppState>,
    Json(req): Json<LikeRequest>,
) -> Result<Json<bool>, ApiError> {
    Ok(Json(state.rooms.add_to_likes(&req).await?))
}

pub async fn can_player_rejoin(
    State(state): State<AppState>,
    Query(query): Query<PlayerQuery>,
) -> Result<Json<bool>, ApiError> {
    Ok(Json(state.rooms.can_player_rejoin(&query.player_session_id).await?))
}

pub async fn common_likes(
    State(state): State<AppState>,
    Query(query): Query<PlayerQuery>,
) -> Result<Json<Vec<i64>>, ApiError> {
    Ok(Json(state.rooms.common_likes(&query.player_session_id).await?))
}

pub async fn player_likes(
    State(state): State<AppState>,
    Query(query): Query<PlayerQuery>,
) -> Result<Json<Vec<i64>>, ApiError> {
    Ok(Json(state.rooms.player_likes(&query.player_session_id).await?))
}

pub async fn random_seed(State(state): State<AppState>) -> Result<String, ApiError> {
    state.rooms.random_seed().await
}

pub async fn does_room_exist(
    State(state): State<AppState>,
    Query(query): Query<SeedQuery>,
) -> Result<Json<bool>, ApiError> {
    Ok(Json(state.rooms.room_exists(&query.seed).await?))
}
