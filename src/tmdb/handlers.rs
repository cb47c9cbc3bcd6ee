use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::picker::{best_trailer, popular_providers, trailer_url};
use super::types::*;
use crate::error::ApiError;
use crate::seed;
use crate::server::AppState;

const GENRE_LANGUAGE: &str = "en";

pub async fn youtube_trailer(
    State(state): State<AppState>,
    Path((movie_id, language)): Path<(i64, String)>,
) -> Result<String, ApiError> {
    let videos = state.picker.catalog().videos(movie_id, &language).await?;

    let trailer = best_trailer(&videos)
        .ok_or_else(|| ApiError::NotFound(format!("No YouTube trailer for movie {}", movie_id)))?;

    let url = trailer_url(trailer);
    info!("Found YouTube trailer for movie {}: {}", movie_id, url);
    Ok(url)
}

pub async fn watch_providers(
    State(state): State<AppState>,
    Path((watch_region, language)): Path<(String, String)>,
) -> Result<Json<Vec<ProviderResponse>>, ApiError> {
    let providers = state
        .picker
        .catalog()
        .watch_providers(&watch_region, &language)
        .await?;

    let providers = popular_providers(&providers, &state.config.tmdb.popular_providers);
    info!(
        "Retrieved {} watch providers for region {} and language {}",
        providers.len(),
        watch_region,
        language
    );
    Ok(Json(providers))
}

pub async fn genres(State(state): State<AppState>) -> Result<Json<Vec<GenreResponse>>, ApiError> {
    let genres = state.picker.catalog().genres(GENRE_LANGUAGE).await?;
    info!("Retrieved {} genres", genres.len());
    Ok(Json(genres.iter().map(GenreResponse::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct FetchParams {
    pub seed: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

fn default_language() -> String {
    "en-US".to_string()
}

/// The deck a seed maps to, without joining a room.
pub async fn fetch_movies(
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> Result<Json<Vec<MovieResponse>>, ApiError> {
    if !seed::is_valid(&params.seed) {
        return Err(ApiError::BadRequest(format!("Invalid seed {}", params.seed)));
    }
    let limit = params
        .limit
        .unwrap_or(state.config.tmdb.movies_per_fetch)
        .min(TMDB_DISCOVER_PAGE_SIZE);

    let movies = state
        .picker
        .pick_n(&params.seed, &params.language, &DiscoverFilters::default(), limit)
        .await?;
    Ok(Json(movies))
}
