use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use super::types::*;
use crate::config::TmdbConfig;

const DISCOVER_SORT_BY: &str = "popularity.desc";

#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    #[error("TMDB request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("TMDB returned {status} for {path}")]
    Status { status: u16, path: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("No TMDB api key configured")]
    MissingApiKey,
}

pub type TmdbResult<T> = Result<T, TmdbError>;

/// Source of movie metadata. `TmdbClient` talks to the real API.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn discover(
        &self,
        page: u32,
        language: &str,
        filters: &DiscoverFilters,
    ) -> TmdbResult<DiscoverPage>;
    async fn movie_details(&self, id: i64, language: &str) -> TmdbResult<MovieDetails>;
    async fn videos(&self, id: i64, language: &str) -> TmdbResult<Vec<Video>>;
    async fn watch_providers(&self, region: &str, language: &str)
        -> TmdbResult<Vec<WatchProvider>>;
    async fn genres(&self, language: &str) -> TmdbResult<Vec<TmdbGenre>>;
}

pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> TmdbResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(TmdbError::MissingApiKey)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> TmdbResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(path = %path, "TMDB request");

        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TmdbError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            error!("TMDB returned {} for {}", status, path);
            return Err(TmdbError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

/// Query parameters of a discover request. Genres and providers are
/// OR-ed together.
pub fn discover_query(page: u32, language: &str, filters: &DiscoverFilters) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("include_adult", "false".to_string()),
        ("include_video", "false".to_string()),
        ("language", language.to_string()),
        ("page", page.to_string()),
        ("sort_by", DISCOVER_SORT_BY.to_string()),
    ];
    if !filters.genres.is_empty() {
        query.push(("with_genres", join_or(&filters.genres)));
    }
    if let Some(region) = filters.watch_region.as_deref().filter(|r| !r.trim().is_empty()) {
        query.push(("watch_region", region.to_string()));
    }
    if !filters.watch_providers.is_empty() {
        query.push(("with_watch_providers", join_or(&filters.watch_providers)));
    }
    query
}

fn join_or(ids: &[i32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join("|")
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn discover(
        &self,
        page: u32,
        language: &str,
        filters: &DiscoverFilters,
    ) -> TmdbResult<DiscoverPage> {
        self.get("/discover/movie", &discover_query(page, language, filters))
            .await
    }

    async fn movie_details(&self, id: i64, language: &str) -> TmdbResult<MovieDetails> {
        self.get(&format!("/movie/{}", id), &[("language", language.to_string())])
            .await
    }

    async fn videos(&self, id: i64, language: &str) -> TmdbResult<Vec<Video>> {
        let results: VideoResults = self
            .get(
                &format!("/movie/{}/videos", id),
                &[("language", language.to_string())],
            )
            .await?;
        Ok(results.results)
    }

    async fn watch_providers(
        &self,
        region: &str,
        language: &str,
    ) -> TmdbResult<Vec<WatchProvider>> {
        let results: ProviderResults = self
            .get(
                "/watch/providers/movie",
                &[
                    ("language", language.to_string()),
                    ("watch_region", region.to_string()),
                ],
            )
            .await?;
        Ok(results.results)
    }

    async fn genres(&self, language: &str) -> TmdbResult<Vec<TmdbGenre>> {
        let list: GenreList = self
            .get("/genre/movie/list", &[("language", language.to_string())])
            .await?;
        Ok(list.genres)
    }
}
