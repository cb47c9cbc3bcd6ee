use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};

use super::client::{MovieCatalog, TmdbResult};
use super::types::*;
use crate::seed;

/// Turns a seed into a list of movies. The same seed, language and filters
/// always yield the same movies in the same order, which is what lets two
/// players in a room swipe through an identical deck.
pub struct MoviePicker {
    catalog: Arc<dyn MovieCatalog>,
    max_discover_page: u32,
    movies_per_fetch: usize,
}

impl MoviePicker {
    pub fn new(catalog: Arc<dyn MovieCatalog>, max_discover_page: u32, movies_per_fetch: usize) -> Self {
        Self {
            catalog,
            max_discover_page: max_discover_page.max(1),
            movies_per_fetch,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn MovieCatalog> {
        &self.catalog
    }

    pub async fn pick(
        &self,
        seed: &str,
        language: &str,
        filters: &DiscoverFilters,
    ) -> TmdbResult<Vec<MovieResponse>> {
        self.pick_n(seed, language, filters, self.movies_per_fetch).await
    }

    pub async fn pick_n(
        &self,
        seed: &str,
        language: &str,
        filters: &DiscoverFilters,
        limit: usize,
    ) -> TmdbResult<Vec<MovieResponse>> {
        let Some(mut rng) = seed::rng_for(seed) else {
            warn!("Refusing to pick movies for invalid seed {}", seed);
            return Ok(Vec::new());
        };
        let mut page_number = rng.random_range(1..=self.max_discover_page);

        info!(
            seed = %seed,
            page = page_number,
            language = %language,
            genres = ?filters.genres,
            watch_region = ?filters.watch_region,
            watch_providers = ?filters.watch_providers,
            "Fetching discover movies"
        );

        let mut page = self.catalog.discover(page_number, language, filters).await?;

        if page.total_pages == 0 {
            info!("No discover results for seed {}", seed);
            return Ok(Vec::new());
        }

        if page.total_pages < page_number {
            page_number = rng.random_range(1..=page.total_pages);
            info!(
                "Seed {} points past the last discover page ({}), retrying with page {}",
                seed, page.total_pages, page_number
            );
            page = self.catalog.discover(page_number, language, filters).await?;
        }

        let pool = page.results.len().min(TMDB_DISCOVER_PAGE_SIZE);
        let count = limit.min(pool);
        if count == 0 {
            warn!("Discover page {} for seed {} is empty", page_number, seed);
            return Ok(Vec::new());
        }

        let mut movies = Vec::with_capacity(count);
        for index in rand::seq::index::sample(&mut rng, pool, count).into_iter() {
            let details = self
                .catalog
                .movie_details(page.results[index].id, language)
                .await?;
            movies.push(MovieResponse::from(details));
        }

        info!("Fetched {} movies from discover for seed {}", movies.len(), seed);
        Ok(movies)
    }
}

fn find_video<'a>(videos: &[&'a Video], video_type: &str, require_official: bool) -> Option<&'a Video> {
    videos
        .iter()
        .find(|v| v.site == "YouTube" && v.video_type == video_type && (!require_official || v.official))
        .copied()
}

/// Largest YouTube video, preferring an official trailer, then any trailer,
/// then a featurette.
pub fn best_trailer(videos: &[Video]) -> Option<&Video> {
    let mut sorted: Vec<&Video> = videos.iter().collect();
    sorted.sort_by(|a, b| b.size.cmp(&a.size));

    find_video(&sorted, "Trailer", true)
        .or_else(|| find_video(&sorted, "Trailer", false))
        .or_else(|| find_video(&sorted, "Featurette", false))
}

pub fn trailer_url(video: &Video) -> String {
    format!("{}{}", YOUTUBE_VIDEO_BASE_URL, video.key)
}

/// Providers worth showing, in TMDB display order.
pub fn popular_providers(providers: &[WatchProvider], names: &[String]) -> Vec<ProviderResponse> {
    let mut sorted: Vec<&WatchProvider> = providers
        .iter()
        .filter(|p| names.iter().any(|n| n == &p.provider_name))
        .collect();
    sorted.sort_by_key(|p| p.display_priority);
    sorted.into_iter().map(ProviderResponse::from).collect()
}
