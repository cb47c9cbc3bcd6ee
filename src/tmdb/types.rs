use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const IMDB_TITLE_BASE_URL: &str = "https://www.imdb.com/title/";
pub const TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w780";
pub const TMDB_LOGO_BASE_URL: &str = "https://image.tmdb.org/t/p/w92";
pub const TMDB_MOVIE_PAGE_BASE_URL: &str = "https://www.themoviedb.org/movie/";
pub const YOUTUBE_VIDEO_BASE_URL: &str = "https://www.youtube.com/embed/";

/// TMDB never returns more than this many results per discover page.
pub const TMDB_DISCOVER_PAGE_SIZE: usize = 20;

/// Narrowing applied to the discover query of a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverFilters {
    pub genres: Vec<i32>,
    pub watch_region: Option<String>,
    pub watch_providers: Vec<i32>,
}

// Wire types of the TMDB v3 API.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoverPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<DiscoverResult>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverResult {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenreList {
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpokenLanguage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub english_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieDetails {
    pub id: i64,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genres: Option<Vec<TmdbGenre>>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub spoken_languages: Option<Vec<SpokenLanguage>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
    #[serde(default)]
    pub size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoResults {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchProvider {
    #[serde(default)]
    pub display_priority: i32,
    #[serde(default)]
    pub logo_path: Option<String>,
    pub provider_name: String,
    pub provider_id: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderResults {
    #[serde(default)]
    pub results: Vec<WatchProvider>,
}

// Types served to the browser client.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreResponse {
    pub id: i32,
    pub name: String,
}

impl From<&TmdbGenre> for GenreResponse {
    fn from(genre: &TmdbGenre) -> Self {
        Self {
            id: genre.id,
            name: genre.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    pub logo_url: String,
    pub provider_name: String,
    pub provider_id: i32,
}

impl From<&WatchProvider> for ProviderResponse {
    fn from(provider: &WatchProvider) -> Self {
        Self {
            logo_url: format!(
                "{}{}",
                TMDB_LOGO_BASE_URL,
                provider.logo_path.as_deref().unwrap_or("")
            ),
            provider_name: provider.provider_name.clone(),
            provider_id: provider.provider_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieResponse {
    pub back_drop_url: Option<String>,
    pub genres: Option<Vec<GenreResponse>>,
    pub id: i64,
    pub imdb_url: Option<String>,
    pub tmdb_url: String,
    pub overview: Option<String>,
    pub popularity: Option<f64>,
    pub poster_url: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
    pub spoken_languages: Option<Vec<String>>,
    pub status: Option<String>,
    pub tagline: Option<String>,
    pub title: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i32>,
}

impl From<MovieDetails> for MovieResponse {
    fn from(movie: MovieDetails) -> Self {
        Self {
            back_drop_url: movie
                .backdrop_path
                .map(|p| format!("{}{}", TMDB_IMAGE_BASE_URL, p)),
            genres: movie
                .genres
                .map(|genres| genres.iter().map(GenreResponse::from).collect()),
            id: movie.id,
            imdb_url: movie
                .imdb_id
                .filter(|id| !id.is_empty())
                .map(|id| format!("{}{}", IMDB_TITLE_BASE_URL, id)),
            tmdb_url: format!("{}{}", TMDB_MOVIE_PAGE_BASE_URL, movie.id),
            overview: movie.overview,
            popularity: movie.popularity,
            poster_url: movie
                .poster_path
                .map(|p| format!("{}{}", TMDB_IMAGE_BASE_URL, p)),
            release_date: movie.release_date.as_deref().and_then(format_release_date),
            runtime: movie.runtime,
            spoken_languages: movie
                .spoken_languages
                .map(|langs| langs.into_iter().map(|l| l.name).collect()),
            status: movie.status,
            tagline: movie.tagline,
            title: movie.title,
            vote_average: movie.vote_average,
            vote_count: movie.vote_count,
        }
    }
}

/// TMDB sends an empty string for unknown dates.
fn format_release_date(raw: &str) -> Option<String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}
