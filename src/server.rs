use axum::{
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::Config;
use crate::db::SqliteRepository;
use crate::room::RoomService;
use crate::tmdb::{MovieCatalog, MoviePicker};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub picker: Arc<MoviePicker>,
    pub rooms: Arc<RoomService>,
}

impl AppState {
    pub fn new(config: Config, db: Arc<SqliteRepository>, catalog: Arc<dyn MovieCatalog>) -> Self {
        let picker = Arc::new(MoviePicker::new(
            catalog,
            config.tmdb.max_discover_page,
            config.tmdb.movies_per_fetch,
        ));
        let rooms = Arc::new(RoomService::new(db, picker.clone()));
        Self {
            config: Arc::new(config),
            picker,
            rooms,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/create-room", post(crate::room::create_room))
        .route("/join-room", post(crate::room::join_room))
        .route("/fetch-more", post(crate::room::fetch_more))
        .route("/add-to-likes", post(crate::room::add_to_likes))
        .route("/can-player-rejoin", get(crate::room::can_player_rejoin))
        .route("/common-likes", get(crate::room::common_likes))
        .route("/player-likes", get(crate::room::player_likes))
        .route("/does-room-exist", get(crate::room::does_room_exist))
        .route("/random-seed", get(crate::room::random_seed));

    let tmdb_routes = Router::new()
        .route(
            "/youtube-trailer/:movie_id/:language",
            get(crate::tmdb::youtube_trailer),
        )
        .route(
            "/watch-providers/:watch_region/:language",
            get(crate::tmdb::watch_providers),
        )
        .route("/genres", get(crate::tmdb::genres))
        .route("/fetch", get(crate::tmdb::fetch_movies));

    Router::new()
        .route("/robots.txt", get(robots_txt_handler))
        .nest("/api/v1/session", session_routes)
        .nest("/api/v1/tmdb", tmdb_routes)
        .fallback(fallback_handler)
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(cors_layer(&state.config.frontend.origin))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                warn!("Invalid frontend origin {:?}, allowing any origin", origin);
                AllowOrigin::any()
            }
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

async fn robots_txt_handler() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

async fn fallback_handler(req: Request<axum::body::Body>) -> impl IntoResponse {
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}
