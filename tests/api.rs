use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tower::ServiceExt;
use uuid::Uuid;

use moviematch::config::Config;
use moviematch::db::SqliteRepository;
use moviematch::server::{build_router, AppState};
use moviematch::tmdb::{
    DiscoverFilters, DiscoverPage, DiscoverResult, MovieCatalog, MovieDetails, TmdbError,
    TmdbGenre, TmdbResult, Video, WatchProvider,
};

/// 50 pages of 20 movies. Movie ids encode page and position. Even ids
/// have a trailer.
struct FakeCatalog;

#[async_trait]
impl MovieCatalog for FakeCatalog {
    async fn discover(
        &self,
        page: u32,
        _language: &str,
        filters: &DiscoverFilters,
    ) -> TmdbResult<DiscoverPage> {
        // A genre filter of 9999 matches nothing.
        if filters.genres.contains(&9999) {
            return Ok(DiscoverPage::default());
        }
        Ok(DiscoverPage {
            page,
            results: (0..20)
                .map(|i| DiscoverResult {
                    id: page as i64 * 100 + i,
                    title: None,
                })
                .collect(),
            total_pages: 50,
            total_results: 1000,
        })
    }

    async fn movie_details(&self, id: i64, _language: &str) -> TmdbResult<MovieDetails> {
        Ok(MovieDetails {
            id,
            title: Some(format!("Movie {}", id)),
            poster_path: Some(format!("/{}.jpg", id)),
            release_date: Some("2001-02-03".to_string()),
            ..Default::default()
        })
    }

    async fn videos(&self, id: i64, _language: &str) -> TmdbResult<Vec<Video>> {
        if id % 2 == 1 {
            return Ok(Vec::new());
        }
        Ok(vec![
            Video {
                key: format!("teaser{}", id),
                site: "YouTube".to_string(),
                video_type: "Teaser".to_string(),
                official: true,
                size: 2160,
            },
            Video {
                key: format!("trailer{}", id),
                site: "YouTube".to_string(),
                video_type: "Trailer".to_string(),
                official: true,
                size: 1080,
            },
        ])
    }

    async fn watch_providers(
        &self,
        _region: &str,
        _language: &str,
    ) -> TmdbResult<Vec<WatchProvider>> {
        Ok(vec![
            WatchProvider {
                display_priority: 3,
                logo_path: Some("/max.jpg".to_string()),
                provider_name: "Max".to_string(),
                provider_id: 1899,
            },
            WatchProvider {
                display_priority: 0,
                logo_path: Some("/local.jpg".to_string()),
                provider_name: "Local Video Store".to_string(),
                provider_id: 1,
            },
            WatchProvider {
                display_priority: 1,
                logo_path: Some("/netflix.jpg".to_string()),
                provider_name: "Netflix".to_string(),
                provider_id: 8,
            },
        ])
    }

    async fn genres(&self, language: &str) -> TmdbResult<Vec<TmdbGenre>> {
        if language != "en" {
            return Err(TmdbError::NotFound(language.to_string()));
        }
        Ok(vec![
            TmdbGenre {
                id: 28,
                name: "Action".to_string(),
            },
            TmdbGenre {
                id: 35,
                name: "Comedy".to_string(),
            },
        ])
    }
}

async fn state_with_db(db_path: &str) -> AppState {
    let config = Config::from_yaml("{}").unwrap();
    let db = Arc::new(SqliteRepository::new(db_path).await.unwrap());
    AppState::new(config, db, Arc::new(FakeCatalog))
}

async fn test_app() -> Router {
    build_router(state_with_db("sqlite::memory:").await)
}

fn player() -> String {
    Uuid::new_v4().to_string()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, req).await;
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

fn movie_ids(value: &Value) -> Vec<i64> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect()
}

fn room(seed: &str, player: &str) -> Value {
    json!({ "seed": seed, "playerSessionId": player, "language": "en-US" })
}

fn like(seed: &str, player: &str, movie_id: i64) -> Value {
    json!({ "seed": seed, "playerSessionId": player, "movieId": movie_id })
}

#[tokio::test]
async fn test_both_players_get_the_same_deck() {
    let app = test_app().await;
    let (p1, p2) = (player(), player());

    let (status, created) = send_json(&app, post_json("/api/v1/session/create-room", room("AB12", &p1))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created.as_array().unwrap().len(), 10);
    assert!(created[0]["posterUrl"].as_str().unwrap().starts_with("https://image.tmdb.org/t/p/w780/"));
    assert_eq!(created[0]["releaseDate"], "2001-02-03");

    let (status, joined) = send_json(&app, post_json("/api/v1/session/join-room", room("AB12", &p2))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(movie_ids(&created), movie_ids(&joined));

    let (_, preview) = send_json(&app, get("/api/v1/tmdb/fetch?seed=AB12&language=en-US&limit=10")).await;
    assert_eq!(movie_ids(&preview), movie_ids(&created));
}

#[tokio::test]
async fn test_create_room_validation() {
    let app = test_app().await;
    let p1 = player();

    let (status, body) = send(&app, post_json("/api/v1/session/create-room", room("ab12", &p1))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8(body).unwrap().contains("Invalid seed ab12"));

    let (status, _) = send(&app, post_json("/api/v1/session/create-room", room("AB12", "not-a-uuid"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, post_json("/api/v1/session/create-room", room("AB12", &p1))).await;
    assert_eq!(status, StatusCode::OK);

    // Same seed, different player.
    let (status, body) = send(&app, post_json("/api/v1/session/create-room", room("AB12", &player()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8(body).unwrap().contains("already exists"));

    // Same player, different seed.
    let (status, body) = send(&app, post_json("/api/v1/session/create-room", room("CD34", &p1))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        format!("Player session id {} already exists", p1)
    );
}

#[tokio::test]
async fn test_join_room_rules() {
    let app = test_app().await;
    let (p1, p2, p3) = (player(), player(), player());

    let (status, _) = send(&app, post_json("/api/v1/session/join-room", room("ZZZZ", &p1))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, post_json("/api/v1/session/create-room", room("AB12", &p1))).await;
    let (status, _) = send(&app, post_json("/api/v1/session/join-room", room("AB12", &p2))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, post_json("/api/v1/session/join-room", room("AB12", &p3))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8(body).unwrap().contains("too many players (3)"));

    // A member coming back is not a third player.
    let (status, _) = send(&app, post_json("/api/v1/session/join-room", room("AB12", &p1))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_mutual_likes() {
    let app = test_app().await;
    let (p1, p2) = (player(), player());
    send(&app, post_json("/api/v1/session/create-room", room("AB12", &p1))).await;

    // Alone in the room: never common.
    let (status, common) = send_json(&app, post_json("/api/v1/session/add-to-likes", like("AB12", &p1, 550))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(common, json!(false));

    send(&app, post_json("/api/v1/session/join-room", room("AB12", &p2))).await;

    let (_, common) = send_json(&app, post_json("/api/v1/session/add-to-likes", like("AB12", &p2, 13))).await;
    assert_eq!(common, json!(false));
    let (_, common) = send_json(&app, post_json("/api/v1/session/add-to-likes", like("AB12", &p2, 550))).await;
    assert_eq!(common, json!(true));
    let (_, common) = send_json(&app, post_json("/api/v1/session/add-to-likes", like("AB12", &p1, 13))).await;
    assert_eq!(common, json!(true));

    let (status, body) = send(&app, post_json("/api/v1/session/add-to-likes", like("AB12", &p1, 550))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(String::from_utf8(body).unwrap(), "Movie already liked");

    let (_, common) = send_json(&app, get(&format!("/api/v1/session/common-likes?playerSessionId={}", p2))).await;
    assert_eq!(common, json!([550, 13]));

    let (_, mine) = send_json(&app, get(&format!("/api/v1/session/player-likes?playerSessionId={}", p2))).await;
    assert_eq!(mine, json!([13, 550]));
}

#[tokio::test]
async fn test_likes_require_membership() {
    let app = test_app().await;
    let (p1, outsider) = (player(), player());
    send(&app, post_json("/api/v1/session/create-room", room("AB12", &p1))).await;
    send(&app, post_json("/api/v1/session/create-room", room("CD34", &outsider))).await;

    let (status, _) = send(&app, post_json("/api/v1/session/add-to-likes", like("AB12", &outsider, 1))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, post_json("/api/v1/session/add-to-likes", like("AB12", &player(), 1))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, post_json("/api/v1/session/add-to-likes", like("QQQQ", &p1, 1))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, post_json("/api/v1/session/add-to-likes", like("AB1", &p1, 1))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get(&format!("/api/v1/session/common-likes?playerSessionId={}", player()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fetch_more_follows_the_seed_sequence() {
    let app = test_app().await;
    let (p1, p2) = (player(), player());
    send(&app, post_json("/api/v1/session/create-room", room("AB12", &p1))).await;
    send(&app, post_json("/api/v1/session/join-room", room("AB12", &p2))).await;

    let (status, first_p1) = send_json(&app, post_json("/api/v1/session/fetch-more", room("AB12", &p1))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second_p1) = send_json(&app, post_json("/api/v1/session/fetch-more", room("AB12", &p1))).await;

    // The second player pages through the seeds the first one generated.
    let (_, first_p2) = send_json(&app, post_json("/api/v1/session/fetch-more", room("AB12", &p2))).await;
    let (_, second_p2) = send_json(&app, post_json("/api/v1/session/fetch-more", room("AB12", &p2))).await;
    assert_eq!(movie_ids(&first_p1), movie_ids(&first_p2));
    assert_eq!(movie_ids(&second_p1), movie_ids(&second_p2));

    // The generated seed is derived from the room seed.
    let next = moviematch::seed::next_seed("AB12").unwrap();
    let (_, preview) = send_json(&app, get(&format!("/api/v1/tmdb/fetch?seed={}&limit=10", next))).await;
    assert_eq!(movie_ids(&preview), movie_ids(&first_p1));
}

#[tokio::test]
async fn test_rejoin_returns_current_deck() {
    let app = test_app().await;
    let p1 = player();
    send(&app, post_json("/api/v1/session/create-room", room("AB12", &p1))).await;
    let (_, more) = send_json(&app, post_json("/api/v1/session/fetch-more", room("AB12", &p1))).await;

    let (status, rejoined) = send_json(&app, post_json("/api/v1/session/join-room", room("AB12", &p1))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(movie_ids(&rejoined), movie_ids(&more));
}

#[tokio::test]
async fn test_player_moves_between_rooms() {
    let app = test_app().await;
    let (p1, p2) = (player(), player());
    send(&app, post_json("/api/v1/session/create-room", room("AB12", &p1))).await;
    send(&app, post_json("/api/v1/session/create-room", room("CD34", &p2))).await;
    send(&app, post_json("/api/v1/session/add-to-likes", like("CD34", &p2, 77))).await;

    let (status, _) = send(&app, post_json("/api/v1/session/join-room", room("AB12", &p2))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, mine) = send_json(&app, get(&format!("/api/v1/session/player-likes?playerSessionId={}", p2))).await;
    assert_eq!(mine, json!([]));

    let (status, _) = send(&app, post_json("/api/v1/session/add-to-likes", like("CD34", &p2, 78))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, post_json("/api/v1/session/add-to-likes", like("AB12", &p2, 77))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rejoin_and_existence_checks() {
    let app = test_app().await;
    let p1 = player();

    let (_, exists) = send_json(&app, get("/api/v1/session/does-room-exist?seed=AB12")).await;
    assert_eq!(exists, json!(false));
    let (_, can) = send_json(&app, get(&format!("/api/v1/session/can-player-rejoin?playerSessionId={}", p1))).await;
    assert_eq!(can, json!(false));

    send(&app, post_json("/api/v1/session/create-room", room("AB12", &p1))).await;

    let (_, exists) = send_json(&app, get("/api/v1/session/does-room-exist?seed=AB12")).await;
    assert_eq!(exists, json!(true));
    let (_, exists) = send_json(&app, get("/api/v1/session/does-room-exist?seed=ab12")).await;
    assert_eq!(exists, json!(false));
    let (_, can) = send_json(&app, get(&format!("/api/v1/session/can-player-rejoin?playerSessionId={}", p1))).await;
    assert_eq!(can, json!(true));
}

#[tokio::test]
async fn test_room_filters_apply_to_joiners() {
    let app = test_app().await;
    let (p1, p2) = (player(), player());
    let mut request = room("AB12", &p1);
    request["genres"] = json!([9999]);

    let (status, created) = send_json(&app, post_json("/api/v1/session/create-room", request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created, json!([]));

    // The joiner sends no filters but gets the room's.
    let (_, joined) = send_json(&app, post_json("/api/v1/session/join-room", room("AB12", &p2))).await;
    assert_eq!(joined, json!([]));
}

#[tokio::test]
async fn test_trailer_endpoint() {
    let app = test_app().await;

    let (status, body) = send(&app, get("/api/v1/tmdb/youtube-trailer/550/en-US")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "https://www.youtube.com/embed/trailer550"
    );

    let (status, _) = send(&app, get("/api/v1/tmdb/youtube-trailer/551/en-US")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_providers_and_genres() {
    let app = test_app().await;

    let (status, providers) = send_json(&app, get("/api/v1/tmdb/watch-providers/US/en-US")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        providers,
        json!([
            { "logoUrl": "https://image.tmdb.org/t/p/w92/netflix.jpg", "providerName": "Netflix", "providerId": 8 },
            { "logoUrl": "https://image.tmdb.org/t/p/w92/max.jpg", "providerName": "Max", "providerId": 1899 }
        ])
    );

    let (status, genres) = send_json(&app, get("/api/v1/tmdb/genres")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(genres, json!([{ "id": 28, "name": "Action" }, { "id": 35, "name": "Comedy" }]));
}

#[tokio::test]
async fn test_fetch_preview_validation_and_limit() {
    let app = test_app().await;

    let (status, _) = send(&app, get("/api/v1/tmdb/fetch?seed=A-12")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, movies) = send_json(&app, get("/api/v1/tmdb/fetch?seed=AB12&limit=50")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(movies.as_array().unwrap().len(), 20);

    let (_, movies) = send_json(&app, get("/api/v1/tmdb/fetch?seed=AB12")).await;
    assert_eq!(movies.as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_unknown_route() {
    let app = test_app().await;
    let (status, _) = send(&app, get("/api/v1/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = send(&app, get("/robots.txt")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("Disallow"));
}

#[tokio::test]
async fn test_join_room_rejects_invalid_seed() {
    let app = test_app().await;
    let (p1, p2) = (player(), player());
    send(&app, post_json("/api/v1/session/create-room", room("AB12", &p1))).await;

    let (status, body) = send(&app, post_json("/api/v1/session/join-room", room("ab12", &p2))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8(body).unwrap().contains("Invalid seed ab12"));

    let (status, _) = send(&app, post_json("/api/v1/session/join-room", room("AB12", "not-a-uuid"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_fetch_more_requires_membership() {
    let app = test_app().await;
    let (p1, outsider) = (player(), player());
    send(&app, post_json("/api/v1/session/create-room", room("AB12", &p1))).await;
    send(&app, post_json("/api/v1/session/create-room", room("CD34", &outsider))).await;

    let (status, _) = send(&app, post_json("/api/v1/session/fetch-more", room("QQQQ", &p1))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, post_json("/api/v1/session/fetch-more", room("AB12", &player()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, post_json("/api/v1/session/fetch-more", room("AB12", &outsider))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, post_json("/api/v1/session/fetch-more", room("AB-2", &p1))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_player_likes_unknown_player() {
    let app = test_app().await;
    let (status, _) = send(&app, get(&format!("/api/v1/session/player-likes?playerSessionId={}", player()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_random_seed_is_unused() {
    let app = test_app().await;
    let (status, body) = send(&app, get("/api/v1/session/random-seed")).await;
    assert_eq!(status, StatusCode::OK);
    let seed = String::from_utf8(body).unwrap();
    assert!(moviematch::seed::is_valid(&seed));

    let (_, exists) = send_json(&app, get(&format!("/api/v1/session/does-room-exist?seed={}", seed))).await;
    assert_eq!(exists, json!(false));
    let (status, _) = send(&app, post_json("/api/v1/session/create-room", room(&seed, &player()))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_fill_one_place() {
    let app = test_app().await;
    send(&app, post_json("/api/v1/session/create-room", room("AB12", &player()))).await;

    let joins: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                send(&app, post_json("/api/v1/session/join-room", room("AB12", &player()))).await.0
            })
        })
        .collect();

    let mut statuses = Vec::new();
    for join in joins {
        statuses.push(join.await.unwrap());
    }
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::BAD_REQUEST).count(),
        7
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_likes_find_each_other() {
    let app = test_app().await;
    let (p1, p2) = (player(), player());
    send(&app, post_json("/api/v1/session/create-room", room("AB12", &p1))).await;
    send(&app, post_json("/api/v1/session/join-room", room("AB12", &p2))).await;

    let likes: Vec<_> = [p1.clone(), p2.clone()]
        .into_iter()
        .map(|p| {
            let app = app.clone();
            tokio::spawn(async move {
                send_json(&app, post_json("/api/v1/session/add-to-likes", like("AB12", &p, 550))).await
            })
        })
        .collect();

    let mut results = Vec::new();
    for handle in likes {
        let (status, common) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        results.push(common);
    }
    assert_eq!(results.iter().filter(|c| **c == json!(true)).count(), 1);

    let (_, common) = send_json(&app, get(&format!("/api/v1/session/common-likes?playerSessionId={}", p1))).await;
    assert_eq!(common, json!([550]));
}

#[tokio::test]
async fn test_idle_rooms_are_swept() {
    let state = state_with_db("sqlite::memory:").await;
    let app = build_router(state.clone());
    let p1 = player();
    send(&app, post_json("/api/v1/session/create-room", room("AB12", &p1))).await;

    state
        .rooms
        .clone()
        .start_background_tasks(Duration::ZERO, Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(200)).await;

    let (_, exists) = send_json(&app, get("/api/v1/session/does-room-exist?seed=AB12")).await;
    assert_eq!(exists, json!(false));
    let (_, can) = send_json(&app, get(&format!("/api/v1/session/can-player-rejoin?playerSessionId={}", p1))).await;
    assert_eq!(can, json!(false));
}

#[tokio::test]
async fn test_failed_like_can_be_retried() {
    let path = std::env::temp_dir().join(format!("moviematch-{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());
    let app = build_router(state_with_db(&url).await);
    let (p1, p2) = (player(), player());
    send(&app, post_json("/api/v1/session/create-room", room("AB12", &p1))).await;
    send(&app, post_json("/api/v1/session/join-room", room("AB12", &p2))).await;
    send(&app, post_json("/api/v1/session/add-to-likes", like("AB12", &p1, 550))).await;

    let admin = SqlitePool::connect_with(SqliteConnectOptions::from_str(&url).unwrap())
        .await
        .unwrap();
    sqlx::query(
        "CREATE TRIGGER fail_common BEFORE INSERT ON common_likes
         BEGIN SELECT RAISE(FAIL, 'transient'); END",
    )
    .execute(&admin)
    .await
    .unwrap();

    let (status, _) = send(&app, post_json("/api/v1/session/add-to-likes", like("AB12", &p2, 550))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let (_, mine) = send_json(&app, get(&format!("/api/v1/session/player-likes?playerSessionId={}", p2))).await;
    assert_eq!(mine, json!([]));

    sqlx::query("DROP TRIGGER fail_common")
        .execute(&admin)
        .await
        .unwrap();
    admin.close().await;

    let (status, common) = send_json(&app, post_json("/api/v1/session/add-to-likes", like("AB12", &p2, 550))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(common, json!(true));
    let (_, common) = send_json(&app, get(&format!("/api/v1/session/common-likes?playerSessionId={}", p1))).await;
    assert_eq!(common, json!([550]));

    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}
