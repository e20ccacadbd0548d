use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::api::{account, auth, genres, movies, people};
use crate::auth::{auth_middleware, TokenKeys};
use crate::config::Config;
use crate::db::SqliteRepository;
use crate::paging::SortRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<SqliteRepository>,
    pub registry: Arc<SortRegistry>,
    pub tokens: Arc<TokenKeys>,
}

impl AppState {
    pub fn new(config: Config, db: Arc<SqliteRepository>, tokens: TokenKeys) -> Self {
        Self {
            config: Arc::new(config),
            db,
            registry: Arc::new(SortRegistry::standard()),
            tokens: Arc::new(tokens),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Routes that annotate results for the caller when a token is sent.
    let personalized = Router::new()
        .route("/api/movies", get(movies::list_movies))
        .route("/api/movies/:id", get(movies::get_movie))
        .route("/api/movies/:id/similar", get(movies::similar_movies))
        .route("/api/genres/:name/movies", get(genres::genre_movies))
        .route("/api/people/:id/acted", get(people::acted_in))
        .route("/api/people/:id/directed", get(people::directed))
        .route("/api/account/favorites", get(account::list_favorites))
        .route(
            "/api/account/favorites/:id",
            post(account::add_favorite).delete(account::remove_favorite),
        )
        .route("/api/account/ratings/:id", post(account::save_rating))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let public = Router::new()
        .route("/api/movies/:id/ratings", get(movies::movie_ratings))
        .route("/api/genres", get(genres::list_genres))
        .route("/api/genres/:name", get(genres::get_genre))
        .route("/api/people", get(people::list_people))
        .route("/api/people/:id", get(people::get_person))
        .route("/api/people/:id/similar", get(people::similar_people))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    let mut router = Router::new()
        .route("/robots.txt", get(robots_txt_handler))
        .merge(personalized)
        .merge(public)
        .fallback(fallback_handler);

    if let Some(ref appdir) = state.config.appdir {
        router = router.fallback_service(ServeDir::new(appdir));
    }

    router
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn robots_txt_handler() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

async fn fallback_handler(req: Request) -> impl IntoResponse {
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}
