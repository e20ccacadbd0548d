use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use super::paging;
use crate::auth::Principal;
use crate::db::{MovieDetails, MovieListItem, MovieRepo, RatingRepo, Review, SimilarMovie};
use crate::error::ApiResult;
use crate::paging::{EntityKind, PageParams};
use crate::server::AppState;

pub async fn list_movies(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<MovieListItem>>> {
    let page = paging(&state, &params, EntityKind::Movie);
    let movies = state.db.find_all_movies(principal.user_id(), &page).await?;
    Ok(Json(movies))
}

pub async fn get_movie(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(movie_id): Path<String>,
) -> ApiResult<Json<MovieDetails>> {
    let movie = state.db.find_movie(&movie_id, principal.user_id()).await?;
    Ok(Json(movie))
}

pub async fn similar_movies(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(movie_id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<SimilarMovie>>> {
    let page = paging(&state, &params, EntityKind::Movie);
    let movies = state
        .db
        .find_similar_movies(&movie_id, principal.user_id(), &page)
        .await?;
    Ok(Json(movies))
}

pub async fn movie_ratings(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<Review>>> {
    let page = paging(&state, &params, EntityKind::Rating);
    let reviews = state.db.find_ratings(&movie_id, &page).await?;
    Ok(Json(reviews))
}
