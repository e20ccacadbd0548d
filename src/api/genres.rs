use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use super::paging;
use crate::auth::Principal;
use crate::db::{Genre, GenreRepo, MovieListItem, MovieRepo};
use crate::error::ApiResult;
use crate::paging::{EntityKind, PageParams};
use crate::server::AppState;

pub async fn list_genres(State(state): State<AppState>) -> ApiResult<Json<Vec<Genre>>> {
    Ok(Json(state.db.find_all_genres().await?))
}

pub async fn get_genre(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Genre>> {
    Ok(Json(state.db.find_genre(&name).await?))
}

pub async fn genre_movies(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<MovieListItem>>> {
    let page = paging(&state, &params, EntityKind::Movie);
    let movies = state
        .db
        .find_movies_by_genre(&name, principal.user_id(), &page)
        .await?;
    Ok(Json(movies))
}
