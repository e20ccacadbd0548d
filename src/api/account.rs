use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::paging;
use crate::auth::Principal;
use crate::db::{FavoriteRepo, MovieListItem, RatedMovie, RatingRepo};
use crate::error::{ApiError, ApiResult};
use crate::paging::{EntityKind, PageParams};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    #[serde(default)]
    pub rating: Value,
}

/// Ratings arrive as a JSON integer or a string holding one.
pub fn parse_rating(value: &Value) -> ApiResult<i64> {
    let rating = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    rating.ok_or_else(|| ApiError::Validation(format!("Invalid rating: {}", value)))
}

pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<MovieListItem>>> {
    let user_id = principal.require()?;
    let page = paging(&state, &params, EntityKind::Movie);
    Ok(Json(state.db.find_favorites(user_id, &page).await?))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(movie_id): Path<String>,
) -> ApiResult<Json<MovieListItem>> {
    let user_id = principal.require()?;
    Ok(Json(state.db.save_favorite(user_id, &movie_id).await?))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(movie_id): Path<String>,
) -> ApiResult<Json<MovieListItem>> {
    let user_id = principal.require()?;
    Ok(Json(state.db.delete_favorite(user_id, &movie_id).await?))
}

pub async fn save_rating(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(movie_id): Path<String>,
    body: Result<Json<RatingRequest>, JsonRejection>,
) -> ApiResult<Json<RatedMovie>> {
    let user_id = principal.require()?;
    let Json(req) = body?;
    let rating = parse_rating(&req.rating)?;
    Ok(Json(state.db.save_rating(user_id, &movie_id, rating).await?))
}
