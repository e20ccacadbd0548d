use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use super::paging;
use crate::auth::Principal;
use crate::db::{MovieListItem, MovieRepo, PeopleRepo, PersonDetails, PersonListItem, SimilarPerson};
use crate::error::ApiResult;
use crate::paging::{EntityKind, PageParams};
use crate::server::AppState;

pub async fn list_people(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<PersonListItem>>> {
    let page = paging(&state, &params, EntityKind::Person);
    Ok(Json(state.db.find_all_people(&page).await?))
}

pub async fn get_person(
    State(state): State<AppState>,
    Path(person_id): Path<String>,
) -> ApiResult<Json<PersonDetails>> {
    Ok(Json(state.db.find_person(&person_id).await?))
}

pub async fn similar_people(
    State(state): State<AppState>,
    Path(person_id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<SimilarPerson>>> {
    let page = paging(&state, &params, EntityKind::Person);
    Ok(Json(state.db.find_similar_people(&person_id, &page).await?))
}

pub async fn acted_in(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(person_id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<MovieListItem>>> {
    let page = paging(&state, &params, EntityKind::Movie);
    let movies = state
        .db
        .find_movies_by_actor(&person_id, principal.user_id(), &page)
        .await?;
    Ok(Json(movies))
}

pub async fn directed(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(person_id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<MovieListItem>>> {
    let page = paging(&state, &params, EntityKind::Movie);
    let movies = state
        .db
        .find_movies_by_director(&person_id, principal.user_id(), &page)
        .await?;
    Ok(Json(movies))
}
