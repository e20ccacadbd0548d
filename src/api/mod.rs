//! HTTP handlers for the `/api` routes.

pub mod account;
pub mod auth;
pub mod genres;
pub mod movies;
pub mod people;

use crate::paging::{EntityKind, PageParams, Paging};
use crate::server::AppState;

fn paging(state: &AppState, params: &PageParams, kind: EntityKind) -> Paging {
    Paging::parse(params, &state.registry, kind)
}
