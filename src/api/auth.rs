use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use crate::auth::{self, AuthenticatedUser};
use crate::error::ApiResult;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Json<AuthenticatedUser>> {
    let Json(req) = body?;
    let user = auth::register(
        state.db.as_ref(),
        &state.tokens,
        state.config.auth.saltrounds,
        &req.email,
        &req.password,
        &req.name,
    )
    .await?;
    Ok(Json(user))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthenticatedUser>> {
    let Json(req) = body?;
    let user = auth::login(state.db.as_ref(), &state.tokens, &req.email, &req.password).await?;
    Ok(Json(user))
}
