use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest, UpdateProfileRequest},
        extractors::Identity,
        services,
        tokens::Token,
    },
    error::AppError,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/me", get(get_me).put(update_me))
}

pub fn token_routes() -> Router<AppState> {
    Router::new().route(
        "/tokens/authentication",
        post(create_token).delete(delete_tokens),
    )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let user = services::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn create_token(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(StatusCode, Json<Token>), AppError> {
    let token = services::login(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(token)))
}

#[instrument(skip(state, identity))]
pub async fn delete_tokens(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<StatusCode, AppError> {
    services::logout_all(&state, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(identity))]
pub async fn get_me(identity: Identity) -> Result<Json<PublicUser>, AppError> {
    services::current_user(&identity).map(Json)
}

#[instrument(skip(state, identity, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let user = services::update_profile(&state, &identity, payload).await?;
    Ok(Json(user))
}
