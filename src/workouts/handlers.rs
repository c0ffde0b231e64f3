use axum::{
    extract::{Path, State},
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{extractors::Identity, guard::require_authenticated},
    error::AppError,
    state::AppState,
    workouts::{
        dto::{CreateWorkoutRequest, UpdateWorkoutRequest},
        repo_types::{Workout, WorkoutDraft},
        services,
    },
};

pub fn workout_routes() -> Router<AppState> {
    Router::new()
        .route("/workouts", post(create_workout))
        .route(
            "/workouts/:id",
            get(get_workout).put(update_workout).delete(delete_workout),
        )
}

#[instrument(skip(state, identity, payload))]
pub async fn create_workout(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateWorkoutRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Workout>), AppError> {
    require_authenticated(&identity)?;
    let draft = WorkoutDraft::try_from(payload)?;
    let workout = services::create_workout(&state, &identity, draft).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/workouts/{}", workout.id)) {
        headers.insert(LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(workout)))
}

#[instrument(skip(state, identity))]
pub async fn get_workout(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Workout>, AppError> {
    services::get_workout(&state, &identity, id).await.map(Json)
}

#[instrument(skip(state, identity, payload))]
pub async fn update_workout(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWorkoutRequest>,
) -> Result<Json<Workout>, AppError> {
    services::update_workout(&state, &identity, id, payload)
        .await
        .map(Json)
}

#[instrument(skip(state, identity))]
pub async fn delete_workout(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    services::delete_workout(&state, &identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
