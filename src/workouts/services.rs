use tracing::info;
use uuid::Uuid;

use crate::auth::{
    extractors::Identity,
    guard::{require_authenticated, require_ownership},
};
use crate::error::AppError;
use crate::state::AppState;
use crate::workouts::{
    dto::UpdateWorkoutRequest,
    repo_types::{Workout, WorkoutDraft},
};

pub fn validate(draft: &WorkoutDraft) -> Result<(), AppError> {
    if draft.title.trim().is_empty() {
        return Err(AppError::MalformedInput("title is required".into()));
    }
    if draft.duration_minutes < 0 || draft.calories_burned < 0 {
        return Err(AppError::MalformedInput(
            "duration_minutes and calories_burned must not be negative".into(),
        ));
    }
    for (i, entry) in draft.entries.iter().enumerate() {
        if entry.exercise_name.trim().is_empty() {
            return Err(AppError::MalformedInput(format!(
                "entries[{i}]: exercise_name is required"
            )));
        }
        if entry.sets < 0 {
            return Err(AppError::MalformedInput(format!(
                "entries[{i}]: sets must not be negative"
            )));
        }
        if !entry.has_single_measure() {
            return Err(AppError::MalformedInput(format!(
                "entries[{i}]: exactly one of reps or duration_seconds is required"
            )));
        }
    }
    Ok(())
}

pub async fn create_workout(
    state: &AppState,
    identity: &Identity,
    draft: WorkoutDraft,
) -> Result<Workout, AppError> {
    let user = require_authenticated(identity)?;
    validate(&draft)?;
    let workout = state.workouts.create(user.id, &draft).await?;
    info!(workout_id = %workout.id, user_id = %user.id, "workout created");
    Ok(workout)
}

pub async fn get_workout(
    state: &AppState,
    identity: &Identity,
    id: Uuid,
) -> Result<Workout, AppError> {
    require_authenticated(identity)?;
    state.workouts.get_by_id(id).await?.ok_or(AppError::NotFound)
}

/// Ownership is checked on the owner id alone before the aggregate is loaded.
async fn authorize_mutation(
    state: &AppState,
    identity: &Identity,
    id: Uuid,
) -> Result<(), AppError> {
    require_authenticated(identity)?;
    let owner_id = state.workouts.owner_of(id).await?.ok_or(AppError::NotFound)?;
    require_ownership(identity, owner_id)?;
    Ok(())
}

pub async fn update_workout(
    state: &AppState,
    identity: &Identity,
    id: Uuid,
    patch: UpdateWorkoutRequest,
) -> Result<Workout, AppError> {
    authorize_mutation(state, identity, id).await?;

    let existing = state.workouts.get_by_id(id).await?.ok_or(AppError::NotFound)?;
    let mut draft = WorkoutDraft::from(&existing);
    patch.apply_to(&mut draft)?;
    validate(&draft)?;

    let workout = state.workouts.update(id, &draft).await?;
    info!(workout_id = %id, entries = workout.entries.len(), "workout updated");
    Ok(workout)
}

pub async fn delete_workout(
    state: &AppState,
    identity: &Identity,
    id: Uuid,
) -> Result<(), AppError> {
    authorize_mutation(state, identity, id).await?;
    state.workouts.delete(id).await?;
    info!(workout_id = %id, "workout deleted");
    Ok(())
}
