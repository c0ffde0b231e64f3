use serde::Deserialize;

use crate::error::AppError;
use crate::workouts::repo_types::{EntryDraft, WorkoutDraft};

#[derive(Debug, Clone, Deserialize)]
pub struct EntryRequest {
    pub exercise_name: String,
    pub sets: i32,
    pub reps: Option<i32>,
    pub duration_seconds: Option<i32>,
    pub weight: Option<f64>,
    #[serde(default)]
    pub notes: String,
    /// Defaults to the 1-based position when no entry in the list sets it.
    pub order_index: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWorkoutRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration_minutes: i32,
    #[serde(default)]
    pub calories_burned: i32,
    #[serde(default)]
    pub entries: Vec<EntryRequest>,
}

/// Absent scalars keep their stored value. A present `entries` list replaces
/// the stored list entirely.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateWorkoutRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<i32>,
    pub calories_burned: Option<i32>,
    pub entries: Option<Vec<EntryRequest>>,
}

/// Either every entry carries `order_index` or none does. In the latter case
/// the 1-based list position is used.
pub fn entry_drafts(entries: Vec<EntryRequest>) -> Result<Vec<EntryDraft>, AppError> {
    let explicit = entries.iter().filter(|e| e.order_index.is_some()).count();
    if explicit != 0 && explicit != entries.len() {
        return Err(AppError::MalformedInput(
            "entries: order_index must be given for every entry or for none".into(),
        ));
    }
    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(i, e)| EntryDraft {
            exercise_name: e.exercise_name,
            sets: e.sets,
            reps: e.reps,
            duration_seconds: e.duration_seconds,
            weight: e.weight,
            notes: e.notes,
            order_index: e.order_index.unwrap_or(i as i32 + 1),
        })
        .collect())
}

impl TryFrom<CreateWorkoutRequest> for WorkoutDraft {
    type Error = AppError;

    fn try_from(req: CreateWorkoutRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: req.title,
            description: req.description,
            duration_minutes: req.duration_minutes,
            calories_burned: req.calories_burned,
            entries: entry_drafts(req.entries)?,
        })
    }
}

impl UpdateWorkoutRequest {
    pub fn apply_to(self, draft: &mut WorkoutDraft) -> Result<(), AppError> {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(minutes) = self.duration_minutes {
            draft.duration_minutes = minutes;
        }
        if let Some(calories) = self.calories_burned {
            draft.calories_burned = calories;
        }
        if let Some(entries) = self.entries {
            draft.entries = entry_drafts(entries)?;
        }
        Ok(())
    }
}
