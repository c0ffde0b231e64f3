use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Root row of the `workouts` table.
#[derive(Debug, Clone, FromRow)]
pub struct WorkoutRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub calories_burned: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkoutEntry {
    pub id: Uuid,
    pub exercise_name: String,
    pub sets: i32,
    pub reps: Option<i32>,
    pub duration_seconds: Option<i32>,
    pub weight: Option<f64>,
    pub notes: String,
    pub order_index: i32,
}

/// Fully materialised aggregate: root plus entries sorted by `order_index`.
#[derive(Debug, Clone, Serialize)]
pub struct Workout {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub calories_burned: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub entries: Vec<WorkoutEntry>,
}

impl WorkoutRow {
    pub fn into_workout(self, entries: Vec<WorkoutEntry>) -> Workout {
        Workout {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            duration_minutes: self.duration_minutes,
            calories_burned: self.calories_burned,
            created_at: self.created_at,
            updated_at: self.updated_at,
            entries,
        }
    }
}

/// Entry content as written by a caller; ids are assigned by storage.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub exercise_name: String,
    pub sets: i32,
    pub reps: Option<i32>,
    pub duration_seconds: Option<i32>,
    pub weight: Option<f64>,
    pub notes: String,
    pub order_index: i32,
}

/// Everything a create or full-replace update writes.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutDraft {
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub calories_burned: i32,
    pub entries: Vec<EntryDraft>,
}

impl From<&WorkoutEntry> for EntryDraft {
    fn from(e: &WorkoutEntry) -> Self {
        Self {
            exercise_name: e.exercise_name.clone(),
            sets: e.sets,
            reps: e.reps,
            duration_seconds: e.duration_seconds,
            weight: e.weight,
            notes: e.notes.clone(),
            order_index: e.order_index,
        }
    }
}

impl From<&Workout> for WorkoutDraft {
    fn from(w: &Workout) -> Self {
        Self {
            title: w.title.clone(),
            description: w.description.clone(),
            duration_minutes: w.duration_minutes,
            calories_burned: w.calories_burned,
            entries: w.entries.iter().map(EntryDraft::from).collect(),
        }
    }
}

impl EntryDraft {
    /// Mirrors the `valid_workout_entry` CHECK constraint.
    pub fn has_single_measure(&self) -> bool {
        self.reps.is_some() != self.duration_seconds.is_some()
    }
}
