use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::workouts::repo_types::{EntryDraft, Workout, WorkoutDraft, WorkoutEntry, WorkoutRow};

/// Persistence of the workout aggregate. `create` and `update` are atomic:
/// either the root and every entry are written, or nothing is.
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    async fn create(&self, owner_id: Uuid, draft: &WorkoutDraft) -> Result<Workout, AppError>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Workout>, AppError>;
    /// Replaces the scalar fields and the whole entry list.
    async fn update(&self, id: Uuid, draft: &WorkoutDraft) -> Result<Workout, AppError>;
    /// Entries go with the root through the foreign-key cascade.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
    async fn owner_of(&self, id: Uuid) -> Result<Option<Uuid>, AppError>;
}

#[derive(Clone)]
pub struct PgWorkoutStore {
    db: PgPool,
}

impl PgWorkoutStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Insert every entry of `draft` for `workout_id` within a transaction.
async fn insert_entries_tx(
    tx: &mut Transaction<'_, Postgres>,
    workout_id: Uuid,
    entries: &[EntryDraft],
) -> Result<Vec<WorkoutEntry>, AppError> {
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let row = sqlx::query_as::<_, WorkoutEntry>(
            r#"
            INSERT INTO workout_entries
                (workout_id, exercise_name, sets, reps, duration_seconds, weight, notes, order_index)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, exercise_name, sets, reps, duration_seconds, weight, notes, order_index
            "#,
        )
        .bind(workout_id)
        .bind(&entry.exercise_name)
        .bind(entry.sets)
        .bind(entry.reps)
        .bind(entry.duration_seconds)
        .bind(entry.weight)
        .bind(&entry.notes)
        .bind(entry.order_index)
        .fetch_one(&mut **tx)
        .await?;
        out.push(row);
    }
    out.sort_by_key(|e| e.order_index);
    Ok(out)
}

#[async_trait]
impl WorkoutStore for PgWorkoutStore {
    async fn create(&self, owner_id: Uuid, draft: &WorkoutDraft) -> Result<Workout, AppError> {
        // dropping `tx` on any early return rolls it back
        let mut tx = self.db.begin().await.context("begin tx")?;

        let root = sqlx::query_as::<_, WorkoutRow>(
            r#"
            INSERT INTO workouts (user_id, title, description, duration_minutes, calories_burned)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, title, description, duration_minutes, calories_burned,
                      created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.duration_minutes)
        .bind(draft.calories_burned)
        .fetch_one(&mut *tx)
        .await?;

        let entries = insert_entries_tx(&mut tx, root.id, &draft.entries).await?;
        tx.commit().await.context("commit tx")?;

        debug!(workout_id = %root.id, entries = entries.len(), "workout created");
        Ok(root.into_workout(entries))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Workout>, AppError> {
        let Some(root) = sqlx::query_as::<_, WorkoutRow>(
            r#"
            SELECT id, user_id, title, description, duration_minutes, calories_burned,
                   created_at, updated_at
            FROM workouts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        else {
            return Ok(None);
        };

        let entries = sqlx::query_as::<_, WorkoutEntry>(
            r#"
            SELECT id, exercise_name, sets, reps, duration_seconds, weight, notes, order_index
            FROM workout_entries
            WHERE workout_id = $1
            ORDER BY order_index ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some(root.into_workout(entries)))
    }

    async fn update(&self, id: Uuid, draft: &WorkoutDraft) -> Result<Workout, AppError> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let result = sqlx::query(
            r#"
            UPDATE workouts
            SET title = $1, description = $2, duration_minutes = $3, calories_burned = $4,
                updated_at = now()
            WHERE id = $5
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.duration_minutes)
        .bind(draft.calories_burned)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        sqlx::query(r#"DELETE FROM workout_entries WHERE workout_id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let entries = insert_entries_tx(&mut tx, id, &draft.entries).await?;

        let root = sqlx::query_as::<_, WorkoutRow>(
            r#"
            SELECT id, user_id, title, description, duration_minutes, calories_burned,
                   created_at, updated_at
            FROM workouts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await.context("commit tx")?;

        debug!(workout_id = %id, entries = entries.len(), "workout updated");
        Ok(root.into_workout(entries))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(r#"DELETE FROM workouts WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn owner_of(&self, id: Uuid) -> Result<Option<Uuid>, AppError> {
        let owner = sqlx::query_scalar::<_, Uuid>(r#"SELECT user_id FROM workouts WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(owner)
    }
}
