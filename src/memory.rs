//! In-memory stores used by unit and router tests. They keep the same
//! constraints as the PostgreSQL schema: unique username/email, the
//! `valid_workout_entry` check, owner foreign key and all-or-nothing writes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{
    repo::{TokenStore, UserStore},
    repo_types::{NewUser, User},
    tokens::{Scope, Token},
};
use crate::error::AppError;
use crate::workouts::{
    repo::WorkoutStore,
    repo_types::{EntryDraft, Workout, WorkoutDraft, WorkoutEntry, WorkoutRow},
};

struct StoredToken {
    hash: Vec<u8>,
    user_id: Uuid,
    expiry: OffsetDateTime,
    scope: Scope,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    tokens: Vec<StoredToken>,
    workouts: HashMap<Uuid, (WorkoutRow, Vec<WorkoutEntry>)>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

fn materialize(entries: &[EntryDraft]) -> Result<Vec<WorkoutEntry>, AppError> {
    if entries.iter().any(|e| !e.has_single_measure()) {
        return Err(AppError::Internal(anyhow::anyhow!(
            "insert violates check constraint \"valid_workout_entry\""
        )));
    }
    let mut out: Vec<WorkoutEntry> = entries
        .iter()
        .map(|e| WorkoutEntry {
            id: Uuid::new_v4(),
            exercise_name: e.exercise_name.clone(),
            sets: e.sets,
            reps: e.reps,
            duration_seconds: e.duration_seconds,
            weight: e.weight,
            notes: e.notes.clone(),
            order_index: e.order_index,
        })
        .collect();
    out.sort_by_key(|e| e.order_index);
    Ok(out)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut inner = self.inner.write().await;
        if inner
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::Conflict("username or email already taken".into()));
        }
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            bio: user.bio,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(created.clone());
        Ok(created)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn update(&self, user: &User) -> Result<User, AppError> {
        let mut inner = self.inner.write().await;
        if inner
            .users
            .iter()
            .any(|u| u.id != user.id && (u.username == user.username || u.email == user.email))
        {
            return Err(AppError::Conflict("username or email already taken".into()));
        }
        let stored = inner
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(AppError::NotFound)?;
        *stored = User {
            updated_at: OffsetDateTime::now_utc(),
            created_at: stored.created_at,
            ..user.clone()
        };
        Ok(stored.clone())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert(&self, token: &Token) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if !inner.users.iter().any(|u| u.id == token.user_id) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "insert violates foreign key constraint \"tokens_user_id_fkey\""
            )));
        }
        inner.tokens.push(StoredToken {
            hash: token.hash.clone(),
            user_id: token.user_id,
            expiry: token.expiry,
            scope: token.scope,
        });
        Ok(())
    }

    async fn find_user(
        &self,
        hash: &[u8],
        scope: Scope,
        now: OffsetDateTime,
    ) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        let Some(token) = inner
            .tokens
            .iter()
            .find(|t| t.hash == hash && t.scope == scope && t.expiry > now)
        else {
            return Ok(None);
        };
        Ok(inner.users.iter().find(|u| u.id == token.user_id).cloned())
    }

    async fn delete_all_for_user(&self, user_id: Uuid, scope: Scope) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner
            .tokens
            .retain(|t| !(t.user_id == user_id && t.scope == scope));
        Ok(())
    }
}

#[async_trait]
impl WorkoutStore for MemoryStore {
    async fn create(&self, owner_id: Uuid, draft: &WorkoutDraft) -> Result<Workout, AppError> {
        let mut inner = self.inner.write().await;
        if !inner.users.iter().any(|u| u.id == owner_id) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "insert violates foreign key constraint \"workouts_user_id_fkey\""
            )));
        }
        let entries = materialize(&draft.entries)?;
        let now = OffsetDateTime::now_utc();
        let root = WorkoutRow {
            id: Uuid::new_v4(),
            user_id: owner_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            duration_minutes: draft.duration_minutes,
            calories_burned: draft.calories_burned,
            created_at: now,
            updated_at: now,
        };
        inner
            .workouts
            .insert(root.id, (root.clone(), entries.clone()));
        Ok(root.into_workout(entries))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Workout>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .workouts
            .get(&id)
            .map(|(root, entries)| root.clone().into_workout(entries.clone())))
    }

    async fn update(&self, id: Uuid, draft: &WorkoutDraft) -> Result<Workout, AppError> {
        let mut inner = self.inner.write().await;
        let Some((root, stored_entries)) = inner.workouts.get_mut(&id) else {
            return Err(AppError::NotFound);
        };
        let entries = materialize(&draft.entries)?;
        root.title = draft.title.clone();
        root.description = draft.description.clone();
        root.duration_minutes = draft.duration_minutes;
        root.calories_burned = draft.calories_burned;
        root.updated_at = OffsetDateTime::now_utc();
        *stored_entries = entries.clone();
        Ok(root.clone().into_workout(entries))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner
            .workouts
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::NotFound)
    }

    async fn owner_of(&self, id: Uuid) -> Result<Option<Uuid>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.workouts.get(&id).map(|(root, _)| root.user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, reps: Option<i32>, secs: Option<i32>, order_index: i32) -> EntryDraft {
        EntryDraft {
            exercise_name: name.into(),
            sets: 3,
            reps,
            duration_seconds: secs,
            weight: Some(42.5),
            notes: "keep form".into(),
            order_index,
        }
    }

    fn draft(entries: Vec<EntryDraft>) -> WorkoutDraft {
        WorkoutDraft {
            title: "Full Body".into(),
            description: "Complete workout day".into(),
            duration_minutes: 90,
            calories_burned: 500,
            entries,
        }
    }

    async fn store_with_owner() -> (MemoryStore, Uuid) {
        let store = MemoryStore::default();
        let owner = UserStore::create(
            &store,
            NewUser {
                username: "alice".into(),
                email: "alice@x.com".into(),
                password_hash: "unused".into(),
                bio: String::new(),
            },
        )
        .await
        .unwrap();
        (store, owner.id)
    }

    #[tokio::test]
    async fn create_then_get_returns_same_entries_in_order() {
        let (store, owner) = store_with_owner().await;
        let input = draft(vec![
            entry("Bench Press", Some(10), None, 1),
            entry("Plank", None, Some(60), 2),
            entry("Squat", Some(5), None, 3),
        ]);
        let created = WorkoutStore::create(&store, owner, &input).await.unwrap();
        let loaded = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(WorkoutDraft::from(&loaded), input);
    }

    #[tokio::test]
    async fn failed_create_persists_nothing() {
        let (store, owner) = store_with_owner().await;
        let input = draft(vec![
            entry("Bench Press", Some(10), None, 1),
            entry("Squat", Some(7), Some(120), 2),
        ]);
        assert!(WorkoutStore::create(&store, owner, &input).await.is_err());
        assert!(store.inner.read().await.workouts.is_empty());
    }

    #[tokio::test]
    async fn failed_update_keeps_previous_aggregate() {
        let (store, owner) = store_with_owner().await;
        let original = draft(vec![entry("A", Some(1), None, 1)]);
        let created = WorkoutStore::create(&store, owner, &original).await.unwrap();

        let mut bad = draft(vec![entry("B", None, None, 1)]);
        bad.title = "changed".into();
        assert!(WorkoutStore::update(&store, created.id, &bad).await.is_err());

        let loaded = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(WorkoutDraft::from(&loaded), original);
    }

    #[tokio::test]
    async fn update_fully_replaces_entries() {
        let (store, owner) = store_with_owner().await;
        let created = WorkoutStore::create(
            &store,
            owner,
            &draft(vec![
                entry("A", Some(1), None, 1),
                entry("B", Some(2), None, 2),
                entry("C", Some(3), None, 3),
            ]),
        )
        .await
        .unwrap();

        let next = draft(vec![entry("D", None, Some(30), 1), entry("A", Some(1), None, 2)]);
        WorkoutStore::update(&store, created.id, &next).await.unwrap();

        let loaded = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(loaded.entries.len(), 2);
        assert_eq!(WorkoutDraft::from(&loaded), next);
    }

    #[tokio::test]
    async fn entries_come_back_sorted_by_order_index() {
        let (store, owner) = store_with_owner().await;
        let created = WorkoutStore::create(
            &store,
            owner,
            &draft(vec![entry("second", Some(1), None, 2), entry("first", Some(1), None, 1)]),
        )
        .await
        .unwrap();
        let loaded = store.get_by_id(created.id).await.unwrap().unwrap();
        let names: Vec<&str> = loaded.entries.iter().map(|e| e.exercise_name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_workout_are_not_found() {
        let (store, _) = store_with_owner().await;
        let missing = Uuid::new_v4();
        assert!(matches!(
            WorkoutStore::update(&store, missing, &draft(vec![])).await.unwrap_err(),
            AppError::NotFound
        ));
        assert!(matches!(
            store.delete(missing).await.unwrap_err(),
            AppError::NotFound
        ));
        assert_eq!(store.owner_of(missing).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_then_get_is_none() {
        let (store, owner) = store_with_owner().await;
        let created = WorkoutStore::create(&store, owner, &draft(vec![]))
            .await
            .unwrap();
        store.delete(created.id).await.unwrap();
        assert!(store.get_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn workout_requires_existing_owner() {
        let store = MemoryStore::default();
        let res = WorkoutStore::create(&store, Uuid::new_v4(), &draft(vec![])).await;
        assert!(matches!(res, Err(AppError::Internal(_))));
    }
}
