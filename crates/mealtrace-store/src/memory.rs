//! In-memory meal repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use mealtrace_core::{Error, Meal, MealPatch, MealRepository, MealStatus, Result};

/// In-memory [`MealRepository`] backed by a `tokio::sync::RwLock`.
///
/// Cloning shares the underlying map. Meals are never deleted; the
/// enrichment subsystem does not own deletion.
#[derive(Clone, Default)]
pub struct MemoryMealStore {
    meals: Arc<RwLock<HashMap<Uuid, Meal>>>,
}

impl MemoryMealStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored meals (all statuses).
    pub async fn len(&self) -> usize {
        self.meals.read().await.len()
    }

    /// Whether the store holds no meals.
    pub async fn is_empty(&self) -> bool {
        self.meals.read().await.is_empty()
    }
}

#[async_trait]
impl MealRepository for MemoryMealStore {
    async fn insert(&self, meal: Meal) -> Result<()> {
        let mut meals = self.meals.write().await;
        debug!(meal_id = %meal.id, status = ?meal.status, "Inserting meal");
        meals.insert(meal.id, meal);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Meal>> {
        Ok(self.meals.read().await.get(&id).cloned())
    }

    async fn query_by_status(&self, status: MealStatus, limit: usize) -> Result<Vec<Meal>> {
        let meals = self.meals.read().await;
        let mut matching: Vec<Meal> = meals
            .values()
            .filter(|m| m.status == status)
            .cloned()
            .collect();
        // Most recently created first.
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn update(&self, id: Uuid, patch: MealPatch) -> Result<()> {
        let mut meals = self.meals.write().await;
        let meal = meals.get_mut(&id).ok_or(Error::MealNotFound(id))?;

        if let Some(expected) = patch.expected_updated_at {
            if meal.updated_at != expected {
                return Err(Error::Conflict(format!(
                    "meal {} changed since read (expected {}, found {})",
                    id, expected, meal.updated_at
                )));
            }
        }

        if let Some(items) = patch.items {
            meal.items = items;
        }
        if let Some(status) = patch.status {
            meal.status = status;
        }
        if let Some(retry_count) = patch.retry_count {
            meal.retry_count = retry_count;
        }
        if let Some(last_retry_at) = patch.last_retry_at {
            meal.last_retry_at = Some(last_retry_at);
        }
        meal.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mealtrace_core::FoodItem;

    fn meal_with(name: &str, created_offset_secs: i64) -> Meal {
        let created = Utc::now() - Duration::seconds(created_offset_secs);
        Meal::new(name, vec![FoodItem::unzoned("kale")], created)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryMealStore::new();
        let meal = meal_with("lunch", 0);
        let id = meal.id;

        store.insert(meal).await.unwrap();
        let fetched = store.get(id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "lunch");
        assert_eq!(fetched.status, MealStatus::Analyzing);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = MemoryMealStore::new();
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_orders_most_recent_first_and_limits() {
        let store = MemoryMealStore::new();
        let old = meal_with("old", 300);
        let mid = meal_with("mid", 60);
        let new = meal_with("new", 0);
        for meal in [old, mid, new] {
            store.insert(meal).await.unwrap();
        }

        let result = store
            .query_by_status(MealStatus::Analyzing, 2)
            .await
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "new");
        assert_eq!(result[1].name, "mid");
    }

    #[tokio::test]
    async fn test_query_filters_by_status() {
        let store = MemoryMealStore::new();
        let meal = meal_with("lunch", 0);
        let id = meal.id;
        store.insert(meal).await.unwrap();

        store
            .update(
                id,
                MealPatch {
                    status: Some(MealStatus::PendingReview),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(store
            .query_by_status(MealStatus::Analyzing, 10)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .query_by_status(MealStatus::PendingReview, 10)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_update_bumps_updated_at() {
        let store = MemoryMealStore::new();
        let meal = meal_with("lunch", 60);
        let id = meal.id;
        let before = meal.updated_at;
        store.insert(meal).await.unwrap();

        store
            .update(
                id,
                MealPatch {
                    retry_count: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let fetched = store.get(id).await.unwrap().unwrap();
        assert_eq!(fetched.retry_count, 1);
        assert!(fetched.updated_at > before);
    }

    #[tokio::test]
    async fn test_guarded_update_conflicts_on_stale_read() {
        let store = MemoryMealStore::new();
        let meal = meal_with("lunch", 60);
        let id = meal.id;
        store.insert(meal).await.unwrap();

        let first_read = store.get(id).await.unwrap().unwrap();

        // A competing writer lands first.
        store
            .update(
                id,
                MealPatch {
                    retry_count: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stale = MealPatch {
            retry_count: Some(2),
            ..Default::default()
        }
        .guarded(first_read.updated_at);
        let err = store.update(id, stale).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        // The losing write left no trace.
        let fetched = store.get(id).await.unwrap().unwrap();
        assert_eq!(fetched.retry_count, 1);
    }

    #[tokio::test]
    async fn test_update_missing_meal_errors() {
        let store = MemoryMealStore::new();
        let err = store
            .update(Uuid::new_v4(), MealPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MealNotFound(_)));
    }
}
