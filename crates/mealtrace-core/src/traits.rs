//! Core traits for mealtrace abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Meal, MealPatch, MealStatus};

/// Repository for meal records.
///
/// The store is the single source of truth for meals. Implementations must
/// provide at-least read-your-writes consistency per meal, apply a
/// [`MealPatch`] atomically, and honor its `expected_updated_at` guard by
/// returning `Error::Conflict` on a mismatch. Deletion is deliberately
/// absent: the enrichment subsystem never removes meals.
#[async_trait]
pub trait MealRepository: Send + Sync {
    /// Insert a new meal.
    async fn insert(&self, meal: Meal) -> Result<()>;

    /// Fetch a meal by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Meal>>;

    /// List up to `limit` meals with the given status, most recently
    /// created first.
    async fn query_by_status(&self, status: MealStatus, limit: usize) -> Result<Vec<Meal>>;

    /// Apply a partial update; bumps `updated_at` on success.
    async fn update(&self, id: Uuid, patch: MealPatch) -> Result<()>;
}
