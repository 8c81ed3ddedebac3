//! # mealtrace-core
//!
//! Core types, traits, and abstractions for the mealtrace enrichment
//! pipeline.
//!
//! This crate provides the meal/item data model, the error taxonomy, the
//! repository trait the record store implements, and the generic
//! concurrency-bounded batch executor shared by the enrichment client and
//! the retry scheduler.

pub mod batch;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use batch::{run_batches, AbortHandle, BatchFailure, BatchOptions, BatchReport};
pub use error::{Error, Result};
pub use models::{
    sanitize_item_name, FoodItem, Meal, MealPatch, MealStatus, Zone,
};
pub use traits::MealRepository;
