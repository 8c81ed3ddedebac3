//! # mealtrace-store
//!
//! In-memory implementation of [`mealtrace_core::MealRepository`].
//!
//! Serves as the test and local-development store, and as the reference
//! semantics for the store contract: atomic patch application, `updated_at`
//! bumping, and optimistic-concurrency conflicts.

pub mod memory;

pub use memory::MemoryMealStore;
