//! # mealtrace-enrich
//!
//! Client for the external food classification service.
//!
//! This crate provides:
//! - the [`ClassifierService`] trait with a tagged error type, so callers
//!   never inspect loose JSON;
//! - [`HttpClassifier`], the reqwest-backed production backend;
//! - [`MockClassifier`] for deterministic tests;
//! - [`EnrichmentClient`], which merges whatever classifications come back
//!   onto food items by name key and never fails a call outright.
//!
//! The client performs no retries; retry policy belongs to the submission
//! processor and the retry scheduler in `mealtrace-jobs`.

pub mod client;
pub mod http;
pub mod mock;
pub mod service;

pub use client::{EnrichmentClient, EnrichmentOptions, EnrichmentOutcome};
pub use http::HttpClassifier;
pub use mock::MockClassifier;
pub use service::{Classification, ClassifierService, ClassifyError, ClassifyResult};
