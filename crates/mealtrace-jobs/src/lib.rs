//! # mealtrace-jobs
//!
//! Asynchronous enrichment pipeline for mealtrace.
//!
//! This crate provides:
//! - the synchronous best-effort [`SubmissionProcessor`] invoked when a
//!   meal is created or edited;
//! - the [`RetryScheduler`] that sweeps unfinished meals with exponential
//!   backoff, plus the manual single-meal retry entry point;
//! - the read-only [`Monitor`] that flags meals stuck in a failure loop.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mealtrace_enrich::{EnrichmentClient, HttpClassifier};
//! use mealtrace_jobs::{RetryScheduler, SchedulerConfig};
//!
//! let store = Arc::new(connect_store());
//! let client = EnrichmentClient::new(Arc::new(HttpClassifier::from_env()));
//!
//! // Invoked on a cadence by an external trigger (timer, cron, request).
//! let scheduler = RetryScheduler::new(store, client)
//!     .with_config(SchedulerConfig::from_env());
//! let summary = scheduler.sweep().await;
//! println!("retried {} meals", summary.retried);
//! ```

pub mod monitor;
pub mod scheduler;
pub mod submit;

pub use monitor::{BacklogReport, Monitor, MonitorConfig};
pub use scheduler::{
    backoff_delay, is_eligible, RetryScheduler, SchedulerConfig, SweepSummary,
};
pub use submit::{
    ItemDraft, ProcessedSubmission, SubmissionError, SubmissionErrorKind, SubmissionProcessor,
    SubmissionRequest, NO_VALID_ITEMS,
};
