//! Centralized default constants for the mealtrace system.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// RETRY / BACKOFF
// =============================================================================

/// Base delay before the first retry attempt (milliseconds).
pub const RETRY_BASE_DELAY_MS: u64 = 1_000;

/// Exponential backoff multiplier between attempts.
pub const RETRY_MULTIPLIER: u32 = 2;

/// Ceiling on the backoff delay (milliseconds).
pub const RETRY_MAX_DELAY_MS: u64 = 30_000;

/// Maximum background retry attempts before a meal is parked for manual
/// review.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

// =============================================================================
// SWEEP
// =============================================================================

/// Maximum meals selected per scheduler sweep.
pub const SWEEP_BATCH_SIZE: usize = 10;

/// Backlog size (as a multiple of the sweep batch size) above which the
/// monitor warns.
pub const BACKLOG_WARN_FACTOR: usize = 3;

/// Age in hours after which a still-analyzing meal is flagged as stuck.
pub const STUCK_THRESHOLD_HOURS: i64 = 24;

/// Internal fetch limit for monitor aggregation queries.
pub const MONITOR_FETCH_LIMIT: usize = 1_000;

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Default base URL of the classification service.
pub const CLASSIFIER_URL: &str = "http://localhost:8420";

/// Timeout for a single classification call (seconds).
pub const CLASSIFY_TIMEOUT_SECS: u64 = 30;

/// Concurrent per-item classification calls. Kept small so long inputs do
/// not trip the endpoint's rate limiting.
pub const PER_ITEM_CONCURRENCY: usize = 3;

/// Pause between per-item classification batches (milliseconds).
pub const PER_ITEM_BATCH_DELAY_MS: u64 = 300;
