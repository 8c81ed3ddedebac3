//! Structured logging field name constants for mealtrace.
//!
//! All crates use these constants for consistent structured logging
//! fields, so log aggregation tools can query by standardized names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Sweep/submission completions, lifecycle events |
//! | DEBUG | Decision points, intermediate values |
//! | TRACE | Per-item iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "enrich", "jobs", "store"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "http_classifier", "scheduler", "monitor", "submit"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "classify", "sweep", "retry_now", "scan"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Meal UUID being operated on.
pub const MEAL_ID: &str = "meal_id";

/// Number of items in a call or meal.
pub const ITEM_COUNT: &str = "item_count";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of classifications matched back onto items.
pub const MATCHED_COUNT: &str = "matched_count";

/// Retry attempt number for a meal.
pub const RETRY_COUNT: &str = "retry_count";
