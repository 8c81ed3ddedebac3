//! Read-only backlog monitoring for operational visibility.
//!
//! Counts meals still analyzing, flags those close to exhausting their
//! retry budget or stuck beyond an age threshold, and emits structured
//! warnings. Performs no mutation and no retries.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use mealtrace_core::{defaults, MealRepository, MealStatus, Result};

/// Configuration for the monitor pass.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Scheduler retry budget; meals within one attempt of it are counted
    /// as near-exhausted.
    pub max_attempts: u32,
    /// Scheduler sweep batch size; backlog beyond
    /// `BACKLOG_WARN_FACTOR ×` this warns.
    pub sweep_batch_size: usize,
    /// Age in hours after which a still-analyzing meal counts as stuck.
    pub stuck_threshold_hours: i64,
    /// Upper bound on meals fetched for aggregation.
    pub fetch_limit: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            sweep_batch_size: defaults::SWEEP_BATCH_SIZE,
            stuck_threshold_hours: defaults::STUCK_THRESHOLD_HOURS,
            fetch_limit: defaults::MONITOR_FETCH_LIMIT,
        }
    }
}

/// Aggregated view of the enrichment backlog.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BacklogReport {
    /// Meals currently in `Analyzing`.
    pub analyzing_total: usize,
    /// Meals with `retry_count >= max_attempts - 1`.
    pub near_exhausted: usize,
    /// Meals analyzing for longer than the stuck threshold.
    pub stuck: usize,
    /// IDs of the stuck meals, for operator follow-up.
    pub stuck_ids: Vec<Uuid>,
}

/// Read-only aggregation over unfinished meals.
pub struct Monitor {
    store: Arc<dyn MealRepository>,
    config: MonitorConfig,
}

impl Monitor {
    /// Create a monitor over the given store.
    pub fn new(store: Arc<dyn MealRepository>, config: MonitorConfig) -> Self {
        Self { store, config }
    }

    /// Scan the backlog and emit warnings for anything needing attention.
    #[instrument(skip(self), fields(subsystem = "jobs", component = "monitor", op = "scan"))]
    pub async fn scan(&self) -> Result<BacklogReport> {
        let meals = self
            .store
            .query_by_status(MealStatus::Analyzing, self.config.fetch_limit)
            .await?;

        let now = Utc::now();
        let stuck_cutoff = now - Duration::hours(self.config.stuck_threshold_hours);
        let near_exhausted_floor = self.config.max_attempts.saturating_sub(1);

        let mut report = BacklogReport {
            analyzing_total: meals.len(),
            ..Default::default()
        };
        for meal in &meals {
            if meal.retry_count >= near_exhausted_floor {
                report.near_exhausted += 1;
            }
            if meal.created_at < stuck_cutoff {
                report.stuck += 1;
                report.stuck_ids.push(meal.id);
            }
        }

        if report.near_exhausted > 0 {
            warn!(
                near_exhausted = report.near_exhausted,
                max_attempts = self.config.max_attempts,
                "Meals close to exhausting their retry budget"
            );
        }
        if report.stuck > 0 {
            warn!(
                stuck = report.stuck,
                threshold_hours = self.config.stuck_threshold_hours,
                "Meals analyzing past the stuck threshold"
            );
        }
        let backlog_limit = self.config.sweep_batch_size * defaults::BACKLOG_WARN_FACTOR;
        if report.analyzing_total > backlog_limit {
            warn!(
                backlog = report.analyzing_total,
                limit = backlog_limit,
                "Enrichment backlog exceeds sweep capacity"
            );
        }

        debug!(
            analyzing_total = report.analyzing_total,
            near_exhausted = report.near_exhausted,
            stuck = report.stuck,
            "Backlog scan complete"
        );
        Ok(report)
    }
}
