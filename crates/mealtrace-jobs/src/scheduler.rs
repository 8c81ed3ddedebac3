//! Background retry scheduler for meals stuck in `Analyzing`.
//!
//! Not a long-lived process: an external trigger (timer, cron, request)
//! invokes [`RetryScheduler::sweep`] on a cadence, and each invocation is
//! naturally bounded by the sweep batch size. Per-meal failures are
//! absorbed into retry-count increments; a sweep never throws.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use mealtrace_core::{
    defaults, Error, FoodItem, Meal, MealPatch, MealRepository, MealStatus, Result,
};
use mealtrace_enrich::EnrichmentClient;

use crate::monitor::{Monitor, MonitorConfig};

/// Configuration for the retry scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Base delay before the first retry (milliseconds).
    pub base_delay_ms: u64,
    /// Exponential multiplier between attempts.
    pub multiplier: u32,
    /// Backoff ceiling (milliseconds).
    pub max_delay_ms: u64,
    /// Retry budget before a meal is parked for manual review.
    pub max_attempts: u32,
    /// Maximum meals selected per sweep.
    pub batch_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: defaults::RETRY_BASE_DELAY_MS,
            multiplier: defaults::RETRY_MULTIPLIER,
            max_delay_ms: defaults::RETRY_MAX_DELAY_MS,
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            batch_size: defaults::SWEEP_BATCH_SIZE,
        }
    }
}

impl SchedulerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `MEALTRACE_RETRY_BASE_DELAY_MS` | `1000` | Base backoff delay |
    /// | `MEALTRACE_RETRY_MAX_ATTEMPTS` | `3` | Retry budget per meal |
    /// | `MEALTRACE_SWEEP_BATCH_SIZE` | `10` | Meals per sweep |
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_parse::<u64>("MEALTRACE_RETRY_BASE_DELAY_MS") {
            config.base_delay_ms = v;
        }
        if let Some(v) = env_parse::<u32>("MEALTRACE_RETRY_MAX_ATTEMPTS") {
            config.max_attempts = v.max(1);
        }
        if let Some(v) = env_parse::<usize>("MEALTRACE_SWEEP_BATCH_SIZE") {
            config.batch_size = v.max(1);
        }
        config
    }

    /// Set the retry budget.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the sweep batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Backoff delay before attempt `attempt` (1-based):
/// `min(base * multiplier^(attempt-1), max)`.
pub fn backoff_delay(config: &SchedulerConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(20);
    let factor = u64::from(config.multiplier).saturating_pow(exponent);
    let ms = config
        .base_delay_ms
        .saturating_mul(factor)
        .min(config.max_delay_ms);
    Duration::from_millis(ms)
}

/// Whether a meal is due for its next retry attempt.
///
/// Eligible when no attempt has been made yet, or when the time since the
/// last attempt has reached the backoff delay for the upcoming attempt.
/// Pure function of its inputs; no I/O.
pub fn is_eligible(
    config: &SchedulerConfig,
    last_retry_at: Option<DateTime<Utc>>,
    retry_count: u32,
    now: DateTime<Utc>,
) -> bool {
    match last_retry_at {
        None => true,
        Some(last) => {
            let required = backoff_delay(config, retry_count + 1);
            now.signed_duration_since(last)
                .to_std()
                .map(|elapsed| elapsed >= required)
                .unwrap_or(false)
        }
    }
}

/// Aggregate counts for one sweep.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SweepSummary {
    /// Meals selected from the store.
    pub selected: usize,
    /// Meals that passed the backoff filter.
    pub eligible: usize,
    /// Meals fully classified and closed out this sweep.
    pub processed: usize,
    /// Meals that consumed an attempt and stay `Analyzing`.
    pub retried: usize,
    /// Meals that exhausted their budget and were parked for review.
    pub exhausted: usize,
    /// Meals skipped because a concurrent sweep got there first.
    pub conflicts: usize,
    /// Meals whose store write failed.
    pub failed: usize,
}

/// Outcome of processing one meal.
enum RetryOutcome {
    Processed,
    Retried,
    Exhausted,
    Conflict,
    Failed,
}

/// Sweeps `Analyzing` meals, re-invoking the enrichment client for their
/// unzoned items and advancing each meal's status.
pub struct RetryScheduler {
    store: Arc<dyn MealRepository>,
    enrichment: EnrichmentClient,
    config: SchedulerConfig,
}

impl RetryScheduler {
    /// Create a scheduler with default configuration.
    pub fn new(store: Arc<dyn MealRepository>, enrichment: EnrichmentClient) -> Self {
        Self {
            store,
            enrichment,
            config: SchedulerConfig::default(),
        }
    }

    /// Override the configuration.
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Run one sweep over eligible meals.
    ///
    /// Absorbs all per-meal errors; surfaces only aggregate log output and
    /// the returned [`SweepSummary`].
    #[instrument(skip(self), fields(subsystem = "jobs", component = "scheduler", op = "sweep"))]
    pub async fn sweep(&self) -> SweepSummary {
        let now = Utc::now();
        let mut summary = SweepSummary::default();

        let meals = match self
            .store
            .query_by_status(MealStatus::Analyzing, self.config.batch_size)
            .await
        {
            Ok(meals) => meals,
            Err(e) => {
                error!(error = %e, "Failed to query meals for sweep");
                return summary;
            }
        };
        summary.selected = meals.len();

        let eligible: Vec<Meal> = meals
            .into_iter()
            .filter(|m| is_eligible(&self.config, m.last_retry_at, m.retry_count, now))
            .collect();
        summary.eligible = eligible.len();

        // Sequential per meal; only the per-item classification calls
        // inside run with bounded parallelism.
        for meal in eligible {
            let meal_id = meal.id;
            match self.process_meal(meal).await {
                RetryOutcome::Processed => summary.processed += 1,
                RetryOutcome::Retried => summary.retried += 1,
                RetryOutcome::Exhausted => {
                    warn!(meal_id = %meal_id, "Retry budget exhausted; parked for manual review");
                    summary.exhausted += 1;
                }
                RetryOutcome::Conflict => {
                    debug!(meal_id = %meal_id, "Concurrent sweep owns this meal; skipping");
                    summary.conflicts += 1;
                }
                RetryOutcome::Failed => summary.failed += 1,
            }
        }

        // Monitor pass for operational visibility.
        let monitor = Monitor::new(
            self.store.clone(),
            MonitorConfig {
                max_attempts: self.config.max_attempts,
                sweep_batch_size: self.config.batch_size,
                ..MonitorConfig::default()
            },
        );
        match monitor.scan().await {
            Ok(report) => info!(
                selected = summary.selected,
                eligible = summary.eligible,
                processed = summary.processed,
                retried = summary.retried,
                exhausted = summary.exhausted,
                conflicts = summary.conflicts,
                failed = summary.failed,
                backlog = report.analyzing_total,
                near_exhausted = report.near_exhausted,
                stuck = report.stuck,
                "Sweep complete"
            ),
            Err(e) => warn!(error = %e, "Monitor pass failed"),
        }

        summary
    }

    /// Manual single-meal retry, bypassing the backoff filter.
    ///
    /// Operator- or UI-initiated. `Processed` meals are returned unchanged
    /// without a classifier call. `PendingReview` meals are retried; a
    /// failed manual attempt leaves them in `PendingReview`.
    #[instrument(skip(self), fields(subsystem = "jobs", component = "scheduler", op = "retry_now", meal_id = %id))]
    pub async fn retry_now(&self, id: Uuid) -> Result<Meal> {
        let meal = self.store.get(id).await?.ok_or(Error::MealNotFound(id))?;

        if meal.status == MealStatus::Processed {
            debug!("Meal already processed; nothing to retry");
            return Ok(meal);
        }

        self.process_meal(meal).await;
        self.store.get(id).await?.ok_or(Error::MealNotFound(id))
    }

    /// Process one meal: classify its unzoned items and advance its
    /// status. Absorbs every error into the returned outcome.
    async fn process_meal(&self, meal: Meal) -> RetryOutcome {
        let guard = meal.updated_at;

        if !meal.has_unzoned_items() {
            // Nothing left to classify; close it out without a call.
            let patch = MealPatch {
                status: Some(MealStatus::Processed),
                ..Default::default()
            }
            .guarded(guard);
            return match self.store.update(meal.id, patch).await {
                Ok(()) => RetryOutcome::Processed,
                Err(Error::Conflict(_)) => RetryOutcome::Conflict,
                Err(e) => self.record_failed_attempt(&meal, &e).await,
            };
        }

        let unzoned: Vec<FoodItem> = meal
            .items
            .iter()
            .filter(|i| i.zone.is_unzoned())
            .cloned()
            .collect();
        let outcome = self.enrichment.enrich_per_item(unzoned).await;
        for warning in &outcome.warnings {
            debug!(meal_id = %meal.id, warning, "Classification warning during retry");
        }

        // Merge the classified subset back into the full list by name.
        let merged: HashMap<String, FoodItem> = outcome
            .items
            .into_iter()
            .map(|i| (i.name.clone(), i))
            .collect();
        let items: Vec<FoodItem> = meal
            .items
            .iter()
            .map(|item| {
                if item.zone.is_unzoned() {
                    merged.get(&item.name).cloned().unwrap_or_else(|| item.clone())
                } else {
                    item.clone()
                }
            })
            .collect();

        let fully_classified = items.iter().all(FoodItem::is_classified);
        let patch = if fully_classified {
            // A successful attempt does not consume retry budget.
            MealPatch {
                items: Some(items),
                status: Some(MealStatus::Processed),
                ..Default::default()
            }
            .guarded(guard)
        } else {
            let attempts = (meal.retry_count + 1).min(self.config.max_attempts);
            let status = if attempts >= self.config.max_attempts {
                MealStatus::PendingReview
            } else {
                MealStatus::Analyzing
            };
            MealPatch {
                items: Some(items),
                status: Some(status),
                retry_count: Some(attempts),
                last_retry_at: Some(Utc::now()),
                expected_updated_at: None,
            }
            .guarded(guard)
        };

        let exhausted = patch.status == Some(MealStatus::PendingReview);
        match self.store.update(meal.id, patch).await {
            Ok(()) if fully_classified => RetryOutcome::Processed,
            Ok(()) if exhausted => RetryOutcome::Exhausted,
            Ok(()) => RetryOutcome::Retried,
            Err(Error::Conflict(_)) => RetryOutcome::Conflict,
            Err(e) => self.record_failed_attempt(&meal, &e).await,
        }
    }

    /// A store failure while processing counts as a failed attempt for
    /// this meal only; the sweep continues.
    async fn record_failed_attempt(&self, meal: &Meal, cause: &Error) -> RetryOutcome {
        warn!(meal_id = %meal.id, error = %cause, "Meal processing failed; consuming an attempt");

        let attempts = (meal.retry_count + 1).min(self.config.max_attempts);
        let status = if attempts >= self.config.max_attempts {
            MealStatus::PendingReview
        } else {
            MealStatus::Analyzing
        };
        let patch = MealPatch {
            status: Some(status),
            retry_count: Some(attempts),
            last_retry_at: Some(Utc::now()),
            ..Default::default()
        }
        .guarded(meal.updated_at);

        match self.store.update(meal.id, patch).await {
            Ok(()) if status == MealStatus::PendingReview => RetryOutcome::Exhausted,
            Ok(()) => RetryOutcome::Failed,
            Err(Error::Conflict(_)) => RetryOutcome::Conflict,
            Err(e) => {
                error!(meal_id = %meal.id, error = %e, "Failed to record failed attempt");
                RetryOutcome::Failed
            }
        }
    }
}
