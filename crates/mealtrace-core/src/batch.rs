//! Generic concurrency-bounded batch executor.
//!
//! Processes a list of inputs through an async operation in fixed-size
//! batches: all items of one batch run concurrently, with a configurable
//! pause before the next batch starts. A failure on one item never affects
//! its siblings; each item's success or failure is captured independently
//! in the returned [`BatchReport`].
//!
//! The executor has no knowledge of meals or classification and holds no
//! global state; every invocation is independent and reentrant.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::time::sleep;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Callback invoked after each batch with `(processed_so_far, total)`.
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Callback invoked after each batch with `(batch_index, batch_len)`.
pub type BatchCompleteCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Callback invoked for each failed item with `(index, error message)`.
pub type ErrorCallback = Box<dyn Fn(usize, &str) + Send + Sync>;

/// Options controlling a batch run.
pub struct BatchOptions {
    /// Number of items processed concurrently per batch.
    pub batch_size: usize,
    /// Pause inserted before every batch after the first.
    pub delay_between_batches: Duration,
    /// Progress reporting hook.
    pub on_progress: Option<ProgressCallback>,
    /// Per-batch completion hook.
    pub on_batch_complete: Option<BatchCompleteCallback>,
    /// Per-item failure hook.
    pub on_error: Option<ErrorCallback>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 1,
            delay_between_batches: Duration::ZERO,
            on_progress: None,
            on_batch_complete: None,
            on_error: None,
        }
    }
}

impl BatchOptions {
    /// Create options with the given batch size and no delay.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }

    /// Set the pause between batches.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_between_batches = delay;
        self
    }

    /// Set the progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Set the per-batch completion callback.
    pub fn with_batch_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.on_batch_complete = Some(Box::new(callback));
        self
    }

    /// Set the per-item failure callback.
    pub fn with_error_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, &str) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }
}

/// Cooperative abort flag for a batch run.
///
/// Checked between batches only: items already in flight when abort is
/// requested complete normally, and all remaining inputs fail with
/// [`Error::Aborted`] instead of being silently dropped.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    /// Create a new, un-aborted handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abort. Idempotent.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether abort has been requested.
    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A single failed item.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    /// Index of the input in the original sequence.
    pub index: usize,
    /// Human-readable error message.
    pub error: String,
}

/// Outcome of a batch run.
#[derive(Debug)]
pub struct BatchReport<R> {
    /// Per-index results; `None` where the item failed or was aborted.
    pub results: Vec<Option<R>>,
    /// Failures, including items skipped by an abort.
    pub failures: Vec<BatchFailure>,
    /// Items actually attempted (succeeded or failed, excluding aborted).
    pub processed: usize,
    /// Wall-clock time for the whole run.
    pub elapsed: Duration,
}

impl<R> BatchReport<R> {
    /// Number of items that produced a result.
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_some()).count()
    }
}

/// Process `inputs` through `op` in concurrency-bounded batches.
///
/// Items within one batch run concurrently via `join_all`; batches run
/// sequentially with `delay_between_batches` in between. See the module
/// docs for failure isolation and abort semantics.
pub async fn run_batches<I, R, F, Fut>(
    inputs: Vec<I>,
    options: &BatchOptions,
    abort: Option<&AbortHandle>,
    op: F,
) -> BatchReport<R>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let total = inputs.len();
    let started = Instant::now();
    let batch_size = options.batch_size.max(1);

    let mut results: Vec<Option<R>> = (0..total).map(|_| None).collect();
    let mut failures: Vec<BatchFailure> = Vec::new();
    let mut processed = 0usize;

    let mut pending = inputs.into_iter().enumerate();
    let mut batch_index = 0usize;

    loop {
        let batch: Vec<(usize, I)> = pending.by_ref().take(batch_size).collect();
        if batch.is_empty() {
            break;
        }

        if let Some(handle) = abort {
            if handle.is_aborted() {
                debug!(batch_index, "Batch run aborted; failing remaining inputs");
                let message = Error::Aborted("skipped before start".to_string()).to_string();
                for (index, _) in batch.into_iter().chain(pending.by_ref()) {
                    if let Some(cb) = &options.on_error {
                        cb(index, &message);
                    }
                    failures.push(BatchFailure {
                        index,
                        error: message.clone(),
                    });
                }
                break;
            }
        }

        if batch_index > 0 && !options.delay_between_batches.is_zero() {
            sleep(options.delay_between_batches).await;
        }

        let batch_len = batch.len();
        trace!(batch_index, batch_len, "Running batch");

        let outcomes = join_all(batch.into_iter().map(|(index, input)| {
            let fut = op(input);
            async move { (index, fut.await) }
        }))
        .await;

        for (index, outcome) in outcomes {
            processed += 1;
            match outcome {
                Ok(value) => results[index] = Some(value),
                Err(e) => {
                    let message = e.to_string();
                    if let Some(cb) = &options.on_error {
                        cb(index, &message);
                    }
                    failures.push(BatchFailure {
                        index,
                        error: message,
                    });
                }
            }
        }

        if let Some(cb) = &options.on_batch_complete {
            cb(batch_index, batch_len);
        }
        if let Some(cb) = &options.on_progress {
            cb(processed, total);
        }

        batch_index += 1;
    }

    BatchReport {
        results,
        failures,
        processed,
        elapsed: started.elapsed(),
    }
}
