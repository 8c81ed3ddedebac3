//! Enrichment client: classification calls plus name-keyed merge.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use mealtrace_core::{
    batch::{run_batches, BatchOptions},
    defaults, sanitize_item_name, Error, FoodItem,
};

use crate::service::{Classification, ClassifierService};

/// Tuning for the per-item call mode.
#[derive(Debug, Clone)]
pub struct EnrichmentOptions {
    /// Concurrent per-item calls. Kept small (2-3) to respect the
    /// endpoint's rate limits.
    pub per_item_concurrency: usize,
    /// Pause between per-item batches.
    pub per_item_batch_delay: Duration,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self {
            per_item_concurrency: defaults::PER_ITEM_CONCURRENCY,
            per_item_batch_delay: Duration::from_millis(defaults::PER_ITEM_BATCH_DELAY_MS),
        }
    }
}

/// Result of an enrichment pass. Never an error: total call failure
/// degrades to zero matches plus a warning string.
#[derive(Debug)]
pub struct EnrichmentOutcome {
    /// Input items with classifications merged on where matched.
    pub items: Vec<FoodItem>,
    /// Number of items that received a classification in this pass.
    pub matched: usize,
    /// Human-readable warnings for calls that failed outright.
    pub warnings: Vec<String>,
}

impl EnrichmentOutcome {
    /// Whether every item now carries a real zone.
    pub fn fully_classified(&self) -> bool {
        self.items.iter().all(FoodItem::is_classified)
    }
}

/// Client wrapping the external classification service.
///
/// The service is injected, never a module-level singleton, so tests swap
/// in [`crate::MockClassifier`]. The client never retries; retry policy
/// belongs to the callers.
#[derive(Clone)]
pub struct EnrichmentClient {
    service: Arc<dyn ClassifierService>,
    options: EnrichmentOptions,
}

impl EnrichmentClient {
    /// Create a client over the given service.
    pub fn new(service: Arc<dyn ClassifierService>) -> Self {
        Self {
            service,
            options: EnrichmentOptions::default(),
        }
    }

    /// Override the per-item call tuning.
    pub fn with_options(mut self, options: EnrichmentOptions) -> Self {
        self.options = options;
        self
    }

    /// Bulk mode: one call for every distinct name.
    ///
    /// Used on the synchronous creation path where latency matters more
    /// than the endpoint's tendency to truncate large lists. The caller
    /// enforces any batch ceiling.
    #[instrument(skip(self, items), fields(subsystem = "enrich", component = "client", op = "enrich_bulk", item_count = items.len()))]
    pub async fn enrich_bulk(&self, items: Vec<FoodItem>) -> EnrichmentOutcome {
        let names = distinct_names(&items);
        if names.is_empty() {
            return EnrichmentOutcome {
                items,
                matched: 0,
                warnings: Vec::new(),
            };
        }

        match self.service.classify(&names).await {
            Ok(classifications) => {
                let map = classification_map(classifications);
                let outcome = merge(items, &map);
                debug!(matched = outcome.matched, "Bulk enrichment complete");
                outcome
            }
            Err(e) => {
                warn!(error = %e, "Bulk classification call failed");
                EnrichmentOutcome {
                    items,
                    matched: 0,
                    warnings: vec![format!(
                        "classification unavailable for {} item(s): {}",
                        names.len(),
                        e
                    )],
                }
            }
        }
    }

    /// Per-item mode: one call per name, run through the batch executor at
    /// small concurrency with a short inter-batch delay.
    ///
    /// Used by the retry scheduler, where long inputs would otherwise get
    /// truncated or rate-limited. A failed call for one name degrades to a
    /// warning without affecting the other names.
    #[instrument(skip(self, items), fields(subsystem = "enrich", component = "client", op = "enrich_per_item", item_count = items.len()))]
    pub async fn enrich_per_item(&self, items: Vec<FoodItem>) -> EnrichmentOutcome {
        let names = distinct_names(&items);
        if names.is_empty() {
            return EnrichmentOutcome {
                items,
                matched: 0,
                warnings: Vec::new(),
            };
        }

        let options = BatchOptions::new(self.options.per_item_concurrency)
            .with_delay(self.options.per_item_batch_delay);
        let service = self.service.clone();

        let report = run_batches(names.clone(), &options, None, |name: String| {
            let service = service.clone();
            async move {
                service
                    .classify(std::slice::from_ref(&name))
                    .await
                    .map_err(|e| Error::Classification(e.to_string()))
            }
        })
        .await;

        let warnings: Vec<String> = report
            .failures
            .iter()
            .map(|f| format!("classification failed for \"{}\": {}", names[f.index], f.error))
            .collect();

        let classifications: Vec<Classification> =
            report.results.into_iter().flatten().flatten().collect();
        let map = classification_map(classifications);

        let mut outcome = merge(items, &map);
        debug!(
            matched = outcome.matched,
            failed = warnings.len(),
            duration_ms = report.elapsed.as_millis() as u64,
            "Per-item enrichment complete"
        );
        outcome.warnings = warnings;
        outcome
    }
}

/// Distinct sanitized names in item order; blank names are skipped.
fn distinct_names(items: &[FoodItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|i| sanitize_item_name(&i.name))
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect()
}

/// Key classifications by sanitized name for merging.
fn classification_map(classifications: Vec<Classification>) -> HashMap<String, Classification> {
    classifications
        .into_iter()
        .map(|c| (sanitize_item_name(&c.name), c))
        .collect()
}

/// Overwrite `zone`/`category`/`group` on every item whose name has a
/// match; `organic` and unmatched items are left untouched.
fn merge(items: Vec<FoodItem>, map: &HashMap<String, Classification>) -> EnrichmentOutcome {
    let mut matched = 0usize;
    let items = items
        .into_iter()
        .map(|mut item| {
            if let Some(classification) = map.get(&sanitize_item_name(&item.name)) {
                item.zone = classification.zone;
                item.category = classification.category.clone();
                item.group = classification.group.clone();
                matched += 1;
            }
            item
        })
        .collect();

    EnrichmentOutcome {
        items,
        matched,
        warnings: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockClassifier;
    use mealtrace_core::Zone;

    fn unzoned(names: &[&str]) -> Vec<FoodItem> {
        names.iter().map(|n| FoodItem::unzoned(*n)).collect()
    }

    #[tokio::test]
    async fn test_bulk_merge_leaves_unmatched_unzoned() {
        let mock = MockClassifier::new().with_classification("kale", Zone::Green, "Leafy Greens");
        let client = EnrichmentClient::new(Arc::new(mock));

        let outcome = client.enrich_bulk(unzoned(&["kale", "sugar"])).await;

        assert_eq!(outcome.matched, 1);
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.items[0].zone, Zone::Green);
        assert_eq!(outcome.items[0].group, "Leafy Greens");
        assert_eq!(outcome.items[1].zone, Zone::Unzoned);
        assert_eq!(outcome.items[1].name, "sugar");
    }

    #[tokio::test]
    async fn test_merge_preserves_organic_flag() {
        let mock = MockClassifier::new().with_classification("kale", Zone::Green, "Leafy Greens");
        let client = EnrichmentClient::new(Arc::new(mock));

        let mut item = FoodItem::unzoned("kale");
        item.organic = true;
        let outcome = client.enrich_bulk(vec![item]).await;

        assert_eq!(outcome.items[0].zone, Zone::Green);
        assert!(outcome.items[0].organic);
    }

    #[tokio::test]
    async fn test_bulk_total_failure_degrades_to_warning() {
        let mock = MockClassifier::new().with_failing();
        let client = EnrichmentClient::new(Arc::new(mock));

        let outcome = client.enrich_bulk(unzoned(&["kale", "sugar"])).await;

        assert_eq!(outcome.matched, 0);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("classification unavailable"));
        assert!(outcome.items.iter().all(|i| i.zone.is_unzoned()));
    }

    #[tokio::test]
    async fn test_bulk_makes_a_single_call() {
        let mock = MockClassifier::new();
        let client = EnrichmentClient::new(Arc::new(mock.clone()));

        client.enrich_bulk(unzoned(&["kale", "sugar", "rice"])).await;

        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.calls()[0].len(), 3);
    }

    #[tokio::test]
    async fn test_per_item_makes_one_call_per_name() {
        let mock = MockClassifier::new()
            .with_classification("kale", Zone::Green, "Leafy Greens")
            .with_classification("bacon", Zone::Red, "Processed Meat");
        let client = EnrichmentClient::new(Arc::new(mock.clone())).with_options(EnrichmentOptions {
            per_item_concurrency: 2,
            per_item_batch_delay: Duration::ZERO,
        });

        let outcome = client
            .enrich_per_item(unzoned(&["kale", "bacon", "mystery"]))
            .await;

        assert_eq!(mock.call_count(), 3);
        assert!(mock.calls().iter().all(|call| call.len() == 1));
        assert_eq!(outcome.matched, 2);
        assert_eq!(outcome.items[2].zone, Zone::Unzoned);
    }

    #[tokio::test]
    async fn test_per_item_failures_become_warnings() {
        let mock = MockClassifier::new().with_failing();
        let client = EnrichmentClient::new(Arc::new(mock)).with_options(EnrichmentOptions {
            per_item_concurrency: 2,
            per_item_batch_delay: Duration::ZERO,
        });

        let outcome = client.enrich_per_item(unzoned(&["kale", "sugar"])).await;

        assert_eq!(outcome.matched, 0);
        assert_eq!(outcome.warnings.len(), 2);
        assert!(outcome.warnings[0].contains("kale"));
        assert!(outcome.items.iter().all(|i| i.zone.is_unzoned()));
    }

    #[tokio::test]
    async fn test_duplicate_and_blank_names_collapse() {
        let mock = MockClassifier::new();
        let client = EnrichmentClient::new(Arc::new(mock.clone()));

        let mut items = unzoned(&["kale", "Kale", "kale"]);
        items.push(FoodItem::unzoned(""));
        client.enrich_bulk(items).await;

        assert_eq!(mock.calls()[0], vec!["kale".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_input_skips_the_service() {
        let mock = MockClassifier::new();
        let client = EnrichmentClient::new(Arc::new(mock.clone()));

        let outcome = client.enrich_bulk(Vec::new()).await;

        assert_eq!(mock.call_count(), 0);
        assert!(outcome.items.is_empty());
        assert!(outcome.warnings.is_empty());
    }
}
