//! Mock classifier backend for deterministic testing.
//!
//! Provides canned classifications keyed by item name, optional failure
//! injection, simulated latency, and a call log for assertions.
//!
//! ## Usage
//!
//! ```ignore
//! use mealtrace_enrich::{ClassifierService, MockClassifier};
//! use mealtrace_core::Zone;
//!
//! let classifier = MockClassifier::new()
//!     .with_classification("kale", Zone::Green, "Leafy Greens");
//!
//! let result = classifier
//!     .classify(&["kale".to_string(), "sugar".to_string()])
//!     .await?;
//! assert_eq!(result.len(), 1);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mealtrace_core::{sanitize_item_name, Zone};

use crate::service::{Classification, ClassifierService, ClassifyError, ClassifyResult};

/// Mock classifier for testing.
#[derive(Clone, Default)]
pub struct MockClassifier {
    known: Arc<Mutex<HashMap<String, Classification>>>,
    failing: Arc<AtomicBool>,
    failure_rate: f64,
    latency_ms: u64,
    call_log: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockClassifier {
    /// Create a mock that knows no classifications and never fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a canned classification for a name.
    pub fn with_classification(
        self,
        name: impl Into<String>,
        zone: Zone,
        group: impl Into<String>,
    ) -> Self {
        self.add_classification(name, zone, group);
        self
    }

    /// Start in the failing state (every call errors).
    pub fn with_failing(self) -> Self {
        self.set_failing(true);
        self
    }

    /// Set probabilistic failure rate (0.0 - 1.0) for error-path testing.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Set simulated latency for every call.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Add a classification after construction (e.g. between sweeps).
    pub fn add_classification(
        &self,
        name: impl Into<String>,
        zone: Zone,
        group: impl Into<String>,
    ) {
        let name = sanitize_item_name(&name.into());
        let classification = Classification {
            name: name.clone(),
            zone,
            category: None,
            group: group.into(),
        };
        self.known.lock().unwrap().insert(name, classification);
    }

    /// Toggle the always-fail state.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All calls made so far, each as the list of requested names.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    fn should_fail(&self) -> bool {
        if self.failing.load(Ordering::SeqCst) {
            return true;
        }
        if self.failure_rate > 0.0 {
            use rand::Rng;
            return rand::thread_rng().gen::<f64>() < self.failure_rate;
        }
        false
    }
}

#[async_trait]
impl ClassifierService for MockClassifier {
    async fn classify(&self, names: &[String]) -> ClassifyResult<Vec<Classification>> {
        self.call_log.lock().unwrap().push(names.to_vec());

        if self.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.latency_ms)).await;
        }

        if self.should_fail() {
            return Err(ClassifyError::Transport("simulated outage".to_string()));
        }

        let known = self.known.lock().unwrap();
        Ok(names
            .iter()
            .filter_map(|name| known.get(&sanitize_item_name(name)).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_only_known_names() {
        let classifier = MockClassifier::new()
            .with_classification("kale", Zone::Green, "Leafy Greens")
            .with_classification("bacon", Zone::Red, "Processed Meat");

        let result = classifier
            .classify(&["kale".to_string(), "sugar".to_string()])
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "kale");
        assert_eq!(result[0].zone, Zone::Green);
        assert_eq!(result[0].group, "Leafy Greens");
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let classifier = MockClassifier::new().with_failing();
        let err = classifier.classify(&["kale".to_string()]).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Transport(_)));

        classifier.set_failing(false);
        assert!(classifier.classify(&["kale".to_string()]).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_call_log() {
        let classifier = MockClassifier::new();
        classifier.classify(&["kale".to_string()]).await.unwrap();
        classifier
            .classify(&["sugar".to_string(), "rice".to_string()])
            .await
            .unwrap();

        assert_eq!(classifier.call_count(), 2);
        let calls = classifier.calls();
        assert_eq!(calls[0], vec!["kale".to_string()]);
        assert_eq!(calls[1], vec!["sugar".to_string(), "rice".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_failure_rate_extremes() {
        // 1.0 fails every call; 0.0 never does. Intermediate rates are
        // probabilistic and not asserted here.
        let flaky = MockClassifier::new().with_failure_rate(1.0);
        for _ in 0..5 {
            let err = flaky.classify(&["kale".to_string()]).await.unwrap_err();
            assert!(matches!(err, ClassifyError::Transport(_)));
        }

        let solid = MockClassifier::new().with_failure_rate(0.0);
        for _ in 0..5 {
            assert!(solid.classify(&["kale".to_string()]).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_mock_matches_after_normalization() {
        let classifier = MockClassifier::new().with_classification("Kale", Zone::Green, "Leafy Greens");
        let result = classifier.classify(&["kale".to_string()]).await.unwrap();
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_latency_simulation() {
        let classifier = MockClassifier::new().with_latency_ms(50);

        let start = std::time::Instant::now();
        classifier.classify(&["kale".to_string()]).await.unwrap();
        assert!(start.elapsed().as_millis() >= 50, "Should simulate latency");
    }
}
