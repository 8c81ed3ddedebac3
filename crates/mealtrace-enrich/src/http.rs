//! HTTP classifier backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use mealtrace_core::{defaults, Zone};

use crate::service::{Classification, ClassifierService, ClassifyError, ClassifyResult};

/// Default classification endpoint.
pub const DEFAULT_CLASSIFIER_URL: &str = defaults::CLASSIFIER_URL;

/// Timeout for classification requests (seconds).
pub const CLASSIFY_TIMEOUT_SECS: u64 = defaults::CLASSIFY_TIMEOUT_SECS;

/// reqwest-backed classifier for the external classification service.
pub struct HttpClassifier {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpClassifier {
    /// Create a classifier against the default endpoint.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CLASSIFIER_URL.to_string(), CLASSIFY_TIMEOUT_SECS)
    }

    /// Create a classifier with a custom endpoint and timeout.
    pub fn with_config(base_url: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        info!("Initializing HTTP classifier: url={}", base_url);

        Self {
            client,
            base_url,
            timeout_secs,
        }
    }

    /// Create from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `MEALTRACE_CLASSIFIER_URL` | `http://localhost:8420` | Endpoint base URL |
    /// | `MEALTRACE_CLASSIFY_TIMEOUT_SECS` | `30` | Per-call timeout |
    pub fn from_env() -> Self {
        let base_url = std::env::var("MEALTRACE_CLASSIFIER_URL")
            .unwrap_or_else(|_| DEFAULT_CLASSIFIER_URL.to_string());
        let timeout_secs = std::env::var("MEALTRACE_CLASSIFY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(CLASSIFY_TIMEOUT_SECS);

        Self::with_config(base_url, timeout_secs)
    }
}

impl Default for HttpClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Request payload for the `/classify` endpoint.
#[derive(Serialize)]
struct ClassifyRequest {
    items: Vec<String>,
}

/// Response from the `/classify` endpoint.
#[derive(Deserialize)]
struct ClassifyResponse {
    items: Vec<WireClassification>,
}

/// One classification element as it appears on the wire.
///
/// `name` is mandatory; `zone` and `group` are normalized leniently
/// (`Unzoned` / `"other"`) so a sloppy element never fails the payload.
#[derive(Deserialize)]
struct WireClassification {
    name: String,
    zone: Option<String>,
    category: Option<String>,
    group: Option<String>,
}

impl From<WireClassification> for Classification {
    fn from(wire: WireClassification) -> Self {
        Classification {
            name: wire.name,
            zone: Zone::from_wire(wire.zone.as_deref()),
            category: wire.category,
            group: wire.group.unwrap_or_else(|| "other".to_string()),
        }
    }
}

#[async_trait]
impl ClassifierService for HttpClassifier {
    #[instrument(skip(self, names), fields(subsystem = "enrich", component = "http_classifier", op = "classify", item_count = names.len()))]
    async fn classify(&self, names: &[String]) -> ClassifyResult<Vec<Classification>> {
        if names.is_empty() {
            return Ok(vec![]);
        }

        let start = Instant::now();
        let request = ClassifyRequest {
            items: names.to_vec(),
        };

        let response = self
            .client
            .post(format!("{}/classify", self.base_url))
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let code = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(code, "Classifier returned error status");
            return Err(ClassifyError::Status { code, body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        let parsed: ClassifyResponse =
            serde_json::from_str(&body).map_err(|e| ClassifyError::Schema(e.to_string()))?;

        let classifications: Vec<Classification> =
            parsed.items.into_iter().map(Classification::from).collect();

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            requested = names.len(),
            returned = classifications.len(),
            duration_ms = elapsed,
            "Classification call complete"
        );
        if classifications.len() < names.len() {
            debug!(
                missing = names.len() - classifications.len(),
                "Classifier returned a partial result"
            );
        }

        Ok(classifications)
    }
}
