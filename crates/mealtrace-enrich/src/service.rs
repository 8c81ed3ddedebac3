//! Classifier service trait and tagged result types.

use async_trait::async_trait;
use thiserror::Error;

use mealtrace_core::Zone;

/// A validated classification returned by the service for one item name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Name as returned by the service; matched against items after
    /// normalization on both sides.
    pub name: String,
    pub zone: Zone,
    pub category: Option<String>,
    pub group: String,
}

/// Failure of an entire classification call.
///
/// A short response (classifications for only a subset of the requested
/// names) is *not* an error; it is expected partial success.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// The endpoint answered with a non-2xx status.
    #[error("classifier returned {code}: {body}")]
    Status { code: u16, body: String },

    /// The request never completed (connect, timeout, body read).
    #[error("classifier transport error: {0}")]
    Transport(String),

    /// The body arrived but did not match the expected schema.
    #[error("classifier schema error: {0}")]
    Schema(String),
}

/// Result type for classification calls.
pub type ClassifyResult<T> = std::result::Result<T, ClassifyError>;

/// External classification endpoint.
///
/// One call covers one batch of names; implementations must not retry
/// internally. The returned list may be shorter than the request.
#[async_trait]
pub trait ClassifierService: Send + Sync {
    /// Classify a batch of item names.
    async fn classify(&self, names: &[String]) -> ClassifyResult<Vec<Classification>>;
}
