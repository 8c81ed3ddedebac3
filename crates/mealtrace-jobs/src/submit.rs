//! Synchronous submission pipeline for meal creation and edits.
//!
//! Sanitizes and deduplicates items, makes one best-effort bulk
//! classification attempt, and assembles the final meal. Every step is
//! tolerant of partial failure: degraded inputs become warnings, never
//! errors. The only hard failure is a submission with zero valid items.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use mealtrace_core::{sanitize_item_name, FoodItem, Meal, Zone};
use mealtrace_enrich::EnrichmentClient;

/// Error code for a submission with no classifiable items.
pub const NO_VALID_ITEMS: &str = "NO_VALID_ITEMS";

/// A proposed item as entered by the user, before sanitization.
#[derive(Debug, Clone, Default)]
pub struct ItemDraft {
    pub name: String,
    pub organic: bool,
    /// Set when the item was already classified in a previous edit.
    pub zone: Option<Zone>,
    pub category: Option<String>,
    pub group: Option<String>,
}

impl ItemDraft {
    /// Create an unclassified draft.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Mark the item organic.
    pub fn organic(mut self) -> Self {
        self.organic = true;
        self
    }

    /// Carry over an existing classification.
    pub fn classified(
        mut self,
        zone: Zone,
        category: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        self.zone = Some(zone);
        self.category = Some(category.into());
        self.group = Some(group.into());
        self
    }
}

/// Proposed meal fields for one submission.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    /// Display name for the meal.
    pub name: String,
    pub items: Vec<ItemDraft>,
    pub note: Option<String>,
    /// Item text still sitting in the input box, not yet committed to the
    /// list; appended after sanitization.
    pub pending_item: Option<String>,
    pub logged_at: DateTime<Utc>,
}

/// Failure classification for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionErrorKind {
    Validation,
    Api,
    Network,
    Unknown,
}

/// Hard failure of a submission. The processor only ever produces
/// `NO_VALID_ITEMS`; enrichment problems degrade to warnings instead.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct SubmissionError {
    pub message: String,
    pub code: &'static str,
    pub kind: SubmissionErrorKind,
}

/// Successful submission: the assembled meal plus non-fatal warnings.
#[derive(Debug)]
pub struct ProcessedSubmission {
    pub meal: Meal,
    pub warnings: Vec<String>,
}

/// Synchronous best-effort enrichment pipeline for the creation path.
pub struct SubmissionProcessor {
    enrichment: EnrichmentClient,
}

impl SubmissionProcessor {
    /// Create a processor over an injected enrichment client.
    pub fn new(enrichment: EnrichmentClient) -> Self {
        Self { enrichment }
    }

    /// Process one submission.
    ///
    /// The assembled meal gets `status = Processed` only when every item is
    /// classified; otherwise it starts `Analyzing` and the retry scheduler
    /// reconciles the unzoned remainder on a later sweep. Persistence is
    /// the caller's job.
    #[instrument(skip(self, request), fields(subsystem = "jobs", component = "submit", op = "process", item_count = request.items.len()))]
    pub async fn process(
        &self,
        request: SubmissionRequest,
    ) -> Result<ProcessedSubmission, SubmissionError> {
        let mut warnings = Vec::new();
        let mut drafts = request.items;

        // Commit the pending input-box text as one more item.
        if let Some(raw) = &request.pending_item {
            if !raw.is_empty() {
                if sanitize_item_name(raw).is_empty() {
                    warnings.push(format!("dropped pending item {raw:?}: empty after sanitizing"));
                } else {
                    drafts.push(ItemDraft::new(raw.clone()));
                }
            }
        }

        // Sanitize every name; drop blanks with a warning, collapse
        // duplicates (first occurrence wins).
        let mut seen: HashSet<String> = HashSet::new();
        let mut items: Vec<FoodItem> = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let name = sanitize_item_name(&draft.name);
            if name.is_empty() {
                warnings.push(format!(
                    "dropped item {:?}: empty after sanitizing",
                    draft.name
                ));
                continue;
            }
            if !seen.insert(name.clone()) {
                debug!(item = %name, "Collapsing duplicate item");
                continue;
            }
            items.push(FoodItem {
                name,
                zone: draft.zone.unwrap_or(Zone::Unzoned),
                category: draft.category,
                group: draft.group.unwrap_or_else(|| "other".to_string()),
                organic: draft.organic,
            });
        }

        if items.is_empty() {
            return Err(SubmissionError {
                message: "no valid items after sanitizing".to_string(),
                code: NO_VALID_ITEMS,
                kind: SubmissionErrorKind::Validation,
            });
        }

        // One bulk attempt for the items that still need classification.
        // Already-classified items (zone plus category/group from a prior
        // edit) skip the service entirely.
        let needs_classification: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| !(item.is_classified() && item.category.is_some()))
            .map(|(i, _)| i)
            .collect();

        if !needs_classification.is_empty() {
            let subset: Vec<FoodItem> = needs_classification
                .iter()
                .map(|&i| items[i].clone())
                .collect();
            let outcome = self.enrichment.enrich_bulk(subset).await;
            warnings.extend(outcome.warnings);
            for (&i, merged) in needs_classification.iter().zip(outcome.items) {
                items[i] = merged;
            }
        }

        let mut meal = Meal::new(request.name, items, request.logged_at);
        meal.note = request.note;

        debug!(
            meal_id = %meal.id,
            status = ?meal.status,
            warning_count = warnings.len(),
            "Submission assembled"
        );
        Ok(ProcessedSubmission { meal, warnings })
    }
}
