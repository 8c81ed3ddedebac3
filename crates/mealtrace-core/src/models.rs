//! Data model for meals under enrichment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification outcome for a single food item.
///
/// `Unzoned` is the "not yet classified" sentinel; items stay `Unzoned`
/// until the classification service returns a match for their name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Green,
    Yellow,
    Red,
    Unzoned,
}

impl Zone {
    /// Decode a wire value leniently: absent or unrecognized zones become
    /// `Unzoned` rather than failing the whole payload.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("green") => Zone::Green,
            Some("yellow") => Zone::Yellow,
            Some("red") => Zone::Red,
            _ => Zone::Unzoned,
        }
    }

    /// Whether this item still needs classification.
    pub fn is_unzoned(&self) -> bool {
        matches!(self, Zone::Unzoned)
    }
}

/// Lifecycle status of a meal.
///
/// `Processed` and `PendingReview` are terminal for the enrichment
/// subsystem; only `Analyzing` meals are selected by retry sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MealStatus {
    /// Retry budget exhausted with items still unclassified; needs a human.
    PendingReview,
    /// At least one item awaits classification; swept by the scheduler.
    Analyzing,
    /// Every item classified; no further automatic work.
    Processed,
}

impl MealStatus {
    /// Whether the retry scheduler will ever select this meal again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MealStatus::Analyzing)
    }
}

fn default_group() -> String {
    "other".to_string()
}

/// A single classifiable food item within a meal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    /// Normalized (trimmed, lower-cased) name; the merge key for
    /// classification results.
    pub name: String,
    pub zone: Zone,
    /// Coarse label, e.g. "vegetable".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Fine-grained label, e.g. "Leafy Greens".
    #[serde(default = "default_group")]
    pub group: String,
    /// Caller-set attribute, independent of classification.
    #[serde(default)]
    pub organic: bool,
}

impl FoodItem {
    /// Create an unclassified item from an already-sanitized name.
    pub fn unzoned(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            zone: Zone::Unzoned,
            category: None,
            group: default_group(),
            organic: false,
        }
    }

    /// True once the item carries a real zone.
    pub fn is_classified(&self) -> bool {
        !self.zone.is_unzoned()
    }
}

/// A user-owned meal record under enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub id: Uuid,
    /// Display name chosen by the user, e.g. "tuesday lunch".
    pub name: String,
    /// Insertion-ordered items; order matters for display, not processing.
    pub items: Vec<FoodItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub status: MealStatus,
    /// Background retry attempts consumed so far.
    pub retry_count: u32,
    /// Set iff at least one retry attempt has been made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_retry_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meal {
    /// Create a fresh meal. Status is derived from the items: fully
    /// classified meals start `Processed`, anything else starts
    /// `Analyzing` so the retry scheduler picks it up.
    pub fn new(name: impl Into<String>, items: Vec<FoodItem>, created_at: DateTime<Utc>) -> Self {
        let status = if items.iter().all(FoodItem::is_classified) {
            MealStatus::Processed
        } else {
            MealStatus::Analyzing
        };
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            items,
            note: None,
            status,
            retry_count: 0,
            last_retry_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Attach a free-text note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Whether any item still lacks a classification.
    pub fn has_unzoned_items(&self) -> bool {
        self.items.iter().any(|i| i.zone.is_unzoned())
    }

    /// Names of the items still awaiting classification, in item order.
    pub fn unzoned_names(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|i| i.zone.is_unzoned())
            .map(|i| i.name.clone())
            .collect()
    }
}

/// Partial update applied to a stored meal.
///
/// The store writes all present fields atomically and bumps `updated_at`.
/// When `expected_updated_at` is set, the write only succeeds if the
/// stored `updated_at` still matches (optimistic concurrency); a mismatch
/// yields `Error::Conflict` and leaves the meal untouched.
#[derive(Debug, Clone, Default)]
pub struct MealPatch {
    pub items: Option<Vec<FoodItem>>,
    pub status: Option<MealStatus>,
    pub retry_count: Option<u32>,
    pub last_retry_at: Option<DateTime<Utc>>,
    pub expected_updated_at: Option<DateTime<Utc>>,
}

impl MealPatch {
    /// Guard this patch against concurrent writers.
    pub fn guarded(mut self, expected_updated_at: DateTime<Utc>) -> Self {
        self.expected_updated_at = Some(expected_updated_at);
        self
    }
}

/// Normalize a raw item name into its merge key: trimmed, lower-cased,
/// inner whitespace collapsed. Returns an empty string for blank input;
/// callers drop such items with a warning.
pub fn sanitize_item_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
