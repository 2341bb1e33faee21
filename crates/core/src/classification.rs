//! AI-assisted classification of issue descriptions.
//!
//! The classification service suggests a category and severity for a free
//! text description. It is advisory: any failure degrades to
//! [`Classification::fallback`] and the submission proceeds.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::issue::{Category, Severity};

/// Confidence reported by the keyword rule classifier.
pub const RULE_CONFIDENCE: f64 = 0.8;

/// Suggestion text attached to the fallback classification.
pub const FALLBACK_SUGGESTION: &str = "Could not classify automatically";

/// A suggested category/severity with a confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub severity: Severity,
    #[serde(deserialize_with = "deserialize_confidence")]
    pub confidence: f64,
    pub suggestion: String,
}

fn deserialize_confidence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    f64::deserialize(deserializer).map(clamp_confidence)
}

impl Classification {
    /// The classification used whenever the service is unreachable or fails.
    pub fn fallback() -> Self {
        Self {
            category: Category::Other,
            severity: Severity::Medium,
            confidence: 0.0,
            suggestion: FALLBACK_SUGGESTION.to_string(),
        }
    }

    /// Confidence as a whole percentage, e.g. `0.8` -> `80`.
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

/// Clamp a reported confidence into `[0, 1]`; non-finite values become 0.
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Classification as returned by the service or stored in older documents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassificationDocument {
    pub category: Option<String>,
    pub severity: Option<String>,
    pub confidence: Option<f64>,
    pub suggestion: Option<String>,
}

impl ClassificationDocument {
    pub fn into_classification(self) -> Classification {
        Classification {
            category: Category::parse_lenient(self.category.as_deref()),
            severity: Severity::parse_lenient(self.severity.as_deref()),
            confidence: clamp_confidence(self.confidence.unwrap_or(0.0)),
            suggestion: self.suggestion.unwrap_or_default(),
        }
    }
}

/// Coordinates sent alongside the description.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Request body of the classification endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub description: String,
    pub location: Option<Coordinates>,
}

/// Anything able to suggest a classification.
///
/// Implementations must not fail: errors are logged and turned into
/// [`Classification::fallback`].
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, request: &ClassifyRequest) -> Classification;
}

// ---------------------------------------------------------------------------
// Keyword rules
// ---------------------------------------------------------------------------

/// Category keyword table, checked in order; the first match wins.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Plumbing,
        &["water", "leak", "pipe", "fountain", "toilet", "sink", "drain"],
    ),
    (
        Category::Electrical,
        &["light", "electric", "power", "outlet", "wire", "bulb"],
    ),
    (
        Category::Safety,
        &["danger", "unsafe", "hazard", "risk", "emergency", "broken glass"],
    ),
    (
        Category::Cleanliness,
        &["dirty", "trash", "garbage", "clean", "mess", "waste"],
    ),
    (
        Category::Infrastructure,
        &["road", "path", "sidewalk", "building", "wall", "roof", "door", "window"],
    ),
    (
        Category::Landscaping,
        &["grass", "tree", "plant", "garden", "lawn", "landscape"],
    ),
];

const HIGH_SEVERITY_KEYWORDS: &[&str] = &[
    "urgent",
    "critical",
    "emergency",
    "danger",
    "unsafe",
    "immediate",
];

const LOW_SEVERITY_KEYWORDS: &[&str] = &["minor", "small", "slight", "cosmetic"];

/// Rule-based classifier used by the classification endpoint.
///
/// Matching is substring based on the lowercased description.
pub fn classify_by_keywords(description: &str) -> Classification {
    let lowered = description.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| lowered.contains(w));

    let category = CATEGORY_KEYWORDS
        .iter()
        .find(|(_, words)| contains_any(words))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other);

    let severity = if contains_any(HIGH_SEVERITY_KEYWORDS) {
        Severity::High
    } else if contains_any(LOW_SEVERITY_KEYWORDS) {
        Severity::Low
    } else {
        Severity::Medium
    };

    Classification {
        category,
        severity,
        confidence: RULE_CONFIDENCE,
        suggestion: format!("Issue categorized as {category} with {severity} priority"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
