//! Issue record, its enumerations, and boundary validation.
//!
//! Every issue flowing through the system is an [`Issue`]. Raw documents
//! read from a store are decoded leniently through [`IssueDocument`], which
//! substitutes the documented defaults for missing or unknown values. Writes
//! go through [`NewIssue`] and must use the canonical enumerations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classification::{Classification, ClassificationDocument};
use crate::error::CoreError;
use crate::types::{IssueId, Timestamp};

// ---------------------------------------------------------------------------
// Validation constants
// ---------------------------------------------------------------------------

/// Maximum length for the user-provided description field (characters).
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

macro_rules! define_issue_enum {
    (
        $(#[$meta:meta])*
        $name:ident (field = $field:literal, default = $default:ident) {
            $( $(#[$vmeta:meta])* $variant:ident => ($wire:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every value, in canonical order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire representation (matches the serde encoding).
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }

            /// Human-readable label for badges and chart axes.
            pub fn label(self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }

            /// Decode a value read from storage.
            ///
            /// Missing values fall back to the default silently; unknown
            /// values fall back to the default with a warning.
            pub fn parse_lenient(value: Option<&str>) -> Self {
                match value.map(str::trim) {
                    None | Some("") => $name::$default,
                    Some(raw) => raw.parse().unwrap_or_else(|_| {
                        tracing::warn!(field = $field, value = raw, "Unknown value, using default");
                        $name::$default
                    }),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lowered = s.trim().to_ascii_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == lowered)
                    .ok_or_else(|| {
                        let valid: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        CoreError::Validation(format!(
                            "Invalid {} '{}'. Must be one of: {:?}",
                            $field, s, valid
                        ))
                    })
            }
        }
    };
}

define_issue_enum! {
    /// What kind of problem was reported.
    Category (field = "category", default = Other) {
        Plumbing => ("plumbing", "Plumbing"),
        Electrical => ("electrical", "Electrical"),
        Safety => ("safety", "Safety"),
        Cleanliness => ("cleanliness", "Cleanliness"),
        Infrastructure => ("infrastructure", "Infrastructure"),
        Landscaping => ("landscaping", "Landscaping"),
        Other => ("other", "Other"),
    }
}

define_issue_enum! {
    /// Urgency of an issue. `critical` is not part of the canonical set.
    Severity (field = "severity", default = Medium) {
        Low => ("low", "Low"),
        Medium => ("medium", "Medium"),
        High => ("high", "High"),
    }
}

define_issue_enum! {
    /// Triage state. Any transition between states is permitted.
    Status (field = "status", default = Pending) {
        Pending => ("pending", "Pending"),
        InProgress => ("in_progress", "In Progress"),
        Resolved => ("resolved", "Resolved"),
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// Point picked on the map, with an optional display address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            address: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Coordinates formatted to six decimals, as shown in the location field.
    pub fn display_coordinates(&self) -> String {
        format!("{:.6}, {:.6}", self.latitude, self.longitude)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoreError::Validation(format!(
                "Latitude must be between -90 and 90 (got {})",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoreError::Validation(format!(
                "Longitude must be between -180 and 180 (got {})",
                self.longitude
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// A single reported problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub description: String,
    pub category: Category,
    pub severity: Severity,
    pub status: Status,
    pub location: Option<Location>,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    pub ai_classification: Option<Classification>,
    pub reported_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
    pub response_time_ms: Option<i64>,
    pub reporter_id: Option<String>,
}

impl Issue {
    /// Open high-severity issues are what the overview calls "urgent".
    pub fn is_urgent(&self) -> bool {
        self.severity == Severity::High && self.status != Status::Resolved
    }

    /// Hours between report and resolution, when both are known.
    pub fn resolution_hours(&self) -> Option<f64> {
        let reported = self.reported_at?;
        let resolved = self.resolved_at?;
        Some((resolved - reported).num_milliseconds() as f64 / 3_600_000.0)
    }
}

// ---------------------------------------------------------------------------
// Lenient read-side document
// ---------------------------------------------------------------------------

/// Location as it may appear in stored documents (`lat`/`lng` accepted).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocationDocument {
    #[serde(alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(alias = "lng")]
    pub longitude: Option<f64>,
    pub address: Option<String>,
}

impl LocationDocument {
    fn into_location(self) -> Option<Location> {
        Some(Location {
            latitude: self.latitude?,
            longitude: self.longitude?,
            address: self.address.filter(|a| !a.trim().is_empty()),
        })
    }
}

/// An issue as stored, with every field optional.
///
/// Accepts the legacy camelCase field names so older documents still load.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IssueDocument {
    pub description: Option<String>,
    pub category: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub location: Option<LocationDocument>,
    #[serde(alias = "photoURLs", alias = "images")]
    pub photo_urls: Option<Vec<String>>,
    #[serde(alias = "aiClassification")]
    pub ai_classification: Option<ClassificationDocument>,
    #[serde(alias = "reportedAt", alias = "createdAt")]
    pub reported_at: Option<Timestamp>,
    #[serde(alias = "updatedAt")]
    pub updated_at: Option<Timestamp>,
    #[serde(alias = "resolvedAt")]
    pub resolved_at: Option<Timestamp>,
    #[serde(alias = "responseTime")]
    pub response_time_ms: Option<i64>,
    #[serde(alias = "userId")]
    pub reporter_id: Option<String>,
}

impl IssueDocument {
    /// Normalize into an [`Issue`] keyed by the store-assigned `id`.
    pub fn into_issue(self, id: impl Into<IssueId>) -> Issue {
        Issue {
            id: id.into(),
            description: self.description.unwrap_or_default(),
            category: Category::parse_lenient(self.category.as_deref()),
            severity: Severity::parse_lenient(self.severity.as_deref()),
            status: Status::parse_lenient(self.status.as_deref()),
            location: self.location.and_then(LocationDocument::into_location),
            photo_urls: self.photo_urls.unwrap_or_default(),
            ai_classification: self
                .ai_classification
                .map(ClassificationDocument::into_classification),
            reported_at: self.reported_at,
            updated_at: self.updated_at,
            resolved_at: self.resolved_at,
            response_time_ms: self.response_time_ms.map(|ms| ms.max(0)),
            reporter_id: self.reporter_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Write-side document
// ---------------------------------------------------------------------------

/// A new issue ready to be created. Timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIssue {
    pub description: String,
    pub location: Location,
    pub category: Category,
    pub severity: Severity,
    #[serde(default)]
    pub status: Status,
    pub ai_classification: Option<Classification>,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    pub reporter_id: Option<String>,
}

impl NewIssue {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_description(&self.description)?;
        self.location.validate()
    }
}

/// Validate the description: non-blank and within the length limit.
pub fn validate_description(description: &str) -> Result<(), CoreError> {
    if description.trim().is_empty() {
        return Err(CoreError::Validation("Description is required".into()));
    }
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Description exceeds maximum length of {MAX_DESCRIPTION_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
