//! Issue row model.

use campus_core::classification::ClassificationDocument;
use campus_core::issue::{Category, Issue, Location, Severity, Status};
use campus_core::types::{IssueId, Timestamp};
use sqlx::FromRow;

/// A row from the `issues` table.
#[derive(Debug, Clone, FromRow)]
pub struct IssueRow {
    pub id: IssueId,
    pub description: String,
    pub category: String,
    pub severity: String,
    pub status: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub photo_urls: Vec<String>,
    pub ai_classification: Option<serde_json::Value>,
    pub reporter_id: Option<String>,
    pub reported_at: Timestamp,
    pub updated_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub response_time_ms: Option<i64>,
}

impl From<IssueRow> for Issue {
    fn from(row: IssueRow) -> Self {
        let location = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(Location {
                latitude,
                longitude,
                address: row.address.filter(|a| !a.trim().is_empty()),
            }),
            _ => None,
        };

        let ai_classification = row.ai_classification.and_then(|value| {
            match serde_json::from_value::<ClassificationDocument>(value) {
                Ok(doc) => Some(doc.into_classification()),
                Err(e) => {
                    tracing::warn!(issue_id = %row.id, error = %e, "Unreadable ai_classification, ignoring");
                    None
                }
            }
        });

        Issue {
            category: Category::parse_lenient(Some(row.category.as_str())),
            severity: Severity::parse_lenient(Some(row.severity.as_str())),
            status: Status::parse_lenient(Some(row.status.as_str())),
            id: row.id,
            description: row.description,
            location,
            photo_urls: row.photo_urls,
            ai_classification,
            reported_at: Some(row.reported_at),
            updated_at: Some(row.updated_at),
            resolved_at: row.resolved_at,
            response_time_ms: row.response_time_ms.map(|ms| ms.max(0)),
            reporter_id: row.reporter_id,
        }
    }
}
