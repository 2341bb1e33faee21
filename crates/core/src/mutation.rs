//! Builders for the two writes the application performs: a status change on
//! an existing issue and the creation of a new one.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::classification::Classification;
use crate::issue::{Category, Issue, Location, NewIssue, Status};
use crate::types::Timestamp;

/// Partial update applied to an issue when its status changes.
///
/// `resolved_at` and `response_time_ms` are present exactly when the new
/// status is [`Status::Resolved`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<i64>,
}

impl StatusUpdate {
    /// Build the update moving `issue` to `status` at instant `now`.
    ///
    /// Resolution stamps `now` and the elapsed time since the cached report
    /// time (0 if that time is unknown or in the future).
    pub fn for_issue(issue: &Issue, status: Status, now: Timestamp) -> Self {
        if status != Status::Resolved {
            return Self::plain(status);
        }
        let response_time_ms = issue
            .reported_at
            .map(|reported| (now - reported).num_milliseconds().max(0))
            .unwrap_or(0);
        Self {
            status,
            resolved_at: Some(now),
            response_time_ms: Some(response_time_ms),
        }
    }

    /// Same as [`for_issue`](Self::for_issue) using the current time.
    pub fn for_issue_now(issue: &Issue, status: Status) -> Self {
        Self::for_issue(issue, status, Utc::now())
    }

    /// An update that only carries the status.
    pub fn plain(status: Status) -> Self {
        Self {
            status,
            resolved_at: None,
            response_time_ms: None,
        }
    }

    /// Reconcile a caller-supplied update with the stored issue.
    ///
    /// Resolution stamps come from the store's clock: whatever the caller
    /// sent, a resolution is stamped at `now` with the elapsed time since
    /// the stored report time, and any other status carries neither.
    pub fn normalized_for(self, issue: &Issue, now: Timestamp) -> Self {
        Self::for_issue(issue, self.status, now)
    }

    /// Apply this update to an issue in place, stamping `updated_at`.
    pub fn apply_to(&self, issue: &mut Issue, now: Timestamp) {
        issue.status = self.status;
        if self.status == Status::Resolved {
            issue.resolved_at = self.resolved_at;
            issue.response_time_ms = self.response_time_ms;
        }
        issue.updated_at = Some(now);
    }
}

/// One selected image, not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Values of the citizen report form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportForm {
    pub description: String,
    /// The point selected on the map, if any.
    pub location: Option<Location>,
    /// Explicit category choice; `None` defers to the classifier.
    pub category: Option<Category>,
    pub photos: Vec<PhotoUpload>,
    pub reporter_id: Option<String>,
}

/// Assemble the document for a new issue.
///
/// The explicit category wins over the suggested one; severity always comes
/// from the classification (which itself defaults to medium).
pub fn build_new_issue(
    form: &ReportForm,
    location: Location,
    classification: &Classification,
    photo_urls: Vec<String>,
) -> NewIssue {
    NewIssue {
        description: form.description.trim().to_string(),
        location,
        category: form.category.unwrap_or(classification.category),
        severity: classification.severity,
        status: Status::Pending,
        ai_classification: Some(classification.clone()),
        photo_urls,
        reporter_id: form
            .reporter_id
            .clone()
            .or_else(|| Some("anonymous".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Severity;
    use crate::testing::{at, issue};

    #[test]
    fn resolving_sets_both_stamps() {
        let mut i = issue("a", Status::Pending);
        i.reported_at = Some(at(2024, 5, 1, 10));
        let now = at(2024, 5, 1, 12);

        let update = StatusUpdate::for_issue(&i, Status::Resolved, now);
        assert_eq!(update.status, Status::Resolved);
        assert_eq!(update.resolved_at, Some(now));
        assert_eq!(update.response_time_ms, Some(2 * 3_600_000));
    }

    #[test]
    fn resolving_without_report_time_uses_zero() {
        let i = issue("a", Status::InProgress);
        let update = StatusUpdate::for_issue(&i, Status::Resolved, at(2024, 5, 1, 12));
        assert!(update.resolved_at.is_some());
        assert_eq!(update.response_time_ms, Some(0));
    }

    #[test]
    fn future_report_time_clamps_to_zero() {
        let mut i = issue("a", Status::Pending);
        i.reported_at = Some(at(2024, 5, 2, 0));
        let update = StatusUpdate::for_issue(&i, Status::Resolved, at(2024, 5, 1, 0));
        assert_eq!(update.response_time_ms, Some(0));
    }

    #[test]
    fn other_statuses_carry_only_status() {
        let i = issue("a", Status::Pending);
        let update = StatusUpdate::for_issue(&i, Status::InProgress, at(2024, 5, 1, 0));
        assert_eq!(update, StatusUpdate::plain(Status::InProgress));
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "in_progress" }));
    }

    #[test]
    fn normalization_stamps_resolution_from_store_clock() {
        let mut i = issue("a", Status::Pending);
        i.reported_at = Some(at(2024, 5, 1, 0));
        let now = at(2024, 5, 1, 1);

        let update = StatusUpdate::plain(Status::Resolved).normalized_for(&i, now);
        assert_eq!(update.resolved_at, Some(now));
        assert_eq!(update.response_time_ms, Some(3_600_000));

        let forged = StatusUpdate {
            status: Status::Resolved,
            resolved_at: Some(at(2001, 1, 1, 0)),
            response_time_ms: Some(999_999_999),
        }
        .normalized_for(&i, now);
        assert_eq!(forged.resolved_at, Some(now));
        assert_eq!(forged.response_time_ms, Some(3_600_000));

        let stray = StatusUpdate {
            status: Status::Pending,
            resolved_at: Some(now),
            response_time_ms: Some(5),
        }
        .normalized_for(&i, now);
        assert_eq!(stray, StatusUpdate::plain(Status::Pending));
    }

    #[test]
    fn apply_keeps_previous_resolution_when_reopening() {
        let mut i = issue("a", Status::Resolved);
        i.resolved_at = Some(at(2024, 5, 1, 0));
        StatusUpdate::plain(Status::InProgress).apply_to(&mut i, at(2024, 5, 2, 0));
        assert_eq!(i.status, Status::InProgress);
        assert_eq!(i.resolved_at, Some(at(2024, 5, 1, 0)));
        assert_eq!(i.updated_at, Some(at(2024, 5, 2, 0)));
    }

    #[test]
    fn explicit_category_wins_over_suggestion() {
        let form = ReportForm {
            description: "  Broken bench  ".into(),
            category: Some(Category::Infrastructure),
            ..Default::default()
        };
        let suggestion = Classification {
            category: Category::Safety,
            severity: Severity::High,
            confidence: 0.8,
            suggestion: String::new(),
        };
        let doc = build_new_issue(&form, Location::new(1.0, 2.0), &suggestion, vec![]);
        assert_eq!(doc.description, "Broken bench");
        assert_eq!(doc.category, Category::Infrastructure);
        assert_eq!(doc.severity, Severity::High);
        assert_eq!(doc.status, Status::Pending);
        assert_eq!(doc.reporter_id.as_deref(), Some("anonymous"));
        assert_eq!(doc.ai_classification, Some(suggestion));
    }

    #[test]
    fn suggested_category_is_used_when_form_is_blank() {
        let form = ReportForm {
            description: "Leak".into(),
            ..Default::default()
        };
        let doc = build_new_issue(
            &form,
            Location::new(1.0, 2.0),
            &Classification::fallback(),
            vec!["u".into()],
        );
        assert_eq!(doc.category, Category::Other);
        assert_eq!(doc.severity, Severity::Medium);
        assert_eq!(doc.photo_urls, vec!["u".to_string()]);
    }
}
