//! Pure view-models for the dashboard, map and analytics pages.
//!
//! Each `*_view` function takes the issue set (and the current time where
//! relative or calendar values are shown) and returns a serializable value a
//! shell can render directly. Nothing here touches a store.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::classification::Classification;
use crate::issue::{Category, Issue, Severity};
use crate::stats::{
    self, CategoryCount, DayAverage, DayCount, OverviewCounts, SeverityCounts, StatusTotals,
};
use crate::types::Timestamp;

pub const NO_ISSUES_MESSAGE: &str = "No issues found";
pub const NO_URGENT_MESSAGE: &str = "No urgent issues!";
pub const LOCATION_NOT_SPECIFIED: &str = "Location not specified";
pub const NOT_AVAILABLE: &str = "N/A";

const SHORT_ID_LEN: usize = 8;
const TABLE_EXCERPT_LEN: usize = 50;
const POPUP_EXCERPT_LEN: usize = 100;

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Icon name for a category badge.
pub fn category_icon(category: Category) -> &'static str {
    match category {
        Category::Plumbing => "wrench",
        Category::Electrical => "bolt",
        Category::Safety => "shield-alt",
        Category::Cleanliness => "broom",
        Category::Infrastructure => "building",
        Category::Landscaping => "tree",
        Category::Other => "question-circle",
    }
}

/// Marker colour for a severity.
pub fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "#dc3545",
        Severity::Medium => "#f0ad4e",
        Severity::Low => "#28a745",
    }
}

/// Heat-map weight for a severity.
pub fn heat_intensity(severity: Severity) -> f64 {
    match severity {
        Severity::Low => 0.3,
        Severity::Medium => 0.5,
        Severity::High => 0.7,
    }
}

/// First `max` characters of `text`, with `...` appended when cut.
pub fn excerpt(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

/// Coarse relative time: the largest whole unit that fits, or "just now".
pub fn time_ago(then: Timestamp, now: Timestamp) -> String {
    const UNITS: [(&str, i64); 6] = [
        ("year", 31_536_000),
        ("month", 2_592_000),
        ("week", 604_800),
        ("day", 86_400),
        ("hour", 3_600),
        ("minute", 60),
    ];

    let seconds = (now - then).num_seconds();
    for (unit, size) in UNITS {
        let n = seconds / size;
        if n == 1 {
            return format!("1 {unit} ago");
        }
        if n > 1 {
            return format!("{n} {unit}s ago");
        }
    }
    "just now".to_string()
}

fn time_ago_or_na(then: Option<Timestamp>, now: Timestamp) -> String {
    then.map(|t| time_ago(t, now))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn local_date<Tz: TimeZone>(at: Option<Timestamp>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.map(|t| t.with_timezone(tz).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn local_datetime<Tz: TimeZone>(at: Option<Timestamp>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.map(|t| t.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn address_or_default(issue: &Issue) -> String {
    issue
        .location
        .as_ref()
        .and_then(|l| l.address.clone())
        .unwrap_or_else(|| LOCATION_NOT_SPECIFIED.to_string())
}

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityCard {
    pub id: String,
    pub severity: Severity,
    pub category: Category,
    pub time_ago: String,
    pub description: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewView {
    pub counts: OverviewCounts,
    pub priority: Vec<PriorityCard>,
    /// Set when there is nothing urgent to show.
    pub empty_message: Option<&'static str>,
}

pub fn overview_view<Tz: TimeZone>(issues: &[Issue], now: &DateTime<Tz>) -> OverviewView {
    let utc_now = now.with_timezone(&Utc);
    let priority: Vec<PriorityCard> = stats::priority_issues(issues)
        .into_iter()
        .map(|issue| PriorityCard {
            id: issue.id.clone(),
            severity: issue.severity,
            category: issue.category,
            time_ago: time_ago_or_na(issue.reported_at, utc_now),
            description: issue.description.clone(),
            location: address_or_default(issue),
        })
        .collect();

    OverviewView {
        counts: stats::overview_counts(issues, now),
        empty_message: priority.is_empty().then_some(NO_URGENT_MESSAGE),
        priority,
    }
}

// ---------------------------------------------------------------------------
// Issues table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub id: String,
    pub short_id: String,
    pub excerpt: String,
    pub category: &'static str,
    pub severity: &'static str,
    pub status: &'static str,
    pub reported: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub rows: Vec<TableRow>,
    pub empty_message: Option<&'static str>,
}

/// Rows for an already filtered issue list.
pub fn table_view<Tz: TimeZone>(issues: &[&Issue], tz: &Tz) -> TableView
where
    Tz::Offset: std::fmt::Display,
{
    let rows: Vec<TableRow> = issues
        .iter()
        .map(|issue| TableRow {
            id: issue.id.clone(),
            short_id: short_id(&issue.id),
            excerpt: excerpt(&issue.description, TABLE_EXCERPT_LEN),
            category: issue.category.label(),
            severity: issue.severity.label(),
            status: issue.status.label(),
            reported: local_date(issue.reported_at, tz),
        })
        .collect();

    TableView {
        empty_message: rows.is_empty().then_some(NO_ISSUES_MESSAGE),
        rows,
    }
}

// ---------------------------------------------------------------------------
// Detail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiBlock {
    pub category: &'static str,
    pub severity: &'static str,
    pub confidence_percent: u32,
    pub suggestion: String,
}

impl From<&Classification> for AiBlock {
    fn from(c: &Classification) -> Self {
        Self {
            category: c.category.label(),
            severity: c.severity.label(),
            confidence_percent: c.confidence_percent(),
            suggestion: c.suggestion.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueDetail {
    pub id: String,
    pub status: &'static str,
    pub category: &'static str,
    pub severity: &'static str,
    pub description: String,
    pub address: String,
    /// Six-decimal coordinates, when a location is known.
    pub coordinates: Option<String>,
    pub reported: String,
    pub reported_ago: String,
    pub resolved: Option<String>,
    pub photo_urls: Vec<String>,
    pub ai: Option<AiBlock>,
}

pub fn detail_view<Tz: TimeZone>(issue: &Issue, now: &DateTime<Tz>) -> IssueDetail
where
    Tz::Offset: std::fmt::Display,
{
    let tz = now.timezone();
    IssueDetail {
        id: issue.id.clone(),
        status: issue.status.label(),
        category: issue.category.label(),
        severity: issue.severity.label(),
        description: issue.description.clone(),
        address: issue
            .location
            .as_ref()
            .and_then(|l| l.address.clone())
            .unwrap_or_else(|| "Not specified".to_string()),
        coordinates: issue.location.as_ref().map(|l| l.display_coordinates()),
        reported: local_datetime(issue.reported_at, &tz),
        reported_ago: time_ago_or_na(issue.reported_at, now.with_timezone(&Utc)),
        resolved: issue.resolved_at.map(|at| local_datetime(Some(at), &tz)),
        photo_urls: issue.photo_urls.clone(),
        ai: issue.ai_classification.as_ref().map(AiBlock::from),
    }
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub color: &'static str,
    pub severity: Severity,
    pub category: Category,
    pub status: &'static str,
    pub address: String,
    pub popup: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub markers: Vec<MapMarker>,
    pub heat: Vec<HeatPoint>,
}

/// Markers and heat points for every issue with a known location.
pub fn map_view(issues: &[Issue]) -> MapView {
    let mut markers = Vec::new();
    let mut heat = Vec::new();

    for issue in issues {
        let Some(location) = &issue.location else {
            continue;
        };
        markers.push(MapMarker {
            id: issue.id.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            color: severity_color(issue.severity),
            severity: issue.severity,
            category: issue.category,
            status: issue.status.label(),
            address: address_or_default(issue),
            popup: excerpt(&issue.description, POPUP_EXCERPT_LEN),
        });
        heat.push(HeatPoint {
            latitude: location.latitude,
            longitude: location.longitude,
            intensity: heat_intensity(issue.severity),
        });
    }

    MapView { markers, heat }
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityItem {
    pub id: String,
    pub icon: &'static str,
    pub category: &'static str,
    pub status: &'static str,
    pub excerpt: String,
    pub time_ago: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsView {
    pub totals: StatusTotals,
    pub resolution_rate: u32,
    pub average_response_hours: i64,
    pub categories: Vec<CategoryCount>,
    pub severities: SeverityCounts,
    pub timeline: Vec<DayCount>,
    pub response_times: Vec<DayAverage>,
    pub recent: Vec<ActivityItem>,
}

pub fn analytics_view<Tz: TimeZone>(issues: &[Issue], days: u32, now: &DateTime<Tz>) -> AnalyticsView {
    let utc_now = now.with_timezone(&Utc);
    AnalyticsView {
        totals: stats::status_totals(issues),
        resolution_rate: stats::resolution_rate(issues),
        average_response_hours: stats::average_response_hours(issues),
        categories: stats::category_counts(issues),
        severities: stats::severity_counts(issues),
        timeline: stats::timeline(issues, days, now),
        response_times: stats::response_time_series(issues, now),
        recent: stats::recent_activity(issues, stats::ACTIVITY_FEED_LIMIT)
            .into_iter()
            .map(|issue| ActivityItem {
                id: issue.id.clone(),
                icon: category_icon(issue.category),
                category: issue.category.label(),
                status: issue.status.label(),
                excerpt: excerpt(&issue.description, TABLE_EXCERPT_LEN),
                time_ago: time_ago_or_na(issue.reported_at, utc_now),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::issue::{Location, Status};
    use crate::testing::{at, issue};

    #[test]
    fn time_ago_units() {
        let now = at(2024, 5, 10, 12);
        assert_eq!(time_ago(now, now), "just now");
        assert_eq!(time_ago(now - Duration::seconds(59), now), "just now");
        assert_eq!(time_ago(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(time_ago(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(time_ago(now - Duration::days(8), now), "1 week ago");
        assert_eq!(time_ago(now - Duration::days(65), now), "2 months ago");
        assert_eq!(time_ago(now - Duration::days(400), now), "1 year ago");
        assert_eq!(time_ago(now + Duration::hours(1), now), "just now");
    }

    #[test]
    fn excerpt_only_marks_truncation() {
        assert_eq!(excerpt("short", 50), "short");
        let exact = "x".repeat(50);
        assert_eq!(excerpt(&exact, 50), exact);
        let long = "y".repeat(51);
        assert_eq!(excerpt(&long, 50), format!("{}...", "y".repeat(50)));
        assert_eq!(excerpt("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn table_rows_and_empty_message() {
        let mut a = issue("0123456789abcdef", Status::InProgress);
        a.description = "d".repeat(60);
        a.reported_at = Some(at(2024, 5, 1, 10));
        let b = issue("short", Status::Pending);

        let view = table_view(&[&a, &b], &Utc);
        assert!(view.empty_message.is_none());
        assert_eq!(view.rows[0].short_id, "01234567");
        assert_eq!(view.rows[0].excerpt.len(), 53);
        assert_eq!(view.rows[0].status, "In Progress");
        assert_eq!(view.rows[0].reported, "2024-05-01");
        assert_eq!(view.rows[1].reported, NOT_AVAILABLE);

        let empty = table_view(&[], &Utc);
        assert_eq!(empty.empty_message, Some(NO_ISSUES_MESSAGE));
    }

    #[test]
    fn overview_cards_fall_back_for_location() {
        let mut urgent = issue("u", Status::Pending);
        urgent.severity = Severity::High;
        urgent.reported_at = Some(at(2024, 5, 10, 9));

        let view = overview_view(&[urgent], &at(2024, 5, 10, 12));
        assert_eq!(view.counts.urgent, 1);
        assert_eq!(view.priority[0].location, LOCATION_NOT_SPECIFIED);
        assert_eq!(view.priority[0].time_ago, "3 hours ago");

        let calm = overview_view(&[issue("c", Status::Pending)], &at(2024, 5, 10, 12));
        assert_eq!(calm.empty_message, Some(NO_URGENT_MESSAGE));
    }

    #[test]
    fn detail_shows_coordinates_and_confidence() {
        let mut i = issue("d", Status::Resolved);
        i.location = Some(Location::new(37.8719, -122.2585).with_address("Library"));
        i.ai_classification = Some(Classification {
            category: Category::Safety,
            severity: Severity::High,
            confidence: 0.8,
            suggestion: "Issue categorized as safety with high priority".into(),
        });
        i.resolved_at = Some(at(2024, 5, 2, 8));

        let detail = detail_view(&i, &at(2024, 5, 10, 12));
        assert_eq!(detail.address, "Library");
        assert_eq!(detail.coordinates.as_deref(), Some("37.871900, -122.258500"));
        assert_eq!(detail.ai.unwrap().confidence_percent, 80);
        assert_eq!(detail.resolved.as_deref(), Some("2024-05-02 08:00"));
        assert_eq!(detail.reported, NOT_AVAILABLE);
    }

    #[test]
    fn map_skips_issues_without_location() {
        let mut high = issue("h", Status::Pending);
        high.severity = Severity::High;
        high.description = "z".repeat(120);
        high.location = Some(Location::new(1.0, 2.0));
        let mut low = issue("l", Status::Pending);
        low.severity = Severity::Low;
        low.location = Some(Location::new(3.0, 4.0));
        let nowhere = issue("n", Status::Pending);

        let view = map_view(&[high, low, nowhere]);
        assert_eq!(view.markers.len(), 2);
        assert_eq!(view.markers[0].color, "#dc3545");
        assert_eq!(view.markers[0].popup.chars().count(), 103);
        assert_eq!(view.markers[1].color, "#28a745");
        assert_eq!(view.heat[0].intensity, 0.7);
        assert_eq!(view.heat[1].intensity, 0.3);
    }

    #[test]
    fn analytics_of_empty_set_is_zeroed() {
        let view = analytics_view(&[], 30, &at(2024, 5, 10, 12));
        assert_eq!(view.totals.total, 0);
        assert_eq!(view.resolution_rate, 0);
        assert_eq!(view.average_response_hours, 0);
        assert!(view.categories.is_empty());
        assert_eq!(view.timeline.len(), 30);
        assert_eq!(view.response_times.len(), 7);
        assert!(view.recent.is_empty());
    }

    #[test]
    fn icons_cover_every_category() {
        for c in Category::ALL {
            assert!(!category_icon(*c).is_empty());
        }
        assert_eq!(category_icon(Category::Other), "question-circle");
    }
}
