//! Summary counters and chart aggregations over an issue set.
//!
//! Everything here is a pure function of the (unfiltered) issue set and the
//! current time. Missing optional fields are treated with their documented
//! defaults; an empty set yields zeroed results, never an error.
//!
//! Calendar-day bucketing happens in the time zone of `now`, so callers pass
//! `chrono::Local::now()` in production and a fixed `Utc` instant in tests.

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use serde::Serialize;

use crate::issue::{Category, Issue, Severity, Status};
use crate::types::Timestamp;

/// Maximum number of entries in the priority list.
pub const PRIORITY_LIMIT: usize = 5;

/// Trailing window (days) of the response-time chart.
pub const RESPONSE_TIME_WINDOW_DAYS: u32 = 7;

/// Default trailing window (days) of the timeline chart.
pub const DEFAULT_TIMELINE_DAYS: u32 = 7;

/// Number of entries in the analytics activity feed.
pub const ACTIVITY_FEED_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Overview counters
// ---------------------------------------------------------------------------

/// Counters shown on the admin overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverviewCounts {
    /// High severity and not yet resolved.
    pub urgent: usize,
    pub pending: usize,
    pub in_progress: usize,
    /// Resolved with a resolution time on the current local day.
    pub resolved_today: usize,
}

pub fn overview_counts<Tz: TimeZone>(issues: &[Issue], now: &DateTime<Tz>) -> OverviewCounts {
    let today = now.date_naive();
    let tz = now.timezone();

    let mut counts = OverviewCounts::default();
    for issue in issues {
        if issue.is_urgent() {
            counts.urgent += 1;
        }
        match issue.status {
            Status::Pending => counts.pending += 1,
            Status::InProgress => counts.in_progress += 1,
            Status::Resolved => {
                if issue
                    .resolved_at
                    .is_some_and(|at| local_date(&at, &tz) == today)
                {
                    counts.resolved_today += 1;
                }
            }
        }
    }
    counts
}

/// Open high-severity issues, newest report first, at most [`PRIORITY_LIMIT`].
///
/// Issues without a report time sort as the oldest.
pub fn priority_issues(issues: &[Issue]) -> Vec<&Issue> {
    let mut urgent: Vec<&Issue> = issues.iter().filter(|i| i.is_urgent()).collect();
    sort_newest_first(&mut urgent);
    urgent.truncate(PRIORITY_LIMIT);
    urgent
}

/// The `limit` most recently reported issues.
pub fn recent_activity(issues: &[Issue], limit: usize) -> Vec<&Issue> {
    let mut all: Vec<&Issue> = issues.iter().collect();
    sort_newest_first(&mut all);
    all.truncate(limit);
    all
}

fn sort_newest_first(issues: &mut [&Issue]) {
    // `None < Some(_)`, so a descending sort puts unknown times last.
    issues.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));
}

// ---------------------------------------------------------------------------
// Status totals and rates
// ---------------------------------------------------------------------------

/// Per-status totals for the analytics cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusTotals {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

pub fn status_totals(issues: &[Issue]) -> StatusTotals {
    issues.iter().fold(
        StatusTotals {
            total: issues.len(),
            ..Default::default()
        },
        |mut acc, issue| {
            match issue.status {
                Status::Pending => acc.pending += 1,
                Status::InProgress => acc.in_progress += 1,
                Status::Resolved => acc.resolved += 1,
            }
            acc
        },
    )
}

/// Resolved share of all issues as a whole percentage; 0 for an empty set.
pub fn resolution_rate(issues: &[Issue]) -> u32 {
    let totals = status_totals(issues);
    if totals.total == 0 {
        return 0;
    }
    (totals.resolved as f64 / totals.total as f64 * 100.0).round() as u32
}

/// Mean hours from report to resolution over resolved issues with both
/// timestamps; 0 when there are none.
pub fn average_response_hours(issues: &[Issue]) -> i64 {
    let hours: Vec<f64> = issues
        .iter()
        .filter(|i| i.status == Status::Resolved)
        .filter_map(Issue::resolution_hours)
        .collect();
    mean_rounded(&hours)
}

fn mean_rounded(values: &[f64]) -> i64 {
    if values.is_empty() {
        return 0;
    }
    (values.iter().sum::<f64>() / values.len() as f64).round() as i64
}

// ---------------------------------------------------------------------------
// Chart series
// ---------------------------------------------------------------------------

/// One slice of the category chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

/// Group-count by category in canonical order; empty categories are omitted.
pub fn category_counts(issues: &[Issue]) -> Vec<CategoryCount> {
    Category::ALL
        .iter()
        .map(|&category| CategoryCount {
            category,
            count: issues.iter().filter(|i| i.category == category).count(),
        })
        .filter(|c| c.count > 0)
        .collect()
}

/// Bars of the severity chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

pub fn severity_counts(issues: &[Issue]) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    for issue in issues {
        match issue.severity {
            Severity::Low => counts.low += 1,
            Severity::Medium => counts.medium += 1,
            Severity::High => counts.high += 1,
        }
    }
    counts
}

/// Issues reported on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Per-day report counts for the trailing `days` calendar days ending today.
///
/// Every day in the window gets a bucket, including empty ones.
pub fn timeline<Tz: TimeZone>(issues: &[Issue], days: u32, now: &DateTime<Tz>) -> Vec<DayCount> {
    let window = trailing_days(now, days);
    let tz = now.timezone();

    let mut buckets: Vec<DayCount> = window
        .iter()
        .map(|&date| DayCount { date, count: 0 })
        .collect();

    for reported in issues.iter().filter_map(|i| i.reported_at) {
        if let Some(idx) = bucket_index(&window, local_date(&reported, &tz)) {
            buckets[idx].count += 1;
        }
    }
    buckets
}

/// Average resolution time (hours) of issues resolved on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayAverage {
    pub date: NaiveDate,
    pub hours: i64,
}

/// Per-day average resolution hours over the trailing
/// [`RESPONSE_TIME_WINDOW_DAYS`], keyed by resolution date. Days without
/// resolutions report 0.
pub fn response_time_series<Tz: TimeZone>(issues: &[Issue], now: &DateTime<Tz>) -> Vec<DayAverage> {
    let window = trailing_days(now, RESPONSE_TIME_WINDOW_DAYS);
    let tz = now.timezone();

    let mut samples: Vec<Vec<f64>> = vec![Vec::new(); window.len()];
    for issue in issues.iter().filter(|i| i.status == Status::Resolved) {
        let (Some(resolved), Some(hours)) = (issue.resolved_at, issue.resolution_hours()) else {
            continue;
        };
        if let Some(idx) = bucket_index(&window, local_date(&resolved, &tz)) {
            samples[idx].push(hours);
        }
    }

    window
        .into_iter()
        .zip(samples)
        .map(|(date, hours)| DayAverage {
            date,
            hours: mean_rounded(&hours),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn local_date<Tz: TimeZone>(at: &Timestamp, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// The `days` calendar dates ending with today, oldest first.
fn trailing_days<Tz: TimeZone>(now: &DateTime<Tz>, days: u32) -> Vec<NaiveDate> {
    let today = now.date_naive();
    (0..i64::from(days))
        .rev()
        .map(|back| today - Duration::days(back))
        .collect()
}

fn bucket_index(window: &[NaiveDate], date: NaiveDate) -> Option<usize> {
    let first = *window.first()?;
    let offset = (date - first).num_days();
    usize::try_from(offset).ok().filter(|&i| i < window.len())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
