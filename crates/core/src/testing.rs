//! Fixtures shared by unit tests.

use chrono::{TimeZone, Utc};

use crate::issue::{Category, Issue, Severity, Status};
use crate::types::Timestamp;

pub fn issue(id: &str, status: Status) -> Issue {
    Issue {
        id: id.to_string(),
        description: format!("Issue {id}"),
        category: Category::Other,
        severity: Severity::Medium,
        status,
        location: None,
        photo_urls: Vec::new(),
        ai_classification: None,
        reported_at: None,
        updated_at: None,
        resolved_at: None,
        response_time_ms: None,
        reporter_id: None,
    }
}

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> Timestamp {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("valid test timestamp")
}
