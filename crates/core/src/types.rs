/// Issue ids are opaque strings assigned by the document store.
pub type IssueId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
