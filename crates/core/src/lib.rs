//! Campus issue reporter domain library.
//!
//! Holds everything that does not depend on a transport or a database:
//!
//! - [`issue`] and [`classification`]: the issue record, its enumerations
//!   and the keyword classifier.
//! - [`filter`] and [`stats`]: filtering and aggregation over an issue set.
//! - [`session`]: the client-side admin gate.
//! - [`mutation`], [`submission`]: the writes (status updates and new
//!   reports) and the citizen submission flow.
//! - [`store`] and [`cache`]: ports to the remote store and the revisioned
//!   snapshot cache.
//! - [`dashboard`] and [`view`]: the admin controller and its view-models.

pub mod cache;
pub mod classification;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod issue;
pub mod mutation;
pub mod session;
pub mod stats;
pub mod store;
pub mod submission;
pub mod types;
pub mod view;

#[cfg(test)]
mod testing;

pub use error::CoreError;
pub use issue::{Category, Issue, Location, NewIssue, Severity, Status};
pub use store::{IssueStore, PhotoStore, Snapshot, SnapshotSource, StoreError};
