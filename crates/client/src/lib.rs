//! Client side of the campus reporter.
//!
//! Talks to the classification service, the issue API and the live
//! snapshot WebSocket, exposing each through the ports defined in
//! `campus-core` so the submission flow and the dashboard can run against
//! a remote server.

pub mod api;
pub mod classify;
pub mod config;
pub mod live;
pub mod reconnect;

pub use api::{ApiClientError, IssueApi};
pub use classify::ClassificationClient;
pub use config::ClientConfig;
pub use live::{LiveClient, LiveFeed, LiveStatus};
pub use reconnect::{Backoff, ReconnectConfig};
