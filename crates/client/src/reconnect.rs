//! Backoff between attempts to reach the live snapshot socket.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::live::{LiveClient, LiveConnection};

/// Tunable parameters for the backoff strategy.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Wait after the first failed attempt.
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Growth factor applied after every further failure.
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Backoff state carried across connections of one feed.
///
/// A connection that delivers at least one snapshot counts as healthy and
/// resets the state; a server that accepts and immediately drops the socket
/// is retried with growing delays like an unreachable one.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: ReconnectConfig,
    upcoming: Duration,
}

impl Backoff {
    pub fn new(config: ReconnectConfig) -> Self {
        let upcoming = config.initial_delay;
        Self { config, upcoming }
    }

    /// The delay to wait now; later calls return longer delays, up to
    /// `max_delay`.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.upcoming.min(self.config.max_delay);
        let grown_ms = (delay.as_millis() as f64 * self.config.multiplier) as u64;
        self.upcoming = Duration::from_millis(grown_ms).min(self.config.max_delay);
        delay
    }

    pub fn reset(&mut self) {
        self.upcoming = self.config.initial_delay;
    }

    /// Sleep for the next delay. Returns `false` if `cancel` fired first.
    pub async fn wait(&mut self, cancel: &CancellationToken) -> bool {
        let delay = self.next_delay();
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}

/// Connect to the feed, sleeping through `backoff` between failures.
///
/// The first attempt is made immediately. Returns `None` if `cancel` fires
/// before a connection succeeds.
pub async fn connect_with_backoff(
    client: &LiveClient,
    backoff: &mut Backoff,
    cancel: &CancellationToken,
) -> Option<LiveConnection> {
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let result = tokio::select! {
            _ = cancel.cancelled() => return None,
            result = client.connect() => result,
        };

        match result {
            Ok(connection) => {
                if attempt > 1 {
                    tracing::info!(url = client.ws_url(), attempt, "Live feed reachable again");
                }
                return Some(connection);
            }
            Err(e) => {
                tracing::warn!(url = client.ws_url(), attempt, error = %e, "Live feed connect failed");
            }
        }

        if !backoff.wait(cancel).await {
            return None;
        }
    }
}
