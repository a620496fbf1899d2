use std::time::Duration;

use spanlink_core::config::IngestSettings;
use spanlink_core::error::{Result, SpanlinkError};
use spanlink_store::SpanStore;
use tokio::time::Instant;
use tracing::trace;

/// Blocking barrier over the store's per-host in-flight counts.
///
/// The store acknowledges writes asynchronously, so a read issued right
/// after a write can miss it. `drain` closes that gap: it returns only once
/// a full scan over every connected host observed zero in-flight requests.
#[derive(Debug, Clone)]
pub struct BackpressureMonitor {
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl Default for BackpressureMonitor {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            timeout: None,
        }
    }
}

impl BackpressureMonitor {
    pub fn new(poll_interval: Duration, timeout: Option<Duration>) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }

    pub fn from_settings(settings: &IngestSettings) -> Self {
        Self::new(settings.poll_interval, settings.drain_timeout)
    }

    /// Wait until every connected host reports zero in-flight requests.
    ///
    /// A scan that finds one busy host restarts from the first host after
    /// sleeping one poll interval: counts move concurrently and no snapshot
    /// isolation is assumed, so a partial clean scan proves nothing. With no
    /// timeout configured this can wait forever, exactly like the source
    /// system; set one to get a typed `DrainTimeout` instead.
    pub async fn drain<S: SpanStore>(&self, store: &S) -> Result<()> {
        let started = Instant::now();
        'scan: loop {
            for host in store.connected_hosts() {
                let pending = store.in_flight(&host);
                if pending > 0 {
                    if let Some(limit) = self.timeout {
                        if started.elapsed() >= limit {
                            return Err(SpanlinkError::DrainTimeout(limit));
                        }
                    }
                    trace!(host = %host, pending, "host busy, restarting drain scan");
                    tokio::time::sleep(self.poll_interval).await;
                    continue 'scan;
                }
            }
            return Ok(());
        }
    }
}
