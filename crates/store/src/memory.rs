use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spanlink_core::error::{Result, SpanlinkError};
use spanlink_core::model::link::DependencyLink;
use spanlink_core::model::span::Span;
use spanlink_core::time::DayBucket;
use tracing::debug;

use crate::SpanStore;

/// In-process store with simulated asynchronous acknowledgment: every span
/// write is applied by a spawned task after `ack_delay`, and counts as
/// in-flight on one host until then. This reproduces the eventually-visible
/// behavior of a real cluster closely enough to exercise the drain barrier.
///
/// Requires a tokio runtime for span writes.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    hosts: Arc<Vec<Host>>,
    next_host: Arc<AtomicUsize>,
    keyspace: String,
    ack_delay: Duration,
}

struct Host {
    name: String,
    in_flight: AtomicUsize,
}

#[derive(Default)]
struct Inner {
    // Keyed by (trace_id, span_id) so duplicate submission upserts.
    spans: BTreeMap<DayBucket, BTreeMap<(String, String), Span>>,
    links: BTreeMap<DayBucket, Vec<DependencyLink>>,
    submitted_batches: Vec<Vec<Span>>,
    writes_before_failure: Option<usize>,
    fail_reads: bool,
    fail_link_writes: bool,
}

impl MemoryStore {
    pub fn new(keyspace: impl Into<String>, hosts: &[&str], ack_delay: Duration) -> Self {
        let hosts = hosts
            .iter()
            .map(|name| Host {
                name: name.to_string(),
                in_flight: AtomicUsize::new(0),
            })
            .collect::<Vec<_>>();

        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            hosts: Arc::new(hosts),
            next_host: Arc::new(AtomicUsize::new(0)),
            keyspace: keyspace.into(),
            ack_delay,
        }
    }

    /// Single-host store with immediate acknowledgment.
    pub fn single_node(keyspace: impl Into<String>) -> Self {
        Self::new(keyspace, &["127.0.0.1:9042"], Duration::ZERO)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }

    /// Stored link set for one day, in stored order.
    pub fn links(&self, day: DayBucket) -> Vec<DependencyLink> {
        self.lock().links.get(&day).cloned().unwrap_or_default()
    }

    /// Sizes of span batches in submission order.
    pub fn write_batch_sizes(&self) -> Vec<usize> {
        self.lock().submitted_batches.iter().map(Vec::len).collect()
    }

    /// Span batches in submission order.
    pub fn submitted_batches(&self) -> Vec<Vec<Span>> {
        self.lock().submitted_batches.clone()
    }

    /// Fail every span write after the first `batches` successful ones.
    pub fn fail_writes_after(&self, batches: usize) {
        self.lock().writes_before_failure = Some(batches);
    }

    /// Make subsequent `read_spans` calls fail.
    pub fn fail_reads(&self) {
        self.lock().fail_reads = true;
    }

    /// Make subsequent `write_links` calls fail.
    pub fn fail_link_writes(&self) {
        self.lock().fail_link_writes = true;
    }

    fn pick_host(&self) -> usize {
        self.next_host.fetch_add(1, Ordering::Relaxed) % self.hosts.len()
    }
}

impl SpanStore for MemoryStore {
    fn write_spans(&self, spans: &[Span]) -> Result<()> {
        {
            let mut inner = self.lock();
            if let Some(remaining) = inner.writes_before_failure {
                if remaining == 0 {
                    return Err(SpanlinkError::Store(
                        "injected span write failure".to_string(),
                    ));
                }
                inner.writes_before_failure = Some(remaining - 1);
            }
            inner.submitted_batches.push(spans.to_vec());
        }

        let host_idx = self.pick_host();
        let host = &self.hosts[host_idx];
        host.in_flight.fetch_add(1, Ordering::SeqCst);
        debug!(host = %host.name, spans = spans.len(), "span batch submitted");

        let batch = spans.to_vec();
        let inner = Arc::clone(&self.inner);
        let hosts = Arc::clone(&self.hosts);
        let ack_delay = self.ack_delay;
        tokio::spawn(async move {
            if !ack_delay.is_zero() {
                tokio::time::sleep(ack_delay).await;
            }
            {
                let mut inner = inner.lock().expect("memory store mutex poisoned");
                for span in batch {
                    inner
                        .spans
                        .entry(span.day_bucket())
                        .or_default()
                        .insert((span.trace_id.clone(), span.span_id.clone()), span);
                }
            }
            hosts[host_idx].in_flight.fetch_sub(1, Ordering::SeqCst);
        });

        Ok(())
    }

    fn connected_hosts(&self) -> Vec<String> {
        self.hosts.iter().map(|h| h.name.clone()).collect()
    }

    fn in_flight(&self, host: &str) -> usize {
        self.hosts
            .iter()
            .find(|h| h.name == host)
            .map(|h| h.in_flight.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    fn read_spans(&self, day: DayBucket) -> Result<Vec<Span>> {
        let inner = self.lock();
        if inner.fail_reads {
            return Err(SpanlinkError::Store(
                "injected span read failure".to_string(),
            ));
        }
        Ok(inner
            .spans
            .get(&day)
            .map(|by_id| by_id.values().cloned().collect())
            .unwrap_or_default())
    }

    fn write_links(&self, day: DayBucket, links: &[DependencyLink]) -> Result<()> {
        let mut inner = self.lock();
        if inner.fail_link_writes {
            return Err(SpanlinkError::Store(
                "injected link write failure".to_string(),
            ));
        }
        inner.links.insert(day, links.to_vec());
        Ok(())
    }

    fn keyspace_exists(&self, name: &str) -> bool {
        name == self.keyspace
    }
}
