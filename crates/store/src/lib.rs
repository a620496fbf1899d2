pub mod memory;

use spanlink_core::Result;
use spanlink_core::model::link::DependencyLink;
use spanlink_core::model::span::Span;
use spanlink_core::time::DayBucket;

pub use memory::MemoryStore;

/// The narrow contract the ingestion path and the dependency job consume.
/// Concrete drivers (Cassandra, Scylla, ...) live outside this workspace;
/// [`MemoryStore`] is the in-process reference implementation.
///
/// Writes are acknowledged asynchronously: `write_spans` returns once the
/// batch is submitted, not once it is readable. Callers that need
/// read-your-writes must wait until every host's `in_flight` count reaches
/// zero (the drain barrier in `spanlink-ingest` does exactly this).
pub trait SpanStore {
    /// Submit a span batch. Upserts by `(trace_id, span_id)`, so
    /// re-submitting after a partial failure is safe.
    fn write_spans(&self, spans: &[Span]) -> Result<()>;

    /// Hosts currently holding connections.
    fn connected_hosts(&self) -> Vec<String>;

    /// Requests submitted to `host` and not yet acknowledged.
    fn in_flight(&self, host: &str) -> usize;

    /// All spans stored under one day partition.
    fn read_spans(&self, day: DayBucket) -> Result<Vec<Span>>;

    /// Replace the stored link set for `day` wholesale. Never merges.
    fn write_links(&self, day: DayBucket, links: &[DependencyLink]) -> Result<()>;

    fn keyspace_exists(&self, name: &str) -> bool;
}
