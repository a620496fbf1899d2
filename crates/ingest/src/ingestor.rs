use spanlink_core::config::IngestSettings;
use spanlink_core::error::{Result, SpanlinkError};
use spanlink_core::model::span::Span;
use spanlink_store::SpanStore;
use tracing::{debug, info};

use crate::backpressure::BackpressureMonitor;

/// Bulk span ingestion with bounded concurrent load.
///
/// Submitting an arbitrarily large batch in one go can exhaust the backend's
/// request pool, so the batch is split into chunks and each chunk is drained
/// before the next is submitted: at most one chunk's worth of writes is ever
/// outstanding. The final chunk is drained too, so when `ingest` returns the
/// whole batch is visible to subsequent reads.
pub struct SpanIngestor<S> {
    store: S,
    monitor: BackpressureMonitor,
    chunk_size: usize,
}

impl<S: SpanStore> SpanIngestor<S> {
    pub fn new(store: S, settings: &IngestSettings) -> Self {
        Self {
            store,
            monitor: BackpressureMonitor::from_settings(settings),
            chunk_size: settings.chunk_size.max(1),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ingest a span batch chunk by chunk, strictly sequentially.
    ///
    /// Not atomic: a failing chunk aborts the remaining ones and surfaces
    /// the error, while already-acknowledged chunks stay in the store.
    /// Re-ingesting the same batch is safe because span writes upsert by
    /// span identity. No automatic retry.
    pub async fn ingest(&self, spans: &[Span]) -> Result<()> {
        if spans.is_empty() {
            return Ok(());
        }

        let mut acknowledged = 0usize;
        for chunk in spans.chunks(self.chunk_size) {
            self.store.write_spans(chunk).map_err(|e| {
                SpanlinkError::Ingest(format!(
                    "chunk submit failed after {acknowledged} acknowledged spans: {e}"
                ))
            })?;
            self.monitor.drain(&self.store).await?;
            acknowledged += chunk.len();
            debug!(chunk = chunk.len(), acknowledged, "span chunk acknowledged");
        }

        info!(spans = spans.len(), "span batch ingested");
        Ok(())
    }
}
