pub mod backpressure;
pub mod ingestor;

pub use backpressure::BackpressureMonitor;
pub use ingestor::SpanIngestor;
