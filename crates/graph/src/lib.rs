pub mod aggregate;
pub mod job;

use spanlink_core::Result;
use spanlink_core::config::JobConfig;
use spanlink_core::model::span::Span;
use spanlink_store::SpanStore;

pub use aggregate::{aggregate, links_for_day};
pub use job::{DependencyJob, JobReport, JobState};

/// Rebuild the dependency links for every day a span batch touches.
///
/// The in-memory aggregation pass is used purely for scheduling: it finds
/// the touched day buckets, then one job per day re-reads that day's spans
/// from the store and replaces its link partition. Days run sequentially in
/// bucket order to keep backend load bounded.
pub fn rebuild_touched_days<S: SpanStore>(
    store: &S,
    spans: &[Span],
    keyspace: &str,
    contact_points: &[String],
) -> Result<Vec<JobReport>> {
    let days = aggregate(spans).into_keys().collect::<Vec<_>>();

    let mut reports = Vec::with_capacity(days.len());
    for day in days {
        let config = JobConfig::new(keyspace, contact_points.to_vec(), day)?;
        let mut job = DependencyJob::new(config);
        reports.push(job.run(store)?);
    }
    Ok(reports)
}
