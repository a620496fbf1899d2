use serde::Serialize;
use spanlink_core::config::JobConfig;
use spanlink_core::error::{Result, SpanlinkError};
use spanlink_core::time::DayBucket;
use spanlink_store::SpanStore;
use tracing::info;

use crate::aggregate::links_for_day;

/// Batch job that rebuilds one day's dependency links from stored spans.
///
/// Each instance runs exactly once: Pending -> Running -> Done or Failed.
/// Rerunning a day means constructing a new job with the same config. The
/// stored link partition is replaced wholesale, never merged, so a rerun
/// after partial or duplicate ingestion converges instead of
/// double-counting.
pub struct DependencyJob {
    config: JobConfig,
    state: JobState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub day: DayBucket,
    pub spans_read: usize,
    pub links_written: usize,
}

impl DependencyJob {
    pub fn new(config: JobConfig) -> Self {
        Self {
            config,
            state: JobState::Pending,
        }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Read the day's spans, recompute its links, replace the stored set.
    ///
    /// Fails fast if the keyspace is absent. A failure in either phase
    /// leaves the job Failed and the stored links in whatever state the
    /// last successful write left them; there is no rollback, the remedy
    /// is a fresh job for the same day.
    pub fn run<S: SpanStore>(&mut self, store: &S) -> Result<JobReport> {
        if self.state != JobState::Pending {
            return Err(SpanlinkError::InvalidArgument(format!(
                "job for day {} already ran (state {:?})",
                self.config.day, self.state
            )));
        }

        self.state = JobState::Running;
        match self.execute(store) {
            Ok(report) => {
                self.state = JobState::Done;
                Ok(report)
            }
            Err(e) => {
                self.state = JobState::Failed;
                Err(e)
            }
        }
    }

    fn execute<S: SpanStore>(&self, store: &S) -> Result<JobReport> {
        let day = self.config.day;
        if !store.keyspace_exists(&self.config.keyspace) {
            return Err(SpanlinkError::MissingKeyspace(self.config.keyspace.clone()));
        }

        info!(%day, keyspace = %self.config.keyspace, "rebuilding dependency links");

        let spans = store
            .read_spans(day)
            .map_err(|e| SpanlinkError::Read(format!("spans for day {day}: {e}")))?;

        let links = links_for_day(&spans, day);

        store
            .write_links(day, &links)
            .map_err(|e| SpanlinkError::Write(format!("links for day {day}: {e}")))?;

        info!(
            %day,
            spans = spans.len(),
            links = links.len(),
            "dependency links replaced"
        );

        Ok(JobReport {
            day,
            spans_read: spans.len(),
            links_written: links.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use spanlink_store::MemoryStore;
    use testkit::{base_micros, call_chain};

    use super::*;

    fn job_config(store_day: DayBucket) -> JobConfig {
        JobConfig::new("traces", vec!["db1:9042".to_string()], store_day).unwrap()
    }

    async fn seeded_store() -> (MemoryStore, DayBucket) {
        let store = MemoryStore::single_node("traces");
        let spans = call_chain("t1", base_micros());
        let day = spans[0].day_bucket();
        store.write_spans(&spans).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        (store, day)
    }

    #[tokio::test]
    async fn pending_job_runs_to_done() {
        let (store, day) = seeded_store().await;
        let mut job = DependencyJob::new(job_config(day));
        assert_eq!(job.state(), JobState::Pending);

        let report = job.run(&store).unwrap();
        assert_eq!(job.state(), JobState::Done);
        assert_eq!(report.day, day);
        assert_eq!(report.spans_read, 4);
        assert_eq!(report.links_written, 2);
        assert_eq!(store.links(day).len(), 2);
    }

    #[tokio::test]
    async fn job_instance_runs_exactly_once() {
        let (store, day) = seeded_store().await;
        let mut job = DependencyJob::new(job_config(day));
        job.run(&store).unwrap();

        let err = job.run(&store).unwrap_err();
        assert!(matches!(err, SpanlinkError::InvalidArgument(_)));
        assert_eq!(job.state(), JobState::Done);
    }

    #[tokio::test]
    async fn missing_keyspace_fails_fast() {
        let (store, day) = seeded_store().await;
        let mut job = DependencyJob::new(
            JobConfig::new("absent", vec!["db1:9042".to_string()], day).unwrap(),
        );

        let err = job.run(&store).unwrap_err();
        assert!(matches!(err, SpanlinkError::MissingKeyspace(ref k) if k == "absent"));
        assert_eq!(job.state(), JobState::Failed);
        assert!(store.links(day).is_empty());
    }

    #[tokio::test]
    async fn read_failure_lands_in_failed_state() {
        let (store, day) = seeded_store().await;
        store.fail_reads();

        let mut job = DependencyJob::new(job_config(day));
        let err = job.run(&store).unwrap_err();
        assert!(matches!(err, SpanlinkError::Read(_)));
        assert_eq!(job.state(), JobState::Failed);
    }

    #[tokio::test]
    async fn write_failure_is_distinguishable_from_read_failure() {
        let (store, day) = seeded_store().await;
        store.fail_link_writes();

        let mut job = DependencyJob::new(job_config(day));
        let err = job.run(&store).unwrap_err();
        assert!(matches!(err, SpanlinkError::Write(_)));
        assert_eq!(job.state(), JobState::Failed);
    }

    #[tokio::test]
    async fn empty_day_replaces_links_with_nothing() {
        let (store, day) = seeded_store().await;
        let stale = spanlink_core::model::link::DependencyLink {
            parent: "old".to_string(),
            child: "stale".to_string(),
            call_count: 9,
            error_count: 9,
        };
        let empty_day = DayBucket::new(day.index() + 30);
        store.write_links(empty_day, &[stale]).unwrap();

        let mut job = DependencyJob::new(job_config(empty_day));
        let report = job.run(&store).unwrap();

        assert_eq!(report.spans_read, 0);
        assert_eq!(report.links_written, 0);
        assert!(store.links(empty_day).is_empty());
    }
}
