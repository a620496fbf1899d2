//! End-to-end flow: chunked ingestion gated by the drain barrier, then one
//! dependency job per touched day, verified against the in-memory reference
//! aggregation.

use std::time::Duration;

use anyhow::Result;
use spanlink_core::config::{IngestSettings, JobConfig};
use spanlink_core::model::link::DependencyLink;
use spanlink_core::time::DayBucket;
use spanlink_graph::{DependencyJob, aggregate, rebuild_touched_days};
use spanlink_ingest::SpanIngestor;
use spanlink_store::MemoryStore;
use testkit::{base_micros, call_chain, cross_day_traces, init_test_logging, two_service_hop};

fn contact_points() -> Vec<String> {
    vec!["db1:9042".to_string()]
}

fn settings() -> IngestSettings {
    IngestSettings {
        chunk_size: 3,
        poll_interval: Duration::from_millis(5),
        drain_timeout: Some(Duration::from_secs(5)),
    }
}

fn store() -> MemoryStore {
    MemoryStore::new("traces", &["db1:9042", "db2:9042"], Duration::from_millis(10))
}

#[tokio::test]
async fn ingest_then_rebuild_matches_reference_aggregation() -> Result<()> {
    init_test_logging();
    let store = store();
    let ingestor = SpanIngestor::new(store.clone(), &settings());

    let mut spans = cross_day_traces();
    spans.extend(call_chain("t-chain", base_micros()));
    ingestor.ingest(&spans).await?;

    let reports = rebuild_touched_days(&store, &spans, "traces", &contact_points())?;
    assert_eq!(reports.len(), 2);

    for (day, expected) in aggregate(&spans) {
        assert_eq!(store.links(day), expected, "links for {day}");
    }
    Ok(())
}

#[tokio::test]
async fn rebuilding_twice_is_idempotent() -> Result<()> {
    let store = store();
    let ingestor = SpanIngestor::new(store.clone(), &settings());
    let spans = call_chain("t1", base_micros());
    ingestor.ingest(&spans).await?;

    let day = spans[0].day_bucket();
    let config = JobConfig::new("traces", contact_points(), day)?;

    DependencyJob::new(config.clone()).run(&store)?;
    let first = store.links(day);

    DependencyJob::new(config).run(&store)?;
    assert_eq!(store.links(day), first);
    Ok(())
}

#[tokio::test]
async fn duplicate_ingestion_converges_instead_of_double_counting() -> Result<()> {
    let store = store();
    let ingestor = SpanIngestor::new(store.clone(), &settings());
    let spans = two_service_hop("t1", base_micros(), "web", "auth");

    // Ingest the same batch twice, as a caller retrying a non-atomic
    // ingestion would.
    ingestor.ingest(&spans).await?;
    ingestor.ingest(&spans).await?;

    let day = spans[0].day_bucket();
    rebuild_touched_days(&store, &spans, "traces", &contact_points())?;

    assert_eq!(
        store.links(day),
        vec![DependencyLink {
            parent: "web".to_string(),
            child: "auth".to_string(),
            call_count: 1,
            error_count: 0,
        }]
    );
    Ok(())
}

#[tokio::test]
async fn rebuild_runs_one_job_per_touched_day_in_order() -> Result<()> {
    let store = store();
    let ingestor = SpanIngestor::new(store.clone(), &settings());
    let spans = cross_day_traces();
    ingestor.ingest(&spans).await?;

    let reports = rebuild_touched_days(&store, &spans, "traces", &contact_points())?;

    let days = reports.iter().map(|r| r.day).collect::<Vec<_>>();
    let mut sorted = days.clone();
    sorted.sort();
    assert_eq!(days, sorted);
    assert_eq!(days.len(), 2);
    Ok(())
}

#[tokio::test]
async fn rebuild_surfaces_a_missing_keyspace() {
    let store = store();
    let spans = call_chain("t1", base_micros());

    let err = rebuild_touched_days(&store, &spans, "absent", &contact_points()).unwrap_err();
    assert!(matches!(
        err,
        spanlink_core::SpanlinkError::MissingKeyspace(_)
    ));
}

#[tokio::test]
async fn job_only_sees_spans_stored_under_its_day() -> Result<()> {
    let store = store();
    let ingestor = SpanIngestor::new(store.clone(), &settings());
    let spans = cross_day_traces();
    ingestor.ingest(&spans).await?;

    let day_one = DayBucket::from_micros(base_micros());
    let config = JobConfig::new("traces", contact_points(), day_one)?;
    let report = DependencyJob::new(config).run(&store)?;

    // Only the first day's two spans, not the other trace.
    assert_eq!(report.spans_read, 2);
    assert_eq!(report.links_written, 1);
    Ok(())
}
