use chrono::{TimeZone, Utc};
use spanlink_core::model::span::{Span, SpanKind};
use tracing_subscriber::EnvFilter;

/// Explicit, test-scoped logging setup. Call from the top of a test that
/// needs output; `try_init` keeps concurrent tests from fighting over it.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_test_writer()
        .compact()
        .try_init();
}

/// Midnight UTC 2026-02-01 in epoch microseconds.
pub fn base_micros() -> i64 {
    Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0)
        .unwrap()
        .timestamp_micros()
}

pub fn span(trace_id: &str, span_id: &str, parent_id: Option<&str>, timestamp: i64) -> Span {
    Span {
        trace_id: trace_id.to_string(),
        span_id: span_id.to_string(),
        parent_id: parent_id.map(str::to_string),
        timestamp,
        duration: 1_000,
        kind: SpanKind::Unset,
        local_service: None,
        remote_service: None,
        error: false,
    }
}

/// `n` root client spans from one service, all in the same day bucket, each
/// in its own trace. Handy for chunking tests where only count and order
/// matter.
pub fn uniform_batch(n: usize) -> Vec<Span> {
    let base = base_micros();
    (0..n)
        .map(|i| {
            let trace_id = uuid::Uuid::new_v4().simple().to_string();
            Span {
                kind: SpanKind::Client,
                local_service: Some("api".to_string()),
                remote_service: Some("backend".to_string()),
                timestamp: base + i as i64,
                ..span(&trace_id, &format!("{i:016x}"), None, 0)
            }
        })
        .collect()
}

/// One trace: frontend calls api, api calls db. Four spans (client/server
/// pair per hop), the db server span carrying an error.
pub fn call_chain(trace_id: &str, base: i64) -> Vec<Span> {
    vec![
        Span {
            kind: SpanKind::Client,
            local_service: Some("frontend".to_string()),
            remote_service: Some("api".to_string()),
            ..span(trace_id, "a1", None, base)
        },
        Span {
            kind: SpanKind::Server,
            local_service: Some("api".to_string()),
            remote_service: Some("frontend".to_string()),
            ..span(trace_id, "b1", Some("a1"), base + 10)
        },
        Span {
            kind: SpanKind::Client,
            local_service: Some("api".to_string()),
            remote_service: Some("db".to_string()),
            ..span(trace_id, "b2", Some("b1"), base + 20)
        },
        Span {
            kind: SpanKind::Server,
            local_service: Some("db".to_string()),
            error: true,
            ..span(trace_id, "c1", Some("b2"), base + 30)
        },
    ]
}

/// Two single-hop traces, one per UTC day, separated by one day exactly.
pub fn cross_day_traces() -> Vec<Span> {
    let day_one = base_micros();
    let day_two = day_one + spanlink_core::time::MICROS_PER_DAY;
    let mut spans = two_service_hop("trace-day1", day_one, "web", "auth");
    spans.extend(two_service_hop("trace-day2", day_two, "web", "billing"));
    spans
}

/// Minimal client/server hop between two named services.
pub fn two_service_hop(trace_id: &str, base: i64, caller: &str, callee: &str) -> Vec<Span> {
    vec![
        Span {
            kind: SpanKind::Client,
            local_service: Some(caller.to_string()),
            remote_service: Some(callee.to_string()),
            ..span(trace_id, "p1", None, base)
        },
        Span {
            kind: SpanKind::Server,
            local_service: Some(callee.to_string()),
            remote_service: Some(caller.to_string()),
            ..span(trace_id, "c1", Some("p1"), base + 5)
        },
    ]
}
