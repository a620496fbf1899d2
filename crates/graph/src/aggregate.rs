use std::collections::{BTreeMap, HashMap, HashSet};

use spanlink_core::model::link::{DependencyLink, UNKNOWN_SERVICE};
use spanlink_core::model::span::Span;
use spanlink_core::time::DayBucket;

/// Reconstruct caller->callee edges from a span batch and group them by UTC
/// day bucket.
///
/// Within each trace, every span whose `parent_id` resolves to another span
/// of the same trace yields one directed edge; spans with no resolvable
/// parent are roots and yield none. Service resolution follows span kind:
/// the CLIENT/PRODUCER side of a hop names the caller and the
/// SERVER/CONSUMER side the callee, with a CLIENT/PRODUCER child whose
/// callee side was never captured falling back to its remote service
/// annotation. Missing names degrade to the `unknown` placeholder.
/// Self-edges are discarded. An edge is assigned to the day bucket of the
/// child span (the span whose parent reference created it), and that span's
/// error flag feeds the error count. Edges sharing (day, caller, callee)
/// merge by summing counts.
///
/// Output is fully deterministic: BTree maps at both levels, so the same
/// input multiset always produces the identical link sequence regardless of
/// input order. Purely in-memory, no store access.
pub fn aggregate(spans: &[Span]) -> BTreeMap<DayBucket, Vec<DependencyLink>> {
    let mut counts: BTreeMap<DayBucket, BTreeMap<(String, String), (u64, u64)>> = BTreeMap::new();

    let mut traces: HashMap<&str, Vec<&Span>> = HashMap::new();
    for span in spans {
        traces.entry(span.trace_id.as_str()).or_default().push(span);
    }

    for trace in traces.values() {
        let by_id: HashMap<&str, &Span> = trace
            .iter()
            .map(|span| (span.span_id.as_str(), *span))
            .collect();

        // Span ids whose hop was also captured on the callee side; the
        // callee span's own pair produces the edge for that hop.
        let captured_callees: HashSet<&str> = trace
            .iter()
            .filter(|span| span.kind.is_callee())
            .filter_map(|span| span.parent_id.as_deref())
            .collect();

        for child in trace {
            let Some(parent) = child
                .parent_id
                .as_deref()
                .and_then(|id| by_id.get(id))
                .filter(|parent| parent.span_id != child.span_id)
            else {
                continue; // root, or parent reference outside this trace
            };

            let (caller, callee) = if child.kind.is_caller() {
                // The child is the CLIENT/PRODUCER side of its own hop.
                // When the callee side exists as a span, that pair yields
                // the edge; otherwise the remote annotation is all that
                // names the callee.
                if captured_callees.contains(child.span_id.as_str()) {
                    continue;
                }
                (leaf_caller_service(parent, child), remote_service(child))
            } else {
                (caller_service(parent), callee_service(parent, child))
            };
            if caller == callee {
                continue; // self-edges carry no topology
            }

            let slot = counts
                .entry(child.day_bucket())
                .or_default()
                .entry((caller, callee))
                .or_insert((0, 0));
            slot.0 += 1;
            if child.error {
                slot.1 += 1;
            }
        }
    }

    counts
        .into_iter()
        .map(|(day, merged)| {
            let links = merged
                .into_iter()
                .map(|((parent, child), (call_count, error_count))| DependencyLink {
                    parent,
                    child,
                    call_count,
                    error_count,
                })
                .collect();
            (day, links)
        })
        .collect()
}

/// Link set for a single day, ignoring spans (and edges) bucketed elsewhere.
pub fn links_for_day(spans: &[Span], day: DayBucket) -> Vec<DependencyLink> {
    aggregate(spans).remove(&day).unwrap_or_default()
}

// Parent is the caller side of the pair; its local service names the
// caller. Missing instrumentation degrades to the placeholder instead of
// dropping the edge.
fn caller_service(parent: &Span) -> String {
    parent
        .local_service
        .clone()
        .unwrap_or_else(|| UNKNOWN_SERVICE.to_string())
}

// Callee: the SERVER/CONSUMER side's local service. When that side was not
// captured with a name of its own, fall back to whichever remote annotation
// named it, then to the placeholder.
fn callee_service(parent: &Span, child: &Span) -> String {
    child
        .local_service
        .clone()
        .or_else(|| child.remote_service.clone())
        .or_else(|| parent.remote_service.clone())
        .unwrap_or_else(|| UNKNOWN_SERVICE.to_string())
}

// A CLIENT/PRODUCER child is itself the caller side; an unresolved local
// name falls back to the parent's.
fn leaf_caller_service(parent: &Span, child: &Span) -> String {
    child
        .local_service
        .clone()
        .or_else(|| parent.local_service.clone())
        .unwrap_or_else(|| UNKNOWN_SERVICE.to_string())
}

// Callee of a hop whose server side was never captured: only the caller's
// remote annotation can name it.
fn remote_service(child: &Span) -> String {
    child
        .remote_service
        .clone()
        .unwrap_or_else(|| UNKNOWN_SERVICE.to_string())
}
