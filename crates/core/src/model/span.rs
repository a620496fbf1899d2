use serde::{Deserialize, Serialize};

use crate::time::DayBucket;

/// One timed operation within a distributed trace. Timestamps and durations
/// are microseconds since the UNIX epoch, matching the upstream collectors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    pub trace_id: String,
    pub span_id: String,
    pub parent_id: Option<String>,
    pub timestamp: i64,
    pub duration: i64,
    pub kind: SpanKind,
    pub local_service: Option<String>,
    pub remote_service: Option<String>,
    pub error: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpanKind {
    #[default]
    Unset,
    Client,
    Server,
    Producer,
    Consumer,
}

impl SpanKind {
    /// True for the side that initiates a call.
    pub fn is_caller(self) -> bool {
        matches!(self, SpanKind::Client | SpanKind::Producer)
    }

    /// True for the side that receives a call.
    pub fn is_callee(self) -> bool {
        matches!(self, SpanKind::Server | SpanKind::Consumer)
    }
}

impl Span {
    pub fn day_bucket(&self) -> DayBucket {
        DayBucket::from_micros(self.timestamp)
    }
}
