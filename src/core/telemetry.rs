use crate::core::schema::SchemaNode;
use crate::core::signature::Signature;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// One captured call, as handed to an [`ExampleSink`].
#[derive(Debug, Clone)]
pub struct CapturePayload {
    pub capture_id: Uuid,
    pub signature: Arc<Signature>,
    pub input: Value,
    pub output: Value,
    pub timestamp: DateTime<Utc>,
    pub trace: TraceIds,
}

impl CapturePayload {
    pub fn signature_hash(&self) -> &str {
        self.signature.signature_hash()
    }

    pub fn scope_name(&self) -> &str {
        self.signature.scope_name()
    }

    pub fn input_schema(&self) -> &SchemaNode {
        self.signature.input_schema()
    }

    pub fn output_schema(&self) -> &SchemaNode {
        self.signature.output_schema()
    }

    pub fn description(&self) -> Option<&str> {
        self.signature.description()
    }
}

#[derive(Serialize)]
struct WirePayload<'a> {
    signature_hash: &'a str,
    function_name: &'a str,
    input_schema: &'a SchemaNode,
    output_schema: &'a SchemaNode,
    description: Option<&'a str>,
    input: &'a Value,
    output: &'a Value,
    timestamp: &'a DateTime<Utc>,
    otel_trace_id: Option<&'a str>,
    otel_span_id: Option<&'a str>,
    parent_span_id: Option<&'a str>,
}

impl Serialize for CapturePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WirePayload {
            signature_hash: self.signature_hash(),
            function_name: self.scope_name(),
            input_schema: self.input_schema(),
            output_schema: self.output_schema(),
            description: self.description(),
            input: &self.input,
            output: &self.output,
            timestamp: &self.timestamp,
            otel_trace_id: self.trace.trace_id.as_deref(),
            otel_span_id: self.trace.span_id.as_deref(),
            parent_span_id: self.trace.parent_span_id.as_deref(),
        }
        .serialize(serializer)
    }
}

/// Destination for captured calls.
///
/// `capture` must not panic and reports whether delivery succeeded. It is
/// called on the caller's thread, so slow sinks should hand off to a queue
/// (see [`QueuedSink`](crate::core::delivery::QueuedSink)).
pub trait ExampleSink: Send + Sync {
    fn capture(&self, payload: CapturePayload) -> bool;
}

/// Simple in-memory collector for captures.
#[derive(Default)]
pub struct MemorySink {
    captures: Mutex<Vec<CapturePayload>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captures(&self) -> Vec<CapturePayload> {
        self.captures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.captures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.captures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ExampleSink for MemorySink {
    fn capture(&self, payload: CapturePayload) -> bool {
        self.captures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload);
        true
    }
}

/// Discards every capture.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ExampleSink for NoopSink {
    fn capture(&self, _payload: CapturePayload) -> bool {
        true
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F> ExampleSink for FnSink<F>
where
    F: Fn(CapturePayload) -> bool + Send + Sync,
{
    fn capture(&self, payload: CapturePayload) -> bool {
        (self.0)(payload)
    }
}

/// Correlation identifiers of the current call, as lowercase hex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraceIds {
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub parent_span_id: Option<String>,
}

impl TraceIds {
    pub fn none() -> Self {
        Self::default()
    }

    /// Formats raw ids: 32 hex digits for the trace, 16 for spans. Zero ids
    /// are invalid and come out as `None`.
    pub fn from_raw(trace_id: u128, span_id: u64, parent_span_id: Option<u64>) -> Self {
        if trace_id == 0 || span_id == 0 {
            return Self::none();
        }
        Self {
            trace_id: Some(format!("{:032x}", trace_id)),
            span_id: Some(format!("{:016x}", span_id)),
            parent_span_id: parent_span_id
                .filter(|id| *id != 0)
                .map(|id| format!("{:016x}", id)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trace_id.is_none() && self.span_id.is_none() && self.parent_span_id.is_none()
    }
}

/// Read-only lookup of the ambient tracing context.
///
/// No active context is a normal outcome and yields [`TraceIds::none`].
pub trait TraceContext: Send + Sync {
    fn current(&self) -> TraceIds;
}

/// A context that never has an active span.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTraceContext;

impl TraceContext for NoTraceContext {
    fn current(&self) -> TraceIds {
        TraceIds::none()
    }
}

/// Always reports the same identifiers.
#[derive(Debug, Clone)]
pub struct StaticTraceContext(pub TraceIds);

impl TraceContext for StaticTraceContext {
    fn current(&self) -> TraceIds {
        self.0.clone()
    }
}

/// Adapts a closure into a trace context.
pub struct FnTraceContext<F>(pub F);

impl<F> TraceContext for FnTraceContext<F>
where
    F: Fn() -> TraceIds + Send + Sync,
{
    fn current(&self) -> TraceIds {
        (self.0)()
    }
}
