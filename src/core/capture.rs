use crate::core::signature::Signature;
use crate::core::telemetry::{CapturePayload, ExampleSink, NoTraceContext, TraceContext, TraceIds};
use chrono::Utc;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use uuid::Uuid;

/// Turns completed calls into [`CapturePayload`]s and forwards them to a
/// sink.
///
/// Emitting is best-effort: sink failures, including panics inside the
/// sink or the trace lookup, are logged and reported as `false`.
#[derive(Clone)]
pub struct CaptureAdapter {
    sink: Arc<dyn ExampleSink>,
    trace: Arc<dyn TraceContext>,
}

impl CaptureAdapter {
    pub fn new(sink: Arc<dyn ExampleSink>) -> Self {
        Self {
            sink,
            trace: Arc::new(NoTraceContext),
        }
    }

    pub fn with_trace(mut self, trace: Arc<dyn TraceContext>) -> Self {
        self.trace = trace;
        self
    }

    pub fn sink(&self) -> &Arc<dyn ExampleSink> {
        &self.sink
    }

    fn current_trace(&self) -> TraceIds {
        catch_unwind(AssertUnwindSafe(|| self.trace.current())).unwrap_or_else(|_| {
            log::warn!("Trace context lookup panicked, capturing without correlation ids");
            TraceIds::none()
        })
    }

    /// Packages one successful call and hands it to the sink.
    pub fn emit(&self, signature: &Arc<Signature>, input: Value, output: Value) -> bool {
        let payload = CapturePayload {
            capture_id: Uuid::new_v4(),
            signature: Arc::clone(signature),
            input,
            output,
            timestamp: Utc::now(),
            trace: self.current_trace(),
        };

        let delivered = match catch_unwind(AssertUnwindSafe(|| self.sink.capture(payload))) {
            Ok(delivered) => delivered,
            Err(_) => {
                log::warn!("Example sink panicked while capturing {}", signature.scope_name());
                false
            }
        };

        if !delivered {
            log::debug!("Failed to capture example for {}", signature.scope_name());
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::function::FunctionDecl;
    use crate::core::scope::ScopePath;
    use crate::core::telemetry::{FnSink, FnTraceContext, MemorySink, StaticTraceContext};
    use serde_json::json;

    fn signature() -> Arc<Signature> {
        let decl = FunctionDecl::new(ScopePath::new("app"), "double")
            .param::<i64>("x")
            .returns::<i64>();
        Arc::new(Signature::from_decl(&decl))
    }

    #[test]
    fn test_emit_builds_payload() {
        let sink = Arc::new(MemorySink::new());
        let trace = TraceIds::from_raw(1, 2, Some(3));
        let adapter = CaptureAdapter::new(sink.clone())
            .with_trace(Arc::new(StaticTraceContext(trace.clone())));
        let signature = signature();

        assert!(adapter.emit(&signature, json!({"x": 2}), json!(4)));

        let captures = sink.captures();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].signature_hash(), signature.signature_hash());
        assert_eq!(captures[0].scope_name(), "app.double");
        assert_eq!(captures[0].input, json!({"x": 2}));
        assert_eq!(captures[0].output, json!(4));
        assert_eq!(captures[0].trace, trace);
    }

    #[test]
    fn test_emit_without_trace_context_omits_ids() {
        let sink = Arc::new(MemorySink::new());
        let adapter = CaptureAdapter::new(sink.clone());
        adapter.emit(&signature(), json!({}), json!(null));
        assert!(sink.captures()[0].trace.is_empty());
    }

    #[test]
    fn test_failing_sink_reports_false() {
        let adapter = CaptureAdapter::new(Arc::new(FnSink(|_payload: CapturePayload| false)));
        assert!(!adapter.emit(&signature(), json!({}), json!(1)));
    }

    #[test]
    fn test_panicking_sink_and_trace_are_absorbed() {
        let adapter = CaptureAdapter::new(Arc::new(FnSink(|_payload: CapturePayload| -> bool {
            panic!("sink exploded")
        })))
        .with_trace(Arc::new(FnTraceContext(|| -> TraceIds { panic!("no context") })));
        assert!(!adapter.emit(&signature(), json!({}), json!(1)));
    }
}
