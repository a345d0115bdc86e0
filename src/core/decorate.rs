use crate::config::global_adapter;
use crate::core::async_impl::{AsyncTrackedFn, AsyncTrackedMethod};
use crate::core::capture::CaptureAdapter;
use crate::core::function::{Binding, FunctionDecl};
use crate::core::sealed::Sealed;
use crate::core::sync_impl::{TrackedFn, TrackedMethod};
use crate::core::telemetry::{ExampleSink, TraceContext};
use crate::error::BlackboxError;
use std::sync::Arc;

/// Builder for wrapping a callable.
///
/// Without an explicit [`sink`](Blackbox::sink) the process-wide sink
/// installed by [`init_with_sink`](crate::init_with_sink) is used, and
/// sealing fails with [`BlackboxError::NotInitialized`] if there is none.
pub struct Blackbox {
    decl: FunctionDecl,
    sink: Option<Arc<dyn ExampleSink>>,
    trace: Option<Arc<dyn TraceContext>>,
}

impl Blackbox {
    pub fn new(decl: FunctionDecl) -> Self {
        Self {
            decl,
            sink: None,
            trace: None,
        }
    }

    pub fn sink(mut self, sink: Arc<dyn ExampleSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn trace(mut self, trace: Arc<dyn TraceContext>) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Resolves the capture destination and computes the signature.
    pub fn seal(self) -> Result<Sealed, BlackboxError> {
        let adapter = match self.sink {
            Some(sink) => CaptureAdapter::new(sink),
            None => global_adapter()?.clone(),
        };
        let adapter = match self.trace {
            Some(trace) => adapter.with_trace(trace),
            None => adapter,
        };
        Ok(Sealed::new(self.decl, adapter))
    }

    pub fn wrap<F>(self, func: F) -> Result<TrackedFn<F>, BlackboxError> {
        Ok(TrackedFn::new(self.seal()?, func))
    }

    pub fn wrap_async<F>(self, func: F) -> Result<AsyncTrackedFn<F>, BlackboxError> {
        Ok(AsyncTrackedFn::new(self.seal()?, func))
    }

    /// Wraps an instance method. The declaration is switched to
    /// [`Binding::Instance`] if it was declared otherwise.
    pub fn wrap_method<F>(self, func: F) -> Result<TrackedMethod<F>, BlackboxError> {
        Ok(TrackedMethod::new(self.instance().seal()?, func))
    }

    pub fn wrap_async_method<F>(self, func: F) -> Result<AsyncTrackedMethod<F>, BlackboxError> {
        Ok(AsyncTrackedMethod::new(self.instance().seal()?, func))
    }

    fn instance(mut self) -> Self {
        if self.decl.binding_style() != Binding::Instance {
            log::debug!("Treating {} as an instance method", self.decl.scope_name());
            self.decl = self.decl.method();
        }
        self
    }
}

/// Wraps a synchronous callable using the process-wide sink.
pub fn blackbox<F>(decl: FunctionDecl, func: F) -> Result<TrackedFn<F>, BlackboxError> {
    Blackbox::new(decl).wrap(func)
}

/// Wraps an async callable using the process-wide sink.
pub fn blackbox_async<F>(decl: FunctionDecl, func: F) -> Result<AsyncTrackedFn<F>, BlackboxError> {
    Blackbox::new(decl).wrap_async(func)
}

pub fn blackbox_method<F>(decl: FunctionDecl, func: F) -> Result<TrackedMethod<F>, BlackboxError> {
    Blackbox::new(decl).wrap_method(func)
}

pub fn blackbox_async_method<F>(
    decl: FunctionDecl,
    func: F,
) -> Result<AsyncTrackedMethod<F>, BlackboxError> {
    Blackbox::new(decl).wrap_async_method(func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scope::ScopePath;
    use crate::core::sealed::Sealable;
    use crate::core::telemetry::{MemorySink, StaticTraceContext, TraceIds};

    #[test]
    fn test_explicit_sink_and_trace() {
        let sink = Arc::new(MemorySink::new());
        let ids = TraceIds::from_raw(9, 9, None);
        let decl = FunctionDecl::new(ScopePath::new("app"), "shout")
            .param::<String>("text")
            .returns::<String>();
        let shout = Blackbox::new(decl)
            .sink(sink.clone())
            .trace(Arc::new(StaticTraceContext(ids.clone())))
            .wrap(|(text,): (String,)| text.to_uppercase())
            .unwrap();

        assert_eq!(shout.call(("hey".to_string(),)), "HEY");
        assert_eq!(sink.captures()[0].trace, ids);
    }

    #[test]
    fn test_wrap_method_forces_instance_binding() {
        struct Counter;
        let sink = Arc::new(MemorySink::new());
        let decl = FunctionDecl::new(ScopePath::new("app").class("Counter"), "zero");
        let zero = Blackbox::new(decl)
            .sink(sink.clone())
            .wrap_method(|_: &Counter, (): ()| 0)
            .unwrap();

        assert_eq!(zero.decl().binding_style(), Binding::Instance);
        assert_eq!(zero.bind(&Counter).call(()), 0);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_class_and_static_methods_use_tracked_fn() {
        let sink = Arc::new(MemorySink::new());
        let class_decl = FunctionDecl::new(ScopePath::new("app").class("Units"), "from_meters")
            .class_method()
            .param::<f64>("meters")
            .returns::<f64>();
        let from_meters = Blackbox::new(class_decl)
            .sink(sink.clone())
            .wrap(|(m,): (f64,)| m * 100.0)
            .unwrap();

        let static_decl = FunctionDecl::new(ScopePath::new("app").class("Units"), "ratio")
            .static_method()
            .returns::<f64>();
        let ratio = Blackbox::new(static_decl)
            .sink(sink.clone())
            .wrap(|(): ()| 0.5)
            .unwrap();

        assert_eq!(from_meters.call((2.0,)), 200.0);
        assert_eq!(ratio.call(()), 0.5);
        assert_eq!(from_meters.scope_name(), "app.Units.from_meters");

        let captures = sink.captures();
        assert_eq!(captures[0].input, serde_json::json!({"meters": 2.0}));
        assert!(captures[0].input_schema().get("cls").is_none());
        assert_eq!(captures[1].input, serde_json::json!({}));
    }
}
