use crate::core::binding::{to_capture_value, Arguments};
use crate::core::sealed::{Sealable, Sealed};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A synchronous callable that records every successful call.
///
/// Calling through the wrapper returns exactly what the inner callable
/// returns. A panic unwinds through the wrapper untouched and nothing is
/// captured for that call.
pub struct TrackedFn<F> {
    sealed: Arc<Sealed>,
    func: F,
}

impl<F: Clone> Clone for TrackedFn<F> {
    fn clone(&self) -> Self {
        Self {
            sealed: Arc::clone(&self.sealed),
            func: self.func.clone(),
        }
    }
}

impl<F> TrackedFn<F> {
    pub fn new(sealed: Sealed, func: F) -> Self {
        Self {
            sealed: Arc::new(sealed),
            func,
        }
    }

    /// The undecorated callable.
    pub fn inner(&self) -> &F {
        &self.func
    }

    /// Invokes the callable and captures `(input, output)`.
    pub fn call<A, R>(&self, args: A) -> R
    where
        F: Fn(A) -> R,
        A: Arguments,
        R: Serialize,
    {
        let input = self.sealed.capture_input(&args);
        let output = (self.func)(args);
        self.sealed.emit(input, to_capture_value(&output));
        output
    }

    /// Invokes a fallible callable. Only `Ok` values are captured; an `Err`
    /// is returned to the caller unchanged.
    pub fn try_call<A, T, E>(&self, args: A) -> Result<T, E>
    where
        F: Fn(A) -> Result<T, E>,
        A: Arguments,
        T: Serialize,
    {
        let input = self.sealed.capture_input(&args);
        let output = (self.func)(args)?;
        self.sealed.emit(input, to_capture_value(&output));
        Ok(output)
    }
}

impl<F> Sealable for TrackedFn<F> {
    fn sealed(&self) -> &Sealed {
        &self.sealed
    }

    fn is_async(&self) -> bool {
        false
    }
}

impl<F> fmt::Debug for TrackedFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedFn")
            .field("scope_name", &self.scope_name())
            .field("signature_hash", &self.signature_hash())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capture::CaptureAdapter;
    use crate::core::function::FunctionDecl;
    use crate::core::scope::ScopePath;
    use crate::core::telemetry::MemorySink;
    use serde_json::json;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn sealed(decl: FunctionDecl, sink: &Arc<MemorySink>) -> Sealed {
        Sealed::new(decl, CaptureAdapter::new(sink.clone()))
    }

    #[test]
    fn test_call_returns_and_captures() {
        let sink = Arc::new(MemorySink::new());
        let decl = FunctionDecl::new(ScopePath::new("math"), "add")
            .param::<i64>("a")
            .param::<i64>("b")
            .returns::<i64>()
            .doc("Adds two numbers.");
        let add = TrackedFn::new(sealed(decl, &sink), |(a, b): (i64, i64)| a + b);

        assert_eq!(add.call((2, 3)), 5);
        assert_eq!(add.name(), "add");
        assert_eq!(add.scope_name(), "math.add");
        assert_eq!(add.doc(), Some("Adds two numbers."));
        assert!(!add.is_async());

        let captures = sink.captures();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].input, json!({"a": 2, "b": 3}));
        assert_eq!(captures[0].output, json!(5));
        assert_eq!(captures[0].signature_hash(), add.signature_hash());
    }

    #[test]
    fn test_err_is_propagated_without_capture() {
        let sink = Arc::new(MemorySink::new());
        let decl = FunctionDecl::new(ScopePath::new("math"), "parse").param::<String>("text");
        let parse = TrackedFn::new(sealed(decl, &sink), |(text,): (&str,)| {
            text.parse::<i32>()
        });

        assert_eq!(parse.try_call(("12",)), Ok(12));
        assert!(parse.try_call(("twelve",)).is_err());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_panic_unwinds_without_capture() {
        let sink = Arc::new(MemorySink::new());
        let decl = FunctionDecl::new(ScopePath::new("math"), "boom");
        let boom = TrackedFn::new(sealed(decl, &sink), |(): ()| -> i32 { panic!("boom") });

        assert!(catch_unwind(AssertUnwindSafe(|| boom.call(()))).is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_clones_share_identity() {
        let sink = Arc::new(MemorySink::new());
        let decl = FunctionDecl::new(ScopePath::new("math"), "neg").param::<i64>("x");
        let neg = TrackedFn::new(sealed(decl, &sink), |(x,): (i64,)| -x);
        let copy = neg.clone();
        assert_eq!(copy.call((4,)), -4);
        assert_eq!(copy.signature_hash(), neg.signature_hash());
        assert_eq!(sink.len(), 1);
    }
}
