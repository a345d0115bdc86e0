use crate::core::binding::{to_capture_value, Arguments};
use crate::core::sealed::{Sealable, Sealed};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// An async callable that records every call whose future completes.
pub struct AsyncTrackedFn<F> {
    sealed: Arc<Sealed>,
    func: F,
}

impl<F: Clone> Clone for AsyncTrackedFn<F> {
    fn clone(&self) -> Self {
        Self {
            sealed: Arc::clone(&self.sealed),
            func: self.func.clone(),
        }
    }
}

impl<F> AsyncTrackedFn<F> {
    pub fn new(sealed: Sealed, func: F) -> Self {
        Self {
            sealed: Arc::new(sealed),
            func,
        }
    }

    pub fn inner(&self) -> &F {
        &self.func
    }

    pub async fn call<A, Fut, R>(&self, args: A) -> R
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = R>,
        A: Arguments,
        R: Serialize,
    {
        let input = self.sealed.capture_input(&args);
        let output = (self.func)(args).await;
        self.sealed.emit(input, to_capture_value(&output));
        output
    }

    pub async fn try_call<A, Fut, T, E>(&self, args: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        A: Arguments,
        T: Serialize,
    {
        let input = self.sealed.capture_input(&args);
        let output = (self.func)(args).await?;
        self.sealed.emit(input, to_capture_value(&output));
        Ok(output)
    }
}

impl<F> Sealable for AsyncTrackedFn<F> {
    fn sealed(&self) -> &Sealed {
        &self.sealed
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl<F> fmt::Debug for AsyncTrackedFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncTrackedFn")
            .field("scope_name", &self.scope_name())
            .field("signature_hash", &self.signature_hash())
            .finish()
    }
}
