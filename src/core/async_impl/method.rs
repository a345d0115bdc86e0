use crate::core::binding::{to_capture_value, Arguments};
use crate::core::sealed::{Sealable, Sealed};
use crate::core::Access;
use futures::future::BoxFuture;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// An async instance method.
///
/// The inner callable borrows its receiver for the life of the returned
/// future, so it is written as `fn(&S, A) -> BoxFuture<'_, R>`.
pub struct AsyncTrackedMethod<F> {
    sealed: Arc<Sealed>,
    func: F,
}

impl<F> AsyncTrackedMethod<F> {
    pub fn new(sealed: Sealed, func: F) -> Self {
        Self {
            sealed: Arc::new(sealed),
            func,
        }
    }

    pub fn inner(&self) -> &F {
        &self.func
    }

    pub fn access<'a, S>(
        &'a self,
        receiver: Option<&'a S>,
    ) -> Access<'a, Self, AsyncBoundMethod<'a, S, F>> {
        match receiver {
            Some(receiver) => Access::Bound(self.bind(receiver)),
            None => Access::Unbound(self),
        }
    }

    pub fn bind<'a, S>(&'a self, receiver: &'a S) -> AsyncBoundMethod<'a, S, F> {
        AsyncBoundMethod {
            method: self,
            receiver,
        }
    }

    pub async fn call<S, A, R>(&self, receiver: &S, args: A) -> R
    where
        F: for<'r> Fn(&'r S, A) -> BoxFuture<'r, R>,
        A: Arguments,
        R: Serialize,
    {
        let input = self.sealed.capture_input(&args);
        let output = (self.func)(receiver, args).await;
        self.sealed.emit(input, to_capture_value(&output));
        output
    }

    pub async fn try_call<S, A, T, E>(&self, receiver: &S, args: A) -> Result<T, E>
    where
        F: for<'r> Fn(&'r S, A) -> BoxFuture<'r, Result<T, E>>,
        A: Arguments,
        T: Serialize,
    {
        let input = self.sealed.capture_input(&args);
        let output = (self.func)(receiver, args).await?;
        self.sealed.emit(input, to_capture_value(&output));
        Ok(output)
    }
}

impl<F> Sealable for AsyncTrackedMethod<F> {
    fn sealed(&self) -> &Sealed {
        &self.sealed
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl<F> fmt::Debug for AsyncTrackedMethod<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncTrackedMethod")
            .field("scope_name", &self.scope_name())
            .field("signature_hash", &self.signature_hash())
            .finish()
    }
}

/// An [`AsyncTrackedMethod`] bound to one receiver.
pub struct AsyncBoundMethod<'a, S, F> {
    method: &'a AsyncTrackedMethod<F>,
    receiver: &'a S,
}

impl<S, F> Clone for AsyncBoundMethod<'_, S, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, F> Copy for AsyncBoundMethod<'_, S, F> {}

impl<'a, S, F> AsyncBoundMethod<'a, S, F> {
    pub fn receiver(&self) -> &'a S {
        self.receiver
    }

    pub fn method(&self) -> &'a AsyncTrackedMethod<F> {
        self.method
    }

    pub async fn call<A, R>(&self, args: A) -> R
    where
        F: for<'r> Fn(&'r S, A) -> BoxFuture<'r, R>,
        A: Arguments,
        R: Serialize,
    {
        self.method.call(self.receiver, args).await
    }

    pub async fn try_call<A, T, E>(&self, args: A) -> Result<T, E>
    where
        F: for<'r> Fn(&'r S, A) -> BoxFuture<'r, Result<T, E>>,
        A: Arguments,
        T: Serialize,
    {
        self.method.try_call(self.receiver, args).await
    }
}

impl<S, F> Sealable for AsyncBoundMethod<'_, S, F> {
    fn sealed(&self) -> &Sealed {
        self.method.sealed()
    }

    fn is_async(&self) -> bool {
        true
    }
}
