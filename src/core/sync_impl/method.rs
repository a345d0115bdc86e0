use crate::core::binding::{to_capture_value, Arguments};
use crate::core::sealed::{Sealable, Sealed};
use crate::core::Access;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// An instance method whose receiver is supplied at call time.
///
/// The receiver is never part of the captured input. Accessed through the
/// type the wrapper stays unbound and takes the receiver explicitly;
/// accessed through an instance it yields a [`BoundMethod`].
pub struct TrackedMethod<F> {
    sealed: Arc<Sealed>,
    func: F,
}

impl<F> TrackedMethod<F> {
    pub fn new(sealed: Sealed, func: F) -> Self {
        Self {
            sealed: Arc::new(sealed),
            func,
        }
    }

    pub fn inner(&self) -> &F {
        &self.func
    }

    /// Attribute-style access: `None` for access through the type, `Some`
    /// for access through an instance.
    pub fn access<'a, S>(
        &'a self,
        receiver: Option<&'a S>,
    ) -> Access<'a, Self, BoundMethod<'a, S, F>> {
        match receiver {
            Some(receiver) => Access::Bound(self.bind(receiver)),
            None => Access::Unbound(self),
        }
    }

    pub fn bind<'a, S>(&'a self, receiver: &'a S) -> BoundMethod<'a, S, F> {
        BoundMethod {
            method: self,
            receiver,
        }
    }

    /// Unbound invocation with an explicit receiver.
    pub fn call<S, A, R>(&self, receiver: &S, args: A) -> R
    where
        F: Fn(&S, A) -> R,
        A: Arguments,
        R: Serialize,
    {
        let input = self.sealed.capture_input(&args);
        let output = (self.func)(receiver, args);
        self.sealed.emit(input, to_capture_value(&output));
        output
    }

    pub fn try_call<S, A, T, E>(&self, receiver: &S, args: A) -> Result<T, E>
    where
        F: Fn(&S, A) -> Result<T, E>,
        A: Arguments,
        T: Serialize,
    {
        let input = self.sealed.capture_input(&args);
        let output = (self.func)(receiver, args)?;
        self.sealed.emit(input, to_capture_value(&output));
        Ok(output)
    }
}

impl<F> Sealable for TrackedMethod<F> {
    fn sealed(&self) -> &Sealed {
        &self.sealed
    }

    fn is_async(&self) -> bool {
        false
    }
}

impl<F> fmt::Debug for TrackedMethod<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedMethod")
            .field("scope_name", &self.scope_name())
            .field("signature_hash", &self.signature_hash())
            .finish()
    }
}

/// A [`TrackedMethod`] bound to one receiver.
pub struct BoundMethod<'a, S, F> {
    method: &'a TrackedMethod<F>,
    receiver: &'a S,
}

impl<S, F> Clone for BoundMethod<'_, S, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, F> Copy for BoundMethod<'_, S, F> {}

impl<'a, S, F> BoundMethod<'a, S, F> {
    pub fn receiver(&self) -> &'a S {
        self.receiver
    }

    pub fn method(&self) -> &'a TrackedMethod<F> {
        self.method
    }

    pub fn call<A, R>(&self, args: A) -> R
    where
        F: Fn(&S, A) -> R,
        A: Arguments,
        R: Serialize,
    {
        self.method.call(self.receiver, args)
    }

    pub fn try_call<A, T, E>(&self, args: A) -> Result<T, E>
    where
        F: Fn(&S, A) -> Result<T, E>,
        A: Arguments,
        T: Serialize,
    {
        self.method.try_call(self.receiver, args)
    }
}

impl<S, F> Sealable for BoundMethod<'_, S, F> {
    fn sealed(&self) -> &Sealed {
        self.method.sealed()
    }

    fn is_async(&self) -> bool {
        false
    }
}
