pub mod async_impl;
pub mod binding;
pub mod capture;
pub mod decorate;
pub mod delivery;
pub mod function;
pub mod schema;
pub mod scope;
pub mod sealed;
pub mod signature;
pub mod sync_impl;
pub mod telemetry;

/// The result of looking a method up on a type or on an instance.
///
/// Lookup through the type yields the wrapper itself, which then takes the
/// receiver explicitly. Lookup through an instance yields a bound view
/// that supplies the receiver on every call.
#[derive(Debug)]
pub enum Access<'a, W, B> {
    Unbound(&'a W),
    Bound(B),
}

impl<'a, W, B> Access<'a, W, B> {
    pub fn is_bound(&self) -> bool {
        matches!(self, Access::Bound(_))
    }

    pub fn bound(self) -> Option<B> {
        match self {
            Access::Bound(bound) => Some(bound),
            Access::Unbound(_) => None,
        }
    }
}
