//! Synchronous wrappers.
//!
//! - [`TrackedFn`] for free functions, class methods and static methods
//! - [`TrackedMethod`] and [`BoundMethod`] for instance methods

pub mod method;
pub mod tracked;

pub use method::{BoundMethod, TrackedMethod};
pub use tracked::TrackedFn;
