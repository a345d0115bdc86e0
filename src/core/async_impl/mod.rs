//! Asynchronous wrappers.
//!
//! - [`AsyncTrackedFn`] for async free functions, class methods and static methods
//! - [`AsyncTrackedMethod`] and [`AsyncBoundMethod`] for async instance methods
//!
//! Capture happens when the wrapped future completes. A future that is
//! dropped before completion captures nothing.

pub mod method;
pub mod tracked;

pub use method::{AsyncBoundMethod, AsyncTrackedMethod};
pub use tracked::AsyncTrackedFn;
