//! # Blackbox
//!
//! Capture every call of an instrumented function as a replayable example,
//! tagged with the structural version of the function that produced it.
//!
//! ## Features
//!
//! - **Structural versioning**: a function's identity is a SHA-256 hash of its
//!   scope-qualified name and its input/output schemas. Change a parameter,
//!   a type or a default and you get a new version, automatically.
//! - **Transparent wrappers**: wrapped functions return exactly what they did
//!   before. Capture failures are logged and never reach the caller.
//! - **Sync & async**: free functions, instance methods, class methods and
//!   static methods, each in a sync and an async flavor.
//! - **Pluggable delivery**: in-memory sinks for tests, a bounded queue with a
//!   background worker, and an HTTP transport (feature `http`).
//!
//! ## Quick Start
//!
//! ```rust
//! use blackbox::prelude::*;
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new());
//! let decl = FunctionDecl::new(scope!(), "add")
//!     .param::<i64>("a")
//!     .param::<i64>("b")
//!     .returns::<i64>()
//!     .doc("Adds two numbers.");
//!
//! let add = Blackbox::new(decl)
//!     .sink(sink.clone())
//!     .wrap(|(a, b): (i64, i64)| a + b)
//!     .unwrap();
//!
//! assert_eq!(add.call((2, 3)), 5);
//! assert_eq!(sink.captures()[0].signature_hash(), add.signature_hash());
//! ```
//!
//! ## Module Organization
//!
//! - [`prelude`]: everything, sync and async (`use blackbox::prelude::*`)
//! - [`sync_prelude`]: only synchronous wrappers
//! - [`async_prelude`]: only asynchronous wrappers

// ============================================================================
// Core Module
// ============================================================================

mod core;

pub mod config;
pub mod error;

#[cfg(feature = "http")]
pub mod http;

// ============================================================================
// Public Re-exports - Granular Imports
// ============================================================================

// Declarations and schemas
pub use core::function::{clean_doc, Binding, FunctionDecl, ParamKind, Parameter};
pub use core::schema::decl::{
    default_value, short_type_name, Describe, FieldDecl, RecordDecl, TypeDecl,
};
pub use core::schema::translate::{input_schema, output_schema, translate, RESULT_FIELD};
pub use core::schema::{PrimitiveKind, SchemaNode};
pub use core::scope::ScopePath;
pub use core::signature::{canonical_json, compute_hash, Signature};

// Calling convention
pub use core::binding::{bind, capture_input, to_capture_value, Arguments, BoundArguments, CallArgs};

// Wrappers
pub use core::decorate::{
    blackbox, blackbox_async, blackbox_async_method, blackbox_method, Blackbox,
};
pub use core::sealed::{Sealable, Sealed};
pub use core::Access;

// Synchronous implementations
pub use core::sync_impl::{BoundMethod, TrackedFn, TrackedMethod};

// Asynchronous implementations
pub use core::async_impl::{AsyncBoundMethod, AsyncTrackedFn, AsyncTrackedMethod};

// Capture and delivery
pub use core::capture::CaptureAdapter;
pub use core::delivery::{DeliveryStats, DeliveryWorker, QueuedSink, Transport};
pub use core::telemetry::{
    CapturePayload, ExampleSink, FnSink, FnTraceContext, MemorySink, NoTraceContext, NoopSink,
    StaticTraceContext, TraceContext, TraceIds,
};

// Configuration and errors
pub use config::{init_with_adapter, init_with_sink, is_initialized, Config};
pub use error::{BindError, BlackboxError, ConfigError, DeliveryError};

#[cfg(feature = "http")]
pub use config::init;
#[cfg(feature = "http")]
pub use http::HttpTransport;

// ============================================================================
// Prelude Modules - Convenient Bulk Imports
// ============================================================================

/// The main prelude: imports everything you need for both sync and async callables.
///
/// # Example
/// ```rust
/// use blackbox::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        blackbox,
        blackbox_async,
        blackbox_async_method,
        blackbox_method,
        describe_record,
        scope,
        Access,
        Arguments,
        // Async
        AsyncBoundMethod,
        AsyncTrackedFn,
        AsyncTrackedMethod,
        Binding,
        Blackbox,
        BlackboxError,
        // Sync
        BoundMethod,
        CallArgs,
        CapturePayload,
        Config,
        // Core
        Describe,
        ExampleSink,
        FunctionDecl,
        MemorySink,
        RecordDecl,
        Sealable,
        Signature,
        TraceContext,
        TraceIds,
        TrackedFn,
        TrackedMethod,
        TypeDecl,
    };
}

/// Prelude for synchronous-only code.
///
/// # Example
/// ```rust
/// use blackbox::sync_prelude::*;
/// ```
pub mod sync_prelude {
    pub use super::{
        blackbox, blackbox_method, describe_record, scope, Access, Arguments, Binding, Blackbox,
        BoundMethod, CallArgs, Describe, FunctionDecl, MemorySink, Sealable, TrackedFn,
        TrackedMethod, TypeDecl,
    };
}

/// Prelude for asynchronous-only code.
///
/// # Example
/// ```rust
/// use blackbox::async_prelude::*;
/// ```
pub mod async_prelude {
    pub use super::{
        blackbox_async, blackbox_async_method, describe_record, scope, Access, Arguments,
        AsyncBoundMethod, AsyncTrackedFn, AsyncTrackedMethod, Binding, Blackbox, CallArgs,
        Describe, FunctionDecl, MemorySink, Sealable, TypeDecl,
    };
}

// ============================================================================
// Re-export commonly used external types for convenience
// ============================================================================

pub use futures::future::BoxFuture;
pub use serde_json::Value as JsonValue;

// ============================================================================
// Library Metadata
// ============================================================================

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
