//! Process-wide installation. Kept in its own test binary, and in a single
//! test, because the global can only be set once per process.

use blackbox::prelude::*;
use blackbox::{init_with_sink, is_initialized, ConfigError, NoopSink, ScopePath};
use std::sync::Arc;

#[test]
fn test_global_sink_lifecycle() {
    let decl = || {
        FunctionDecl::new(ScopePath::new("app"), "echo")
            .param::<String>("text")
            .returns::<String>()
    };

    assert!(!is_initialized());
    assert!(matches!(
        blackbox(decl(), |(text,): (String,)| text),
        Err(BlackboxError::NotInitialized)
    ));

    let sink = Arc::new(MemorySink::new());
    init_with_sink(sink.clone()).unwrap();
    assert!(is_initialized());

    let echo = blackbox(decl(), |(text,): (String,)| text).unwrap();
    assert_eq!(echo.call(("hello".to_string(),)), "hello");
    assert_eq!(sink.len(), 1);

    assert!(matches!(
        init_with_sink(Arc::new(NoopSink)),
        Err(BlackboxError::Config(ConfigError::AlreadyInitialized))
    ));

    let echo_async = blackbox_async(decl(), |(text,): (String,)| async move { text }).unwrap();
    assert_eq!(echo_async.name(), "echo");
    assert!(echo_async.is_async());
}
