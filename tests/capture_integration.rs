use async_trait::async_trait;
use blackbox::prelude::*;
use blackbox::{BoxFuture, DeliveryError, FnSink, QueuedSink, ScopePath, Transport};
use serde::Serialize;
use serde_json::json;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Reply {
    response: String,
    tokens_used: i64,
}

describe_record!(Reply {
    response: String,
    tokens_used: i64,
});

fn generate_decl() -> FunctionDecl {
    FunctionDecl::new(ScopePath::new("support"), "generate")
        .param::<String>("query")
        .param::<String>("context")
        .param_with_default::<i64>("max_tokens", json!(100))
        .returns::<Reply>()
}

fn generate((query, context): (String, String)) -> Reply {
    Reply {
        response: format!("{} ({})", query, context),
        tokens_used: 7,
    }
}

#[test]
fn test_sync_wrapper_is_transparent_and_captures() {
    let sink = Arc::new(MemorySink::new());
    let wrapped = Blackbox::new(generate_decl())
        .sink(sink.clone())
        .wrap(generate)
        .unwrap();

    let args = ("refund?".to_string(), "faq".to_string());
    assert_eq!(wrapped.call(args.clone()), generate(args));

    let captures = sink.captures();
    assert_eq!(captures.len(), 1);
    assert_eq!(
        captures[0].input,
        json!({"query": "refund?", "context": "faq", "max_tokens": 100})
    );
    assert_eq!(
        captures[0].output,
        json!({"response": "refund? (faq)", "tokens_used": 7})
    );
    assert_eq!(captures[0].scope_name(), "support.generate");
    assert_eq!(captures[0].signature_hash(), wrapped.signature_hash());
}

#[test]
fn test_keyword_arguments_through_call_args() {
    let sink = Arc::new(MemorySink::new());
    let wrapped = Blackbox::new(generate_decl())
        .sink(sink.clone())
        .wrap(|args: CallArgs| Reply {
            response: args.get::<String>(0).unwrap_or_default(),
            tokens_used: args.get_kw::<i64>("max_tokens").unwrap_or(100),
        })
        .unwrap();

    let reply = wrapped.call(
        CallArgs::new()
            .arg("q")
            .kwarg("context", "c")
            .kwarg("max_tokens", &5),
    );
    assert_eq!(reply.tokens_used, 5);
    assert_eq!(
        sink.captures()[0].input,
        json!({"query": "q", "context": "c", "max_tokens": 5})
    );
}

#[test]
fn test_failing_sink_never_reaches_the_caller() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let sink = Arc::new(FnSink(move |_payload: CapturePayload| {
        counter.fetch_add(1, Ordering::SeqCst);
        false
    }));
    let divide = Blackbox::new(
        FunctionDecl::new(ScopePath::new("math"), "divide")
            .param::<i32>("a")
            .param::<i32>("b"),
    )
    .sink(sink)
    .wrap(|(a, b): (i32, i32)| a / b)
    .unwrap();

    for _ in 0..3 {
        assert_eq!(divide.call((9, 3)), 3);
    }
    assert!(catch_unwind(AssertUnwindSafe(|| divide.call((1, 0)))).is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[test]
fn test_instance_method_never_captures_receiver() {
    struct Service {
        name: String,
    }

    fn describe(service: &Service, (topic,): (String,)) -> String {
        format!("{} on {}", service.name, topic)
    }

    let sink = Arc::new(MemorySink::new());
    let method = Blackbox::new(
        FunctionDecl::new(ScopePath::new("app").class("Service"), "describe")
            .param::<String>("topic")
            .returns::<String>(),
    )
    .sink(sink.clone())
    .wrap_method(describe as fn(&Service, (String,)) -> String)
    .unwrap();

    let first = Service { name: "a".into() };
    let second = Service { name: "b".into() };
    assert_eq!(method.bind(&first).call(("x".to_string(),)), "a on x");
    assert_eq!(method.bind(&second).call(("y".to_string(),)), "b on y");

    for capture in sink.captures() {
        let input = capture.input.as_object().unwrap();
        assert!(!input.contains_key("self"));
        assert_eq!(input.len(), 1);
        assert!(capture.input_schema().get("self").is_none());
    }
    assert_eq!(sink.len(), 2);
}

struct Assistant {
    tone: String,
}

impl Assistant {
    fn reply(&self, (query,): (String,)) -> BoxFuture<'_, Result<Reply, String>> {
        Box::pin(async move {
            if query.is_empty() {
                return Err("empty query".to_string());
            }
            tokio::task::yield_now().await;
            Ok(Reply {
                response: format!("[{}] {}", self.tone, query),
                tokens_used: query.len() as i64,
            })
        })
    }
}

type ReplyFn = for<'r> fn(&'r Assistant, (String,)) -> BoxFuture<'r, Result<Reply, String>>;

#[tokio::test]
async fn test_async_method_transparency() {
    let sink = Arc::new(MemorySink::new());
    let reply = Blackbox::new(
        FunctionDecl::new(ScopePath::new("bot").class("Assistant"), "reply")
            .param::<String>("query")
            .returns::<Reply>(),
    )
    .sink(sink.clone())
    .wrap_async_method(Assistant::reply as ReplyFn)
    .unwrap();

    let assistant = Assistant {
        tone: "calm".into(),
    };
    let bound = reply.bind(&assistant);

    let ok = bound.try_call(("hi".to_string(),)).await;
    assert_eq!(
        ok,
        Ok(Reply {
            response: "[calm] hi".into(),
            tokens_used: 2
        })
    );
    assert_eq!(bound.try_call((String::new(),)).await, Err("empty query".to_string()));

    let captures = sink.captures();
    assert_eq!(captures.len(), 1);
    assert_eq!(captures[0].input, json!({"query": "hi"}));
    assert_eq!(captures[0].scope_name(), "bot.Assistant.reply");
}

#[derive(Default)]
struct CollectingTransport {
    received: Mutex<Vec<serde_json::Value>>,
}

#[async_trait]
impl Transport for CollectingTransport {
    async fn deliver(&self, payload: &CapturePayload) -> Result<(), DeliveryError> {
        let body = serde_json::to_value(payload)?;
        self.received.lock().unwrap().push(body);
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_queued_delivery_end_to_end() {
    let transport = Arc::new(CollectingTransport::default());
    let (sink, worker) = QueuedSink::spawn(transport.clone(), 16);

    let ids = TraceIds::from_raw(0xfeed, 0xbeef, None);
    let square = Blackbox::new(
        FunctionDecl::new(ScopePath::new("math"), "square")
            .param::<u64>("n")
            .returns::<u64>(),
    )
    .sink(Arc::new(sink))
    .trace(Arc::new(blackbox::StaticTraceContext(ids)))
    .wrap_async(|(n,): (u64,)| async move { n * n })
    .unwrap();

    let results = futures::future::join_all((1..=4u64).map(|n| square.call((n,)))).await;
    assert_eq!(results, vec![1, 4, 9, 16]);

    drop(square);
    let stats = worker.await.unwrap();
    assert_eq!(stats.delivered, 4);
    assert_eq!(stats.failed, 0);

    let received = transport.received.lock().unwrap();
    let mut outputs: Vec<u64> = received
        .iter()
        .map(|body| body["output"].as_u64().unwrap())
        .collect();
    outputs.sort_unstable();
    assert_eq!(outputs, vec![1, 4, 9, 16]);
    for body in received.iter() {
        assert_eq!(body["function_name"], json!("math.square"));
        assert_eq!(body["otel_trace_id"], json!("0000000000000000000000000000feed"));
        assert_eq!(body["otel_span_id"], json!("000000000000beef"));
        assert_eq!(
            body["output_schema"],
            json!({"type": "object", "properties": {"result": {"type": "integer"}}})
        );
    }
}
