#![allow(non_snake_case)]

//! End-to-end scenarios: a host bridge talking to a simulated page

use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::prelude::*;
use webbridge::{
    Bridge, BridgeConfig, BridgeError, BridgeLoggingLayer, CallContext, ChannelTransport,
    Dispatch, FnHandler, Handler, LogCallbackManager, LogLevel, Payload, ReplySink, Resolution,
    Transport,
};

const DISPATCH_PREFIX: &str = "window.onNativeNotify(JSON.parse('";
const REPLY_PREFIX: &str = "window.onNativeCallback('";
const SCRIPT_SUFFIX: &str = "'));";

/// Evaluate the body of a single-quoted script string literal
fn unescape_literal(literal: &str) -> String {
    let mut out = String::new();
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16).unwrap();
                out.push(char::from_u32(code).unwrap());
            }
            Some(other) => out.push(other),
            None => panic!("dangling escape"),
        }
    }
    out
}

/// Envelope embedded in a host-to-page dispatch script
fn parse_dispatch(script: &str) -> Value {
    let literal = script
        .strip_prefix(DISPATCH_PREFIX)
        .and_then(|s| s.strip_suffix(SCRIPT_SUFFIX))
        .unwrap();
    serde_json::from_str(&unescape_literal(literal)).unwrap()
}

/// Token and envelope embedded in a reply script
fn parse_reply(script: &str) -> (String, Value) {
    let body = script
        .strip_prefix(REPLY_PREFIX)
        .and_then(|s| s.strip_suffix(SCRIPT_SUFFIX))
        .unwrap();
    let (token, literal) = body.split_once("', JSON.parse('").unwrap();
    (
        unescape_literal(token),
        serde_json::from_str(&unescape_literal(literal)).unwrap(),
    )
}

async fn next_script(scripts: &mut UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(2), scripts.recv())
        .await
        .unwrap()
        .unwrap()
}

async fn no_script(scripts: &mut UnboundedReceiver<String>) -> bool {
    tokio::time::timeout(Duration::from_millis(100), scripts.recv())
        .await
        .is_err()
}

fn device_handler() -> Arc<dyn Handler> {
    Arc::new(FnHandler::new(
        |call: CallContext, sink: ReplySink| async move {
            match call.method.as_str() {
                "getDeviceInfo" => {
                    sink.success(json!({"os": "demo"}));
                    Ok(())
                }
                "track" => Err(BridgeError::Internal("analytics backend down".to_string())),
                other => Err(BridgeError::HandlerFailure(format!("unknown method {other}"))),
            }
        },
    ))
}

fn counting_handler(count: Arc<AtomicUsize>) -> Arc<dyn Handler> {
    Arc::new(FnHandler::new(move |_call: CallContext, _sink: ReplySink| {
        count.fetch_add(1, Ordering::SeqCst);
        async { Ok::<(), BridgeError>(()) }
    }))
}

struct Side {
    bridge: Bridge,
    transport: Arc<ChannelTransport>,
    scripts: UnboundedReceiver<String>,
}

fn side(handler: Arc<dyn Handler>) -> Side {
    let (transport, scripts) = ChannelTransport::new();
    let dyn_transport: Arc<dyn Transport> = transport.clone();
    let bridge = Bridge::new(BridgeConfig::default(), &dyn_transport, handler).unwrap();
    Side {
        bridge,
        transport,
        scripts,
    }
}

type Captured = Arc<Mutex<Vec<(LogLevel, String)>>>;

/// Route this thread's tracing events into a private log sink
fn capture_logs() -> (tracing::subscriber::DefaultGuard, Captured) {
    let manager: &'static LogCallbackManager = Box::leak(Box::new(LogCallbackManager::new()));
    manager.set_level(LogLevel::Trace);
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();
    manager.set_callback(Some(Arc::new(move |level, _target, message| {
        sink.lock().push((level, message.to_string()));
    })));
    let subscriber = tracing_subscriber::registry().with(BridgeLoggingLayer::with_manager(manager));
    (tracing::subscriber::set_default(subscriber), captured)
}

fn logged(captured: &Captured, level: LogLevel, fragment: &str) -> bool {
    captured
        .lock()
        .iter()
        .any(|(l, m)| *l == level && m.contains(fragment))
}

#[tokio::test]
async fn Bridge___get_device_info_with_callback___replies_through_callback_function() {
    let mut page = side(device_handler());

    page.bridge
        .on_message(r#"{"method":"getDeviceInfo","callbackId":"cb-1"}"#);

    let script = next_script(&mut page.scripts).await;
    assert_eq!(
        script,
        r#"window.onNativeCallback('cb-1', JSON.parse('{\"method\":\"onNativeCallback\",\"callbackId\":null,\"params\":{\"os\":\"demo\"}}'));"#
    );
    let (token, envelope) = parse_reply(&script);
    assert_eq!(token, "cb-1");
    assert_eq!(
        envelope,
        json!({"method": "onNativeCallback", "callbackId": null, "params": {"os": "demo"}})
    );
}

#[tokio::test]
async fn Bridge___loopback_request___originator_resolves_token_with_payload() {
    let mut host = side(counting_handler(Arc::new(AtomicUsize::new(0))));
    let mut page = side(device_handler());

    let pending = host.bridge.request("getDeviceInfo", Payload::Absent);
    let token = pending.token().to_string();

    let outbound = parse_dispatch(&next_script(&mut host.scripts).await);
    assert_eq!(outbound["callbackId"], json!(token));
    page.bridge.on_message(outbound);

    let (reply_token, mut reply) = parse_reply(&next_script(&mut page.scripts).await);
    reply["callbackId"] = json!(reply_token);
    let dispatch = host.bridge.on_message(reply);

    assert_eq!(dispatch, Dispatch::Resolved(Resolution::Delivered));
    assert_eq!(pending.wait().await.unwrap().to_value(), json!({"os": "demo"}));
    assert!(!host.bridge.is_outstanding(&token));
}

#[tokio::test]
async fn Bridge___loopback_handler_error___originator_sees_remote_error() {
    let mut host = side(counting_handler(Arc::new(AtomicUsize::new(0))));
    let mut page = side(device_handler());

    let pending = host.bridge.request("unknownThing", Payload::Absent);
    page.bridge
        .on_message(parse_dispatch(&next_script(&mut host.scripts).await));
    let (reply_token, mut reply) = parse_reply(&next_script(&mut page.scripts).await);
    reply["callbackId"] = json!(reply_token);
    host.bridge.on_message(reply);

    match pending.wait().await {
        Err(BridgeError::Remote { code, message }) => {
            assert_eq!(code, 3);
            assert!(message.contains("unknown method unknownThing"));
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn Bridge___one_way_handler_failure___sends_nothing_and_logs() {
    let (_guard, captured) = capture_logs();
    let mut page = side(device_handler());

    let dispatch = page.bridge.on_message(r#"{"method":"track","params":{"event":"open"}}"#);

    assert_eq!(dispatch, Dispatch::Handled);
    assert!(no_script(&mut page.scripts).await);
    assert!(logged(&captured, LogLevel::Error, "analytics backend down"));
}

#[tokio::test]
async fn Bridge___not_json___dropped_without_handler_invocation() {
    let (_guard, captured) = capture_logs();
    let count = Arc::new(AtomicUsize::new(0));
    let mut page = side(counting_handler(count.clone()));

    let dispatch = page.bridge.on_message("not json");

    assert_eq!(dispatch, Dispatch::Dropped);
    assert!(no_script(&mut page.scripts).await);
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert!(logged(&captured, LogLevel::Warn, "malformed"));
}

#[tokio::test]
async fn Bridge___call_after_transport_teardown___is_logged_no_op() {
    let (_guard, captured) = capture_logs();
    let page = side(device_handler());
    page.transport.teardown();

    let pending = page.bridge.call("refresh", Value::Null, false);

    assert!(pending.is_none());
    assert!(logged(&captured, LogLevel::Warn, "transport unavailable"));
}

#[tokio::test]
async fn Bridge___duplicate_reply___only_first_reaches_caller() {
    let host = side(counting_handler(Arc::new(AtomicUsize::new(0))));
    let pending = host.bridge.request("pick", Payload::Absent);
    let token = pending.token().to_string();

    let first = host.bridge.on_message(json!({
        "method": "onNativeCallback", "callbackId": token, "params": "X"
    }));
    let second = host.bridge.on_message(json!({
        "method": "onNativeCallback", "callbackId": token, "params": "Y"
    }));

    assert_eq!(first, Dispatch::Resolved(Resolution::Delivered));
    assert_eq!(second, Dispatch::Resolved(Resolution::Unmatched));
    assert_eq!(pending.wait().await.unwrap().to_value(), json!("X"));
}

#[tokio::test]
async fn Bridge___unanswered_call___times_out_only_with_caller_timeout() {
    let host = side(counting_handler(Arc::new(AtomicUsize::new(0))));

    let result = host
        .bridge
        .call_with_timeout("neverAnswered", Payload::Absent, Duration::from_millis(30))
        .await;

    assert_eq!(result.unwrap_err(), BridgeError::Timeout);
    assert_eq!(host.bridge.outstanding_calls(), 0);
}

#[tokio::test]
async fn Bridge___hostile_params___survive_script_embedding() {
    let mut host = side(counting_handler(Arc::new(AtomicUsize::new(0))));
    let hostile = "it's \"quoted\"\\path\nline two\r\n</script>\u{2028}end');alert(1);//";

    host.bridge.notify("show", Payload::text(hostile));

    let envelope = parse_dispatch(&next_script(&mut host.scripts).await);
    assert_eq!(envelope["params"], json!(hostile));
}

#[tokio::test]
async fn Bridge___destroy___releases_transport_and_ignores_late_traffic() {
    let page = side(device_handler());
    let pending = page.bridge.request("slow", Payload::Absent);

    page.bridge.destroy();

    assert!(page.transport.is_torn_down());
    assert_eq!(pending.wait().await.unwrap_err(), BridgeError::Cancelled);
    assert_eq!(
        page.bridge.on_message(r#"{"method":"getDeviceInfo","callbackId":"cb-2"}"#),
        Dispatch::Dropped
    );
}
