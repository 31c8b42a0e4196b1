#![allow(non_snake_case)]

use super::*;
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use webbridge_core::BridgeError;
use webbridge_transport::{ChannelTransport, Transport};

struct Fixture {
    invoker: OutboundInvoker,
    transport: Arc<dyn Transport>,
    scripts: UnboundedReceiver<String>,
    correlator: Arc<CallbackCorrelator>,
    state: Arc<StateCell>,
}

fn fixture() -> Fixture {
    let (channel, scripts) = ChannelTransport::new();
    let transport: Arc<dyn Transport> = channel;
    let correlator = Arc::new(CallbackCorrelator::new("cb_"));
    let state = Arc::new(StateCell::new());
    let invoker = OutboundInvoker::new(
        Arc::new(BridgeConfig::default()),
        TransportHandle::new(&transport),
        correlator.clone(),
        state.clone(),
    );
    Fixture {
        invoker,
        transport,
        scripts,
        correlator,
        state,
    }
}

#[test]
fn OutboundInvoker___one_way_call___sends_dispatch_script_without_token() {
    let mut f = fixture();

    let pending = f.invoker.call("refresh", Payload::Absent, false);

    assert!(pending.is_none());
    assert_eq!(
        f.scripts.try_recv().unwrap(),
        r#"window.onNativeNotify(JSON.parse('{\"method\":\"refresh\",\"callbackId\":null,\"params\":null}'));"#
    );
    assert_eq!(f.correlator.outstanding(), 0);
}

#[test]
fn OutboundInvoker___call_expecting_reply___registers_and_embeds_token() {
    let mut f = fixture();

    let pending = f.invoker.call("getUser", json!({"id": 7}), true).unwrap();

    assert_eq!(pending.token(), "cb_0");
    assert!(f.correlator.is_outstanding("cb_0"));
    let script = f.scripts.try_recv().unwrap();
    assert!(script.contains(r#"\"callbackId\":\"cb_0\""#));
    assert!(script.contains(r#"\"params\":{\"id\":7}"#));
}

#[test]
fn OutboundInvoker___transport_dropped___one_way_call_is_silent_no_op() {
    let mut f = fixture();
    drop(f.transport);

    let pending = f.invoker.call("refresh", Payload::Absent, false);

    assert!(pending.is_none());
    assert!(f.scripts.try_recv().is_err());
    assert_eq!(f.state.get(), BridgeState::Detached);
}

#[test]
fn OutboundInvoker___transport_torn_down___call_stays_outstanding() {
    let f = fixture();
    f.transport.teardown();

    let pending = f.invoker.call("getUser", Payload::Absent, true).unwrap();

    assert!(f.correlator.is_outstanding(pending.token()));
    assert_eq!(f.state.get(), BridgeState::Detached);
}

#[tokio::test]
async fn OutboundInvoker___destroyed___call_returns_cancelled_reply() {
    let mut f = fixture();
    f.state.transition_to(BridgeState::Destroyed).unwrap();

    let pending = f.invoker.call("getUser", Payload::Absent, true).unwrap();

    assert!(f.scripts.try_recv().is_err());
    assert_eq!(f.correlator.outstanding(), 0);
    assert_eq!(pending.wait().await.unwrap_err(), BridgeError::Cancelled);
}

#[tokio::test]
async fn OutboundInvoker___correlator_closed_while_attached___request_sends_nothing() {
    let mut f = fixture();
    // Teardown has closed the correlator but the state has not been read as terminal
    f.correlator.close();

    let pending = f.invoker.request("getUser", Payload::Absent);

    assert_eq!(f.state.get(), BridgeState::Attached);
    assert_eq!(f.correlator.outstanding(), 0);
    assert!(f.scripts.try_recv().is_err());
    assert_eq!(pending.wait().await.unwrap_err(), BridgeError::Cancelled);
}

#[test]
fn OutboundInvoker___reply_success___sends_callback_script() {
    let mut f = fixture();

    f.invoker
        .reply("cb-1", Outcome::success(json!({"os": "demo"})))
        .unwrap();

    assert_eq!(
        f.scripts.try_recv().unwrap(),
        r#"window.onNativeCallback('cb-1', JSON.parse('{\"method\":\"onNativeCallback\",\"callbackId\":null,\"params\":{\"os\":\"demo\"}}'));"#
    );
}

#[test]
fn OutboundInvoker___reply_error___wraps_error_in_params() {
    let mut f = fixture();

    f.invoker.reply("cb-2", Outcome::error(3, "boom")).unwrap();

    let script = f.scripts.try_recv().unwrap();
    assert!(script.contains(r#"\"params\":{\"error\":{\"code\":3,\"message\":\"boom\"}}"#));
}

#[test]
fn OutboundInvoker___reply_after_destroy___is_dropped() {
    let mut f = fixture();
    f.state.transition_to(BridgeState::Destroyed).unwrap();

    let result = f.invoker.reply("cb-1", Outcome::success(Payload::Absent));

    assert!(result.is_ok());
    assert!(f.scripts.try_recv().is_err());
}

#[test]
fn OutboundInvoker___hostile_method_name___stays_inside_literal() {
    let mut f = fixture();

    f.invoker.call("x');alert(1);//", Payload::Absent, false);

    let script = f.scripts.try_recv().unwrap();
    assert!(script.contains(r#"\"method\":\"x\');alert(1);//\""#));
    assert!(script.ends_with("'));"));
}
