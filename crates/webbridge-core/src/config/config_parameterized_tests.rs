#![allow(non_snake_case)]

use super::*;
use test_case::test_case;

// ============================================================================
// Identifier validation
// ============================================================================

#[test_case("onNativeCallback", true ; "camel case")]
#[test_case("_private", true ; "underscore")]
#[test_case("$bridge", true ; "dollar")]
#[test_case("cb2", true ; "digits")]
#[test_case("", false ; "empty")]
#[test_case("2fast", false ; "leading digit")]
#[test_case("alert('x')", false ; "call expression")]
#[test_case("a.b", false ; "member access")]
#[test_case("with space", false ; "space")]
#[test_case("naïve", false ; "non ascii")]
fn is_script_identifier___classifies_names(value: &str, expected: bool) {
    assert_eq!(is_script_identifier(value), expected);
}

#[test_case("channel_name")]
#[test_case("remote_object")]
#[test_case("callback_function")]
#[test_case("notify_function")]
fn BridgeConfig___injected_name___fails_validation(field: &str) {
    let mut config = BridgeConfig::default();
    let hostile = "x');alert(1);('".to_string();
    match field {
        "channel_name" => config.channel_name = hostile,
        "remote_object" => config.remote_object = hostile,
        "callback_function" => config.callback_function = hostile,
        _ => config.notify_function = hostile,
    }

    let result = config.validate();

    assert!(matches!(result, Err(BridgeError::Config(msg)) if msg.contains(field)));
}

// ============================================================================
// JSON parsing
// ============================================================================

#[test_case(r#"{"log_level": "trace"}"#, LogLevel::Trace)]
#[test_case(r#"{"log_level": "debug"}"#, LogLevel::Debug)]
#[test_case(r#"{"log_level": "warn"}"#, LogLevel::Warn)]
#[test_case(r#"{"log_level": "error"}"#, LogLevel::Error)]
#[test_case(r#"{}"#, LogLevel::Info)]
fn BridgeConfig___log_level_json___parses_correctly(json: &str, expected: LogLevel) {
    let config = BridgeConfig::from_json(json.as_bytes()).unwrap();

    assert_eq!(config.log_level(), expected);
}

#[test_case(r#"{"notification_capacity": 1}"#, 1)]
#[test_case(r#"{"notification_capacity": 256}"#, 256)]
#[test_case(r#"{}"#, 64)]
fn BridgeConfig___notification_capacity_json___parses_correctly(json: &str, expected: usize) {
    let config = BridgeConfig::from_json(json.as_bytes()).unwrap();

    assert_eq!(config.notification_capacity, expected);
}

#[test_case(0, false ; "zero")]
#[test_case(1, true ; "one")]
#[test_case(MAX_NOTIFICATION_CAPACITY, true ; "upper bound")]
#[test_case(MAX_NOTIFICATION_CAPACITY + 1, false ; "above upper bound")]
#[test_case(usize::MAX, false ; "usize max")]
fn BridgeConfig___notification_capacity___validates_range(capacity: usize, valid: bool) {
    let config = BridgeConfig {
        notification_capacity: capacity,
        ..Default::default()
    };

    let result = config.validate();

    assert_eq!(result.is_ok(), valid);
    if !valid {
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }
}
