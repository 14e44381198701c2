//! On-disk and wire format tests for core types.
//!
//! These pin the exact JSON shapes of the persisted records and the
//! published launch state, since other processes and older installs read
//! the same files.

use chrono::{TimeZone, Utc};
use serde_json::json;
use url::Url;

use crate::{
    ConversionResult, LaunchState, Mode, PushGateState, RemoteConfig, StoredRemoteConfig,
};

#[test]
fn test_mode_record_format() {
    assert_eq!(serde_json::to_string(&Mode::Web).unwrap(), r#""web""#);
    let parsed: Mode = serde_json::from_str(r#""native""#).unwrap();
    assert_eq!(parsed, Mode::Native);
}

#[test]
fn test_stored_remote_config_record_format() {
    let stored = StoredRemoteConfig::new(
        RemoteConfig::new(
            Url::parse("https://example.com/experience?cid=7").unwrap(),
            1_700_003_600,
        ),
        Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
    );

    let value = serde_json::to_value(&stored).unwrap();
    assert_eq!(
        value,
        json!({
            "url": "https://example.com/experience?cid=7",
            "expires": 1_700_003_600,
            "saved_at": "2023-11-14T22:13:20Z",
        })
    );

    let parsed: StoredRemoteConfig = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, stored);
}

#[test]
fn test_conversion_record_preserves_unknown_keys() {
    let raw = json!({
        "payload": {
            "af_status": "Non-organic",
            "af_sub1": "x-17",
            "is_retargeting": false,
        },
        "attribution_id": "1699-0042",
    });

    let parsed: ConversionResult = serde_json::from_value(raw).unwrap();
    assert_eq!(parsed.str_field("af_sub1"), Some("x-17"));
    assert!(!parsed.is_organic());

    let back = serde_json::to_value(&parsed).unwrap();
    assert_eq!(back["payload"]["is_retargeting"], json!(false));
}

#[test]
fn test_push_gate_record_defaults_missing_fields() {
    let parsed: PushGateState = serde_json::from_str("{}").unwrap();
    assert!(!parsed.has_requested_permission);
    assert!(parsed.last_skipped_at.is_none());
}

#[test]
fn test_launch_state_is_tagged() {
    let url = Url::parse("https://example.com/e").unwrap();
    let value = serde_json::to_value(LaunchState::web(url)).unwrap();
    assert_eq!(value["state"], "web");
    assert_eq!(value["url"], "https://example.com/e");

    let value = serde_json::to_value(LaunchState::loading("requesting decision")).unwrap();
    assert_eq!(value["state"], "loading");
    assert_eq!(value["message"], "requesting decision");
}
