#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use wsmux_client::config;
use wsmux_client::transport::normalize_endpoint;
use wsmux_core::BoolDecoding;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
wire:
  prefix: "app:"
  seperator: ";" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.wire.prefix, "iris-websocket-message:");
    assert_eq!(cfg.wire.separator, ';');
    assert_eq!(cfg.wire.bool_decoding, BoolDecoding::Truthy);
    assert_eq!(cfg.transport.connect_timeout_ms, 10_000);
    assert_eq!(cfg.transport.ping_interval_ms, 30_000);
    assert_eq!(cfg.transport.read_timeout_ms, 60_000);
    assert_eq!(cfg.transport.write_timeout_ms, 15_000);
    assert_eq!(cfg.transport.outbound_queue, 256);
    assert_eq!(cfg.transport.max_message_bytes, 1024 * 1024);
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
wire:
  prefix: "evt:"
  separator: "|"
  bool_decoding: literal
transport:
  connect_timeout_ms: 2000
  ping_interval_ms: 0
  read_timeout_ms: 0
  write_timeout_ms: 0
  outbound_queue: 8
  max_message_bytes: 0
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    let format = cfg.wire_format().unwrap();
    assert_eq!(format.prefix(), "evt:");
    assert_eq!(format.separator(), '|');
    assert_eq!(format.bool_decoding(), BoolDecoding::Literal);
    assert_eq!(cfg.transport.ping_interval_ms, 0);
    assert_eq!(cfg.transport.read_timeout_ms, 0);
    assert_eq!(cfg.transport.write_timeout_ms, 0);
    assert_eq!(cfg.transport.max_message_bytes, 0);
}

#[test]
fn version_is_required_and_checked() {
    let err = config::load_from_str("wire: {}\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");

    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn bad_wire_format_is_rejected() {
    let err = config::load_from_str("version: 1\nwire:\n  separator: \"a\"\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "INVALID_WIRE_FORMAT");

    let err = config::load_from_str("version: 1\nwire:\n  prefix: \"\"\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "INVALID_WIRE_FORMAT");

    // default separator inside the prefix
    let err = config::load_from_str("version: 1\nwire:\n  prefix: \"a;b:\"\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "INVALID_WIRE_FORMAT");
}

#[test]
fn transport_ranges_are_enforced() {
    for bad in [
        "transport:\n  connect_timeout_ms: 50\n",
        "transport:\n  connect_timeout_ms: 500000\n",
        "transport:\n  ping_interval_ms: 10\n",
        "transport:\n  outbound_queue: 0\n",
        "transport:\n  read_timeout_ms: 500\n",
        "transport:\n  read_timeout_ms: 700000\n",
        "transport:\n  ping_interval_ms: 30000\n  read_timeout_ms: 30000\n",
        "transport:\n  write_timeout_ms: 50\n",
    ] {
        let err = config::load_from_str(&format!("version: 1\n{bad}")).expect_err(bad);
        assert_eq!(err.code().as_str(), "BAD_CONFIG", "{bad}");
    }
}

#[test]
fn read_timeout_without_pings_is_allowed() {
    let cfg = config::load_from_str(
        "version: 1\ntransport:\n  ping_interval_ms: 0\n  read_timeout_ms: 5000\n",
    )
    .expect("must parse");
    assert_eq!(cfg.transport.read_timeout_ms, 5_000);
}

#[test]
fn missing_file_is_bad_config() {
    let err = config::load_from_file("/nonexistent/wsmux.yaml").expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn endpoints_get_a_websocket_scheme() {
    assert_eq!(normalize_endpoint("ws://h/x"), "ws://h/x");
    assert_eq!(normalize_endpoint("wss://h/x"), "wss://h/x");
    assert_eq!(normalize_endpoint("http://h:8080/echo"), "ws://h:8080/echo");
    assert_eq!(normalize_endpoint("https://h/echo"), "wss://h/echo");
    assert_eq!(normalize_endpoint("localhost:8080/echo"), "ws://localhost:8080/echo");
}
