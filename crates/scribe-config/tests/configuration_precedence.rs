//! Layering tests for the worker configuration.

use std::ffi::OsString;

use ortho_config::OrthoConfig;
use rstest::rstest;

use scribe_config::{BackendKind, Config, DEFAULT_TCP_PORT, TransportMode};

fn args(values: &[&str]) -> Vec<OsString> {
    std::iter::once("scribed")
        .chain(values.iter().copied())
        .map(OsString::from)
        .collect()
}

#[rstest]
fn cli_flags_override_defaults() {
    let config = Config::load_from_iter(args(&[
        "--transport",
        "socket",
        "--port",
        "7123",
        "--backend",
        "command",
    ]))
    .expect("configuration should load");

    assert_eq!(config.transport, TransportMode::Socket);
    assert_eq!(config.port, 7123);
    assert_eq!(config.backend, BackendKind::Command);
}

#[rstest]
fn unspecified_values_fall_back_to_defaults() {
    let config = Config::load_from_iter(args(&["--max-connections", "3"]))
        .expect("configuration should load");

    assert_eq!(config.max_connections, 3);
    assert_eq!(config.port, DEFAULT_TCP_PORT);
    assert_eq!(config.transport, TransportMode::Stdio);
}

#[rstest]
fn unknown_transport_fails_fast() {
    let result = Config::load_from_iter(args(&["--transport", "carrier-pigeon"]));
    assert!(result.is_err(), "invalid transport should be rejected");
}
