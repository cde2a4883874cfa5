//! Shared configuration for the transcription worker.
//!
//! Values are layered by `ortho_config`: built-in defaults, then an optional
//! configuration file, then `SCRIBE_*` environment variables, then command
//! line flags. The resolved [`Config`] is built once at process start and
//! handed to each component by reference.

mod backend;
mod defaults;
mod endpoint;
mod modes;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use backend::{BackendKind, BackendKindParseError};
pub use defaults::{
    BASIC_PITCH_COMMAND, BASIC_PITCH_OUTPUT_SUFFIX, DEFAULT_CHUNK_SIZE, DEFAULT_DATA_PREFIX,
    DEFAULT_HEARTBEAT_INTERVAL_MS, DEFAULT_HOST, DEFAULT_KEEP_ALIVE_MARKER, DEFAULT_LOG_FILTER,
    DEFAULT_MAX_CONNECTIONS, DEFAULT_MAX_REQUEST_BYTES, DEFAULT_MESSAGE_POSTFIX,
    DEFAULT_READY_MESSAGE, DEFAULT_SOURCE_EXTENSION, DEFAULT_TCP_PORT, HEARTBEAT_JOIN_GRACE_MS,
    default_backend, default_instruments, default_log_format,
    default_transport,
};
pub use endpoint::{EndpointError, TcpEndpoint};
pub use modes::{InstrumentsMode, LogFormat, ModeParseError, TransportMode};

/// Resolved worker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SCRIBE")]
pub struct Config {
    /// Channel tasks arrive on.
    #[serde(default = "default_transport")]
    pub transport: TransportMode,
    /// Host the socket transport binds to.
    #[serde(default = "serde_defaults::host")]
    pub host: String,
    /// Port the socket transport binds to.
    #[serde(default = "serde_defaults::port")]
    pub port: u16,
    /// Connections accepted before a socket session ends; also the backlog.
    #[serde(default = "serde_defaults::max_connections")]
    pub max_connections: usize,
    /// Largest request frame accepted, in bytes.
    #[serde(default = "serde_defaults::max_request_bytes")]
    pub max_request_bytes: usize,
    /// Size of each socket read.
    #[serde(default = "serde_defaults::chunk_size")]
    pub chunk_size: usize,
    /// Delay between keep-alive markers, in milliseconds.
    #[serde(default = "serde_defaults::heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// Keep-alive marker written while a backend runs.
    #[serde(default = "serde_defaults::keep_alive_marker")]
    pub keep_alive_marker: String,
    /// Line printed to stdout once the listener is bound.
    #[serde(default = "serde_defaults::ready_message")]
    pub ready_message: String,
    /// Marker opening a stdio result line.
    #[serde(default = "serde_defaults::data_prefix")]
    pub data_prefix: String,
    /// Marker closing a stdio result line.
    #[serde(default = "serde_defaults::message_postfix")]
    pub message_postfix: String,
    /// Backend used to transcribe source directories.
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    /// Command template for the `command` backend.
    #[serde(default = "serde_defaults::backend_command")]
    pub backend_command: String,
    /// Extension of the source files a backend transcribes.
    #[serde(default = "serde_defaults::source_extension")]
    pub source_extension: String,
    /// Suffix appended to a source file stem to name its artefact.
    #[serde(default = "serde_defaults::output_suffix")]
    pub output_suffix: String,
    /// Instrument handling forwarded to the backend.
    #[serde(default = "default_instruments")]
    pub instruments: InstrumentsMode,
    /// Tracing filter expression.
    #[serde(default = "serde_defaults::log_filter")]
    pub log_filter: String,
    /// Tracing output format.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

mod serde_defaults {
    use crate::defaults;

    pub(super) fn host() -> String {
        defaults::DEFAULT_HOST.to_owned()
    }

    pub(super) const fn port() -> u16 {
        defaults::DEFAULT_TCP_PORT
    }

    pub(super) const fn max_connections() -> usize {
        defaults::DEFAULT_MAX_CONNECTIONS
    }

    pub(super) const fn max_request_bytes() -> usize {
        defaults::DEFAULT_MAX_REQUEST_BYTES
    }

    pub(super) const fn chunk_size() -> usize {
        defaults::DEFAULT_CHUNK_SIZE
    }

    pub(super) const fn heartbeat_interval_ms() -> u64 {
        defaults::DEFAULT_HEARTBEAT_INTERVAL_MS
    }

    pub(super) fn keep_alive_marker() -> String {
        defaults::DEFAULT_KEEP_ALIVE_MARKER.to_owned()
    }

    pub(super) fn ready_message() -> String {
        defaults::DEFAULT_READY_MESSAGE.to_owned()
    }

    pub(super) fn data_prefix() -> String {
        defaults::DEFAULT_DATA_PREFIX.to_owned()
    }

    pub(super) fn message_postfix() -> String {
        defaults::DEFAULT_MESSAGE_POSTFIX.to_owned()
    }

    pub(super) fn backend_command() -> String {
        defaults::BASIC_PITCH_COMMAND.to_owned()
    }

    pub(super) fn source_extension() -> String {
        defaults::DEFAULT_SOURCE_EXTENSION.to_owned()
    }

    pub(super) fn output_suffix() -> String {
        defaults::BASIC_PITCH_OUTPUT_SUFFIX.to_owned()
    }

    pub(super) fn log_filter() -> String {
        defaults::DEFAULT_LOG_FILTER.to_owned()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            host: serde_defaults::host(),
            port: serde_defaults::port(),
            max_connections: serde_defaults::max_connections(),
            max_request_bytes: serde_defaults::max_request_bytes(),
            chunk_size: serde_defaults::chunk_size(),
            heartbeat_interval_ms: serde_defaults::heartbeat_interval_ms(),
            keep_alive_marker: serde_defaults::keep_alive_marker(),
            ready_message: serde_defaults::ready_message(),
            data_prefix: serde_defaults::data_prefix(),
            message_postfix: serde_defaults::message_postfix(),
            backend: default_backend(),
            backend_command: serde_defaults::backend_command(),
            source_extension: serde_defaults::source_extension(),
            output_suffix: serde_defaults::output_suffix(),
            instruments: default_instruments(),
            log_filter: serde_defaults::log_filter(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Address the socket transport binds to.
    #[must_use]
    pub fn endpoint(&self) -> TcpEndpoint {
        TcpEndpoint::new(self.host.clone(), self.port)
    }

    /// Delay between keep-alive markers.
    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Upper bound on how long stopping the heartbeat may block.
    #[must_use]
    pub const fn heartbeat_join_timeout(&self) -> Duration {
        Duration::from_millis(
            self.heartbeat_interval_ms
                .saturating_add(HEARTBEAT_JOIN_GRACE_MS),
        )
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Tracing output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Rejects values no component can work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, bool, &'static str); 8] = [
            ("max_connections", self.max_connections == 0, "must be at least 1"),
            ("max_request_bytes", self.max_request_bytes == 0, "must be at least 1"),
            ("chunk_size", self.chunk_size == 0, "must be at least 1"),
            (
                "chunk_size",
                self.chunk_size > self.max_request_bytes,
                "must not exceed max_request_bytes",
            ),
            ("heartbeat_interval_ms", self.heartbeat_interval_ms == 0, "must be at least 1"),
            ("data_prefix", self.data_prefix.is_empty(), "must not be empty"),
            ("message_postfix", self.message_postfix.is_empty(), "must not be empty"),
            ("source_extension", self.source_extension.trim().is_empty(), "must not be empty"),
        ];
        match checks.into_iter().find(|(_, failed, _)| *failed) {
            Some((field, _, reason)) => Err(ConfigError::Invalid { field, reason }),
            None => Ok(()),
        }
    }
}

/// Errors raised by [`Config::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A field holds a value outside its accepted range.
    #[error("invalid configuration value for {field}: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// What the field must satisfy.
        reason: &'static str,
    },
}
