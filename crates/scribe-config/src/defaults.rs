use crate::backend::BackendKind;
use crate::modes::{InstrumentsMode, LogFormat, TransportMode};

/// Default host the socket transport binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default TCP port for the socket transport.
pub const DEFAULT_TCP_PORT: u16 = 9787;

/// Default number of connections accepted in one socket session. Also used as
/// the listen backlog.
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

/// Default ceiling for one request frame (directory path, metadata and an
/// optional base64 payload).
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 64 * 1024 * 1024;

/// Default read size for socket frames.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Default delay between keep-alive markers, in milliseconds.
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 5_000;

/// Extra time granted to the heartbeat thread on top of one interval when
/// it is being stopped.
pub const HEARTBEAT_JOIN_GRACE_MS: u64 = 1_000;

/// Default keep-alive marker written on the socket transport.
pub const DEFAULT_KEEP_ALIVE_MARKER: &str = "KEEP_ALIVE";

/// Default line printed to stdout once the listener is bound.
pub const DEFAULT_READY_MESSAGE: &str = "SCRIBE_WORKER_READY";

/// Default marker opening a result line on the stdio transport.
pub const DEFAULT_DATA_PREFIX: &str = "<<SCRIBE_DATA>>";

/// Default marker closing a result line on the stdio transport.
pub const DEFAULT_MESSAGE_POSTFIX: &str = "<<SCRIBE_END>>";

/// Command template used by the `basic-pitch` backend.
pub const BASIC_PITCH_COMMAND: &str = "basic-pitch {output_dir} {input}";

/// Artefact suffix produced by the `basic-pitch` command line tool.
pub const BASIC_PITCH_OUTPUT_SUFFIX: &str = "_basic_pitch.mid";

/// Default source file extension the command backends transcribe.
pub const DEFAULT_SOURCE_EXTENSION: &str = "wav";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default logging format for the binaries.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default transport; the stdio channel is what controllers spawn by default.
#[must_use]
pub fn default_transport() -> TransportMode {
    TransportMode::Stdio
}

/// Default backend selection.
#[must_use]
pub fn default_backend() -> BackendKind {
    BackendKind::BasicPitch
}

/// Default instrument handling passed to backends.
#[must_use]
pub fn default_instruments() -> InstrumentsMode {
    InstrumentsMode::Many
}
