//! Transcription worker.
//!
//! `scribed` accepts transcription tasks from a controller, runs each through
//! a backend and answers with a structured result. A task names a directory
//! of source audio; the backend writes one artefact per source into the same
//! directory and the result lists the artefacts it produced.
//!
//! Tasks arrive over one of two channels, chosen by configuration:
//!
//! - **socket**: one task per TCP connection. The client half-closes after
//!   sending its request; the worker writes keep-alive markers while the
//!   backend runs, then the bare JSON result, then closes the connection.
//! - **stdio**: one task per line on stdin, results on stdout wrapped in
//!   configurable markers so they can share the stream with other output.
//!
//! Tasks are served strictly one at a time. Malformed requests, oversized
//! frames and backend failures are confined to their task; the session ends
//! only when the channel is exhausted, the connection budget is spent or a
//! termination signal arrives. The process exit status summarises the
//! session: `0` when every task succeeded, `1` for a mix, `2` when none did.

pub mod backend;
mod bootstrap;
pub mod codec;
pub mod dispatch;
mod health;
pub mod heartbeat;
mod process;
pub mod session;
mod telemetry;
pub mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, EXIT_SETUP, EXIT_USAGE, StaticConfigLoader, SystemConfigLoader,
    Worker, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, run_worker, run_worker_with};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
