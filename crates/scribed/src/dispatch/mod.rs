//! Per-task orchestration around a single backend.
//!
//! The dispatcher owns the backend for the lifetime of a session. For each
//! decoded request it re-checks the source directory, keeps the channel
//! alive with a heartbeat when one is requested, runs the backend and turns
//! the report into a [`TaskResult`](scribe_protocol::TaskResult).

mod dispatcher;
mod errors;

pub use self::dispatcher::Dispatcher;
pub use self::errors::TaskError;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
