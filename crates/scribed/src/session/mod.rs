//! Task loops for the socket and line channels.
//!
//! A session serves tasks strictly one after another and keeps going past
//! any per-task failure. Each task contributes one success flag to the
//! [`SessionOutcome`] returned at the end.

mod lines;
mod outcome;
mod socket;

use std::sync::Arc;

use scribe_protocol::TaskResult;
use tracing::{info, warn};

use crate::backend::Backend;
use crate::codec::TaskCodec;
use crate::dispatch::{Dispatcher, TaskError};
use crate::health::HealthReporter;
use crate::transport::{FrameLimits, SharedWriter};

pub use self::outcome::SessionOutcome;

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Drives a dispatcher over one channel until the channel is exhausted.
pub struct SessionLoop<B> {
    dispatcher: Dispatcher<B>,
    codec: TaskCodec,
    limits: FrameLimits,
    max_connections: usize,
    reporter: Arc<dyn HealthReporter>,
}

impl<B> SessionLoop<B>
where
    B: Backend,
{
    /// Builds a session loop.
    ///
    /// `max_connections` bounds the connection attempts of a socket
    /// session; line sessions ignore it.
    pub fn new(
        dispatcher: Dispatcher<B>,
        codec: TaskCodec,
        limits: FrameLimits,
        max_connections: usize,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            dispatcher,
            codec,
            limits,
            max_connections,
            reporter,
        }
    }

    /// Decodes, dispatches and answers one frame.
    ///
    /// Errors that carry a status code are still answered with a result
    /// bearing that code before being returned.
    fn serve_frame(
        &mut self,
        raw: &[u8],
        sink: &SharedWriter,
        keep_alive: bool,
    ) -> Result<TaskResult, TaskError> {
        let outcome = self.codec.decode(raw).and_then(|request| {
            self.dispatcher
                .dispatch(&request, keep_alive.then_some(sink))
        });
        match outcome {
            Ok(result) => {
                self.send(&result, sink)?;
                Ok(result)
            }
            Err(error) => {
                if let Some(code) = error.status_code() {
                    let reply = TaskResult::rejected(error.task_id().unwrap_or_default(), code);
                    if let Err(send_error) = self.send(&reply, sink) {
                        warn!(
                            target: SESSION_TARGET,
                            error = %send_error,
                            "failed to answer rejected task"
                        );
                    }
                }
                Err(error)
            }
        }
    }

    fn send(&self, result: &TaskResult, sink: &SharedWriter) -> Result<(), TaskError> {
        let bytes = self.codec.encode(result)?;
        sink.write_frame(&bytes)
            .map_err(|source| TaskError::Send {
                id: result.id.clone(),
                source,
            })
    }

    /// Logs and reports a finished task, returning its success flag.
    fn record(&self, ordinal: usize, outcome: &Result<TaskResult, TaskError>) -> bool {
        match outcome {
            Ok(result) => {
                info!(
                    target: SESSION_TARGET,
                    task = ordinal,
                    id = %result.id,
                    code = result.code.code(),
                    artefacts = result.artifact_names.len(),
                    "task answered"
                );
                self.reporter.task_answered(ordinal, result);
                result.code.is_delivered_success()
            }
            Err(error) => {
                warn!(
                    target: SESSION_TARGET,
                    task = ordinal,
                    id = error.task_id().unwrap_or_default(),
                    error = %error,
                    "task failed"
                );
                self.reporter.task_failed(ordinal, error);
                false
            }
        }
    }

    fn finish(&self, results: &[bool]) -> SessionOutcome {
        let outcome = SessionOutcome::from_results(results);
        self.reporter.session_finished(outcome, results.len());
        outcome
    }
}
