use scribe_protocol::{TaskRequest, TaskResult};
use tracing::{info, warn};

use crate::backend::Backend;
use crate::codec::validate_source_dir;
use crate::heartbeat::{HeartbeatEmitter, HeartbeatSettings};
use crate::transport::SharedWriter;

use super::{DISPATCH_TARGET, TaskError};

/// Runs decoded tasks through the session's backend, one at a time.
#[derive(Debug)]
pub struct Dispatcher<B> {
    backend: B,
    heartbeat: HeartbeatSettings,
}

impl<B> Dispatcher<B>
where
    B: Backend,
{
    /// Builds a dispatcher owning `backend`.
    pub const fn new(backend: B, heartbeat: HeartbeatSettings) -> Self {
        Self { backend, heartbeat }
    }

    /// Serves one task.
    ///
    /// When `keep_alive` is supplied a heartbeat runs on it for the duration
    /// of the backend call and is stopped before this returns, on success
    /// and on failure alike.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidTarget`] when the directory is no longer
    /// usable (the backend is not invoked) and [`TaskError::Backend`] when
    /// the backend aborts.
    pub fn dispatch(
        &mut self,
        request: &TaskRequest,
        keep_alive: Option<&SharedWriter>,
    ) -> Result<TaskResult, TaskError> {
        validate_source_dir(&request.source_dir).map_err(|source| TaskError::InvalidTarget {
            id: request.id.clone(),
            path: request.source_dir.clone(),
            source,
        })?;

        let emitter = keep_alive.and_then(|sink| self.start_heartbeat(sink));
        let outcome = self.backend.run(&request.source_dir);
        if let Some(emitter) = emitter
            && let Err(error) = emitter.stop()
        {
            warn!(
                target: DISPATCH_TARGET,
                id = %request.id,
                error = %error,
                "heartbeat did not stop cleanly"
            );
        }

        let report = outcome.map_err(|source| TaskError::Backend {
            id: request.id.clone(),
            source,
        })?;
        let code = report.status();
        info!(
            target: DISPATCH_TARGET,
            id = %request.id,
            attempted = report.attempted,
            produced = report.produced.len(),
            code = code.code(),
            "task transcribed"
        );
        Ok(TaskResult::new(request.id.clone(), code, report.produced))
    }

    fn start_heartbeat(&self, sink: &SharedWriter) -> Option<HeartbeatEmitter> {
        match HeartbeatEmitter::start(sink.clone(), self.heartbeat.clone()) {
            Ok(emitter) => Some(emitter),
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    error = %error,
                    "continuing without heartbeat"
                );
                None
            }
        }
    }
}
