//! Test double for [`HealthReporter`] that records structured events for assertions.

use std::sync::Mutex;

use scribe_config::{Config, TransportMode};
use scribe_protocol::TaskResult;

use crate::backend::{BackendKind, BackendStartupError};
use crate::bootstrap::BootstrapError;
use crate::dispatch::TaskError;
use crate::health::HealthReporter;
use crate::session::SessionOutcome;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// Backend built successfully.
    BackendReady(BackendKind),
    /// Backend could not be built.
    BackendFailed(BackendKind),
    /// Session began on a transport.
    SessionStarted(TransportMode),
    /// Task answered with a status code.
    TaskAnswered { ordinal: usize, code: i32 },
    /// Task failed.
    TaskFailed { ordinal: usize },
    /// Session ended.
    SessionFinished { outcome: SessionOutcome, tasks: usize },
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn backend_ready(&self, kind: BackendKind) {
        self.record(HealthEvent::BackendReady(kind));
    }

    fn backend_failed(&self, error: &BackendStartupError) {
        self.record(HealthEvent::BackendFailed(error.kind));
    }

    fn session_started(&self, transport: TransportMode) {
        self.record(HealthEvent::SessionStarted(transport));
    }

    fn task_answered(&self, ordinal: usize, result: &TaskResult) {
        self.record(HealthEvent::TaskAnswered {
            ordinal,
            code: result.code.code(),
        });
    }

    fn task_failed(&self, ordinal: usize, _error: &TaskError) {
        self.record(HealthEvent::TaskFailed { ordinal });
    }

    fn session_finished(&self, outcome: SessionOutcome, tasks: usize) {
        self.record(HealthEvent::SessionFinished { outcome, tasks });
    }
}
