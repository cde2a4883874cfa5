//! Structured health reporting for worker lifecycle events.

use std::sync::Arc;

use scribe_config::{Config, TransportMode};
use scribe_protocol::TaskResult;

use crate::backend::{BackendKind, BackendStartupError};
use crate::bootstrap::BootstrapError;
use crate::dispatch::TaskError;
use crate::session::SessionOutcome;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before bootstrap begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the configured backend has been built.
    fn backend_ready(&self, kind: BackendKind);

    /// Invoked when the configured backend cannot be built.
    fn backend_failed(&self, error: &BackendStartupError);

    /// Invoked when a session starts serving tasks.
    fn session_started(&self, transport: TransportMode);

    /// Invoked after a task was answered with a result, whatever its status
    /// code. A `Failure` code here still counts against the session.
    fn task_answered(&self, ordinal: usize, result: &TaskResult);

    /// Invoked after a task failed.
    fn task_failed(&self, ordinal: usize, error: &TaskError);

    /// Invoked when a session ends.
    fn session_finished(&self, outcome: SessionOutcome, tasks: usize);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn backend_ready(&self, kind: BackendKind) {
        (**self).backend_ready(kind);
    }

    fn backend_failed(&self, error: &BackendStartupError) {
        (**self).backend_failed(error);
    }

    fn session_started(&self, transport: TransportMode) {
        (**self).session_started(transport);
    }

    fn task_answered(&self, ordinal: usize, result: &TaskResult) {
        (**self).task_answered(ordinal, result);
    }

    fn task_failed(&self, ordinal: usize, error: &TaskError) {
        (**self).task_failed(ordinal, error);
    }

    fn session_finished(&self, outcome: SessionOutcome, tasks: usize) {
        (**self).session_finished(outcome, tasks);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting worker bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            transport = %config.transport,
            backend = %config.backend,
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "worker bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "worker bootstrap failed"
        );
    }

    fn backend_ready(&self, kind: BackendKind) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "backend_ready",
            backend = %kind,
            "backend ready"
        );
    }

    fn backend_failed(&self, error: &BackendStartupError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "backend_failed",
            backend = %error.kind,
            message = %error.message(),
            error = ?error,
            "backend failed to start"
        );
    }

    fn session_started(&self, transport: TransportMode) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_started",
            transport = %transport,
            "session started"
        );
    }

    fn task_answered(&self, ordinal: usize, result: &TaskResult) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "task_answered",
            task = ordinal,
            id = %result.id,
            code = result.code.code(),
            "task answered"
        );
    }

    fn task_failed(&self, ordinal: usize, error: &TaskError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "task_failed",
            task = ordinal,
            id = error.task_id().unwrap_or_default(),
            error = %error,
            "task failed"
        );
    }

    fn session_finished(&self, outcome: SessionOutcome, tasks: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_finished",
            outcome = %outcome,
            tasks,
            "session finished"
        );
    }
}
