//! Worker bootstrap orchestration.

use std::fmt;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use scribe_config::{Config, ConfigError};
use thiserror::Error;
use tracing::debug;

use crate::backend::{Backend, BackendProvider, BackendStartupError};
use crate::codec::TaskCodec;
use crate::dispatch::Dispatcher;
use crate::health::HealthReporter;
use crate::heartbeat::HeartbeatSettings;
use crate::session::SessionLoop;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::FrameLimits;

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Exit status for an unusable invocation or configuration.
pub const EXIT_USAGE: u8 = 64;
/// Exit status for a failure to set up the worker.
pub const EXIT_SETUP: u8 = 70;

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the worker configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader error when no configuration can be resolved.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`OrthoConfig::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that always yields the same configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps a resolved configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Configuration loaded but holds unusable values.
    #[error("invalid configuration: {source}")]
    InvalidConfiguration {
        /// Offending field and constraint.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The configured backend could not be built.
    #[error("failed to build backend: {source}")]
    Backend {
        /// Underlying backend error.
        #[source]
        source: BackendStartupError,
    },
}

impl BootstrapError {
    /// Process exit status for this failure.
    #[must_use]
    pub const fn exit_status(&self) -> u8 {
        match self {
            Self::Configuration { .. } | Self::InvalidConfiguration { .. } => EXIT_USAGE,
            Self::Telemetry { .. } | Self::Backend { .. } => EXIT_SETUP,
        }
    }
}

/// Result of a successful bootstrap: configuration plus a ready backend.
pub struct Worker {
    config: Config,
    backend: Box<dyn Backend>,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl fmt::Debug for Worker {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Worker")
            .field("config", &self.config)
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}

impl Worker {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Consumes the worker and builds the session loop for its transport.
    #[must_use]
    pub fn into_session(self) -> SessionLoop<Box<dyn Backend>> {
        let dispatcher = Dispatcher::new(self.backend, HeartbeatSettings::from_config(&self.config));
        SessionLoop::new(
            dispatcher,
            TaskCodec::for_transport(&self.config),
            FrameLimits::from_config(&self.config),
            self.config.max_connections,
            self.reporter,
        )
    }
}

/// Bootstraps the worker using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration, telemetry or backend
/// construction fails. The reporter is told about every failure.
pub fn bootstrap_with<P>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    provider: &P,
) -> Result<Worker, BootstrapError>
where
    P: BackendProvider + ?Sized,
{
    reporter.bootstrap_starting();

    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })
        .and_then(|config| {
            config
                .validate()
                .map(|()| config)
                .map_err(|source| BootstrapError::InvalidConfiguration { source })
        });
    let config = match config {
        Ok(config) => config,
        Err(error) => {
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => {
            debug!(target: BOOTSTRAP_TARGET, format = %handle.format(), "telemetry ready");
            handle
        }
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let backend = match provider.build(config.backend, &config) {
        Ok(backend) => {
            reporter.backend_ready(config.backend);
            backend
        }
        Err(source) => {
            reporter.backend_failed(&source);
            let error = BootstrapError::Backend { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    reporter.bootstrap_succeeded(&config);
    Ok(Worker {
        config,
        backend,
        telemetry,
        reporter,
    })
}
