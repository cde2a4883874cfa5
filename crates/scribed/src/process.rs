//! Process entry point: bootstrap, bind, announce readiness, serve, exit.

use std::io::{self, BufRead, Write};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use scribe_config::TransportMode;
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use thiserror::Error;
use tracing::info;

use crate::backend::{BackendProvider, SystemBackendProvider};
use crate::bootstrap::{BootstrapError, ConfigLoader, EXIT_SETUP, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::session::SessionOutcome;
use crate::transport::{ListenerError, TaskListener};

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Errors that stop the worker before or instead of running a session.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrapping the worker failed.
    #[error("worker bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[source]
        source: BootstrapError,
    },
    /// The socket listener could not be bound.
    #[error("socket listener failed: {source}")]
    Listener {
        /// Underlying listener error.
        #[source]
        source: ListenerError,
    },
    /// Installing the shutdown signal flags failed.
    #[error("failed to install signal handlers: {source}")]
    Signals {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The readiness line could not be written.
    #[error("failed to announce readiness: {source}")]
    Ready {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    /// Process exit status for this failure.
    #[must_use]
    pub const fn exit_status(&self) -> u8 {
        match self {
            Self::Bootstrap { source } => source.exit_status(),
            Self::Listener { .. } | Self::Signals { .. } | Self::Ready { .. } => EXIT_SETUP,
        }
    }
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<ListenerError> for LaunchError {
    fn from(source: ListenerError) -> Self {
        Self::Listener { source }
    }
}

/// Runs the worker using the production collaborators and maps the result
/// to a process exit code.
#[must_use]
pub fn run_worker() -> ExitCode {
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    let result = run_worker_with(
        &SystemConfigLoader,
        reporter,
        &SystemBackendProvider,
        io::stdin().lock(),
        io::stdout(),
    );
    match result {
        Ok(outcome) => {
            info!(target: PROCESS_TARGET, outcome = %outcome, "worker exiting");
            outcome.into()
        }
        Err(error) => {
            // Telemetry may not be installed yet, so write the cause directly.
            drop(writeln!(io::stderr(), "scribed: {error}"));
            ExitCode::from(error.exit_status())
        }
    }
}

/// Runs the worker with injected collaborators.
///
/// `input` is read only by the stdio transport. `output` receives results in
/// stdio mode and the readiness line in socket mode.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, binding, signal installation or
/// the readiness announcement fails. Per-task failures never surface here.
pub fn run_worker_with<P, R, W>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    provider: &P,
    input: R,
    mut output: W,
) -> Result<SessionOutcome, LaunchError>
where
    P: BackendProvider + ?Sized,
    R: BufRead,
    W: Write + Send + 'static,
{
    let worker = bootstrap_with(loader, reporter, provider)?;
    let config = worker.config().clone();
    match config.transport {
        TransportMode::Socket => {
            let listener = TaskListener::bind(&config.endpoint(), config.max_connections)?;
            let shutdown = install_shutdown_flag()?;
            announce_ready(&mut output, &config.ready_message, listener.local_addr())
                .map_err(|source| LaunchError::Ready { source })?;
            Ok(worker.into_session().run_socket(&listener, &shutdown))
        }
        TransportMode::Stdio => Ok(worker.into_session().run_lines(input, output)),
    }
}

fn install_shutdown_flag() -> Result<Arc<AtomicBool>, LaunchError> {
    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&shutdown))
            .map_err(|source| LaunchError::Signals { source })?;
    }
    Ok(shutdown)
}

fn announce_ready(output: &mut dyn Write, message: &str, addr: SocketAddr) -> io::Result<()> {
    writeln!(output, "{message} on host {} and port {}", addr.ip(), addr.port())?;
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn readiness_line_names_host_and_port() {
        let mut buffer = Vec::new();
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4321);
        announce_ready(&mut buffer, "READY", addr).expect("announce");
        assert_eq!(buffer, b"READY on host 127.0.0.1 and port 4321\n");
    }
}
