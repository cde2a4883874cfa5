use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::AtomicBool;

use scribe_config::TransportMode;
use scribe_protocol::TaskResult;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::dispatch::TaskError;
use crate::transport::{AcceptOutcome, SharedWriter, SocketFrameReader, TaskListener};

use super::{SESSION_TARGET, SessionLoop, SessionOutcome};

impl<B> SessionLoop<B>
where
    B: Backend,
{
    /// Serves one task per accepted connection.
    ///
    /// The loop ends after `max_connections` attempts (failed accepts
    /// included) or as soon as `shutdown` is raised. Every accepted
    /// connection is shut down once its task is finished, whatever the
    /// outcome.
    pub fn run_socket(&mut self, listener: &TaskListener, shutdown: &AtomicBool) -> SessionOutcome {
        self.reporter.session_started(TransportMode::Socket);
        info!(
            target: SESSION_TARGET,
            local_addr = %listener.local_addr(),
            max_connections = self.max_connections,
            "socket session started"
        );
        let mut results = Vec::new();
        for ordinal in 1..=self.max_connections {
            match listener.accept(shutdown) {
                AcceptOutcome::Shutdown => {
                    info!(target: SESSION_TARGET, "shutdown requested; ending session");
                    break;
                }
                AcceptOutcome::Failed(error) => {
                    warn!(
                        target: SESSION_TARGET,
                        task = ordinal,
                        error = %error,
                        "failed to accept connection"
                    );
                    results.push(false);
                }
                AcceptOutcome::Connection(stream, peer) => {
                    let outcome = self.serve_connection(&stream, peer);
                    close_connection(&stream, peer);
                    results.push(self.record(ordinal, &outcome));
                }
            }
        }
        self.finish(&results)
    }

    fn serve_connection(
        &mut self,
        stream: &TcpStream,
        peer: SocketAddr,
    ) -> Result<TaskResult, TaskError> {
        debug!(target: SESSION_TARGET, peer = %peer, "reading request");
        let mut reader = stream;
        let raw = SocketFrameReader::new(self.limits).read(&mut reader)?;
        let writer = stream.try_clone().map_err(|source| TaskError::Send {
            id: String::new(),
            source,
        })?;
        let sink = SharedWriter::new(writer);
        self.serve_frame(&raw, &sink, true)
    }
}

fn close_connection(stream: &TcpStream, peer: SocketAddr) {
    match stream.shutdown(Shutdown::Both) {
        Ok(()) => debug!(target: SESSION_TARGET, peer = %peer, "connection closed"),
        Err(error) if error.kind() == io::ErrorKind::NotConnected => {}
        Err(error) => warn!(
            target: SESSION_TARGET,
            peer = %peer,
            error = %error,
            "failed to close connection"
        ),
    }
}
