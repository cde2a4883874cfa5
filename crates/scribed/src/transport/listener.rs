//! TCP listener for the socket channel.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use scribe_config::TcpEndpoint;
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info};

use super::{ListenerError, TRANSPORT_TARGET};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Result of waiting for the next connection.
#[derive(Debug)]
pub enum AcceptOutcome {
    /// A client connected.
    Connection(TcpStream, SocketAddr),
    /// The accept call failed; the attempt still counts.
    Failed(io::Error),
    /// The shutdown flag was raised while waiting.
    Shutdown,
}

/// Listener bound to the configured TCP endpoint.
#[derive(Debug)]
pub struct TaskListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TaskListener {
    /// Resolves and binds `endpoint` with the given listen backlog.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when resolution, binding or switching to
    /// non-blocking mode fails.
    pub fn bind(endpoint: &TcpEndpoint, backlog: usize) -> Result<Self, ListenerError> {
        let addr = endpoint.resolve()?;
        let bind_error = |source: io::Error| ListenerError::BindTcp { addr, source };
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .map_err(bind_error)?;
        socket.set_reuse_address(true).map_err(bind_error)?;
        socket.bind(&addr.into()).map_err(bind_error)?;
        socket
            .listen(i32::try_from(backlog).unwrap_or(i32::MAX))
            .map_err(bind_error)?;
        let listener: TcpListener = socket.into();
        listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::NonBlocking { source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenerError::LocalAddr { source })?;
        info!(
            target: TRANSPORT_TARGET,
            endpoint = %endpoint,
            local_addr = %local_addr,
            backlog,
            "socket listener bound"
        );
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Address the listener is bound to; reflects the chosen port when the
    /// configured port was `0`.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the next connection, polling `shutdown` between attempts.
    ///
    /// Accepted streams are switched back to blocking mode.
    pub fn accept(&self, shutdown: &AtomicBool) -> AcceptOutcome {
        loop {
            if shutdown.load(Ordering::SeqCst) {
                return AcceptOutcome::Shutdown;
            }
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if let Err(error) = stream.set_nonblocking(false) {
                        return AcceptOutcome::Failed(error);
                    }
                    debug!(target: TRANSPORT_TARGET, peer = %peer, "connection accepted");
                    return AcceptOutcome::Connection(stream, peer);
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_BACKOFF);
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => {
                    thread::sleep(ERROR_BACKOFF);
                    return AcceptOutcome::Failed(error);
                }
            }
        }
    }
}
