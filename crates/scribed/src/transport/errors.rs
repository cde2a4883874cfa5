//! Error types for framing and listener operations.

use std::io;
use std::net::SocketAddr;

use scribe_config::EndpointError;
use thiserror::Error;

/// Errors raised while reading one request frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame exceeded the configured ceiling.
    #[error("request frame exceeds {limit} bytes")]
    TooLarge {
        /// Configured ceiling in bytes.
        limit: usize,
    },
    /// The channel failed before the frame was complete.
    #[error("request frame truncated after {received} bytes: {source}")]
    Truncated {
        /// Bytes received before the failure.
        received: usize,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Errors surfaced while binding or running the task listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The configured endpoint could not be resolved.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    /// Creating, configuring or binding the socket failed.
    #[error("failed to bind TCP listener at {addr}: {source}")]
    BindTcp {
        /// Address the bind was attempted on.
        addr: SocketAddr,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Switching the listener to non-blocking mode failed.
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The bound address could not be queried.
    #[error("failed to read listener address: {source}")]
    LocalAddr {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
