use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

use thiserror::Error;

/// TCP address the socket transport listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpEndpoint {
    host: String,
    port: u16,
}

impl TcpEndpoint {
    /// Builds an endpoint from a host name or address and a port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port number; `0` asks the OS for an ephemeral port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Resolves the endpoint to the first IPv4 or IPv6 socket address.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Resolve`] when name resolution fails and
    /// [`EndpointError::ResolveEmpty`] when it yields no addresses.
    pub fn resolve(&self) -> Result<SocketAddr, EndpointError> {
        let mut addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|source| EndpointError::Resolve {
                endpoint: self.to_string(),
                source,
            })?;
        addrs
            .find(|addr| matches!(addr, SocketAddr::V4(_) | SocketAddr::V6(_)))
            .ok_or_else(|| EndpointError::ResolveEmpty {
                endpoint: self.to_string(),
            })
    }
}

impl fmt::Display for TcpEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "tcp://{}:{}", self.host, self.port)
    }
}

/// Errors raised while resolving a [`TcpEndpoint`].
#[derive(Debug, Error)]
pub enum EndpointError {
    /// Name resolution failed.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        /// Endpoint as configured.
        endpoint: String,
        /// Underlying resolver error.
        #[source]
        source: io::Error,
    },
    /// Name resolution succeeded but returned nothing usable.
    #[error("no addresses resolved for {endpoint}")]
    ResolveEmpty {
        /// Endpoint as configured.
        endpoint: String,
    },
}
