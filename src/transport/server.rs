//! Connect-back listener for hosts whose stdio is unusable.
//!
//! # Connection Flow
//!
//! 1. Rust binds a listener to `127.0.0.1:0` (random port)
//! 2. The host is launched with the address in [`ADDR_ENV`]
//! 3. The host connects back
//! 4. The accepted stream becomes the [`Channel`]

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::Channel;

// ============================================================================
// Constants
// ============================================================================

/// Environment variable carrying the connect-back address to the host.
pub const ADDR_ENV: &str = "ELECTRON_CONTROL_ADDR";

/// Default wait for the host to connect.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// PendingServer
// ============================================================================

/// A listener that is bound but not yet connected.
///
/// # Example
///
/// ```ignore
/// use electron_control::transport::PendingServer;
///
/// let server = PendingServer::bind_local().await?;
/// let addr = server.addr_string();
///
/// // Launch host with ELECTRON_CONTROL_ADDR=addr ...
///
/// let channel = server.accept(DEFAULT_CONNECT_TIMEOUT).await?;
/// ```
pub struct PendingServer {
    /// TCP listener for the incoming connection.
    listener: TcpListener,
    /// Port the server is bound to.
    port: u16,
}

impl PendingServer {
    /// Binds to the specified address and port.
    ///
    /// Use port 0 to let the OS assign a random available port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(ip: IpAddr, port: u16) -> Result<Self> {
        let addr = SocketAddr::new(ip, port);
        let listener = TcpListener::bind(addr).await?;
        let actual_port = listener.local_addr()?.port();

        debug!(port = actual_port, "Connect-back listener bound");

        Ok(Self {
            listener,
            port: actual_port,
        })
    }

    /// Binds to a random loopback port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind_local() -> Result<Self> {
        Self::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).await
    }

    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the local socket address.
    #[inline]
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), self.port)
    }

    /// Returns the address handed to the host, `127.0.0.1:{port}`.
    #[inline]
    #[must_use]
    pub fn addr_string(&self) -> String {
        self.local_addr().to_string()
    }

    /// Waits for the host to connect.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if nothing connects within `wait`
    /// - [`Error::Io`] if accepting fails
    pub async fn accept(self, wait: Duration) -> Result<Channel> {
        let (stream, addr) = timeout(wait, self.listener.accept())
            .await
            .map_err(|_| Error::connection_timeout(wait.as_millis() as u64))??;

        stream.set_nodelay(true)?;
        info!(?addr, port = self.port, "Host connected");

        Ok(Channel::from_tcp(stream))
    }
}

// ============================================================================
// Tests
// ============================================================================
