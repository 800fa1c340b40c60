//! Host process launcher.
//!
//! The [`Launcher`] starts the host process, connects the transport and
//! returns a ready [`Session`].
//!
//! # Example
//!
//! ```no_run
//! use electron_control::{Launcher, WindowOptions};
//!
//! # async fn example() -> electron_control::Result<()> {
//! let session = Launcher::builder()
//!     .binary("electron")
//!     .arg("host/main.js")
//!     .build()?
//!     .launch()
//!     .await?;
//!
//! let window = session.create_window(&WindowOptions::new()).await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::process::Child;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::shell::Session;
use crate::transport::{ADDR_ENV, Channel, PendingServer};

use super::builder::LauncherBuilder;
use super::options::{LaunchOptions, TransportMode};

// ============================================================================
// Launcher
// ============================================================================

struct LauncherInner {
    binary: PathBuf,
    options: LaunchOptions,
}

/// Validated host launch configuration.
///
/// Cheap to clone. Every [`launch`](Self::launch) starts a new process and
/// returns an independent [`Session`].
#[derive(Clone)]
pub struct Launcher {
    inner: Arc<LauncherInner>,
}

impl fmt::Debug for Launcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Launcher")
            .field("binary", &self.inner.binary)
            .field("transport", &self.inner.options.transport)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Launcher - Public API
// ============================================================================

impl Launcher {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> LauncherBuilder {
        LauncherBuilder::new()
    }

    /// Returns the host executable.
    #[inline]
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.inner.binary
    }

    /// Returns the launch options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &LaunchOptions {
        &self.inner.options
    }

    /// Spawns the host and connects a session to it.
    ///
    /// The process is killed when the session closes or is dropped.
    ///
    /// # Errors
    ///
    /// - [`Error::ProcessLaunchFailed`] if the process fails to spawn
    /// - [`Error::ConnectionTimeout`] if a socket host never connects
    /// - [`Error::Io`] if the connect-back listener cannot bind
    pub async fn launch(&self) -> Result<Session> {
        let channel = match self.inner.options.transport {
            TransportMode::Stdio => {
                let child = self.spawn(None)?;
                Channel::from_child_stdio(child)?
            }
            TransportMode::Socket { connect_timeout } => {
                let server = PendingServer::bind_local().await?;
                let child = self.spawn(Some(&server.addr_string()))?;

                // On failure the child is dropped and killed.
                let channel = server.accept(connect_timeout).await?;
                channel.with_process(child)
            }
        };

        let session = Session::from_channel(channel);
        info!(
            session_id = %session.id(),
            binary = %self.inner.binary.display(),
            "Host launched"
        );
        Ok(session)
    }
}

// ============================================================================
// Launcher - Internal API
// ============================================================================

impl Launcher {
    pub(crate) fn new(binary: PathBuf, options: LaunchOptions) -> Self {
        Self {
            inner: Arc::new(LauncherInner { binary, options }),
        }
    }

    /// Spawns the host process, passing the connect-back address if any.
    fn spawn(&self, connect_addr: Option<&str>) -> Result<Child> {
        let mut cmd = self.inner.options.to_command(&self.inner.binary);
        if let Some(addr) = connect_addr {
            cmd.env(ADDR_ENV, addr);
        }

        let child = cmd.spawn().map_err(Error::process_launch_failed)?;
        debug!(
            pid = child.id(),
            binary = %self.inner.binary.display(),
            args = self.inner.options.args.len(),
            "Host process spawned"
        );
        Ok(child)
    }
}

// ============================================================================
// Tests
// ============================================================================
