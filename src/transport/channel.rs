//! Duplex byte channel to the host process.
//!
//! A [`Channel`] is a read side, a write side, and optionally the child
//! process behind them. It is consumed by [`Router::new`](super::Router::new).

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::process::Child;
use tracing::{debug, info};

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Boxed read side of a channel.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Boxed write side of a channel.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

// ============================================================================
// ProcessGuard
// ============================================================================

/// Guards a child process and ensures it is killed when dropped.
pub(crate) struct ProcessGuard {
    /// The child process handle.
    child: Option<Child>,
    /// Process ID for logging.
    pid: u32,
}

impl ProcessGuard {
    /// Creates a new process guard.
    fn new(child: Child) -> Self {
        let pid = child.id().unwrap_or(0);
        debug!(pid, "Process guard created");
        Self {
            child: Some(child),
            pid,
        }
    }

    /// Kills the process and waits for it to exit.
    pub(crate) async fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!(pid = self.pid, "Killing host process");
            if let Err(e) = child.kill().await {
                debug!(pid = self.pid, error = %e, "Failed to kill process");
            }
            info!(pid = self.pid, "Host process terminated");
        }
    }

    /// Returns the process ID.
    #[inline]
    pub(crate) fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take()
            && let Err(e) = child.start_kill()
        {
            debug!(pid = self.pid, error = %e, "Failed to send kill signal in Drop");
        }
    }
}

// ============================================================================
// Channel
// ============================================================================

/// A duplex byte channel, optionally owning the process behind it.
pub struct Channel {
    reader: BoxedReader,
    writer: BoxedWriter,
    process: Option<ProcessGuard>,
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("pid", &self.process.as_ref().map(ProcessGuard::pid))
            .finish_non_exhaustive()
    }
}

impl Channel {
    /// Creates a channel from any read/write pair.
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
            process: None,
        }
    }

    /// Creates a channel over a child's stdin/stdout and takes ownership of it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the child was spawned without piped stdio.
    pub fn from_child_stdio(mut child: Child) -> Result<Self> {
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::config("host process stdin is not piped"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::config("host process stdout is not piped"))?;

        Ok(Self::new(stdout, stdin).with_process(child))
    }

    /// Creates a channel over a connected stream socket.
    pub fn from_tcp(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self::new(read_half, write_half)
    }

    /// Attaches the process whose lifecycle this channel owns.
    #[must_use]
    pub fn with_process(mut self, child: Child) -> Self {
        self.process = Some(ProcessGuard::new(child));
        self
    }

    /// Returns the owned process ID, if any.
    #[inline]
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().map(ProcessGuard::pid)
    }

    /// Splits the channel into its parts.
    pub(crate) fn into_parts(self) -> (BoxedReader, BoxedWriter, Option<ProcessGuard>) {
        (self.reader, self.writer, self.process)
    }
}

// ============================================================================
// Tests
// ============================================================================
