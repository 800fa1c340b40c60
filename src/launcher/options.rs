//! Host process launch options.
//!
//! Controls the command line, environment and transport used to start the
//! host process.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//!
//! use electron_control::launcher::{LaunchOptions, TransportMode};
//!
//! let options = LaunchOptions::new()
//!     .with_arg("main.js")
//!     .with_env("ELECTRON_ENABLE_LOGGING", "1")
//!     .with_transport(TransportMode::socket(Duration::from_secs(10)));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::transport::DEFAULT_CONNECT_TIMEOUT;

// ============================================================================
// TransportMode
// ============================================================================

/// How commands reach the host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Lines over the child's stdin and stdout.
    #[default]
    Stdio,

    /// Lines over a loopback TCP connection the host opens back to us.
    ///
    /// The address is passed in [`ADDR_ENV`](crate::transport::ADDR_ENV).
    Socket {
        /// How long to wait for the host to connect.
        connect_timeout: Duration,
    },
}

impl TransportMode {
    /// Socket transport with the given connect timeout.
    #[inline]
    #[must_use]
    pub const fn socket(connect_timeout: Duration) -> Self {
        Self::Socket { connect_timeout }
    }

    /// Returns `true` for [`TransportMode::Socket`].
    #[inline]
    #[must_use]
    pub const fn is_socket(&self) -> bool {
        matches!(self, Self::Socket { .. })
    }
}

// ============================================================================
// LaunchOptions
// ============================================================================

/// Host process configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Command-line arguments, in order.
    pub args: Vec<OsString>,

    /// Working directory for the host.
    pub current_dir: Option<PathBuf>,

    /// Extra environment variables.
    pub env: Vec<(OsString, OsString)>,

    /// Transport to the host.
    pub transport: TransportMode,
}

// ============================================================================
// Constructors
// ============================================================================

impl LaunchOptions {
    /// Creates options with no arguments and stdio transport.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for the socket transport with the default timeout.
    #[inline]
    #[must_use]
    pub fn socket() -> Self {
        Self {
            transport: TransportMode::socket(DEFAULT_CONNECT_TIMEOUT),
            ..Default::default()
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl LaunchOptions {
    /// Appends one argument.
    #[inline]
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[inline]
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    #[inline]
    #[must_use]
    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Adds an environment variable.
    #[inline]
    #[must_use]
    pub fn with_env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Sets the transport.
    #[inline]
    #[must_use]
    pub fn with_transport(mut self, transport: TransportMode) -> Self {
        self.transport = transport;
        self
    }
}

// ============================================================================
// Command Construction
// ============================================================================

impl LaunchOptions {
    /// Builds the command for `binary`.
    ///
    /// Stdio transport pipes stdin and stdout. Socket transport leaves stdout
    /// to the parent. Stderr is always inherited.
    pub(crate) fn to_command(&self, binary: &Path) -> Command {
        let mut cmd = Command::new(binary);
        cmd.args(&self.args);
        cmd.envs(self.env.iter().map(|(k, v)| (k, v)));

        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        match self.transport {
            TransportMode::Stdio => {
                cmd.stdin(Stdio::piped()).stdout(Stdio::piped());
            }
            TransportMode::Socket { .. } => {
                cmd.stdin(Stdio::null()).stdout(Stdio::inherit());
            }
        }
        cmd.stderr(Stdio::inherit());
        cmd.kill_on_drop(true);

        cmd
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_stdio() {
        let options = LaunchOptions::new();
        assert_eq!(options.transport, TransportMode::Stdio);
        assert!(options.args.is_empty());
        assert!(!options.transport.is_socket());
    }

    #[test]
    fn test_socket_uses_default_timeout() {
        let options = LaunchOptions::socket();
        assert_eq!(
            options.transport,
            TransportMode::Socket {
                connect_timeout: DEFAULT_CONNECT_TIMEOUT
            }
        );
    }

    #[test]
    fn test_args_keep_order() {
        let options = LaunchOptions::new()
            .with_arg("main.js")
            .with_args(["--inspect", "--no-sandbox"]);

        let args: Vec<_> = options.args.iter().filter_map(|a| a.to_str()).collect();
        assert_eq!(args, vec!["main.js", "--inspect", "--no-sandbox"]);
    }

    #[test]
    fn test_command_carries_configuration() {
        let options = LaunchOptions::new()
            .with_arg("main.js")
            .with_env("MODE", "test")
            .with_current_dir("/tmp");

        let cmd = options.to_command(Path::new("/usr/bin/electron"));
        let std_cmd = cmd.as_std();

        assert_eq!(std_cmd.get_program(), "/usr/bin/electron");
        assert_eq!(std_cmd.get_args().collect::<Vec<_>>(), vec!["main.js"]);
        assert_eq!(std_cmd.get_current_dir(), Some(Path::new("/tmp")));
        assert!(
            std_cmd
                .get_envs()
                .any(|(k, v)| k == "MODE" && v == Some(std::ffi::OsStr::new("test")))
        );
    }
}
