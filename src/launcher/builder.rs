//! Builder pattern for launcher configuration.
//!
//! Provides a fluent API for configuring and creating [`Launcher`] instances.
//!
//! # Example
//!
//! ```no_run
//! use electron_control::Launcher;
//!
//! # fn example() -> electron_control::Result<()> {
//! let launcher = Launcher::builder()
//!     .binary("./node_modules/.bin/electron")
//!     .arg("host/main.js")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::core::Launcher;
use super::options::{LaunchOptions, TransportMode};

// ============================================================================
// LauncherBuilder
// ============================================================================

/// Builder for configuring a [`Launcher`] instance.
///
/// Use [`Launcher::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct LauncherBuilder {
    /// Path or name of the host executable.
    binary: Option<PathBuf>,
    /// Command line, environment and transport.
    options: LaunchOptions,
}

// ============================================================================
// LauncherBuilder Implementation
// ============================================================================

impl LauncherBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host executable.
    ///
    /// A bare name such as `"electron"` is looked up in `PATH` at launch.
    #[inline]
    #[must_use]
    pub fn binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = Some(path.into());
        self
    }

    /// Appends one argument.
    #[inline]
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.options = self.options.with_arg(arg);
        self
    }

    /// Appends several arguments.
    #[inline]
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.options = self.options.with_args(args);
        self
    }

    /// Sets the host's working directory.
    #[inline]
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options = self.options.with_current_dir(dir);
        self
    }

    /// Adds an environment variable for the host.
    #[inline]
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.options = self.options.with_env(key, value);
        self
    }

    /// Sets the transport. Defaults to [`TransportMode::Stdio`].
    #[inline]
    #[must_use]
    pub fn transport(mut self, transport: TransportMode) -> Self {
        self.options = self.options.with_transport(transport);
        self
    }

    /// Replaces all launch options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: LaunchOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the launcher with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no binary is set
    /// - [`Error::HostNotFound`] if an explicit binary path doesn't exist
    pub fn build(self) -> Result<Launcher> {
        let binary = self.validate_binary()?;
        Ok(Launcher::new(binary, self.options))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl LauncherBuilder {
    /// Validates the binary configuration.
    fn validate_binary(&self) -> Result<PathBuf> {
        let binary = self.binary.clone().ok_or_else(|| {
            Error::config(
                "Host binary is required. Use .binary() to set it.\n\
                 Example: Launcher::builder().binary(\"electron\")",
            )
        })?;

        if binary.as_os_str().is_empty() {
            return Err(Error::config("Host binary must not be empty"));
        }

        if is_explicit_path(&binary) && !binary.exists() {
            return Err(Error::host_not_found(&binary));
        }

        Ok(binary)
    }
}

/// Returns `true` if `path` names a location rather than a `PATH` lookup.
fn is_explicit_path(path: &Path) -> bool {
    path.is_absolute() || path.components().count() > 1
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = LauncherBuilder::new();
        assert!(builder.binary.is_none());
        assert_eq!(builder.options, LaunchOptions::default());
    }

    #[test]
    fn test_binary_sets_path() {
        let builder = LauncherBuilder::new().binary("/usr/bin/electron");
        assert_eq!(builder.binary, Some(PathBuf::from("/usr/bin/electron")));
    }

    #[test]
    fn test_arguments_accumulate() {
        let builder = LauncherBuilder::new()
            .arg("main.js")
            .args(["--a", "--b"])
            .env("KEY", "VALUE")
            .current_dir("/tmp");

        assert_eq!(builder.options.args.len(), 3);
        assert_eq!(builder.options.env.len(), 1);
        assert_eq!(builder.options.current_dir, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_build_fails_without_binary() {
        let err = LauncherBuilder::new().arg("main.js").build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("binary"));
    }

    #[test]
    fn test_build_fails_with_empty_binary() {
        let err = LauncherBuilder::new().binary("").build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_build_fails_with_nonexistent_path() {
        let err = LauncherBuilder::new()
            .binary("/nonexistent/electron")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::HostNotFound { .. }));

        let err = LauncherBuilder::new()
            .binary("./nonexistent/electron")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::HostNotFound { .. }));
    }

    #[test]
    fn test_build_accepts_bare_name() {
        let launcher = LauncherBuilder::new()
            .binary("some-host-on-path")
            .build()
            .expect("bare names are resolved at launch");
        assert_eq!(launcher.binary(), Path::new("some-host-on-path"));
    }

    #[test]
    fn test_transport_selection() {
        let builder = LauncherBuilder::new().transport(TransportMode::socket(
            std::time::Duration::from_secs(2),
        ));
        assert!(builder.options.transport.is_socket());
    }
}
