//! Electron Control - drive a GUI host process over a command channel.
//!
//! This library launches an Electron-style host process and controls its
//! windows with line-framed commands over the host's stdio or a loopback
//! socket.
//!
//! # Architecture
//!
//! The crate follows a layered model:
//!
//! - **Transport**: newline-delimited `base64(JSON)` envelopes, one reader
//!   and one writer task per channel
//! - **Router**: resolves the command ID of each inbound envelope
//! - **Session**: resolves the window ID and owns the window registry
//! - **Window**: resolves the event ID and runs user callbacks
//!
//! Key design principles:
//!
//! - Each [`Session`] owns one host process and one channel
//! - Create and load are request/response, correlated by a per-request ID
//! - Windows are destroyed either locally or by the host, never twice
//! - Malformed input is dropped, never fatal
//!
//! # Quick Start
//!
//! ```no_run
//! use electron_control::{Launcher, Result, WindowOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Launcher::builder()
//!         .binary("electron")
//!         .arg("host/main.js")
//!         .build()?
//!         .launch()
//!         .await?;
//!
//!     let window = session
//!         .create_window(&WindowOptions::new().with_size(800, 600).with_title("Hello"))
//!         .await?;
//!
//!     window.listen("clicked", |payload| {
//!         println!("clicked: {}", String::from_utf8_lossy(&payload));
//!     })?;
//!     window.load_url("https://example.com").await?;
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`launcher`] | Host process configuration and spawning |
//! | [`shell`] | [`Session`], [`Window`] and [`WindowOptions`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire envelope, framing and command vocabulary |
//! | [`transport`] | Channel, pump and command router |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for sessions, windows and requests.
pub mod identifiers;

/// Host process launcher.
///
/// Use [`Launcher::builder()`] to configure and start a host.
pub mod launcher;

/// Wire envelope, line framing and command vocabulary.
pub mod protocol;

/// Sessions, windows and window options.
pub mod shell;

/// Channel, pump and command router.
pub mod transport;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Launcher types
pub use launcher::{LaunchOptions, Launcher, LauncherBuilder, TransportMode};

// Shell types
pub use shell::{CREATE_TIMEOUT, LOAD_TIMEOUT, Session, Window, WindowOptions};

// Transport types
pub use protocol::Envelope;
pub use transport::{Channel, CommandHandler, Diagnostic, Router};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{RequestId, SessionId, WindowId};
