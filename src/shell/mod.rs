//! Window lifecycle on top of the command router.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `options` | [`WindowOptions`] builder |
//! | `pending` | Request/response correlation |
//! | `session` | [`Session`] and the window registry |
//! | `window` | [`Window`] handle |
//!
//! # Window States
//!
//! ```text
//! create_window ──response──► open ──close / window_closed──► closed
//!       │
//!       └──timeout──► (nothing registered)
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Submodules
// ============================================================================

/// Window creation options.
pub mod options;

/// Request/response correlation.
pub(crate) mod pending;

/// Session and window registry.
pub mod session;

/// Window handle.
pub mod window;

// ============================================================================
// Re-exports
// ============================================================================

pub use options::WindowOptions;
pub use session::Session;
pub use window::{ClosedCallback, EventCallback, Window};

// ============================================================================
// Constants
// ============================================================================

/// How long [`Session::create_window`] waits for the host.
pub const CREATE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long [`Window::load_url`] waits for the host.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(30);
