//! Host process launcher.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Launcher`] | Spawns the host and returns a connected session |
//! | [`LauncherBuilder`] | Fluent configuration builder |
//! | [`LaunchOptions`] | Command line, environment and transport |
//! | [`TransportMode`] | Stdio pipes or connect-back socket |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for launcher configuration.
pub mod builder;

/// Launcher implementation.
pub mod core;

/// Launch options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::LauncherBuilder;
pub use core::Launcher;
pub use options::{LaunchOptions, TransportMode};
