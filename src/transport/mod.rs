//! Transport layer: duplex channel, pump and command router.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                               ┌──────────────────┐
//! │  Session (Rust)  │                               │  Host process    │
//! │                  │   base64(JSON) lines, '\n'    │  (Electron)      │
//! │  Router ─► Pump  │◄─────────────────────────────►│                  │
//! │                  │   stdio pipes or TCP socket   │                  │
//! └──────────────────┘                               └──────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. A [`Channel`] is built from child stdio or from [`PendingServer::accept`]
//! 2. [`Router::new`] spawns the reader and writer loops
//! 3. [`Router::send`] / [`Router::listen`] exchange commands
//! 4. [`Router::close`] stops the loops and kills the owned process
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | Duplex channel and process guard |
//! | `pump` | Reader and writer loops |
//! | `router` | Dispatch table and send queue |
//! | `server` | Connect-back listener |

// ============================================================================
// Imports
// ============================================================================

use tokio::runtime::Handle;

// ============================================================================
// Submodules
// ============================================================================

/// Duplex channel to the host.
pub mod channel;

/// Reader and writer loops.
pub(crate) mod pump;

/// Command router.
pub mod router;

/// Connect-back listener.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::Channel;
pub use router::{CommandHandler, Diagnostic, DiagnosticHook, Router};
pub use server::{ADDR_ENV, DEFAULT_CONNECT_TIMEOUT, PendingServer};

// ============================================================================
// Callback Execution
// ============================================================================

/// Runs a user callback off the reader task.
///
/// Uses the blocking pool when a runtime is available, otherwise runs inline.
pub(crate) fn run_detached(task: impl FnOnce() + Send + 'static) {
    match Handle::try_current() {
        Ok(handle) => {
            // Detached; the callback's outcome is not observed.
            drop(handle.spawn_blocking(task));
        }
        Err(_) => task(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::mpsc;

    #[test]
    fn test_run_detached_without_runtime_runs_inline() {
        let (tx, rx) = mpsc::channel();
        run_detached(move || tx.send(42).unwrap());
        assert_eq!(rx.try_recv().unwrap(), 42);
    }

    #[tokio::test]
    async fn test_run_detached_uses_blocking_pool() {
        let caller = std::thread::current().id();
        let (tx, rx) = tokio::sync::oneshot::channel();
        run_detached(move || {
            let _ = tx.send(std::thread::current().id());
        });

        assert_ne!(rx.await.unwrap(), caller);
    }
}
