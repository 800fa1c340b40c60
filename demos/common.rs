//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Logging initialization
//! - Graceful exit handling

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;

use electron_control::{Launcher, LauncherBuilder, TransportMode};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

/// Environment variable overriding the host binary.
pub const HOST_BINARY_ENV: &str = "ELECTRON_HOST_BINARY";

/// Environment variable naming the host entry script.
pub const HOST_SCRIPT_ENV: &str = "ELECTRON_HOST_SCRIPT";

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub no_wait: bool,
    pub socket: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            no_wait: args.iter().any(|a| a == "--no-wait"),
            socket: args.iter().any(|a| a == "--socket"),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Host binary, from the environment or `electron` on `PATH`.
pub fn host_binary() -> PathBuf {
    std::env::var_os(HOST_BINARY_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("electron"))
}

/// Launcher builder configured from the environment and flags.
pub fn launcher(args: &Args) -> LauncherBuilder {
    let mut builder = Launcher::builder().binary(host_binary());
    if let Some(script) = std::env::var_os(HOST_SCRIPT_ENV) {
        builder = builder.arg(script);
    }
    if args.socket {
        builder = builder.transport(TransportMode::socket(
            electron_control::transport::DEFAULT_CONNECT_TIMEOUT,
        ));
    }
    builder
}

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        "electron_control=debug"
    } else {
        "electron_control=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// Wait for Ctrl+C or skip if `--no-wait` flag is set.
pub async fn wait_for_exit(no_wait: bool) {
    if no_wait {
        println!("[--no-wait] Skipping wait");
        return;
    }

    println!("Press Ctrl+C to exit...");
    tokio::signal::ctrl_c().await.ok();
}
