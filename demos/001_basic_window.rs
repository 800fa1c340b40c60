//! Basic host launch and window lifecycle.
//!
//! Demonstrates:
//! - Launching the host over stdio or a connect-back socket
//! - Creating a window with options
//! - Loading a URL and waiting for completion
//! - Closing the window and the session
//!
//! Usage:
//!   ELECTRON_HOST_SCRIPT=host/main.js cargo run --example 001_basic_window
//!   cargo run --example 001_basic_window -- --no-wait
//!   cargo run --example 001_basic_window -- --socket --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use common::Args;
use electron_control::{Result, WindowOptions};

// ============================================================================
// Constants
// ============================================================================

const START_URL: &str = "https://example.com/";

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== 001: Basic Window ===\n");

    // ========================================================================
    // Launch Host
    // ========================================================================

    println!("[1] Launching host...");
    println!("    Binary:    {}", common::host_binary().display());
    println!("    Transport: {}", if args.socket { "socket" } else { "stdio" });

    let session = common::launcher(&args).build()?.launch().await?;
    println!("    ✓ Session {} ready\n", session.id());

    // ========================================================================
    // Create Window
    // ========================================================================

    println!("[2] Creating window...");

    let options = WindowOptions::new()
        .with_size(1024, 768)
        .with_title("electron-control demo")
        .with_center(true)
        .with_show(true);
    let window = session.create_window(&options).await?;

    println!("    ✓ Window {} created\n", window.id());

    // ========================================================================
    // Load URL
    // ========================================================================

    println!("[3] Loading {START_URL}...");
    window.load_url(START_URL).await?;
    println!("    ✓ Load complete\n");

    window.on_closed(|| println!("\n[Event] Window closed by the user"))?;

    println!("=== Window open ===\n");
    common::wait_for_exit(args.no_wait).await;

    // ========================================================================
    // Cleanup
    // ========================================================================

    println!("\n[Cleanup] Closing window...");
    window.close()?;
    println!("          ✓ Window closed");

    session.close().await;
    println!("          ✓ Session closed");

    Ok(())
}
