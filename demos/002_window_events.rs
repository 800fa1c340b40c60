//! Page events and messages.
//!
//! Demonstrates:
//! - Subscribing to page events on two windows
//! - Sending messages to a page
//! - Observing dropped units through the diagnostic hook
//!
//! Usage:
//!   ELECTRON_HOST_SCRIPT=host/main.js cargo run --example 002_window_events
//!   cargo run --example 002_window_events -- --no-wait --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use common::Args;
use electron_control::{Diagnostic, Window, WindowOptions};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    common::init_logging(args.debug);

    println!("=== 002: Window Events ===\n");

    let session = common::launcher(&args)
        .build()?
        .launch()
        .await
        .context("failed to launch host")?;

    session.router().set_diagnostic_hook(|diagnostic| match diagnostic {
        Diagnostic::Unhandled { command_id } => println!("    [drop] unhandled {command_id}"),
        other => println!("    [drop] {other:?}"),
    });

    // ========================================================================
    // Windows
    // ========================================================================

    println!("[1] Creating two windows...");
    let left = create(&session, "left", 0).await?;
    let right = create(&session, "right", 620).await?;
    println!("    ✓ Windows {} and {}\n", left.id(), right.id());

    // ========================================================================
    // Subscriptions
    // ========================================================================

    println!("[2] Subscribing to 'clicked'...");
    for window in [&left, &right] {
        let id = window.id();
        window.listen("clicked", move |payload| {
            println!("    [{id}] clicked {}", String::from_utf8_lossy(&payload));
        })?;
    }
    println!("    ✓ Subscribed\n");

    // ========================================================================
    // Messages
    // ========================================================================

    println!("[3] Sending greetings...");
    left.message("greeting", "hello from the left")?;
    right.message("greeting", "hello from the right")?;
    left.open_dev_tools()?;
    tokio::time::sleep(Duration::from_millis(500)).await;
    left.close_dev_tools()?;
    println!("    ✓ Sent\n");

    common::wait_for_exit(args.no_wait).await;

    println!("\n[Cleanup] {} window(s) open", session.window_count());
    session.close().await;
    println!("          ✓ Session closed");

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

async fn create(session: &electron_control::Session, title: &str, x: i32) -> Result<Window> {
    let options = WindowOptions::new()
        .with_size(600, 400)
        .with_position(x, 80)
        .with_title(title)
        .with_show(true);

    let window = session
        .create_window(&options)
        .await
        .with_context(|| format!("failed to create window '{title}'"))?;
    window
        .load_url("data:text/html,<h1>electron-control</h1>")
        .await
        .with_context(|| format!("failed to load window '{title}'"))?;
    Ok(window)
}
