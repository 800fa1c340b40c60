//! Wire protocol between this process and the host shell.
//!
//! This module defines the line framing and the message vocabulary for
//! communication between local end (Rust) and remote end (host process).
//!
//! # Protocol Overview
//!
//! Every message is one line: the base64 encoding of a JSON record
//! `{"CommandID": "...", "CommandBody": "..."}` followed by `\n`.
//!
//! | Layer | Type | Purpose |
//! |-------|------|---------|
//! | Stream | [`LineCodec`] | Splits the byte stream at `\n` |
//! | Line | [`Envelope`] | base64(JSON) ↔ `(command_id, body)` |
//! | Body | [`command`] structs | Typed JSON bodies of the window vocabulary |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `codec` | Newline framing for tokio-util |
//! | `command` | Command IDs and body shapes |
//! | `envelope` | Envelope encode/decode |

// ============================================================================
// Submodules
// ============================================================================

/// Newline delimited framing.
pub mod codec;

/// Command identifiers and body types.
pub mod command;

/// Envelope encode/decode.
pub mod envelope;

// ============================================================================
// Re-exports
// ============================================================================

pub use codec::{LineCodec, LineFrame};
pub use envelope::Envelope;
