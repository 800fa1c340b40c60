//! Command identifiers and body types.
//!
//! The vocabulary shared with the host is fixed:
//!
//! | Command ID | Direction | Body |
//! |------------|-----------|------|
//! | `window_create` | out | [`CreateWindowCommand`] |
//! | `window_create_response` | in | [`CreateWindowResponse`] |
//! | `window_load_url` | out | [`LoadUrlCommand`] |
//! | `window_load_complete` | in | empty, or `{RequestID?, WindowID?}` |
//! | `window_subscribe_message` | out | [`SubscribeCommand`] |
//! | `window_get_subscribed_message` | in | [`SubscribedMessage`] |
//! | `window_send_message` | out | [`SendMessageCommand`] |
//! | `window_open_dev_tools` | out | [`WindowIdBody`] |
//! | `window_close_dev_tools` | out | [`WindowIdBody`] |
//! | `window_close` | out | [`WindowIdBody`] |
//! | `window_closed` | in | [`WindowIdBody`] |
//!
//! Field names are PascalCase with upper-case `ID`/`URL`, as the host expects.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::identifiers::{RequestId, WindowId};
use crate::shell::WindowOptions;

// ============================================================================
// Command IDs
// ============================================================================

/// Create a window.
pub const WINDOW_CREATE: &str = "window_create";
/// Host reply to [`WINDOW_CREATE`].
pub const WINDOW_CREATE_RESPONSE: &str = "window_create_response";
/// Load a URL into a window.
pub const WINDOW_LOAD_URL: &str = "window_load_url";
/// Host reply to [`WINDOW_LOAD_URL`].
pub const WINDOW_LOAD_COMPLETE: &str = "window_load_complete";
/// Ask the host to forward a page message.
pub const WINDOW_SUBSCRIBE_MESSAGE: &str = "window_subscribe_message";
/// A forwarded page message.
pub const WINDOW_GET_SUBSCRIBED_MESSAGE: &str = "window_get_subscribed_message";
/// Send a message to the page.
pub const WINDOW_SEND_MESSAGE: &str = "window_send_message";
/// Open developer tools.
pub const WINDOW_OPEN_DEV_TOOLS: &str = "window_open_dev_tools";
/// Close developer tools.
pub const WINDOW_CLOSE_DEV_TOOLS: &str = "window_close_dev_tools";
/// Close a window.
pub const WINDOW_CLOSE: &str = "window_close";
/// Host notification that a window closed.
pub const WINDOW_CLOSED: &str = "window_closed";

// ============================================================================
// Outgoing Bodies
// ============================================================================

/// Body carrying only a window ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowIdBody {
    /// Target window.
    #[serde(rename = "WindowID")]
    pub window_id: WindowId,
}

/// Body of `window_create`: the window options plus a correlation ID.
#[derive(Debug, Serialize)]
pub struct CreateWindowCommand<'a> {
    /// Correlation ID echoed in the response.
    #[serde(rename = "RequestID")]
    pub request_id: RequestId,

    /// Electron window options.
    #[serde(flatten)]
    pub options: &'a WindowOptions,
}

/// Body of `window_load_url`.
#[derive(Debug, Serialize)]
pub struct LoadUrlCommand<'a> {
    /// Target window.
    #[serde(rename = "WindowID")]
    pub window_id: WindowId,
    /// URL to load.
    #[serde(rename = "URL")]
    pub url: &'a str,
    /// Correlation ID echoed in the completion.
    #[serde(rename = "RequestID")]
    pub request_id: RequestId,
}

/// Body of `window_subscribe_message`.
#[derive(Debug, Serialize)]
pub struct SubscribeCommand<'a> {
    /// Target window.
    #[serde(rename = "WindowID")]
    pub window_id: WindowId,
    /// Page message to forward.
    #[serde(rename = "MessageID")]
    pub message_id: &'a str,
}

/// Body of `window_send_message`.
#[derive(Debug, Serialize)]
pub struct SendMessageCommand<'a> {
    /// Target window.
    #[serde(rename = "WindowID")]
    pub window_id: WindowId,
    /// Page message name.
    #[serde(rename = "MessageID")]
    pub message_id: &'a str,
    /// Message payload.
    #[serde(rename = "Message")]
    pub message: &'a str,
}

// ============================================================================
// Incoming Bodies
// ============================================================================

/// Body of `window_create_response`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWindowResponse {
    /// Host-assigned window ID.
    #[serde(rename = "WindowID")]
    pub window_id: WindowId,
    /// Echoed correlation ID, if the host supports it.
    #[serde(rename = "RequestID", default)]
    pub request_id: Option<RequestId>,
}

/// Body of `window_get_subscribed_message`.
#[derive(Debug, Deserialize)]
pub struct SubscribedMessage {
    /// Source window.
    #[serde(rename = "WindowID")]
    pub window_id: WindowId,
    /// Page message name.
    #[serde(rename = "MessageID")]
    pub message_id: String,
    /// Raw JSON payload.
    #[serde(rename = "Message", default)]
    pub message: Option<Box<RawValue>>,
}

impl SubscribedMessage {
    /// Returns the payload as raw JSON bytes (empty if absent).
    #[must_use]
    pub fn payload(&self) -> Vec<u8> {
        self.message
            .as_ref()
            .map(|raw| raw.get().as_bytes().to_vec())
            .unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
