//! Window creation options.
//!
//! Provides a type-safe interface to the subset of Electron's
//! `BrowserWindow` options the host understands.
//!
//! # Example
//!
//! ```ignore
//! use electron_control::WindowOptions;
//!
//! let options = WindowOptions::new()
//!     .with_size(1280, 720)
//!     .with_title("Dashboard")
//!     .with_frame(false)
//!     .with_show(true);
//! ```
//!
//! Unset options are omitted from the JSON body so the host applies
//! Electron's own defaults. Zero numbers and empty strings count as unset.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

// ============================================================================
// Serialization Helpers
// ============================================================================

fn is_unset_number<T: Default + PartialEq>(value: &Option<T>) -> bool {
    value.as_ref().is_none_or(|v| *v == T::default())
}

fn is_unset_str(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

// ============================================================================
// WindowOptions
// ============================================================================

/// Options sent with `window_create`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowOptions {
    /// Window width in pixels.
    #[serde(skip_serializing_if = "is_unset_number")]
    pub width: Option<u32>,

    /// Window height in pixels.
    #[serde(skip_serializing_if = "is_unset_number")]
    pub height: Option<u32>,

    /// Left offset from the screen.
    #[serde(skip_serializing_if = "is_unset_number")]
    pub x: Option<i32>,

    /// Top offset from the screen.
    #[serde(skip_serializing_if = "is_unset_number")]
    pub y: Option<i32>,

    /// Treat width/height as the web page size instead of the window size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_content_size: Option<bool>,

    /// Center the window on screen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<bool>,

    /// Minimum width.
    #[serde(skip_serializing_if = "is_unset_number")]
    pub min_width: Option<u32>,

    /// Minimum height.
    #[serde(skip_serializing_if = "is_unset_number")]
    pub min_height: Option<u32>,

    /// Maximum width.
    #[serde(skip_serializing_if = "is_unset_number")]
    pub max_width: Option<u32>,

    /// Maximum height.
    #[serde(skip_serializing_if = "is_unset_number")]
    pub max_height: Option<u32>,

    /// Whether the user can resize the window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resizable: Option<bool>,

    /// Keep the window above all others.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_on_top: Option<bool>,

    /// Start fullscreen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullscreen: Option<bool>,

    /// Hide the window from the taskbar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_taskbar: Option<bool>,

    /// Kiosk mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kiosk: Option<bool>,

    /// Window title.
    #[serde(skip_serializing_if = "is_unset_str")]
    pub title: Option<String>,

    /// Show the window when created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,

    /// Draw the native frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<bool>,

    /// Let the first click on an inactive window reach the page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_first_mouse: Option<bool>,

    /// Background color, as `#RRGGBB` or `#AARRGGBB`.
    #[serde(skip_serializing_if = "is_unset_str")]
    pub background_color: Option<String>,
}

// ============================================================================
// Constructors
// ============================================================================

impl WindowOptions {
    /// Creates options with every field unset.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl WindowOptions {
    /// Sets width and height.
    #[inline]
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Sets the window position.
    #[inline]
    #[must_use]
    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Sets the minimum size.
    #[inline]
    #[must_use]
    pub fn with_min_size(mut self, width: u32, height: u32) -> Self {
        self.min_width = Some(width);
        self.min_height = Some(height);
        self
    }

    /// Sets the maximum size.
    #[inline]
    #[must_use]
    pub fn with_max_size(mut self, width: u32, height: u32) -> Self {
        self.max_width = Some(width);
        self.max_height = Some(height);
        self
    }

    /// Interprets the size as the content size.
    #[inline]
    #[must_use]
    pub fn with_use_content_size(mut self, enabled: bool) -> Self {
        self.use_content_size = Some(enabled);
        self
    }

    /// Centers the window.
    #[inline]
    #[must_use]
    pub fn with_center(mut self, enabled: bool) -> Self {
        self.center = Some(enabled);
        self
    }

    /// Sets resizability.
    #[inline]
    #[must_use]
    pub fn with_resizable(mut self, enabled: bool) -> Self {
        self.resizable = Some(enabled);
        self
    }

    /// Sets always-on-top.
    #[inline]
    #[must_use]
    pub fn with_always_on_top(mut self, enabled: bool) -> Self {
        self.always_on_top = Some(enabled);
        self
    }

    /// Sets fullscreen.
    #[inline]
    #[must_use]
    pub fn with_fullscreen(mut self, enabled: bool) -> Self {
        self.fullscreen = Some(enabled);
        self
    }

    /// Hides the window from the taskbar.
    #[inline]
    #[must_use]
    pub fn with_skip_taskbar(mut self, enabled: bool) -> Self {
        self.skip_taskbar = Some(enabled);
        self
    }

    /// Sets kiosk mode.
    #[inline]
    #[must_use]
    pub fn with_kiosk(mut self, enabled: bool) -> Self {
        self.kiosk = Some(enabled);
        self
    }

    /// Sets the title.
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets initial visibility.
    #[inline]
    #[must_use]
    pub fn with_show(mut self, enabled: bool) -> Self {
        self.show = Some(enabled);
        self
    }

    /// Sets whether the native frame is drawn.
    #[inline]
    #[must_use]
    pub fn with_frame(mut self, enabled: bool) -> Self {
        self.frame = Some(enabled);
        self
    }

    /// Sets first-mouse-click acceptance.
    #[inline]
    #[must_use]
    pub fn with_accept_first_mouse(mut self, enabled: bool) -> Self {
        self.accept_first_mouse = Some(enabled);
        self
    }

    /// Sets the background color.
    #[inline]
    #[must_use]
    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_serializes_empty() {
        let json = serde_json::to_string(&WindowOptions::new()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_camel_case_keys() {
        let options = WindowOptions::new()
            .with_min_size(200, 100)
            .with_always_on_top(true)
            .with_skip_taskbar(true)
            .with_accept_first_mouse(false)
            .with_background_color("#202020");

        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value["minWidth"], 200);
        assert_eq!(value["minHeight"], 100);
        assert_eq!(value["alwaysOnTop"], true);
        assert_eq!(value["skipTaskbar"], true);
        assert_eq!(value["acceptFirstMouse"], false);
        assert_eq!(value["backgroundColor"], "#202020");
        assert!(value.get("maxWidth").is_none());
    }

    #[test]
    fn test_zero_and_empty_are_omitted() {
        let options = WindowOptions::new()
            .with_size(0, 480)
            .with_title("")
            .with_position(0, 0)
            .with_center(false);

        let value = serde_json::to_value(&options).unwrap();
        assert!(value.get("width").is_none());
        assert_eq!(value["height"], 480);
        assert!(value.get("title").is_none());
        assert!(value.get("x").is_none());
        assert_eq!(value["center"], false);
    }

    #[test]
    fn test_builder_chain() {
        let options = WindowOptions::new()
            .with_size(700, 700)
            .with_position(10, -20)
            .with_frame(false)
            .with_show(true)
            .with_kiosk(false);

        assert_eq!(options.width, Some(700));
        assert_eq!(options.y, Some(-20));
        assert_eq!(options.frame, Some(false));
        assert_eq!(options.show, Some(true));
        assert_eq!(options.kiosk, Some(false));
    }
}
