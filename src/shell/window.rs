//! Window handle and per-window state.
//!
//! A [`Window`] is a non-owning handle. The state it points to lives in the
//! session registry from the create response until the window is closed,
//! either locally through [`Window::close`] or remotely through
//! `window_closed`.
//!
//! # Example
//!
//! ```ignore
//! let window = session.create_window(&WindowOptions::new().with_size(800, 600)).await?;
//!
//! window.listen("clicked", |payload| {
//!     println!("clicked: {}", String::from_utf8_lossy(&payload));
//! })?;
//! window.on_closed(|| println!("window closed by the user"))?;
//!
//! window.load_url("https://example.com").await?;
//! window.message("greeting", "hello")?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::WindowId;
use crate::protocol::command::{
    LoadUrlCommand, SendMessageCommand, SubscribeCommand, WINDOW_CLOSE, WINDOW_CLOSE_DEV_TOOLS,
    WINDOW_LOAD_URL, WINDOW_OPEN_DEV_TOOLS, WINDOW_SEND_MESSAGE, WINDOW_SUBSCRIBE_MESSAGE,
    WindowIdBody,
};

use super::session::Session;

// ============================================================================
// Types
// ============================================================================

/// Callback for a page event, invoked with the raw JSON payload.
pub type EventCallback = Arc<dyn Fn(Vec<u8>) + Send + Sync>;

/// Callback for a remote close.
pub type ClosedCallback = Box<dyn FnOnce() + Send>;

// ============================================================================
// WindowState
// ============================================================================

/// Registry entry for one open window.
pub(crate) struct WindowState {
    id: WindowId,
    listeners: RwLock<FxHashMap<String, EventCallback>>,
    closed_callback: Mutex<Option<ClosedCallback>>,
}

impl WindowState {
    pub(crate) fn new(id: WindowId) -> Self {
        Self {
            id,
            listeners: RwLock::new(FxHashMap::default()),
            closed_callback: Mutex::new(None),
        }
    }

    /// Returns the listener for an event, cloned out of the lock.
    pub(crate) fn listener(&self, event_id: &str) -> Option<EventCallback> {
        self.listeners.read().get(event_id).cloned()
    }

    /// Takes the closed callback, leaving the slot empty.
    pub(crate) fn take_closed_callback(&self) -> Option<ClosedCallback> {
        self.closed_callback.lock().take()
    }
}

impl fmt::Debug for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowState")
            .field("id", &self.id)
            .field("listeners", &self.listeners.read().len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Window
// ============================================================================

/// Handle to a host window.
///
/// Cheap to clone. Once the window is closed every operation returns
/// [`Error::WindowNotFound`], except [`close`](Self::close) which is a
/// no-op.
#[derive(Clone)]
pub struct Window {
    id: WindowId,
    session: Session,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("session_id", &self.session.id())
            .field("open", &self.is_open())
            .finish()
    }
}

impl Window {
    pub(crate) fn new(id: WindowId, session: Session) -> Self {
        Self { id, session }
    }

    /// Returns the host-assigned window ID.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> WindowId {
        self.id
    }

    /// Returns the owning session.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns `true` while the window is in the session registry.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.session.inner.windows.read().contains_key(&self.id)
    }

    fn state(&self) -> Result<Arc<WindowState>> {
        self.session
            .inner
            .windows
            .read()
            .get(&self.id)
            .cloned()
            .ok_or_else(|| Error::window_not_found(self.id))
    }
}

// ============================================================================
// Window - Navigation
// ============================================================================

impl Window {
    /// Loads a URL and waits for the host to report completion.
    ///
    /// # Errors
    ///
    /// - [`Error::WindowNotFound`] if the window is closed
    /// - [`Error::InvalidArgument`] if `url` does not parse
    /// - [`Error::RequestTimeout`] after [`LOAD_TIMEOUT`](super::LOAD_TIMEOUT)
    /// - [`Error::ConnectionClosed`] if the transport dies while waiting
    pub async fn load_url(&self, url: &str) -> Result<()> {
        self.state()?;
        // Validated only; the host gets the caller's string unchanged.
        Url::parse(url).map_err(|e| Error::invalid_argument(format!("invalid URL '{url}': {e}")))?;

        let inner = &self.session.inner;
        let (request_id, rx) = inner.pending_loads.register();
        let command = LoadUrlCommand {
            window_id: self.id,
            url,
            request_id,
        };

        if let Err(e) = self.session.send_json(WINDOW_LOAD_URL, &command) {
            inner.pending_loads.remove(request_id);
            return Err(e);
        }

        debug!(
            session_id = %self.session.id(),
            window_id = %self.id,
            %request_id,
            url,
            "Loading URL"
        );

        inner
            .pending_loads
            .wait(&inner.router, request_id, rx)
            .await?;
        Ok(())
    }
}

// ============================================================================
// Window - Events
// ============================================================================

impl Window {
    /// Subscribes to a page event.
    ///
    /// The callback is stored first, then the host is asked to forward the
    /// event. A second call for the same event replaces the callback. If the
    /// subscription cannot be sent, the previous callback is restored.
    ///
    /// # Errors
    ///
    /// - [`Error::WindowNotFound`] if the window is closed
    /// - [`Error::NotConnected`] if the transport is gone
    pub fn listen(
        &self,
        event_id: &str,
        callback: impl Fn(Vec<u8>) + Send + Sync + 'static,
    ) -> Result<()> {
        let state = self.state()?;
        let previous = state
            .listeners
            .write()
            .insert(event_id.to_string(), Arc::new(callback));

        let subscribed = self.session.send_json(
            WINDOW_SUBSCRIBE_MESSAGE,
            &SubscribeCommand {
                window_id: self.id,
                message_id: event_id,
            },
        );

        if let Err(e) = subscribed {
            let mut listeners = state.listeners.write();
            match previous {
                Some(previous) => {
                    listeners.insert(event_id.to_string(), previous);
                }
                None => {
                    listeners.remove(event_id);
                }
            }
            return Err(e);
        }

        debug!(window_id = %self.id, event_id, "Event listener registered");
        Ok(())
    }

    /// Removes a local event callback.
    ///
    /// The host keeps forwarding the event, which is then dropped. Returns
    /// `true` if a callback was registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WindowNotFound`] if the window is closed.
    pub fn unlisten(&self, event_id: &str) -> Result<bool> {
        let state = self.state()?;
        Ok(state.listeners.write().remove(event_id).is_some())
    }

    /// Sends a message to the page. No reply is awaited.
    ///
    /// # Errors
    ///
    /// - [`Error::WindowNotFound`] if the window is closed
    /// - [`Error::NotConnected`] if the transport is gone
    pub fn message(&self, event_id: &str, payload: &str) -> Result<()> {
        self.state()?;
        self.session.send_json(
            WINDOW_SEND_MESSAGE,
            &SendMessageCommand {
                window_id: self.id,
                message_id: event_id,
                message: payload,
            },
        )
    }

    /// Registers the callback run when the host reports the window closed.
    ///
    /// It runs at most once and never for a local [`close`](Self::close).
    /// Registering again replaces the previous callback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WindowNotFound`] if the window is closed.
    pub fn on_closed(&self, callback: impl FnOnce() + Send + 'static) -> Result<()> {
        let state = self.state()?;
        *state.closed_callback.lock() = Some(Box::new(callback));
        Ok(())
    }
}

// ============================================================================
// Window - Lifecycle
// ============================================================================

impl Window {
    /// Opens developer tools.
    ///
    /// # Errors
    ///
    /// - [`Error::WindowNotFound`] if the window is closed
    /// - [`Error::NotConnected`] if the transport is gone
    pub fn open_dev_tools(&self) -> Result<()> {
        self.send_window_command(WINDOW_OPEN_DEV_TOOLS)
    }

    /// Closes developer tools.
    ///
    /// # Errors
    ///
    /// - [`Error::WindowNotFound`] if the window is closed
    /// - [`Error::NotConnected`] if the transport is gone
    pub fn close_dev_tools(&self) -> Result<()> {
        self.send_window_command(WINDOW_CLOSE_DEV_TOOLS)
    }

    /// Closes the window.
    ///
    /// The window leaves the registry before the command is sent, so a
    /// `window_closed` that races with it is ignored and the closed callback
    /// never runs. Closing an already closed window is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if the transport is gone. The window
    /// is removed from the registry regardless.
    pub fn close(&self) -> Result<()> {
        let removed = self.session.inner.windows.write().remove(&self.id);
        if removed.is_none() {
            return Ok(());
        }

        debug!(session_id = %self.session.id(), window_id = %self.id, "Window closed locally");
        self.session
            .send_json(WINDOW_CLOSE, &WindowIdBody { window_id: self.id })
    }

    fn send_window_command(&self, command_id: &str) -> Result<()> {
        self.state()?;
        self.session
            .send_json(command_id, &WindowIdBody { window_id: self.id })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use serde_json::Value;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use crate::protocol::command::{WINDOW_GET_SUBSCRIBED_MESSAGE, WINDOW_LOAD_COMPLETE};
    use crate::testing::{HostStub, open_window};

    fn body_json(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn test_load_url_completes_on_echoed_request_id() {
        let (window, mut host) = open_window(7).await;

        let loading = tokio::spawn({
            let window = window.clone();
            async move { window.load_url("https://example.com/").await }
        });

        let request = host.recv().await;
        assert_eq!(request.command_id(), WINDOW_LOAD_URL);
        let body = body_json(request.body());
        assert_eq!(body["WindowID"], 7);
        assert_eq!(body["URL"], "https://example.com/");

        let reply = format!(r#"{{"RequestID":"{}"}}"#, body["RequestID"].as_str().unwrap());
        host.send(WINDOW_LOAD_COMPLETE, &reply).await;

        loading.await.unwrap().expect("load should succeed");
    }

    #[tokio::test]
    async fn test_load_url_sends_url_as_given() {
        let (window, mut host) = open_window(7).await;

        let loading = tokio::spawn({
            let window = window.clone();
            async move { window.load_url("https://example.com").await }
        });

        let request = host.recv().await;
        assert_eq!(body_json(request.body())["URL"], "https://example.com");

        host.send(WINDOW_LOAD_COMPLETE, "").await;
        loading.await.unwrap().expect("load should succeed");
    }

    #[tokio::test]
    async fn test_load_url_accepts_empty_completion() {
        let (window, mut host) = open_window(7).await;

        let loading = tokio::spawn({
            let window = window.clone();
            async move { window.load_url("https://example.com/").await }
        });

        host.recv().await;
        host.send(WINDOW_LOAD_COMPLETE, "").await;

        loading.await.unwrap().expect("load should succeed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_url_times_out() {
        let (window, mut host) = open_window(7).await;

        let loading = tokio::spawn({
            let window = window.clone();
            async move { window.load_url("https://example.com/").await }
        });
        host.recv().await;

        let err = loading.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            Error::RequestTimeout {
                operation: WINDOW_LOAD_URL,
                timeout_ms: 30_000,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_load_url_rejects_invalid_url() {
        let (window, _host) = open_window(7).await;

        let err = window.load_url("not a url").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_listen_subscribes_and_receives_payload() {
        let (window, mut host) = open_window(7).await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        window
            .listen("clicked", move |payload| {
                let _ = tx.send(payload);
            })
            .unwrap();

        let subscribe = host.recv().await;
        assert_eq!(subscribe.command_id(), WINDOW_SUBSCRIBE_MESSAGE);
        let body = body_json(subscribe.body());
        assert_eq!(body["WindowID"], 7);
        assert_eq!(body["MessageID"], "clicked");

        host.send(
            WINDOW_GET_SUBSCRIBED_MESSAGE,
            r#"{"WindowID":7,"MessageID":"clicked","Message":{"x":3}}"#,
        )
        .await;

        let payload = timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload, br#"{"x":3}"#.to_vec());
    }

    #[tokio::test]
    async fn test_listen_keeps_no_callback_when_subscribe_fails() {
        let (window, host) = open_window(7).await;
        window.listen("kept", |_payload| {}).unwrap();

        drop(host);
        timeout(Duration::from_secs(1), window.session().router().closed())
            .await
            .unwrap();

        let err = window.listen("clicked", |_payload| {}).unwrap_err();
        assert!(matches!(err, Error::NotConnected));

        let state = window.state().unwrap();
        assert!(state.listener("clicked").is_none());
        assert!(state.listener("kept").is_some());

        // A failed re-subscribe leaves the earlier callback in place.
        let (tx, mut rx) = mpsc::unbounded_channel::<&str>();
        window
            .listen("kept", move |_payload| {
                let _ = tx.send("replacement");
            })
            .unwrap_err();
        state.listener("kept").unwrap()(Vec::new());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_message_is_fire_and_forget() {
        let (window, mut host) = open_window(7).await;

        window.message("greeting", "hello").unwrap();

        let sent = host.recv().await;
        assert_eq!(sent.command_id(), WINDOW_SEND_MESSAGE);
        let body = body_json(sent.body());
        assert_eq!(body["WindowID"], 7);
        assert_eq!(body["MessageID"], "greeting");
        assert_eq!(body["Message"], "hello");
    }

    #[tokio::test]
    async fn test_dev_tools_commands() {
        let (window, mut host) = open_window(4).await;

        window.open_dev_tools().unwrap();
        window.close_dev_tools().unwrap();

        let open = host.recv().await;
        assert_eq!(open.command_id(), WINDOW_OPEN_DEV_TOOLS);
        assert_eq!(open.body(), br#"{"WindowID":4}"#);

        let close = host.recv().await;
        assert_eq!(close.command_id(), WINDOW_CLOSE_DEV_TOOLS);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (window, mut host) = open_window(7).await;

        window.close().unwrap();
        assert!(!window.is_open());
        assert_eq!(window.session().window_count(), 0);

        let sent = host.recv().await;
        assert_eq!(sent.command_id(), WINDOW_CLOSE);
        assert_eq!(sent.body(), br#"{"WindowID":7}"#);

        window.close().unwrap();
        host.expect_silence().await;
    }

    #[tokio::test]
    async fn test_operations_after_close_fail() {
        let (window, _host) = open_window(7).await;
        window.close().unwrap();

        assert!(matches!(
            window.load_url("https://example.com/").await,
            Err(Error::WindowNotFound { .. })
        ));
        assert!(matches!(
            window.listen("clicked", |_| {}),
            Err(Error::WindowNotFound { .. })
        ));
        assert!(matches!(
            window.message("greeting", "hi"),
            Err(Error::WindowNotFound { .. })
        ));
        assert!(matches!(window.open_dev_tools(), Err(Error::WindowNotFound { .. })));
        assert!(matches!(window.on_closed(|| {}), Err(Error::WindowNotFound { .. })));
        assert!(matches!(window.unlisten("clicked"), Err(Error::WindowNotFound { .. })));
    }

    #[tokio::test]
    async fn test_unlisten_stops_delivery() {
        let (window, mut host) = open_window(7).await;
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

        window
            .listen("clicked", move |payload| {
                let _ = tx.send(payload);
            })
            .unwrap();
        host.recv().await;

        assert!(window.unlisten("clicked").unwrap());
        assert!(!window.unlisten("clicked").unwrap());

        host.send(
            WINDOW_GET_SUBSCRIBED_MESSAGE,
            r#"{"WindowID":7,"MessageID":"clicked","Message":1}"#,
        )
        .await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The sender was dropped with the callback.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_debug_format() {
        let (window, _host): (Window, HostStub) = open_window(9).await;
        let debug = format!("{window:?}");
        assert!(debug.contains("Window"));
        assert!(debug.contains("open: true"));
    }
}
