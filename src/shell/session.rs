//! Session: one router, one window registry.
//!
//! # Layered Dispatch
//!
//! ```text
//! Router ──commandID──► BuiltinHandler ──WindowID──► WindowState ──eventID──► callback
//! ```
//!
//! The router resolves the command ID, the session resolves the window ID
//! and the window resolves the event ID. Each lookup clones what it needs
//! out of its own lock before going one level deeper, and user callbacks
//! run with no lock held.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::error::{Error, Result};
use crate::identifiers::{SessionId, WindowId};
use crate::protocol::command::{
    CreateWindowCommand, CreateWindowResponse, SubscribedMessage, WINDOW_CLOSED, WINDOW_CREATE,
    WINDOW_CREATE_RESPONSE, WINDOW_GET_SUBSCRIBED_MESSAGE, WINDOW_LOAD_COMPLETE, WINDOW_LOAD_URL,
    WindowIdBody,
};
use crate::transport::{Channel, CommandHandler, Router, run_detached};

use super::options::WindowOptions;
use super::pending::{PendingRequests, echoed_request_id};
use super::window::{Window, WindowState};
use super::{CREATE_TIMEOUT, LOAD_TIMEOUT};

// ============================================================================
// SessionInner
// ============================================================================

pub(super) struct SessionInner {
    pub(super) id: SessionId,
    pub(super) router: Router,
    pub(super) windows: RwLock<FxHashMap<WindowId, Arc<WindowState>>>,
    pub(super) pending_creates: PendingRequests,
    pub(super) pending_loads: PendingRequests,
}

// ============================================================================
// Session
// ============================================================================

/// A connection to one host process.
///
/// Cheap to clone. All clones share the router and the window registry.
///
/// # Example
///
/// ```ignore
/// let session = Launcher::builder().binary("./host").build()?.launch().await?;
///
/// let window = session.create_window(&WindowOptions::new().with_title("Demo")).await?;
/// window.load_url("https://example.com").await?;
///
/// session.close().await;
/// ```
#[derive(Clone)]
pub struct Session {
    pub(super) inner: Arc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("windows", &self.window_count())
            .field(
                "pending",
                &(self.inner.pending_creates.len() + self.inner.pending_loads.len()),
            )
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a session over a running router and installs the built-in
    /// window handlers on it.
    pub fn new(router: Router) -> Self {
        let inner = Arc::new(SessionInner {
            id: SessionId::next(),
            router,
            windows: RwLock::new(FxHashMap::default()),
            pending_creates: PendingRequests::new(WINDOW_CREATE, CREATE_TIMEOUT),
            pending_loads: PendingRequests::new(WINDOW_LOAD_URL, LOAD_TIMEOUT),
        });

        for (command_id, kind) in [
            (WINDOW_CREATE_RESPONSE, Builtin::CreateResponse),
            (WINDOW_LOAD_COMPLETE, Builtin::LoadComplete),
            (WINDOW_GET_SUBSCRIBED_MESSAGE, Builtin::SubscribedMessage),
            (WINDOW_CLOSED, Builtin::Closed),
        ] {
            inner.router.listen_inline(
                command_id,
                BuiltinHandler {
                    session: Arc::downgrade(&inner),
                    kind,
                },
            );
        }

        info!(session_id = %inner.id, "Session started");
        Self { inner }
    }

    /// Starts a router over `channel` and wraps it in a session.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_channel(channel: Channel) -> Self {
        Self::new(Router::new(channel))
    }

    /// Returns the process-unique session ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    /// Returns the underlying router.
    #[inline]
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.inner.router
    }

    /// Returns `true` while the transport is alive.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.router.is_connected()
    }
}

// ============================================================================
// Session - Raw Commands
// ============================================================================

impl Session {
    /// Sends a raw command.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the transport is gone
    /// - [`Error::InvalidArgument`] if the ID is empty or the body is not UTF-8
    pub fn command(&self, command_id: &str, body: impl Into<Vec<u8>>) -> Result<()> {
        self.inner.router.send(command_id, body)
    }

    /// Registers a raw command handler.
    ///
    /// Registering one of the built-in window command IDs replaces the
    /// session's own handling of it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if the transport is gone.
    pub fn listen(&self, command_id: impl Into<String>, handler: impl CommandHandler) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        self.inner.router.listen(command_id, handler);
        Ok(())
    }

    pub(super) fn send_json<T: Serialize + ?Sized>(&self, command_id: &str, body: &T) -> Result<()> {
        let body = serde_json::to_vec(body)?;
        self.inner.router.send(command_id, body)
    }
}

// ============================================================================
// Session - Windows
// ============================================================================

impl Session {
    /// Creates a window and waits for the host to assign its ID.
    ///
    /// Nothing is registered unless the response arrives. The window enters
    /// the registry as soon as the response is read, so a `window_closed`
    /// sent right behind it is never missed.
    ///
    /// # Errors
    ///
    /// - [`Error::RequestTimeout`] after [`CREATE_TIMEOUT`]
    /// - [`Error::ConnectionClosed`] if the transport dies while waiting
    /// - [`Error::NotConnected`] if the transport is already gone
    /// - [`Error::Protocol`] if the response carries no window ID
    pub async fn create_window(&self, options: &WindowOptions) -> Result<Window> {
        let inner = &self.inner;
        let (request_id, rx) = inner.pending_creates.register();
        let command = CreateWindowCommand {
            request_id,
            options,
        };

        if let Err(e) = self.send_json(WINDOW_CREATE, &command) {
            inner.pending_creates.remove(request_id);
            return Err(e);
        }
        debug!(session_id = %inner.id, %request_id, "Creating window");

        let body = inner
            .pending_creates
            .wait(&inner.router, request_id, rx)
            .await?;
        let response: CreateWindowResponse = serde_json::from_slice(&body)
            .map_err(|e| Error::protocol(format!("invalid window_create_response: {e}")))?;

        // Already registered by the response handler.
        Ok(Window::new(response.window_id, self.clone()))
    }

    /// Returns a handle to an open window.
    #[must_use]
    pub fn window(&self, window_id: WindowId) -> Option<Window> {
        self.inner
            .windows
            .read()
            .contains_key(&window_id)
            .then(|| Window::new(window_id, self.clone()))
    }

    /// Returns handles to all open windows.
    #[must_use]
    pub fn windows(&self) -> Vec<Window> {
        let ids: Vec<WindowId> = self.inner.windows.read().keys().copied().collect();
        ids.into_iter()
            .map(|id| Window::new(id, self.clone()))
            .collect()
    }

    /// Returns the number of open windows.
    #[inline]
    #[must_use]
    pub fn window_count(&self) -> usize {
        self.inner.windows.read().len()
    }

    /// Closes the transport and terminates the host process.
    ///
    /// The registry is cleared without running closed callbacks. Pending
    /// requests fail with [`Error::ConnectionClosed`].
    pub async fn close(&self) {
        self.inner.router.close().await;
        let dropped = {
            let mut windows = self.inner.windows.write();
            let count = windows.len();
            windows.clear();
            count
        };
        info!(session_id = %self.inner.id, windows = dropped, "Session closed");
    }
}

// ============================================================================
// Built-in Handlers
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Builtin {
    CreateResponse,
    LoadComplete,
    SubscribedMessage,
    Closed,
}

/// Router handler for the session's own command IDs.
struct BuiltinHandler {
    session: Weak<SessionInner>,
    kind: Builtin,
}

impl CommandHandler for BuiltinHandler {
    fn handle(&self, body: Vec<u8>) {
        let Some(session) = self.session.upgrade() else {
            return;
        };

        match self.kind {
            Builtin::CreateResponse => on_create_response(&session, body),
            Builtin::LoadComplete => {
                session
                    .pending_loads
                    .complete(echoed_request_id(&body), body);
            }
            Builtin::SubscribedMessage => on_subscribed_message(&session, &body),
            Builtin::Closed => on_window_closed(&session, &body),
        }
    }
}

fn on_create_response(session: &SessionInner, body: Vec<u8>) {
    let Some(waiter) = session.pending_creates.claim(echoed_request_id(&body)) else {
        return;
    };

    // A body without a window ID still goes to the waiter, which reports it.
    let Ok(response) = serde_json::from_slice::<CreateWindowResponse>(&body) else {
        let _ = waiter.send(body);
        return;
    };

    let window_id = response.window_id;
    session
        .windows
        .write()
        .insert(window_id, Arc::new(WindowState::new(window_id)));

    if waiter.send(body).is_err() {
        // The caller gave up between the claim and the reply.
        session.windows.write().remove(&window_id);
        trace!(%window_id, "Create waiter gone, window not registered");
        return;
    }
    debug!(session_id = %session.id, %window_id, "Window registered");
}

fn on_subscribed_message(session: &SessionInner, body: &[u8]) {
    let message: SubscribedMessage = match serde_json::from_slice(body) {
        Ok(message) => message,
        Err(e) => {
            trace!(error = %e, "Dropping malformed subscribed message");
            return;
        }
    };

    let state = session.windows.read().get(&message.window_id).cloned();
    let Some(state) = state else {
        trace!(window_id = %message.window_id, "Message for unknown window");
        return;
    };
    let Some(callback) = state.listener(&message.message_id) else {
        trace!(
            window_id = %message.window_id,
            event_id = %message.message_id,
            "No listener for event"
        );
        return;
    };

    let payload = message.payload();
    run_detached(move || callback(payload));
}

fn on_window_closed(session: &SessionInner, body: &[u8]) {
    let closed: WindowIdBody = match serde_json::from_slice(body) {
        Ok(closed) => closed,
        Err(e) => {
            trace!(error = %e, "Dropping malformed window_closed");
            return;
        }
    };

    let removed = session.windows.write().remove(&closed.window_id);
    let Some(state) = removed else {
        trace!(window_id = %closed.window_id, "Close for unknown window");
        return;
    };

    debug!(session_id = %session.id, window_id = %closed.window_id, "Window closed remotely");
    if let Some(callback) = state.take_closed_callback() {
        run_detached(callback);
    }
}

// ============================================================================
// Tests
// ============================================================================
