//! Command router: the single endpoint both directions pass through.
//!
//! The [`Router`] owns the pump over a [`Channel`] and a dispatch table
//! mapping command IDs to [`CommandHandler`]s.
//!
//! # Dispatch
//!
//! Each inbound unit is decoded into an [`Envelope`]. Its command ID is
//! looked up under a shared lock, the handler is cloned out, and the lock
//! is released before the handler runs. Malformed units and unknown command
//! IDs are dropped. They are only visible through `trace!` and the
//! optional [`Diagnostic`] hook.
//!
//! Handlers registered with [`Router::listen`] run detached on the blocking
//! pool, one invocation per unit, so a slow handler never stalls the reader.
//! The session's own registry handlers run inline on the reader task, in
//! arrival order.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::error::{Error, Result};
use crate::protocol::{Envelope, LineFrame};

use super::channel::{Channel, ProcessGuard};
use super::pump::{Pump, UnitHandler};
use super::run_detached;

// ============================================================================
// CommandHandler
// ============================================================================

/// Handler invoked with the body of every command matching its ID.
///
/// Implemented for any `Fn(Vec<u8>) + Send + Sync`.
pub trait CommandHandler: Send + Sync + 'static {
    /// Handles one command body.
    fn handle(&self, body: Vec<u8>);
}

impl<F> CommandHandler for F
where
    F: Fn(Vec<u8>) + Send + Sync + 'static,
{
    fn handle(&self, body: Vec<u8>) {
        self(body);
    }
}

// ============================================================================
// Diagnostic
// ============================================================================

/// A unit the router dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The unit was not a valid envelope.
    MalformedFrame {
        /// Decode failure description.
        reason: String,
    },
    /// The unit exceeded the line limit.
    OversizedFrame {
        /// Bytes skipped.
        length: usize,
    },
    /// No handler was registered for the command ID.
    Unhandled {
        /// The command ID.
        command_id: String,
    },
}

/// Observer for dropped units.
pub type DiagnosticHook = Arc<dyn Fn(&Diagnostic) + Send + Sync>;

// ============================================================================
// Dispatch Table
// ============================================================================

/// A registered handler and how it is invoked.
#[derive(Clone)]
struct Route {
    handler: Arc<dyn CommandHandler>,
    inline: bool,
}

/// Dispatch state shared with the reader loop.
struct DispatchTable {
    handlers: RwLock<FxHashMap<String, Route>>,
    diagnostics: RwLock<Option<DiagnosticHook>>,
}

impl DispatchTable {
    fn dispatch(&self, raw: &[u8]) {
        let envelope = match Envelope::decode(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                trace!(error = %e, "Dropping malformed unit");
                self.report(Diagnostic::MalformedFrame {
                    reason: e.to_string(),
                });
                return;
            }
        };

        let (command_id, body) = envelope.into_parts();
        let route = self.handlers.read().get(&command_id).cloned();

        match route {
            Some(Route { handler, inline }) => {
                trace!(command_id = %command_id, bytes = body.len(), inline, "Dispatching command");
                if inline {
                    handler.handle(body);
                } else {
                    run_detached(move || handler.handle(body));
                }
            }
            None => {
                trace!(command_id = %command_id, "No handler registered");
                self.report(Diagnostic::Unhandled { command_id });
            }
        }
    }

    fn report(&self, diagnostic: Diagnostic) {
        let hook = self.diagnostics.read().clone();
        if let Some(hook) = hook {
            hook(&diagnostic);
        }
    }
}

impl UnitHandler for DispatchTable {
    fn handle_unit(&self, frame: LineFrame) {
        match frame {
            LineFrame::Line(line) => self.dispatch(&line),
            LineFrame::Oversized(length) => {
                debug!(length, "Dropping oversized unit");
                self.report(Diagnostic::OversizedFrame { length });
            }
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Shared router state.
struct RouterInner {
    table: Arc<DispatchTable>,
    outgoing: mpsc::UnboundedSender<String>,
    shutdown: CancellationToken,
    writer: Mutex<Option<JoinHandle<()>>>,
    process: Mutex<Option<ProcessGuard>>,
}

/// Addressable endpoint over one channel.
///
/// Cheap to clone. All clones share the same pump and dispatch table.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("connected", &self.is_connected())
            .field("handlers", &self.inner.table.handlers.read().len())
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Starts the pump over `channel`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(channel: Channel) -> Self {
        let (reader, writer, process) = channel.into_parts();
        let table = Arc::new(DispatchTable {
            handlers: RwLock::new(FxHashMap::default()),
            diagnostics: RwLock::new(None),
        });
        let shutdown = CancellationToken::new();

        let pump = Pump::spawn(reader, writer, Arc::clone(&table), shutdown.clone());
        // The reader task is detached; it ends with the shutdown token.
        drop(pump.reader);

        debug!(pid = ?process.as_ref().map(ProcessGuard::pid), "Router started");

        Self {
            inner: Arc::new(RouterInner {
                table,
                outgoing: pump.outgoing,
                shutdown,
                writer: Mutex::new(Some(pump.writer)),
                process: Mutex::new(process),
            }),
        }
    }

    /// Encodes and queues a command.
    ///
    /// There is no delivery confirmation.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the ID is empty or the body is not UTF-8
    /// - [`Error::NotConnected`] if the router is closed
    pub fn send(&self, command_id: &str, body: impl Into<Vec<u8>>) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }

        let line = Envelope::new(command_id, body)?.encode()?;
        self.inner
            .outgoing
            .send(line)
            .map_err(|_| Error::NotConnected)?;

        trace!(command_id, "Command queued");
        Ok(())
    }

    /// Registers a handler, replacing any previous one for the same ID.
    ///
    /// Each invocation runs detached from the reader.
    pub fn listen(&self, command_id: impl Into<String>, handler: impl CommandHandler) {
        self.register(command_id.into(), Arc::new(handler), false);
    }

    /// Registers a handler that runs on the reader task, in arrival order.
    ///
    /// The handler must not block.
    pub(crate) fn listen_inline(&self, command_id: impl Into<String>, handler: impl CommandHandler) {
        self.register(command_id.into(), Arc::new(handler), true);
    }

    fn register(&self, command_id: String, handler: Arc<dyn CommandHandler>, inline: bool) {
        debug!(command_id = %command_id, inline, "Handler registered");
        self.inner
            .table
            .handlers
            .write()
            .insert(command_id, Route { handler, inline });
    }

    /// Removes the handler for a command ID.
    ///
    /// Returns `true` if a handler was registered.
    pub fn unlisten(&self, command_id: &str) -> bool {
        self.inner.table.handlers.write().remove(command_id).is_some()
    }

    /// Decodes and dispatches one raw unit.
    ///
    /// Invalid units and unknown IDs are dropped.
    pub fn dispatch(&self, raw: &[u8]) {
        self.inner.table.dispatch(raw);
    }

    /// Installs an observer for dropped units.
    pub fn set_diagnostic_hook(&self, hook: impl Fn(&Diagnostic) + Send + Sync + 'static) {
        *self.inner.table.diagnostics.write() = Some(Arc::new(hook));
    }

    /// Removes the diagnostic observer.
    pub fn clear_diagnostic_hook(&self) {
        *self.inner.table.diagnostics.write() = None;
    }

    /// Returns `true` while both pump loops are alive and close was not called.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.inner.shutdown.is_cancelled()
    }

    /// Resolves once the router is closed or the transport died.
    pub async fn closed(&self) {
        self.inner.shutdown.cancelled().await;
    }

    /// Shuts the transport down and terminates the owned process.
    ///
    /// Queued commands get a bounded grace period to flush first, so a host
    /// that stopped reading cannot stall this. Calling this again is a no-op.
    pub async fn close(&self) {
        self.inner.shutdown.cancel();

        let writer = self.inner.writer.lock().take();
        if let Some(writer) = writer
            && let Err(e) = writer.await
        {
            debug!(error = %e, "Writer task failed");
        }

        let process = self.inner.process.lock().take();
        if let Some(mut process) = process {
            process.kill().await;
        }

        info!("Router closed");
    }
}

// ============================================================================
// Tests
// ============================================================================
