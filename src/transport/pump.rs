//! Reader and writer loops over a duplex channel.
//!
//! # Loops
//!
//! - **Writer**: drains the outgoing queue onto the write side. Exits on
//!   write failure, queue closure, or the shutdown token. Already-queued
//!   lines get a bounded grace period to flush before the write side is
//!   shut down.
//! - **Reader**: splits the read side into [`LineFrame`]s and hands them to
//!   the [`UnitHandler`] in arrival order. Exits on read failure, EOF or the
//!   shutdown token.
//!
//! Either loop cancels the shutdown token when it exits, so the death of
//! one direction takes the whole session down.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::protocol::{LineCodec, LineFrame};

// ============================================================================
// UnitHandler
// ============================================================================

/// Receives every unit the reader loop produces.
///
/// Runs on the reader task, so it must not block.
pub(crate) trait UnitHandler: Send + Sync + 'static {
    /// Handles one inbound unit.
    fn handle_unit(&self, frame: LineFrame);
}

// ============================================================================
// Pump
// ============================================================================

/// Handles to a running reader/writer pair.
pub(crate) struct Pump {
    /// Outgoing queue (already encoded lines).
    pub outgoing: mpsc::UnboundedSender<String>,
    /// Writer task.
    pub writer: JoinHandle<()>,
    /// Reader task.
    pub reader: JoinHandle<()>,
}

impl Pump {
    /// Spawns both loops.
    pub(crate) fn spawn<R, W, H>(reader: R, writer: W, handler: Arc<H>, shutdown: CancellationToken) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
        H: UnitHandler,
    {
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();

        let writer = tokio::spawn(run_writer(writer, outgoing_rx, shutdown.clone()));
        let reader = tokio::spawn(run_reader(reader, handler, shutdown));

        Self {
            outgoing,
            writer,
            reader,
        }
    }
}

// ============================================================================
// Loops
// ============================================================================

/// How long the writer keeps flushing queued lines after shutdown.
pub(crate) const SHUTDOWN_FLUSH_TIMEOUT: Duration = Duration::from_millis(500);

/// Writer loop.
///
/// A write blocked on a host that stopped reading is abandoned as soon as
/// the shutdown token fires.
pub(crate) async fn run_writer<W>(
    writer: W,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    shutdown: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    let mut sink = FramedWrite::new(writer, LineCodec::new());
    let mut healthy = true;

    loop {
        tokio::select! {
            biased;

            () = shutdown.cancelled() => {
                debug!("Writer shutdown signalled");
                break;
            }

            line = outgoing.recv() => {
                let Some(line) = line else {
                    debug!("Outgoing queue closed");
                    break;
                };

                trace!(bytes = line.len(), "Writing line");
                let sent = tokio::select! {
                    biased;
                    result = sink.send(line) => Some(result),
                    () = shutdown.cancelled() => None,
                };
                match sent {
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "Write to host failed");
                        healthy = false;
                        break;
                    }
                    None => {
                        debug!("Writer shutdown signalled during a write");
                        break;
                    }
                }
            }
        }
    }

    if healthy {
        match timeout(SHUTDOWN_FLUSH_TIMEOUT, drain(&mut sink, &mut outgoing)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "Failed to close write side"),
            Err(_) => warn!("Host stopped reading, dropping unflushed lines"),
        }
    }
    shutdown.cancel();
    debug!("Writer loop terminated");
}

/// Writes whatever is still queued, then flushes and shuts down the sink.
async fn drain<W>(
    sink: &mut FramedWrite<W, LineCodec>,
    outgoing: &mut mpsc::UnboundedReceiver<String>,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Ok(line) = outgoing.try_recv() {
        sink.feed(line).await?;
    }
    sink.close().await
}

/// Reader loop.
pub(crate) async fn run_reader<R, H>(reader: R, handler: Arc<H>, shutdown: CancellationToken)
where
    R: AsyncRead + Unpin,
    H: UnitHandler,
{
    let mut frames = FramedRead::new(reader, LineCodec::new());

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                debug!("Reader shutdown signalled");
                break;
            }

            frame = frames.next() => {
                match frame {
                    Some(Ok(frame)) => handler.handle_unit(frame),
                    Some(Err(e)) => {
                        warn!(error = %e, "Read from host failed");
                        break;
                    }
                    None => {
                        debug!("Host closed the channel");
                        break;
                    }
                }
            }
        }
    }

    shutdown.cancel();
    debug!("Reader loop terminated");
}

// ============================================================================
// Tests
// ============================================================================
