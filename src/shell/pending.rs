//! Correlation table for request/response commands.
//!
//! Each outgoing request carries a fresh [`RequestId`]. The host echoes it in
//! the response, which completes exactly the matching waiter. Responses
//! without an ID complete the oldest waiter. Responses with an unknown ID
//! (late, or for a request that already timed out) are dropped.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::transport::Router;

// ============================================================================
// Request ID Probe
// ============================================================================

#[derive(Deserialize)]
struct RequestIdProbe {
    #[serde(rename = "RequestID", default)]
    request_id: Option<RequestId>,
}

/// Extracts the echoed `RequestID` from a response body, if any.
///
/// Empty and non-JSON bodies yield `None`.
pub(crate) fn echoed_request_id(body: &[u8]) -> Option<RequestId> {
    if body.trim_ascii().is_empty() {
        return None;
    }
    serde_json::from_slice::<RequestIdProbe>(body)
        .ok()
        .and_then(|probe| probe.request_id)
}

// ============================================================================
// PendingRequests
// ============================================================================

#[derive(Default)]
struct Slots {
    waiters: FxHashMap<RequestId, oneshot::Sender<Vec<u8>>>,
    order: VecDeque<RequestId>,
}

/// Waiters for one operation kind.
pub(crate) struct PendingRequests {
    operation: &'static str,
    timeout: Duration,
    slots: Mutex<Slots>,
}

impl PendingRequests {
    /// Creates an empty table.
    pub(crate) fn new(operation: &'static str, timeout: Duration) -> Self {
        Self {
            operation,
            timeout,
            slots: Mutex::new(Slots::default()),
        }
    }

    /// Allocates a request ID and its completion slot.
    pub(crate) fn register(&self) -> (RequestId, oneshot::Receiver<Vec<u8>>) {
        let request_id = RequestId::generate();
        let (tx, rx) = oneshot::channel();

        let mut slots = self.slots.lock();
        slots.waiters.insert(request_id, tx);
        slots.order.push_back(request_id);

        (request_id, rx)
    }

    /// Completes a waiter with a response body.
    ///
    /// Returns `false` if the response matched nobody and was dropped.
    pub(crate) fn complete(&self, request_id: Option<RequestId>, body: Vec<u8>) -> bool {
        match self.claim(request_id) {
            Some(sender) => sender.send(body).is_ok(),
            None => false,
        }
    }

    /// Detaches the waiter a response belongs to without completing it.
    ///
    /// An echoed ID selects its own waiter. Without one the oldest waiter is
    /// taken. Returns `None` if nobody is waiting.
    pub(crate) fn claim(&self, request_id: Option<RequestId>) -> Option<oneshot::Sender<Vec<u8>>> {
        let sender = {
            let mut slots = self.slots.lock();
            match request_id {
                Some(id) => {
                    let sender = slots.waiters.remove(&id);
                    if sender.is_some() {
                        slots.order.retain(|queued| *queued != id);
                    }
                    sender
                }
                None => {
                    let mut sender = None;
                    while let Some(id) = slots.order.pop_front() {
                        if let Some(found) = slots.waiters.remove(&id) {
                            sender = Some(found);
                            break;
                        }
                    }
                    sender
                }
            }
        };

        if sender.is_none() {
            trace!(operation = self.operation, ?request_id, "Dropping unmatched response");
        }
        sender
    }

    /// Forgets a waiter.
    pub(crate) fn remove(&self, request_id: RequestId) {
        let mut slots = self.slots.lock();
        if slots.waiters.remove(&request_id).is_some() {
            slots.order.retain(|queued| *queued != request_id);
        }
    }

    /// Returns the number of outstanding waiters.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().waiters.len()
    }

    /// Waits for the response to `request_id`.
    ///
    /// The slot is removed on every exit path, including cancellation.
    ///
    /// # Errors
    ///
    /// - [`Error::RequestTimeout`] if no response arrives in time
    /// - [`Error::ConnectionClosed`] if the transport dies first
    pub(crate) async fn wait(
        &self,
        router: &Router,
        request_id: RequestId,
        rx: oneshot::Receiver<Vec<u8>>,
    ) -> Result<Vec<u8>> {
        let _guard = SlotGuard {
            table: self,
            request_id,
        };

        tokio::select! {
            biased;

            result = tokio::time::timeout(self.timeout, rx) => match result {
                Ok(Ok(body)) => {
                    debug!(operation = self.operation, %request_id, "Request completed");
                    Ok(body)
                }
                Ok(Err(_)) => Err(Error::ConnectionClosed),
                Err(_) => {
                    debug!(operation = self.operation, %request_id, "Request timed out");
                    Err(Error::request_timeout(
                        self.operation,
                        request_id,
                        self.timeout.as_millis() as u64,
                    ))
                }
            },
            () = router.closed() => Err(Error::ConnectionClosed),
        }
    }
}

/// Removes a slot when its waiter goes away.
struct SlotGuard<'a> {
    table: &'a PendingRequests,
    request_id: RequestId,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.table.remove(self.request_id);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::transport::Channel;

    fn idle_router() -> (Router, tokio::io::DuplexStream) {
        let (local, remote) = tokio::io::duplex(1024);
        let (reader, writer) = tokio::io::split(local);
        (Router::new(Channel::new(reader, writer)), remote)
    }

    #[test]
    fn test_echoed_request_id() {
        let id = RequestId::generate();
        let body = format!(r#"{{"RequestID":"{id}","WindowID":3}}"#);

        assert_eq!(echoed_request_id(body.as_bytes()), Some(id));
        assert_eq!(echoed_request_id(br#"{"WindowID":3}"#), None);
        assert_eq!(echoed_request_id(b""), None);
        assert_eq!(echoed_request_id(b"not json"), None);
    }

    #[test]
    fn test_complete_by_id_out_of_order() {
        let table = PendingRequests::new("window_create", Duration::from_secs(5));
        let (first, mut first_rx) = table.register();
        let (second, mut second_rx) = table.register();

        assert!(table.complete(Some(second), b"second".to_vec()));
        assert!(table.complete(Some(first), b"first".to_vec()));

        assert_eq!(first_rx.try_recv().unwrap(), b"first");
        assert_eq!(second_rx.try_recv().unwrap(), b"second");
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_complete_without_id_is_fifo() {
        let table = PendingRequests::new("window_create", Duration::from_secs(5));
        let (_first, mut first_rx) = table.register();
        let (_second, mut second_rx) = table.register();

        assert!(table.complete(None, b"a".to_vec()));
        assert_eq!(first_rx.try_recv().unwrap(), b"a");
        assert!(second_rx.try_recv().is_err());

        assert!(table.complete(None, b"b".to_vec()));
        assert_eq!(second_rx.try_recv().unwrap(), b"b");
    }

    #[test]
    fn test_unknown_id_is_dropped() {
        let table = PendingRequests::new("window_load_url", Duration::from_secs(30));
        let (_id, mut rx) = table.register();

        assert!(!table.complete(Some(RequestId::generate()), Vec::new()));
        assert!(rx.try_recv().is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_claim_detaches_without_completing() {
        let table = PendingRequests::new("window_create", Duration::from_secs(5));
        let (id, mut rx) = table.register();

        let sender = table.claim(Some(id)).expect("waiter is pending");
        assert_eq!(table.len(), 0);
        assert!(rx.try_recv().is_err());
        assert!(table.claim(Some(id)).is_none());

        sender.send(b"done".to_vec()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), b"done");
    }

    #[test]
    fn test_fifo_skips_removed_waiters() {
        let table = PendingRequests::new("window_create", Duration::from_secs(5));
        let (first, _first_rx) = table.register();
        let (_second, mut second_rx) = table.register();

        table.remove(first);
        assert!(table.complete(None, b"x".to_vec()));
        assert_eq!(second_rx.try_recv().unwrap(), b"x");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_and_clears_slot() {
        let (router, _remote) = idle_router();
        let table = PendingRequests::new("window_create", Duration::from_secs(5));
        let (id, rx) = table.register();

        let err = table.wait(&router, id, rx).await.unwrap_err();
        assert!(matches!(
            err,
            Error::RequestTimeout {
                operation: "window_create",
                timeout_ms: 5000,
                ..
            }
        ));
        assert_eq!(table.len(), 0);
        assert!(!table.complete(Some(id), Vec::new()));
    }

    #[tokio::test]
    async fn test_wait_fails_when_transport_dies() {
        let (router, remote) = idle_router();
        let table = PendingRequests::new("window_create", Duration::from_secs(5));
        let (id, rx) = table.register();

        drop(remote);
        let err = table.wait(&router, id, rx).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
        assert_eq!(table.len(), 0);
    }
}
