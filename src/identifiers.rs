//! Type-safe identifiers for sessions, windows and requests.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//!
//! | Type | Assigned by | Representation |
//! |------|-------------|----------------|
//! | [`SessionId`] | This process (atomic counter) | `u64` |
//! | [`WindowId`] | Host process (create response) | `i64` |
//! | [`RequestId`] | This process (random UUID) | UUID string |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// SessionId
// ============================================================================

/// Process-wide session counter.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of one controlled host-process instance.
///
/// Unique for the lifetime of the current process, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Allocates the next session ID.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// WindowId
// ============================================================================

/// Identifier of a host window, as assigned by the host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(i64);

impl WindowId {
    /// Wraps a host-assigned window ID.
    #[inline]
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// RequestId
// ============================================================================

/// Correlation ID embedded in request bodies and echoed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh random request ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_monotonic() {
        let first = SessionId::next();
        let second = SessionId::next();
        assert!(second > first);
    }

    #[test]
    fn test_window_id_is_transparent_json() {
        let json = serde_json::to_string(&WindowId::new(7)).expect("serialize");
        assert_eq!(json, "7");

        let id: WindowId = serde_json::from_str("42").expect("parse");
        assert_eq!(id.as_i64(), 42);
    }

    #[test]
    fn test_request_id_roundtrips_as_string() {
        let id = RequestId::generate();
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{id}\""));

        let parsed: RequestId = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_request_ids_differ() {
        assert_ne!(RequestId::generate(), RequestId::generate());
    }
}
