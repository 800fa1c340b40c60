//! Envelope encode/decode.
//!
//! An [`Envelope`] is the `(command_id, body)` unit exchanged with the host.
//!
//! # Format
//!
//! ```text
//! base64( {"CommandID":"window_close","CommandBody":"{\"WindowID\":7}"} )
//! ```
//!
//! The body travels as a JSON string. It is opaque to the router and is
//! usually JSON itself.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Wire Records
// ============================================================================

/// Outgoing JSON record (borrowed).
#[derive(Serialize)]
struct WireRecordRef<'a> {
    #[serde(rename = "CommandID")]
    command_id: &'a str,
    #[serde(rename = "CommandBody")]
    command_body: &'a str,
}

/// Incoming JSON record.
///
/// Older hosts spell the body field `ComandBody`.
#[derive(Deserialize)]
struct WireRecord {
    #[serde(rename = "CommandID")]
    command_id: String,
    #[serde(rename = "CommandBody", alias = "ComandBody", default)]
    command_body: String,
}

// ============================================================================
// Envelope
// ============================================================================

/// A `(command_id, body)` pair.
///
/// The command ID is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    command_id: String,
    body: Vec<u8>,
}

impl Envelope {
    /// Creates an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `command_id` is empty.
    pub fn new(command_id: impl Into<String>, body: impl Into<Vec<u8>>) -> Result<Self> {
        let command_id = command_id.into();
        if command_id.is_empty() {
            return Err(Error::invalid_argument("command ID must not be empty"));
        }

        Ok(Self {
            command_id,
            body: body.into(),
        })
    }

    /// Returns the command ID.
    #[inline]
    #[must_use]
    pub fn command_id(&self) -> &str {
        &self.command_id
    }

    /// Returns the body bytes.
    #[inline]
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Splits the envelope into its parts.
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.command_id, self.body)
    }

    /// Encodes the envelope into a wire line (without the delimiter).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the body is not valid UTF-8.
    pub fn encode(&self) -> Result<String> {
        let command_body = std::str::from_utf8(&self.body)
            .map_err(|e| Error::invalid_argument(format!("body is not valid UTF-8: {e}")))?;

        let json = serde_json::to_vec(&WireRecordRef {
            command_id: &self.command_id,
            command_body,
        })?;

        Ok(STANDARD.encode(json))
    }

    /// Decodes a wire line into an envelope.
    ///
    /// Surrounding whitespace (including a trailing `\r`) is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for invalid base64, malformed JSON or an
    /// empty command ID.
    pub fn decode(line: &[u8]) -> Result<Self> {
        let raw = STANDARD
            .decode(line.trim_ascii())
            .map_err(|e| Error::decode(format!("invalid base64: {e}")))?;

        let record: WireRecord = serde_json::from_slice(&raw)
            .map_err(|e| Error::decode(format!("invalid envelope JSON: {e}")))?;

        if record.command_id.is_empty() {
            return Err(Error::decode("empty command ID"));
        }

        Ok(Self {
            command_id: record.command_id,
            body: record.command_body.into_bytes(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_encode_matches_wire_format() {
        let envelope = Envelope::new("window_close", br#"{"WindowID":7}"#.to_vec()).expect("envelope");
        let line = envelope.encode().expect("encode");

        let json = STANDARD.decode(&line).expect("base64");
        let expected = r#"{"CommandID":"window_close","CommandBody":"{\"WindowID\":7}"}"#;
        assert_eq!(std::str::from_utf8(&json).expect("utf8"), expected);
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_decode_accepts_legacy_body_field() {
        let json = r#"{"CommandID":"window_closed","ComandBody":"{\"WindowID\":3}"}"#;
        let line = STANDARD.encode(json);

        let envelope = Envelope::decode(line.as_bytes()).expect("decode");
        assert_eq!(envelope.command_id(), "window_closed");
        assert_eq!(envelope.body(), br#"{"WindowID":3}"#);
    }

    #[test]
    fn test_decode_tolerates_crlf() {
        let envelope = Envelope::new("window_load_complete", Vec::new()).expect("envelope");
        let line = format!("{}\r\n", envelope.encode().expect("encode"));

        let decoded = Envelope::decode(line.as_bytes()).expect("decode");
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_decode_missing_body_is_empty() {
        let line = STANDARD.encode(r#"{"CommandID":"window_load_complete"}"#);
        let envelope = Envelope::decode(line.as_bytes()).expect("decode");
        assert!(envelope.body().is_empty());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(Envelope::decode(b"!!not base64!!"), Err(Error::Decode { .. })));

        let not_json = STANDARD.encode("hello");
        assert!(matches!(Envelope::decode(not_json.as_bytes()), Err(Error::Decode { .. })));

        let empty_id = STANDARD.encode(r#"{"CommandID":"","CommandBody":""}"#);
        assert!(matches!(Envelope::decode(empty_id.as_bytes()), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_new_rejects_empty_command_id() {
        assert!(matches!(Envelope::new("", Vec::new()), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_encode_rejects_non_utf8_body() {
        let envelope = Envelope::new("window_send_message", vec![0xff, 0xfe]).expect("envelope");
        assert!(matches!(envelope.encode(), Err(Error::InvalidArgument { .. })));
    }

    proptest! {
        #[test]
        fn prop_wellformed_lines_reencode_identically(
            command_id in "[a-z_]{1,32}",
            body in any::<String>(),
        ) {
            let line = Envelope::new(command_id, body).unwrap().encode().unwrap();
            let decoded = Envelope::decode(line.as_bytes()).unwrap();
            prop_assert_eq!(decoded.encode().unwrap(), line);
        }

        #[test]
        fn prop_decode_never_panics(line in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = Envelope::decode(&line);
        }
    }
}
