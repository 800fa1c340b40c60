//! Newline delimited framing.
//!
//! [`LineCodec`] splits the inbound byte stream at `\n` and writes outgoing
//! lines with a trailing `\n`. Lines above [`MAX_LINE_LENGTH`] are discarded
//! up to the next delimiter and reported as [`LineFrame::Oversized`], so an
//! oversized unit never terminates the stream.

// ============================================================================
// Imports
// ============================================================================

use std::io;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

// ============================================================================
// Constants
// ============================================================================

/// Maximum line size (16 MB).
pub const MAX_LINE_LENGTH: usize = 16 * 1024 * 1024;

// ============================================================================
// LineFrame
// ============================================================================

/// A unit produced by [`LineCodec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineFrame {
    /// A complete line, delimiter and trailing `\r` stripped.
    Line(Bytes),
    /// A line longer than the limit was skipped.
    Oversized(usize),
}

// ============================================================================
// LineCodec
// ============================================================================

/// Codec for `\n` terminated lines.
#[derive(Debug, Clone)]
pub struct LineCodec {
    max_length: usize,
    /// Offset already scanned for a delimiter.
    next_index: usize,
    /// Bytes skipped so far while discarding an oversized line.
    discarding: Option<usize>,
}

impl LineCodec {
    /// Creates a codec with the default limit.
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_LENGTH)
    }

    /// Creates a codec with a custom line limit.
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: None,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = LineFrame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let read_to = src.len();
        let newline = src[self.next_index..read_to]
            .iter()
            .position(|b| *b == b'\n')
            .map(|offset| self.next_index + offset);

        match (self.discarding, newline) {
            (Some(skipped), Some(idx)) => {
                src.advance(idx + 1);
                self.next_index = 0;
                self.discarding = None;
                Ok(Some(LineFrame::Oversized(skipped + idx)))
            }
            (Some(skipped), None) => {
                src.advance(read_to);
                self.next_index = 0;
                self.discarding = Some(skipped + read_to);
                Ok(None)
            }
            (None, Some(idx)) => {
                self.next_index = 0;
                let mut line = src.split_to(idx + 1);
                line.truncate(idx);
                if line.last() == Some(&b'\r') {
                    line.truncate(idx - 1);
                }

                if line.len() > self.max_length {
                    return Ok(Some(LineFrame::Oversized(line.len())));
                }
                Ok(Some(LineFrame::Line(line.freeze())))
            }
            (None, None) if read_to > self.max_length => {
                src.advance(read_to);
                self.next_index = 0;
                self.discarding = Some(read_to);
                Ok(None)
            }
            (None, None) => {
                self.next_index = read_to;
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }

        // An unterminated tail is not a unit.
        if !src.is_empty() {
            trace!(bytes = src.len(), "Dropping unterminated trailing data");
            src.clear();
        }
        self.next_index = 0;
        self.discarding = None;
        Ok(None)
    }
}

impl Encoder<String> for LineCodec {
    type Error = io::Error;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(s: &str) -> LineFrame {
        LineFrame::Line(Bytes::copy_from_slice(s.as_bytes()))
    }

    #[test]
    fn test_decode_splits_lines() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("abc\ndef\r\n");

        assert_eq!(codec.decode(&mut buf).unwrap(), Some(line("abc")));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(line("def")));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_waits_for_delimiter() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("partial");

        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b" line\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(line("partial line")));
    }

    #[test]
    fn test_oversized_line_is_skipped() {
        let mut codec = LineCodec::with_max_length(4);
        let mut buf = BytesMut::from("toolong");

        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"still\nok\n");

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(LineFrame::Oversized("toolongstill".len()))
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(line("ok")));
    }

    #[test]
    fn test_oversized_complete_line() {
        let mut codec = LineCodec::with_max_length(2);
        let mut buf = BytesMut::from("abcd\nxy\n");

        assert_eq!(codec.decode(&mut buf).unwrap(), Some(LineFrame::Oversized(4)));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(line("xy")));
    }

    #[test]
    fn test_decode_eof_drops_tail() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("done\ntail");

        assert_eq!(codec.decode_eof(&mut buf).unwrap(), Some(line("done")));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encode_appends_newline() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        codec.encode("aGVsbG8=".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"aGVsbG8=\n");
    }
}
