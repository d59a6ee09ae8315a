//! Frame I/O: one complete JSON value per direction per connection.
//!
//! There is no length prefix and no newline delimiter; the reader
//! accumulates bytes and re-attempts a parse until the buffer holds a
//! complete value. A soft size cap bounds memory per connection.

use serde_json::Value;
use std::io::{Read, Write};
use thiserror::Error;

/// Read chunk size. Small frames land in one read; large base64 payloads
/// grow the buffer geometrically through `Vec::extend_from_slice`.
const READ_CHUNK: usize = 16 * 1024;

#[derive(Debug, Error)]
pub enum FramingError {
    #[error("i/o error while reading frame: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame exceeds the {limit} byte cap")]
    Oversize { limit: usize },

    #[error("invalid JSON in frame: {0}")]
    Malformed(serde_json::Error),

    #[error("connection closed before a complete frame arrived")]
    Closed,
}

/// Read one JSON value from `reader`, up to `max_bytes`.
///
/// Returns [`FramingError::Malformed`] as soon as the buffer can be ruled
/// out as a prefix of valid JSON, without waiting for the peer to close.
pub fn read_json_value<R: Read>(reader: &mut R, max_bytes: usize) -> Result<Value, FramingError> {
    let mut buf: Vec<u8> = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            if buf.is_empty() {
                return Err(FramingError::Closed);
            }
            // Peer closed; whatever we have must parse or the frame is bad.
            return serde_json::from_slice(&buf).map_err(FramingError::Malformed);
        }

        if buf.len() + n > max_bytes {
            return Err(FramingError::Oversize { limit: max_bytes });
        }
        buf.extend_from_slice(&chunk[..n]);

        match serde_json::from_slice::<Value>(&buf) {
            Ok(value) => return Ok(value),
            Err(e) if e.is_eof() => continue,
            Err(e) => return Err(FramingError::Malformed(e)),
        }
    }
}

/// Write one JSON value to `writer` and flush.
pub fn write_json_value<W: Write>(writer: &mut W, value: &Value) -> std::io::Result<()> {
    let bytes = serde_json::to_vec(value)?;
    writer.write_all(&bytes)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    /// Reader that hands out its input in fixed-size slices, to exercise
    /// the accumulate-and-reparse loop the way a TCP stream would.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.data.len() {
                return Ok(0);
            }
            let end = (self.pos + self.step).min(self.data.len());
            let n = (end - self.pos).min(out.len());
            out[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_single_read_frame() {
        let frame = json!({"type": "get_scene_info"});
        let bytes = serde_json::to_vec(&frame).unwrap();
        let mut cursor = Cursor::new(bytes);
        let value = read_json_value(&mut cursor, 1024).unwrap();
        assert_eq!(value, frame);
    }

    #[test]
    fn test_frame_split_across_reads() {
        let frame = json!({"type": "execute_code", "params": {"code": "print('x' * 100)"}});
        let mut reader = Trickle {
            data: serde_json::to_vec(&frame).unwrap(),
            pos: 0,
            step: 7,
        };
        let value = read_json_value(&mut reader, 4096).unwrap();
        assert_eq!(value, frame);
    }

    #[test]
    fn test_oversize_frame_rejected() {
        let frame = json!({"type": "execute_code", "params": {"code": "a".repeat(2048)}});
        let mut cursor = Cursor::new(serde_json::to_vec(&frame).unwrap());
        match read_json_value(&mut cursor, 256) {
            Err(FramingError::Oversize { limit: 256 }) => {}
            other => panic!("expected oversize, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json_detected_early() {
        let mut cursor = Cursor::new(b"{\"type\": nonsense}".to_vec());
        match read_json_value(&mut cursor, 1024) {
            Err(FramingError::Malformed(_)) => {}
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_frame_reports_malformed_on_close() {
        let mut cursor = Cursor::new(b"{\"type\": \"exec".to_vec());
        match read_json_value(&mut cursor, 1024) {
            Err(FramingError::Malformed(_)) => {}
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_stream_reports_closed() {
        let mut cursor = Cursor::new(Vec::new());
        match read_json_value(&mut cursor, 1024) {
            Err(FramingError::Closed) => {}
            other => panic!("expected closed, got {other:?}"),
        }
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let frame = json!({"status": "success", "result": {"executed": true}});
        let mut out = Vec::new();
        write_json_value(&mut out, &frame).unwrap();
        let mut cursor = Cursor::new(out);
        assert_eq!(read_json_value(&mut cursor, 1024).unwrap(), frame);
    }
}
