//! Base64 helpers for code and output payloads.
//!
//! Large Python source strings and binary-ish stdout travel base64-encoded
//! to sidestep JSON escaping pitfalls. The broker advertises the encoding
//! with sibling `*_is_base64` flags rather than guessing on decode.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeTextError {
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decoded payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(text.trim())
}

/// Decode base64 that must contain UTF-8 text (e.g. Python source).
pub fn decode_text(text: &str) -> Result<String, DecodeTextError> {
    let bytes = decode(text)?;
    Ok(String::from_utf8(bytes)?)
}

/// True when `text` holds control bytes JSON strings cannot carry without
/// escaping surprises (anything below 0x20 except `\n`, `\r`, `\t`).
pub fn needs_base64(text: &str) -> bool {
    text.chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let source = "import math\nprint(math.pi)\n";
        let encoded = encode(source.as_bytes());
        assert_eq!(decode_text(&encoded).unwrap(), source);
    }

    #[test]
    fn test_decode_tolerates_surrounding_whitespace() {
        let encoded = format!("  {}\n", encode(b"x = 1"));
        assert_eq!(decode_text(&encoded).unwrap(), "x = 1");
    }

    #[test]
    fn test_invalid_base64_is_an_error() {
        assert!(decode_text("not*base64*at*all").is_err());
    }

    #[test]
    fn test_non_utf8_payload_is_an_error() {
        let encoded = encode(&[0xff, 0xfe, 0x00, 0x01]);
        assert!(matches!(
            decode_text(&encoded),
            Err(DecodeTextError::Utf8(_))
        ));
    }

    #[test]
    fn test_needs_base64_on_control_bytes() {
        assert!(!needs_base64("plain text\nwith newlines\tand tabs\r\n"));
        assert!(needs_base64("bell \u{7} char"));
        assert!(needs_base64("nul \u{0}"));
    }
}
