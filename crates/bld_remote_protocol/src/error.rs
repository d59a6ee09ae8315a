//! Error taxonomy carried on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Machine-readable error classification for error responses.
///
/// This is the CANONICAL taxonomy - every error response carries one of
/// these in its `code` field, and the gateway preserves it verbatim when
/// translating broker failures into tool errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed request JSON, unrecognized frame shape, or oversize frame.
    BadFrame,
    /// `type` names no registered command.
    UnknownCommand,
    /// Parameter missing or wrong shape; refused before scheduling.
    BadParams,
    /// The serializer queue is full.
    Busy,
    /// The worker deadline elapsed before the job completed.
    Timeout,
    /// User code raised inside the embedded interpreter.
    ExecFailed,
    /// GUI-only operation attempted without a display.
    Headless,
    /// Any other host-API failure.
    HostError,
    /// Broker precondition violated; should never occur in steady state.
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadFrame => "bad_frame",
            ErrorCode::UnknownCommand => "unknown_command",
            ErrorCode::BadParams => "bad_params",
            ErrorCode::Busy => "busy",
            ErrorCode::Timeout => "timeout",
            ErrorCode::ExecFailed => "exec_failed",
            ErrorCode::Headless => "headless",
            ErrorCode::HostError => "host_error",
            ErrorCode::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures while normalizing a decoded request frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Neither `type` nor a legacy `{message, code}` field is present.
    #[error("request frame has neither 'type' nor a legacy message/code field")]
    UnrecognizedShape,
    /// `_timeout_seconds` was present but not a positive finite number.
    #[error("_timeout_seconds must be a positive, finite number")]
    InvalidTimeout,
}
