//! Wire protocol for the BLD Remote control bridge.
//!
//! The command broker and the tool gateway speak JSON over loopback TCP.
//! Each connection carries exactly one request frame and one response frame;
//! a frame boundary is the end of a valid JSON value (frames are not
//! newline-delimited and carry no length prefix).
//!
//! # Request frame
//! ```json
//! {"type": "execute_code", "params": {"code": "print(1+1)"}}
//! ```
//!
//! A legacy form without `type` is still accepted on ingress and normalized
//! to `execute_code` before dispatch:
//! ```json
//! {"message": "hello", "code": "print('hi')"}
//! ```
//!
//! # Response frame
//! ```json
//! {"status": "success", "result": {...}}
//! {"status": "error", "message": "...", "code": "busy"}
//! ```
//!
//! `result` is always a JSON object, never a bare scalar, so fields can be
//! added without breaking clients.

pub mod commands;
pub mod config;
pub mod defaults;
pub mod encoding;
pub mod error;
pub mod frame;
pub mod framing;

pub use error::{ErrorCode, FrameError};
pub use frame::{RawRequest, Request, Response};
pub use framing::{read_json_value, write_json_value, FramingError};
