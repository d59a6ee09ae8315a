//! Request and response frame types, including legacy-form normalization.

use crate::error::{ErrorCode, FrameError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// A request frame exactly as decoded from the wire.
///
/// Two shapes coexist for back-compat: the typed form `{type, params}` and
/// the legacy form `{message?, code?}`. Only the typed form is dispatched;
/// [`RawRequest::normalize`] folds the legacy form into `execute_code`
/// before the registry ever sees it. Unknown sibling fields are tolerated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRequest {
    /// Command name; absence marks the frame as legacy-form.
    #[serde(rename = "type")]
    pub command: Option<String>,

    /// Command-specific payload.
    #[serde(default)]
    pub params: Option<Value>,

    /// Per-request server-side deadline override, in seconds.
    #[serde(rename = "_timeout_seconds")]
    pub timeout_seconds: Option<f64>,

    /// Legacy form: free-text message echoed back in a diagnostic field.
    pub message: Option<String>,

    /// Legacy form: Python source, treated as `execute_code`.
    pub code: Option<String>,
}

/// A normalized request ready for dispatch.
#[derive(Debug, Clone)]
pub struct Request {
    pub command: String,
    /// Always a JSON object (possibly empty).
    pub params: Value,
    /// Deadline override, already validated as positive and finite.
    pub timeout_override: Option<Duration>,
    /// Present when the frame arrived in legacy form with a `message`.
    pub legacy_message: Option<String>,
}

impl RawRequest {
    /// Fold both accepted frame shapes into the typed form.
    pub fn normalize(self) -> Result<Request, FrameError> {
        let timeout_override = match self.timeout_seconds {
            None => None,
            Some(secs) if secs.is_finite() && secs > 0.0 => {
                Some(Duration::from_secs_f64(secs))
            }
            Some(_) => return Err(FrameError::InvalidTimeout),
        };

        if let Some(command) = self.command {
            let params = match self.params {
                Some(Value::Object(map)) => Value::Object(map),
                Some(Value::Null) | None => Value::Object(Map::new()),
                // A non-object params payload is dispatched as-is so the
                // handler can reject it with a parameter-level error.
                Some(other) => other,
            };
            return Ok(Request {
                command,
                params,
                timeout_override,
                legacy_message: None,
            });
        }

        if self.message.is_none() && self.code.is_none() {
            return Err(FrameError::UnrecognizedShape);
        }

        let mut params = Map::new();
        params.insert(
            "code".to_string(),
            Value::String(self.code.unwrap_or_default()),
        );
        Ok(Request {
            command: crate::commands::EXECUTE_CODE.to_string(),
            params: Value::Object(params),
            timeout_override,
            legacy_message: self.message,
        })
    }
}

/// A response frame.
///
/// Exactly one of the two variants goes out per accepted request; `result`
/// is always an object so new fields can be added without breaking clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Success {
        result: Value,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<ErrorCode>,
        /// Formatted interpreter traceback, for `exec_failed` only.
        #[serde(skip_serializing_if = "Option::is_none")]
        traceback: Option<String>,
    },
}

impl Response {
    pub fn success(result: Value) -> Self {
        Response::Success { result }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
            code: Some(code),
            traceback: None,
        }
    }

    pub fn exec_failed(message: impl Into<String>, traceback: Option<String>) -> Self {
        Response::Error {
            message: message.into(),
            code: Some(ErrorCode::ExecFailed),
            traceback,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }
}
