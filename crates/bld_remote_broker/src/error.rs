//! Broker-side error type and its mapping onto wire responses.

use crate::host::HostError;
use bld_remote_protocol::{ErrorCode, Response};
use thiserror::Error;

/// Errors returned by command handlers and the execution serializer.
///
/// Handlers never panic across the dispatcher: every failure becomes one of
/// these variants, and the dispatcher converts it to a response frame
/// verbatim.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("{0}")]
    BadParams(String),

    #[error("server busy: command queue is full")]
    Busy,

    #[error("deadline elapsed before the command completed; it may still be running on the host")]
    Timeout,

    #[error("{message}")]
    ExecFailed {
        message: String,
        traceback: Option<String>,
    },

    #[error("Viewport capture unavailable in background mode")]
    Headless,

    #[error("{0}")]
    Host(String),

    #[error("{0}")]
    Internal(String),
}

impl BrokerError {
    pub fn bad_params(message: impl Into<String>) -> Self {
        BrokerError::BadParams(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            BrokerError::BadParams(_) => ErrorCode::BadParams,
            BrokerError::Busy => ErrorCode::Busy,
            BrokerError::Timeout => ErrorCode::Timeout,
            BrokerError::ExecFailed { .. } => ErrorCode::ExecFailed,
            BrokerError::Headless => ErrorCode::Headless,
            BrokerError::Host(_) => ErrorCode::HostError,
            BrokerError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn to_response(&self) -> Response {
        match self {
            BrokerError::ExecFailed { message, traceback } => {
                Response::exec_failed(message.clone(), traceback.clone())
            }
            other => Response::error(other.code(), other.to_string()),
        }
    }
}

impl From<HostError> for BrokerError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Headless => BrokerError::Headless,
            HostError::Api(message) => BrokerError::Host(message),
        }
    }
}

/// Shorthand used throughout the handler modules.
pub type HandlerResult = Result<serde_json::Value, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_mapping() {
        assert_eq!(BrokerError::Busy.code(), ErrorCode::Busy);
        assert_eq!(
            BrokerError::bad_params("missing key").code(),
            ErrorCode::BadParams
        );
        assert_eq!(BrokerError::Headless.code(), ErrorCode::Headless);
    }

    #[test]
    fn test_exec_failed_response_carries_traceback() {
        let err = BrokerError::ExecFailed {
            message: "NameError: name 'x' is not defined".to_string(),
            traceback: Some("Traceback (most recent call last): ...".to_string()),
        };
        let wire = serde_json::to_value(err.to_response()).unwrap();
        assert_eq!(wire["status"], "error");
        assert_eq!(wire["code"], "exec_failed");
        assert!(wire["traceback"].as_str().unwrap().starts_with("Traceback"));
    }

    #[test]
    fn test_host_error_conversion() {
        let err: BrokerError = HostError::Headless.into();
        assert_eq!(err.code(), ErrorCode::Headless);

        let err: BrokerError = HostError::Api("render failed".to_string()).into();
        assert_eq!(err.code(), ErrorCode::HostError);
        assert_eq!(err.to_string(), "render failed");
    }
}
