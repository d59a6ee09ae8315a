//! Gateway-side failures and their rendering for tool consumers.

use bld_remote_protocol::ErrorCode;
use thiserror::Error;

/// Failures while translating one tool call into one broker request.
///
/// Broker error codes are preserved verbatim so MCP clients can branch on
/// them; timeout paths carry the reminder that the job itself was not
/// cancelled on the host.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("host not reachable on {host}:{port} ({source}); is the 3D application running with the bridge enabled?")]
    Unreachable {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o failure talking to the broker: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out waiting for '{command}'; a long-running job may still be executing on the host")]
    CallTimeout { command: String },

    #[error("{}", broker_message(.code, .message))]
    Broker {
        code: Option<ErrorCode>,
        message: String,
    },

    #[error("broker response did not match the protocol: {0}")]
    BadResponse(String),
}

impl GatewayError {
    /// The broker's error code, when this failure carries one.
    pub fn broker_code(&self) -> Option<ErrorCode> {
        match self {
            GatewayError::Broker { code, .. } => *code,
            GatewayError::CallTimeout { .. } => Some(ErrorCode::Timeout),
            _ => None,
        }
    }
}

fn broker_message(code: &Option<ErrorCode>, message: &str) -> String {
    match code {
        Some(code) if *code == ErrorCode::Timeout => format!(
            "[{code}] {message}; a long-running job may still be executing on the host"
        ),
        Some(code) => format!("[{code}] {message}"),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_error_preserves_code() {
        let err = GatewayError::Broker {
            code: Some(ErrorCode::Busy),
            message: "server busy: command queue is full".to_string(),
        };
        assert_eq!(err.to_string(), "[busy] server busy: command queue is full");
        assert_eq!(err.broker_code(), Some(ErrorCode::Busy));
    }

    #[test]
    fn test_timeout_errors_carry_the_hint() {
        let err = GatewayError::Broker {
            code: Some(ErrorCode::Timeout),
            message: "deadline elapsed".to_string(),
        };
        assert!(err.to_string().contains("may still be executing"));

        let err = GatewayError::CallTimeout {
            command: "execute_code".to_string(),
        };
        assert!(err.to_string().contains("may still be executing"));
        assert_eq!(err.broker_code(), Some(ErrorCode::Timeout));
    }

    #[test]
    fn test_codeless_error_renders_bare() {
        let err = GatewayError::Broker {
            code: None,
            message: "something odd".to_string(),
        };
        assert_eq!(err.to_string(), "something odd");
    }
}
