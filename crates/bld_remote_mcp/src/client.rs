//! One-shot TCP client for the command broker.
//!
//! Connection discipline: every call opens a fresh connection, writes one
//! frame, reads one frame, and closes. No pooling - the cost of a call is
//! dominated by main-loop serialization on the host, not TCP setup.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use bld_remote_protocol::framing::{self, FramingError};
use bld_remote_protocol::{commands, defaults, Response};
use serde_json::{json, Value};
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use tracing::debug;

/// Synchronous client for the broker's one-frame-per-connection protocol.
#[derive(Debug, Clone)]
pub struct BrokerClient {
    host: String,
    port: u16,
    connect_timeout: Duration,
    call_timeout: Duration,
}

impl BrokerClient {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            host: config.broker_host.clone(),
            port: config.broker_port,
            connect_timeout: config.connect_timeout,
            call_timeout: config.call_timeout,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Issue `command` with the default per-call deadline.
    pub fn call(&self, command: &str, params: Value) -> Result<Value, GatewayError> {
        self.call_with_timeout(command, params, self.call_timeout)
    }

    /// Issue `command`, waiting up to `read_timeout` for the response.
    pub fn call_with_timeout(
        &self,
        command: &str,
        params: Value,
        read_timeout: Duration,
    ) -> Result<Value, GatewayError> {
        let frame = json!({"type": command, "params": params});
        debug!(command, "broker call");

        let mut stream = self.connect()?;
        stream.set_write_timeout(Some(self.connect_timeout))?;
        stream.set_read_timeout(Some(read_timeout))?;

        framing::write_json_value(&mut stream, &frame)?;

        let value = match framing::read_json_value(&mut stream, defaults::MAX_FRAME_BYTES) {
            Ok(value) => value,
            Err(FramingError::Io(e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                return Err(GatewayError::CallTimeout {
                    command: command.to_string(),
                })
            }
            Err(FramingError::Io(e)) => return Err(GatewayError::Io(e)),
            Err(FramingError::Closed) => {
                return Err(GatewayError::BadResponse(
                    "connection closed before a response frame arrived".to_string(),
                ))
            }
            Err(FramingError::Malformed(e)) => {
                return Err(GatewayError::BadResponse(e.to_string()))
            }
            Err(FramingError::Oversize { limit }) => {
                return Err(GatewayError::BadResponse(format!(
                    "response frame exceeds the {limit} byte cap"
                )))
            }
        };

        let response: Response = serde_json::from_value(value)
            .map_err(|e| GatewayError::BadResponse(e.to_string()))?;

        match response {
            Response::Success { result } => Ok(result),
            Response::Error { message, code, .. } => Err(GatewayError::Broker { code, message }),
        }
    }

    /// Short round-trip through an inline command, reporting latency.
    /// Used by `check_connection_status` and `--require-broker` startup.
    pub fn probe(&self) -> Result<Duration, GatewayError> {
        let started = Instant::now();
        self.call_with_timeout(
            commands::LIST_PERSIST_KEYS,
            json!({}),
            self.connect_timeout,
        )?;
        Ok(started.elapsed())
    }

    fn connect(&self) -> Result<TcpStream, GatewayError> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|source| GatewayError::Unreachable {
                host: self.host.clone(),
                port: self.port,
                source,
            })?
            .collect();

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    let _ = stream.set_nodelay(true);
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(GatewayError::Unreachable {
            host: self.host.clone(),
            port: self.port,
            source: last_error.unwrap_or_else(|| {
                std::io::Error::new(ErrorKind::AddrNotAvailable, "no addresses resolved")
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(port: u16) -> BrokerClient {
        let mut config = GatewayConfig::for_broker("127.0.0.1", port);
        config.connect_timeout = Duration::from_millis(300);
        BrokerClient::from_config(&config)
    }

    #[test]
    fn test_unreachable_broker_is_reported_with_endpoint() {
        // Bind-then-drop guarantees a port nothing is listening on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = client_for(port).call("get_scene_info", json!({})).unwrap_err();
        match err {
            GatewayError::Unreachable { host, port: p, .. } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(p, port);
            }
            other => panic!("expected Unreachable, got {other:?}"),
        }
    }
}
