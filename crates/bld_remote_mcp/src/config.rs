//! Gateway configuration.

use bld_remote_protocol::{config as env_config, defaults};
use std::time::Duration;

/// Settings for one gateway process.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Server name (reported in initialize)
    pub server_name: String,

    /// Server version (reported in initialize)
    pub server_version: String,

    /// Broker endpoint. Always loopback in practice; kept addressable for
    /// tests that bind ephemeral ports.
    pub broker_host: String,
    pub broker_port: u16,

    /// TCP connect timeout for each one-shot broker call.
    pub connect_timeout: Duration,

    /// Socket read deadline for quick commands (scene reads, persistence).
    pub call_timeout: Duration,

    /// Longer deadlines for commands that can legitimately take a while.
    pub execute_timeout: Duration,
    pub screenshot_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server_name: "bld-remote-mcp".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            broker_host: defaults::BIND_HOST.to_string(),
            broker_port: env_config::port_from_env(),
            connect_timeout: defaults::GATEWAY_CONNECT_TIMEOUT,
            call_timeout: defaults::GATEWAY_CALL_TIMEOUT,
            execute_timeout: defaults::EXECUTE_CODE_DEADLINE,
            screenshot_timeout: defaults::SCREENSHOT_DEADLINE,
        }
    }
}

impl GatewayConfig {
    /// Config pointed at an explicit broker endpoint.
    pub fn for_broker(host: impl Into<String>, port: u16) -> Self {
        Self {
            broker_host: host.into(),
            broker_port: port,
            ..Self::default()
        }
    }
}
