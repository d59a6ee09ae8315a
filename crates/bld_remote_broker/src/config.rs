//! Broker configuration.

use bld_remote_protocol::{config as env_config, defaults};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Tunables for one broker instance.
///
/// The bind address is loopback-only by construction; there is no
/// authentication or transport encryption, so exposure beyond the local
/// machine is never configured here.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub bind_addr: SocketAddr,
    pub max_frame_bytes: usize,
    pub max_connections: usize,
    pub queue_depth: usize,
    pub admission_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    /// Ceiling applied over every per-command and per-request deadline.
    pub hard_deadline: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self::with_port(defaults::DEFAULT_PORT)
    }
}

impl BrokerConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port),
            max_frame_bytes: defaults::MAX_FRAME_BYTES,
            max_connections: defaults::MAX_CONNECTIONS,
            queue_depth: defaults::MAX_PENDING_JOBS,
            admission_timeout: defaults::ADMISSION_TIMEOUT,
            read_timeout: defaults::SOCKET_READ_TIMEOUT,
            write_timeout: defaults::SOCKET_WRITE_TIMEOUT,
            hard_deadline: defaults::HARD_DEADLINE,
        }
    }

    /// Port taken from `BLD_REMOTE_MCP_PORT`, defaulting when unset.
    pub fn from_env() -> Self {
        Self::with_port(env_config::port_from_env())
    }

    /// OS-assigned port; the bound address is published on the handle.
    pub fn ephemeral() -> Self {
        Self::with_port(0)
    }
}
