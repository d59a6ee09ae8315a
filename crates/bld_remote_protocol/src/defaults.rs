//! Canonical defaults and resource ceilings shared by broker and gateway.

use std::time::Duration;

/// Default TCP port for the command broker.
pub const DEFAULT_PORT: u16 = 6688;

/// The broker binds loopback only; there is no authentication layer.
pub const BIND_HOST: &str = "127.0.0.1";

/// Soft cap on a single request or response frame.
pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// Pending main-loop jobs beyond the one in flight. Requests arriving when
/// the queue is full are rejected with `busy`.
pub const MAX_PENDING_JOBS: usize = 16;

/// Live TCP connections; further accepts are closed without a response.
pub const MAX_CONNECTIONS: usize = 64;

/// How long a worker waits for queue space before rejecting with `busy`.
pub const ADMISSION_TIMEOUT: Duration = Duration::from_secs(2);

/// Per-connection socket timeouts.
pub const SOCKET_READ_TIMEOUT: Duration = Duration::from_secs(30);
pub const SOCKET_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Hard ceiling on any single request, regardless of overrides.
pub const HARD_DEADLINE: Duration = Duration::from_secs(600);

/// Per-command default deadlines, all clamped by [`HARD_DEADLINE`].
pub const EXECUTE_CODE_DEADLINE: Duration = Duration::from_secs(300);
pub const SCREENSHOT_DEADLINE: Duration = Duration::from_secs(120);
pub const SCENE_READ_DEADLINE: Duration = Duration::from_secs(60);

/// Longest-side constraint for viewport captures.
pub const DEFAULT_VIEWPORT_MAX_SIZE: u32 = 800;
pub const VIEWPORT_MAX_SIZE_CEILING: u32 = 4096;

/// Gateway-side timeouts for one-shot broker calls.
pub const GATEWAY_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const GATEWAY_CALL_TIMEOUT: Duration = Duration::from_secs(60);
