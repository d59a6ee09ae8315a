//! TCP endpoint: accept loop, per-connection workers, and dispatch.
//!
//! Each accepted connection carries exactly one request and one response;
//! there are no persistent sessions and no pipelining. Workers never touch
//! host state - main-loop commands go through the serializer, inline
//! commands answer directly.

use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::host::Host;
use crate::persist::PersistStore;
use crate::registry::{CommandContext, CommandKind, CommandRegistry};
use crate::scheduler::{Scheduler, TickQueue};
use crate::shutdown::ShutdownSignal;
use anyhow::{Context, Result};
use bld_remote_protocol::framing::{self, FramingError};
use bld_remote_protocol::{ErrorCode, FrameError, RawRequest, Request, Response};
use serde_json::Value;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How often the accept loop re-checks the shutdown latch.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// The command broker: a loopback TCP endpoint living inside the host
/// process.
///
/// `start` binds the listener and spawns the accept loop; the host then
/// takes the [`TickQueue`] from the returned handle and drains it from its
/// main loop. Nothing executes on the main loop until the host does so.
pub struct CommandBroker;

impl CommandBroker {
    /// Start with the built-in command set.
    pub fn start(config: BrokerConfig) -> Result<BrokerHandle> {
        Self::start_with_registry(config, CommandRegistry::builtin())
    }

    /// Start with a caller-extended registry.
    pub fn start_with_registry(
        config: BrokerConfig,
        registry: CommandRegistry,
    ) -> Result<BrokerHandle> {
        let listener = TcpListener::bind(config.bind_addr)
            .with_context(|| format!("Failed to bind command broker to {}", config.bind_addr))?;
        let local_addr = listener
            .local_addr()
            .context("Failed to read bound address")?;
        listener
            .set_nonblocking(true)
            .context("Failed to set listener non-blocking")?;

        let (scheduler, tick_queue) = Scheduler::new(config.queue_depth, config.admission_timeout);
        let persist = PersistStore::new();
        let shutdown = ShutdownSignal::new();

        let deps = Arc::new(ConnDeps {
            config: config.clone(),
            registry,
            scheduler: scheduler.clone(),
            context: CommandContext {
                persist: persist.clone(),
                shutdown: shutdown.clone(),
            },
            live_connections: AtomicUsize::new(0),
            connection_seq: AtomicUsize::new(0),
        });

        let accept_shutdown = shutdown.clone();
        let accept_deps = Arc::clone(&deps);
        let accept_thread = thread::Builder::new()
            .name("bld-remote-accept".to_string())
            .spawn(move || accept_loop(listener, accept_deps, accept_shutdown))
            .context("Failed to spawn accept thread")?;

        info!(addr = %local_addr, "command broker listening");

        Ok(BrokerHandle {
            local_addr,
            tick_queue: Some(tick_queue),
            persist,
            shutdown,
            scheduler,
            accept_thread: Some(accept_thread),
        })
    }
}

/// Start a broker from environment configuration when
/// `BLD_REMOTE_MCP_START_NOW` is truthy. Hosts call this at process init.
pub fn start_from_env() -> Result<Option<BrokerHandle>> {
    if !bld_remote_protocol::config::start_now() {
        return Ok(None);
    }
    CommandBroker::start(BrokerConfig::from_env()).map(Some)
}

/// Owner-side handle for a running broker.
pub struct BrokerHandle {
    local_addr: SocketAddr,
    tick_queue: Option<TickQueue>,
    persist: PersistStore,
    shutdown: ShutdownSignal,
    scheduler: Scheduler,
    accept_thread: Option<JoinHandle<()>>,
}

impl BrokerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// The main-loop side of the serializer. Taken exactly once by the
    /// host integration, which drains it from its tick.
    pub fn take_tick_queue(&mut self) -> Option<TickQueue> {
        self.tick_queue.take()
    }

    /// Hand the persistence store to the host so it can bind the facade
    /// into the execution namespace.
    pub fn bind_host(&self, host: &mut dyn Host) {
        host.bind_persist(self.persist.clone());
    }

    pub fn persist(&self) -> PersistStore {
        self.persist.clone()
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// True once a client or the host asked the process to quit.
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.is_requested()
    }

    /// Ask the accept loop to stop; the host observes the same latch.
    pub fn request_shutdown(&self) {
        self.shutdown.request();
    }

    /// True while a main-loop command is queued or executing.
    pub fn is_busy(&self) -> bool {
        self.scheduler.is_busy()
    }

    /// Stop accepting and wait for the accept loop to exit.
    pub fn join(mut self) {
        self.shutdown.request();
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for BrokerHandle {
    fn drop(&mut self) {
        self.shutdown.request();
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
    }
}

/// Everything a connection worker needs, shared behind one Arc.
struct ConnDeps {
    config: BrokerConfig,
    registry: CommandRegistry,
    scheduler: Scheduler,
    context: CommandContext,
    live_connections: AtomicUsize,
    connection_seq: AtomicUsize,
}

fn accept_loop(listener: TcpListener, deps: Arc<ConnDeps>, shutdown: ShutdownSignal) {
    loop {
        if shutdown.is_requested() {
            debug!("accept loop stopping");
            break;
        }

        match listener.accept() {
            Ok((stream, peer)) => {
                let live = deps.live_connections.load(Ordering::SeqCst);
                if live >= deps.config.max_connections {
                    // Shed load with a short close; no response frame.
                    warn!(%peer, live, "connection limit reached, closing");
                    drop(stream);
                    continue;
                }

                let conn_id = deps.connection_seq.fetch_add(1, Ordering::SeqCst);
                deps.live_connections.fetch_add(1, Ordering::SeqCst);
                let worker_deps = Arc::clone(&deps);
                let spawned = thread::Builder::new()
                    .name(format!("bld-remote-conn-{conn_id}"))
                    .spawn(move || {
                        handle_connection(stream, conn_id, &worker_deps);
                        worker_deps.live_connections.fetch_sub(1, Ordering::SeqCst);
                    });
                if let Err(e) = spawned {
                    error!("failed to spawn connection worker: {e}");
                    deps.live_connections.fetch_sub(1, Ordering::SeqCst);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => {
                error!("accept failed: {e}");
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
        }
    }
}

fn handle_connection(mut stream: TcpStream, conn_id: usize, deps: &ConnDeps) {
    let _ = stream.set_nodelay(true);
    let _ = stream.set_read_timeout(Some(deps.config.read_timeout));
    let _ = stream.set_write_timeout(Some(deps.config.write_timeout));

    let frame = match framing::read_json_value(&mut stream, deps.config.max_frame_bytes) {
        Ok(value) => value,
        Err(FramingError::Oversize { limit }) => {
            write_response(
                &mut stream,
                conn_id,
                &Response::error(
                    ErrorCode::BadFrame,
                    format!("request frame exceeds the {limit} byte cap"),
                ),
            );
            return;
        }
        Err(FramingError::Malformed(e)) => {
            write_response(
                &mut stream,
                conn_id,
                &Response::error(ErrorCode::BadFrame, format!("invalid JSON: {e}")),
            );
            return;
        }
        // Transport-level failures abort without a response.
        Err(FramingError::Closed) => {
            debug!(conn_id, "connection closed before a frame arrived");
            return;
        }
        Err(FramingError::Io(e)) => {
            debug!(conn_id, "read failed: {e}");
            return;
        }
    };

    let response = match decode_request(frame) {
        Ok(request) => {
            debug!(conn_id, command = %request.command, "dispatching");
            dispatch(request, deps)
        }
        Err(response) => response,
    };

    write_response(&mut stream, conn_id, &response);
    let _ = stream.shutdown(std::net::Shutdown::Both);
}

/// Decode + normalize a raw frame, mapping failures straight to response
/// frames so the worker has nothing to interpret.
fn decode_request(frame: Value) -> Result<Request, Response> {
    if !frame.is_object() {
        return Err(Response::error(
            ErrorCode::BadFrame,
            "request frame must be a JSON object",
        ));
    }

    let raw: RawRequest = serde_json::from_value(frame)
        .map_err(|e| Response::error(ErrorCode::BadFrame, format!("malformed request: {e}")))?;

    raw.normalize().map_err(|e| match e {
        FrameError::UnrecognizedShape => Response::error(ErrorCode::BadFrame, e.to_string()),
        FrameError::InvalidTimeout => Response::error(ErrorCode::BadParams, e.to_string()),
    })
}

fn dispatch(request: Request, deps: &ConnDeps) -> Response {
    let Some(descriptor) = deps.registry.get(&request.command) else {
        return Response::error(
            ErrorCode::UnknownCommand,
            format!("unknown command type: {}", request.command),
        );
    };

    let outcome = match &descriptor.kind {
        CommandKind::Inline(handler) => handler(&deps.context, request.params),
        CommandKind::MainLoop(builder) => builder(request.params).and_then(|job| {
            let deadline = effective_deadline(
                request.timeout_override,
                descriptor.default_deadline,
                deps.config.hard_deadline,
            );
            deps.scheduler.submit(job, deadline)
        }),
    };

    match outcome {
        Ok(mut result) => {
            // Legacy-form frames get their free-text message echoed back in
            // a diagnostic field alongside the real result.
            if let Some(message) = request.legacy_message {
                if let Some(map) = result.as_object_mut() {
                    map.insert(
                        "message".to_string(),
                        Value::String(format!("Printed message: {message}")),
                    );
                }
            }
            Response::success(result)
        }
        Err(err) => {
            if matches!(err, BrokerError::Internal(_)) {
                error!(command = %request.command, "internal failure: {err}");
            }
            err.to_response()
        }
    }
}

/// Worker deadline: the tightest of the per-request override, the
/// command's default, and the configured hard ceiling.
fn effective_deadline(
    override_deadline: Option<Duration>,
    command_default: Duration,
    hard_cap: Duration,
) -> Duration {
    let base = command_default.min(hard_cap);
    match override_deadline {
        Some(requested) => requested.min(base),
        None => base,
    }
}

fn write_response(stream: &mut TcpStream, conn_id: usize, response: &Response) {
    let value = match serde_json::to_value(response) {
        Ok(value) => value,
        Err(e) => {
            error!(conn_id, "unencodable response: {e}");
            return;
        }
    };
    if let Err(e) = framing::write_json_value(stream, &value) {
        debug!(conn_id, "write failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_deadline_takes_the_tightest_bound() {
        let default = Duration::from_secs(300);
        let hard = Duration::from_secs(600);

        assert_eq!(effective_deadline(None, default, hard), default);
        assert_eq!(
            effective_deadline(Some(Duration::from_secs(5)), default, hard),
            Duration::from_secs(5)
        );
        // Overrides never extend past the per-command default or hard cap.
        assert_eq!(
            effective_deadline(Some(Duration::from_secs(900)), default, hard),
            default
        );
        assert_eq!(
            effective_deadline(None, Duration::from_secs(1200), hard),
            hard
        );
    }

    #[test]
    fn test_decode_request_rejects_non_objects() {
        let err = decode_request(serde_json::json!([1, 2, 3])).unwrap_err();
        let wire = serde_json::to_value(err).unwrap();
        assert_eq!(wire["code"], "bad_frame");
    }

    #[test]
    fn test_decode_request_rejects_wrong_field_types() {
        let err = decode_request(serde_json::json!({"type": 17})).unwrap_err();
        let wire = serde_json::to_value(err).unwrap();
        assert_eq!(wire["code"], "bad_frame");
    }

    #[test]
    fn test_decode_request_maps_bad_timeout_to_bad_params() {
        let err = decode_request(
            serde_json::json!({"type": "execute_code", "_timeout_seconds": -1.0}),
        )
        .unwrap_err();
        let wire = serde_json::to_value(err).unwrap();
        assert_eq!(wire["code"], "bad_params");
    }
}
