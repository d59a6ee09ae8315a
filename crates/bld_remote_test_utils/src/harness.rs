//! Broker harness: a real listener on an OS-assigned loopback port plus a
//! main-loop thread standing in for the host application's tick.

use crate::mock_host::{ExecSpan, MockHost};
use anyhow::{Context, Result};
use bld_remote_broker::{BrokerConfig, BrokerHandle, CommandBroker, PersistStore};
use bld_remote_protocol::{defaults, framing, Response};
use serde_json::Value;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Tick interval for the harness main loop (~500 Hz; the production floor
/// is 100 Hz when idle).
const TICK_INTERVAL: Duration = Duration::from_millis(2);

/// A running broker with its mock host being ticked in the background.
pub struct BrokerFixture {
    handle: BrokerHandle,
    main_loop: Option<JoinHandle<()>>,
    exec_spans: Arc<Mutex<Vec<ExecSpan>>>,
    persist: PersistStore,
}

/// Broker on an ephemeral port with a fresh default mock host.
pub fn spawn_broker() -> BrokerFixture {
    spawn_broker_with(MockHost::new(), BrokerConfig::ephemeral())
        .expect("broker harness failed to start")
}

/// Broker with a caller-prepared host and configuration.
pub fn spawn_broker_with(mut host: MockHost, config: BrokerConfig) -> Result<BrokerFixture> {
    let mut handle = CommandBroker::start(config).context("broker failed to start")?;
    handle.bind_host(&mut host);

    let ticks = handle
        .take_tick_queue()
        .context("tick queue already taken")?;
    let exec_spans = host.exec_spans();
    let persist = handle.persist();
    let shutdown = handle.shutdown_signal();

    let main_loop = thread::Builder::new()
        .name("bld-remote-main-loop".to_string())
        .spawn(move || {
            while !shutdown.is_requested() {
                ticks.run_pending(&mut host);
                thread::sleep(TICK_INTERVAL);
            }
        })
        .context("failed to spawn main-loop thread")?;

    Ok(BrokerFixture {
        handle,
        main_loop: Some(main_loop),
        exec_spans,
        persist,
    })
}

impl BrokerFixture {
    pub fn addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    /// One-shot request against the fixture, panicking on transport
    /// failures so tests read as straight-line assertions.
    pub fn send(&self, frame: Value) -> Response {
        send_frame(self.addr(), &frame).expect("request against fixture failed")
    }

    /// Raw bytes variant for malformed-frame tests. `None` when the broker
    /// closed without a response frame.
    pub fn send_bytes(&self, bytes: &[u8]) -> Option<Response> {
        let mut stream = TcpStream::connect(self.addr()).ok()?;
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .ok()?;
        use std::io::Write as _;
        stream.write_all(bytes).ok()?;
        let _ = stream.shutdown(Shutdown::Write);
        let value = framing::read_json_value(&mut stream, defaults::MAX_FRAME_BYTES).ok()?;
        serde_json::from_value(value).ok()
    }

    /// Execution intervals recorded by the mock host, in completion order.
    pub fn exec_spans(&self) -> Vec<ExecSpan> {
        self.exec_spans.lock().unwrap().clone()
    }

    pub fn persist(&self) -> &PersistStore {
        &self.persist
    }

    pub fn shutdown_requested(&self) -> bool {
        self.handle.shutdown_requested()
    }
}

impl Drop for BrokerFixture {
    fn drop(&mut self) {
        self.handle.request_shutdown();
        if let Some(main_loop) = self.main_loop.take() {
            let _ = main_loop.join();
        }
    }
}

/// Connect, write one frame, read one response frame.
pub fn send_frame(addr: SocketAddr, frame: &Value) -> Result<Response> {
    let mut stream = TcpStream::connect(addr).context("connect failed")?;
    stream
        .set_read_timeout(Some(Duration::from_secs(30)))
        .context("set_read_timeout failed")?;
    framing::write_json_value(&mut stream, frame).context("write failed")?;
    let value = framing::read_json_value(&mut stream, defaults::MAX_FRAME_BYTES)
        .context("read failed")?;
    serde_json::from_value(value).context("response frame did not match the protocol shape")
}
