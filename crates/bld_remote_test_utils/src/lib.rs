//! Test infrastructure for the BLD Remote bridge.
//!
//! Provides a scripted stand-in for the host 3D application and a harness
//! that runs a real broker on a loopback port with a main-loop thread
//! draining the tick queue, so integration tests exercise the same wire
//! path production clients use.

pub mod harness;
pub mod mock_host;

pub use harness::{send_frame, spawn_broker, spawn_broker_with, BrokerFixture};
pub use mock_host::{ExecSpan, MockHost};
