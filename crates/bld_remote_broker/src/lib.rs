//! Command broker for the BLD Remote bridge.
//!
//! A long-lived loopback TCP endpoint hosted inside a 3D-content
//! application. It accepts JSON command frames, dispatches them to
//! built-in handlers, and serializes every state-touching command onto
//! the application's single main-loop thread, so each command observes a
//! consistent view of application state.
//!
//! # Integration
//!
//! The host implements [`host::Host`], starts the broker, takes the
//! [`scheduler::TickQueue`], and drains it from its own tick:
//!
//! ```ignore
//! let mut handle = CommandBroker::start(BrokerConfig::from_env())?;
//! handle.bind_host(&mut my_host);
//! let ticks = handle.take_tick_queue().expect("tick queue taken once");
//! // ... inside the application's main loop, at >= 100 Hz when idle:
//! ticks.run_pending(&mut my_host);
//! if handle.shutdown_requested() { /* quit after this tick */ }
//! ```
//!
//! # Concurrency model
//!
//! Two domains: parallel I/O workers (one per accepted connection) that
//! never touch application state, and the single-threaded cooperative
//! main loop that runs every scheduled job. The serializer in
//! [`scheduler`] is the only bridge between them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod host;
pub mod persist;
pub mod registry;
pub mod scheduler;
pub mod server;
pub mod shutdown;

pub use config::BrokerConfig;
pub use error::BrokerError;
pub use persist::PersistStore;
pub use registry::{CommandContext, CommandDescriptor, CommandKind, CommandRegistry};
pub use scheduler::{MainLoopJob, Scheduler, TickQueue};
pub use server::{start_from_env, BrokerHandle, CommandBroker};
pub use shutdown::ShutdownSignal;
