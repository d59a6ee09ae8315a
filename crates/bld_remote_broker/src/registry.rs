//! Command registry: maps a request `type` onto a handler.
//!
//! Each descriptor declares whether its handler mutates application state
//! (must be serialized onto the main loop) or is read-only metadata that
//! can answer inline on the I/O worker. Adding a command means registering
//! a descriptor; no other component changes.

use crate::error::{BrokerError, HandlerResult};
use crate::persist::PersistStore;
use crate::scheduler::MainLoopJob;
use crate::shutdown::ShutdownSignal;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Shared state handed to inline handlers.
#[derive(Clone)]
pub struct CommandContext {
    pub persist: PersistStore,
    pub shutdown: ShutdownSignal,
}

/// Handler that completes on the I/O worker without touching the host.
pub type InlineHandler = Arc<dyn Fn(&CommandContext, Value) -> HandlerResult + Send + Sync>;

/// Validates parameters on the I/O worker, then yields the job that will
/// run on the main loop. Parameter errors refuse the request before it is
/// ever scheduled.
pub type JobBuilder = Arc<dyn Fn(Value) -> Result<MainLoopJob, BrokerError> + Send + Sync>;

pub enum CommandKind {
    Inline(InlineHandler),
    MainLoop(JobBuilder),
}

pub struct CommandDescriptor {
    pub name: &'static str,
    pub kind: CommandKind,
    /// Worker-side completion deadline when the request carries no
    /// override; always clamped by the configured hard ceiling.
    pub default_deadline: Duration,
}

impl CommandDescriptor {
    pub fn requires_main_loop(&self) -> bool {
        matches!(self.kind, CommandKind::MainLoop(_))
    }
}

/// Registry of built-in (and host-registered) commands.
pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDescriptor>,
}

impl CommandRegistry {
    /// Registry with every built-in command installed.
    pub fn builtin() -> Self {
        let mut registry = Self {
            commands: HashMap::new(),
        };
        crate::handlers::install(&mut registry);
        debug!("registered {} commands", registry.commands.len());
        registry
    }

    pub fn register(&mut self, descriptor: CommandDescriptor) {
        debug!("registering command: {}", descriptor.name);
        self.commands.insert(descriptor.name, descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
