//! Built-in command handlers.
//!
//! Main-loop commands (code execution, scene reads, viewport capture)
//! validate their parameters on the I/O worker and package the remaining
//! work as a scheduled job. Inline commands (persistence, shutdown)
//! complete on the worker without ever touching the host.

mod execute;
mod persist;
mod scene;
mod shutdown;

use crate::error::BrokerError;
use crate::registry::CommandRegistry;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Install every built-in command descriptor.
pub fn install(registry: &mut CommandRegistry) {
    registry.register(execute::descriptor());
    registry.register(scene::scene_info_descriptor());
    registry.register(scene::object_info_descriptor());
    registry.register(scene::screenshot_descriptor());
    registry.register(persist::put_descriptor());
    registry.register(persist::get_descriptor());
    registry.register(persist::remove_descriptor());
    registry.register(persist::list_keys_descriptor());
    registry.register(shutdown::descriptor());
}

/// Decode `params` into a handler's argument struct, refusing the request
/// with `bad_params` on any shape mismatch.
pub(crate) fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, BrokerError> {
    serde_json::from_value(params)
        .map_err(|e| BrokerError::bad_params(format!("invalid parameters: {e}")))
}
