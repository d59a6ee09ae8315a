//! `server_shutdown`: latch the quit request for the host and listener.

use crate::registry::{CommandDescriptor, CommandKind};
use bld_remote_protocol::{commands, defaults};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor {
        name: commands::SERVER_SHUTDOWN,
        kind: CommandKind::Inline(Arc::new(|ctx, _params| {
            info!("shutdown requested by client");
            ctx.shutdown.request();
            Ok(json!({"shutting_down": true}))
        })),
        default_deadline: defaults::SCENE_READ_DEADLINE,
    }
}
