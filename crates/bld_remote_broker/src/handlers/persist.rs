//! Inline persistence-store handlers.
//!
//! These never touch the main loop: they acquire the store mutex briefly
//! and answer on the I/O worker.

use super::parse_params;
use crate::registry::{CommandContext, CommandDescriptor, CommandKind};
use bld_remote_protocol::{commands, defaults};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn put_descriptor() -> CommandDescriptor {
    CommandDescriptor {
        name: commands::PUT_PERSIST_DATA,
        kind: CommandKind::Inline(Arc::new(|ctx, params| {
            #[derive(Deserialize)]
            struct PutParams {
                key: String,
                data: Value,
            }
            let params: PutParams = parse_params(params)?;
            ctx.persist.put(params.key, params.data);
            Ok(json!({"stored": true}))
        })),
        default_deadline: defaults::SCENE_READ_DEADLINE,
    }
}

pub fn get_descriptor() -> CommandDescriptor {
    CommandDescriptor {
        name: commands::GET_PERSIST_DATA,
        kind: CommandKind::Inline(Arc::new(|ctx, params| {
            #[derive(Deserialize)]
            struct GetParams {
                key: String,
                #[serde(default)]
                default: Option<Value>,
            }
            let params: GetParams = parse_params(params)?;
            let fallback = params.default.unwrap_or(Value::Null);
            let (found, data) = ctx.persist.get_or(&params.key, fallback);
            Ok(json!({"found": found, "data": data}))
        })),
        default_deadline: defaults::SCENE_READ_DEADLINE,
    }
}

pub fn remove_descriptor() -> CommandDescriptor {
    CommandDescriptor {
        name: commands::REMOVE_PERSIST_DATA,
        kind: CommandKind::Inline(Arc::new(|ctx, params| {
            #[derive(Deserialize)]
            struct RemoveParams {
                key: String,
            }
            let params: RemoveParams = parse_params(params)?;
            let removed = ctx.persist.remove(&params.key);
            Ok(json!({"removed": removed}))
        })),
        default_deadline: defaults::SCENE_READ_DEADLINE,
    }
}

pub fn list_keys_descriptor() -> CommandDescriptor {
    CommandDescriptor {
        name: commands::LIST_PERSIST_KEYS,
        kind: CommandKind::Inline(Arc::new(|ctx, _params| {
            Ok(json!({"keys": ctx.persist.keys()}))
        })),
        default_deadline: defaults::SCENE_READ_DEADLINE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BrokerError;
    use crate::persist::PersistStore;
    use crate::registry::CommandKind;
    use crate::shutdown::ShutdownSignal;

    fn ctx() -> CommandContext {
        CommandContext {
            persist: PersistStore::new(),
            shutdown: ShutdownSignal::new(),
        }
    }

    fn call(descriptor: &CommandDescriptor, ctx: &CommandContext, params: Value) -> Result<Value, BrokerError> {
        match &descriptor.kind {
            CommandKind::Inline(handler) => handler(ctx, params),
            CommandKind::MainLoop(_) => panic!("persistence handlers are inline"),
        }
    }

    #[test]
    fn test_store_retrieve_remove_cycle() {
        let ctx = ctx();
        let put = put_descriptor();
        let get = get_descriptor();
        let remove = remove_descriptor();

        let stored = call(&put, &ctx, json!({"key": "k", "data": {"a": [1, 2, 3]}})).unwrap();
        assert_eq!(stored, json!({"stored": true}));

        let found = call(&get, &ctx, json!({"key": "k"})).unwrap();
        assert_eq!(found, json!({"found": true, "data": {"a": [1, 2, 3]}}));

        let removed = call(&remove, &ctx, json!({"key": "k"})).unwrap();
        assert_eq!(removed, json!({"removed": true}));

        let missing = call(&get, &ctx, json!({"key": "k", "default": null})).unwrap();
        assert_eq!(missing, json!({"found": false, "data": null}));
    }

    #[test]
    fn test_get_with_default_value() {
        let ctx = ctx();
        let get = get_descriptor();
        let result = call(&get, &ctx, json!({"key": "absent", "default": "fallback"})).unwrap();
        assert_eq!(result, json!({"found": false, "data": "fallback"}));
    }

    #[test]
    fn test_put_requires_key_and_data() {
        let ctx = ctx();
        let put = put_descriptor();
        assert!(matches!(
            call(&put, &ctx, json!({"key": "k"})).unwrap_err(),
            BrokerError::BadParams(_)
        ));
        assert!(matches!(
            call(&put, &ctx, json!({"data": 1})).unwrap_err(),
            BrokerError::BadParams(_)
        ));
    }

    #[test]
    fn test_remove_missing_key_reports_false() {
        let ctx = ctx();
        let remove = remove_descriptor();
        let result = call(&remove, &ctx, json!({"key": "nothing"})).unwrap();
        assert_eq!(result, json!({"removed": false}));
    }

    #[test]
    fn test_list_keys() {
        let ctx = ctx();
        ctx.persist.put("b", json!(1));
        ctx.persist.put("a", json!(2));
        let list = list_keys_descriptor();
        let result = call(&list, &ctx, json!({})).unwrap();
        assert_eq!(result, json!({"keys": ["a", "b"]}));
    }
}
