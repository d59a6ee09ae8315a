//! Canonical command names understood by the command broker.

/// Enumerate scene objects with their transforms and visibility.
pub const GET_SCENE_INFO: &str = "get_scene_info";
/// Detailed dump for one named object, including geometry counts.
pub const GET_OBJECT_INFO: &str = "get_object_info";
/// Run Python source in the host's persistent execution namespace.
pub const EXECUTE_CODE: &str = "execute_code";
/// Render the active viewport to an image file.
pub const GET_VIEWPORT_SCREENSHOT: &str = "get_viewport_screenshot";
/// Store a key/value pair in the in-process persistence store.
pub const PUT_PERSIST_DATA: &str = "put_persist_data";
/// Retrieve a value from the persistence store.
pub const GET_PERSIST_DATA: &str = "get_persist_data";
/// Delete a key from the persistence store.
pub const REMOVE_PERSIST_DATA: &str = "remove_persist_data";
/// List all keys currently held in the persistence store.
pub const LIST_PERSIST_KEYS: &str = "list_persist_keys";
/// Ask the host to quit after the current tick.
pub const SERVER_SHUTDOWN: &str = "server_shutdown";
