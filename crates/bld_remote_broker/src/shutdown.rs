//! Shutdown latch shared between the accept loop, inline handlers, and
//! the host integration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Set once by `server_shutdown` (or the host itself); never cleared.
/// The accept loop stops on the next poll, and the host is expected to
/// quit after the tick on which it observes the latch.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
