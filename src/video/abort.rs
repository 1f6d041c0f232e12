use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{BezelError, BezelResult};

/// Cloneable cancellation flag threaded into long-running pipelines.
#[derive(Clone, Debug, Default)]
pub struct AbortSignal {
    flag: Arc<AtomicBool>,
}

impl AbortSignal {
    /// Create an unset signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear a previous request so the signal can guard the next run.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Return `true` once cancellation was requested.
    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fail with [`BezelError::Aborted`] once cancellation was requested.
    pub fn check(&self) -> BezelResult<()> {
        if self.is_aborted() {
            Err(BezelError::Aborted)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/video/abort.rs"]
mod tests;
