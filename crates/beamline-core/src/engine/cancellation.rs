use super::error::EngineError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between an algorithm host, its child
/// algorithms, and the algorithm manager.
///
/// Cancellation is polled, never preemptive: long-running `exec` loops call
/// [`CancellationToken::check`] at safe points (typically the top of a
/// per-spectrum iteration) and unwind with `EngineError::Cancelled`.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; observed by every clone of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Clears a stale request so a token cancelled between runs does not
    /// poison the next execution.
    pub fn clear(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }

    /// Errors out with `EngineError::Cancelled` when cancellation was
    /// requested.
    pub fn check(&self, algorithm: &str) -> Result<(), EngineError> {
        if self.is_cancelled() {
            return Err(EngineError::Cancelled {
                algorithm: algorithm.to_string(),
            });
        }
        Ok(())
    }
}
