use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Returned by an operation that observed a cancellation request.
///
/// Whatever the operation had done up to that point stays done; there is
/// no undo of register writes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("operation cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Cooperative cancellation flag shared between a polling thread and
/// whoever wants it to stop.
///
/// Clones share the same flag. The polling side calls [`checkpoint`] at
/// its loop heads and unwinds with `?`.
///
/// [`checkpoint`]: CancelToken::checkpoint
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        log::debug!("cancellation requested");
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once [`cancel`](CancelToken::cancel) has been called
    /// on this token or any of its clones.
    #[inline]
    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
