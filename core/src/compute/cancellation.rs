use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Error returned when work is abandoned because its token was cancelled.
///
/// Jobs that call [`CancellationToken::check()`] receive this error once any
/// clone of the token has been cancelled, and can propagate it with `?`.
///
/// # Example
///
/// ```
/// use matforge_core::compute::{CancellationToken, Cancelled};
///
/// fn work(token: &CancellationToken) -> Result<u32, Cancelled> {
///     token.check()?;
///     Ok(42)
/// }
///
/// let token = CancellationToken::new();
/// assert_eq!(work(&token), Ok(42));
/// token.cancel();
/// assert_eq!(work(&token), Err(Cancelled));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("task cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Token that signals cancellation to cooperative jobs.
///
/// Cloning a token creates another handle to the same cancellation flag.
/// Calling [`cancel()`](CancellationToken::cancel) on any clone affects all.
/// The flag is written with release ordering and read with acquire ordering,
/// so anything a job wrote before cancelling is visible to whoever observes it.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new cancellation token (not cancelled).
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signals cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns whether cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Returns `Err(Cancelled)` if cancellation has been signalled.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
