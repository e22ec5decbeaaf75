use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

/// Shared flag used to stop the otherwise unbounded waits of a session.
///
/// Clones observe the same flag. A token that is never cancelled lets every
/// wait run indefinitely.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
  cancelled: Arc<AtomicBool>,
}

impl CancelToken {
  /// Creates a token which has not been cancelled.
  pub fn new() -> Self {
    Self::default()
  }

  /// Trips the token for every clone.
  pub fn cancel(&self) {
    self.cancelled.store(true, Ordering::SeqCst);
  }

  /// Whether `cancel` has been called on this token or any clone of it.
  pub fn is_cancelled(&self) -> bool {
    self.cancelled.load(Ordering::SeqCst)
  }
}
