//! Progress indicators for long-running operations
//!
//! Uses `linya` for allocation-free, concurrency-optimized progress bars.

use linya::{Bar, Progress};
use std::sync::{Arc, Mutex};

/// Thread-safe progress bar over a batch of components
///
/// Cloned handles share the same bar, so rayon workers can tick it
/// concurrently.
#[derive(Clone)]
pub struct ComponentProgress {
  progress: Arc<Mutex<Progress>>,
  bar: Arc<Bar>,
}

impl ComponentProgress {
  /// Create a new bar for `total` components
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self {
      progress: Arc::new(Mutex::new(progress)),
      bar: Arc::new(bar),
    }
  }

  /// Only draw when there is more than one component to wait for
  pub fn for_batch(total: usize, label: impl Into<String>, quiet: bool) -> Option<Self> {
    if quiet || total < 2 {
      None
    } else {
      Some(Self::new(total, label))
    }
  }

  /// Increment progress by 1 (thread-safe)
  pub fn inc(&self) {
    // A poisoned lock only means another worker panicked mid-draw
    if let Ok(mut progress) = self.progress.lock() {
      progress.inc_and_draw(&self.bar, 1);
    }
  }
}
