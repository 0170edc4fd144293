//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::SanitizeConfigBuilder::progress_callback`] to receive
//! events as the batch driver works through its inputs. The CLI uses it to
//! drive a terminal progress bar; a host service might forward events to its
//! own log or metrics.
//!
//! # Example
//!
//! ```rust
//! use docling_sanitizer::{BatchProgressCallback, SanitizeConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, name: &str) {
//!         let n = self.done.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("[{}/{}] {} ({} ok so far)", index + 1, total, name, n);
//!     }
//! }
//!
//! let config = SanitizeConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch driver as it processes each file.
///
/// Files are processed one at a time in input order, so calls never overlap
/// within one batch. The trait is still `Send + Sync` so a single callback can
/// be shared by batches running on different threads. All methods have no-op
/// defaults.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first file.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called before a file is read and parsed. `index` is 0-based.
    fn on_file_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called after a file's artifact has been written.
    fn on_file_complete(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when a file fails. The batch continues with the next file.
    fn on_file_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let _ = (index, total, name, error);
    }

    /// Called once after the last processed file.
    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        let _ = (total, succeeded);
    }

    /// Polled between files; returning `false` stops the batch before the
    /// next file starts. A document in progress is always finished.
    fn should_continue(&self) -> bool {
        true
    }
}

/// No-op implementation used when no callback is configured.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience type alias for a shared callback.
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
