//! Task spawning and tracking.
//!
//! `spawn` and `spawn_blocking` forward to Tokio. [`TaskTracker`] is exposed
//! for components that submit fire-and-forget work and later need to wait
//! until all of it has drained (for example before shutdown).
//!
//! # Examples
//!
//! ```rust
//! use core_async::task::{self, TaskTracker};
//!
//! async fn example() {
//!     let tracker = TaskTracker::new();
//!     tracker.spawn(async { /* background write */ });
//!     tracker.close();
//!     tracker.wait().await;
//!
//!     let value = task::spawn_blocking(|| 2 + 2).await.unwrap();
//!     assert_eq!(value, 4);
//! }
//! ```

pub use tokio::task::{spawn_blocking, yield_now, JoinError, JoinHandle};
pub use tokio_util::task::TaskTracker;

/// Spawns a new asynchronous task on the current Tokio runtime.
///
/// The spawned task may run on a different thread. Panics when called
/// outside of a runtime, like `tokio::spawn`.
///
/// # Examples
///
/// ```rust
/// use core_async::task::spawn;
///
/// # async fn example() {
/// let handle = spawn(async { 42 });
/// assert_eq!(handle.await.unwrap(), 42);
/// # }
/// ```
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, JoinError>;
