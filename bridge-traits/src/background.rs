//! Background Task Submission
//!
//! Fire-and-forget work scheduling used by the response cache. Submitting a
//! task never blocks the caller; the host decides which pool runs it.

use futures::future::BoxFuture;
use std::future::Future;

/// A unit of background work. The result is not observed by the submitter.
pub type BackgroundTask = BoxFuture<'static, ()>;

/// Background task executor trait
///
/// Abstracts the shared worker pool that cache writes are dispatched onto:
/// - **Desktop**: Tokio multi-threaded runtime
/// - **iOS**: a global concurrent dispatch queue (via FFI host)
///
/// Tasks submitted here have no ordering guarantee relative to each other
/// and cannot be cancelled once submitted.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::background::{TaskExecutor, TaskExecutorExt};
///
/// fn persist_later(executor: &dyn TaskExecutor) {
///     executor.spawn_detached(async {
///         // write to storage
///     });
/// }
/// ```
#[async_trait::async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Submit a task for asynchronous execution.
    ///
    /// Must return immediately without waiting for the task to start.
    fn submit(&self, task: BackgroundTask);

    /// Wait until every task submitted so far has finished, including tasks
    /// submitted by those tasks while they ran.
    ///
    /// Used to flush pending work before shutdown and by tests that need the
    /// background writes to settle.
    async fn wait_idle(&self);

    /// Number of submitted tasks that have not finished yet.
    fn pending_tasks(&self) -> usize {
        0
    }
}

/// Convenience methods for submitting plain futures to a [`TaskExecutor`].
pub trait TaskExecutorExt {
    /// Box and submit a future.
    fn spawn_detached<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

impl<E> TaskExecutorExt for E
where
    E: TaskExecutor + ?Sized,
{
    fn spawn_detached<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.submit(Box::pin(future));
    }
}
