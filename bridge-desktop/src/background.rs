//! Background Task Execution Implementation

use async_trait::async_trait;
use bridge_traits::{
    background::{BackgroundTask, TaskExecutor},
    error::{BridgeError, Result},
};
use core_async::runtime::Handle;
use core_async::sync::Mutex;
use core_async::task::TaskTracker;
use std::sync::Arc;
use tracing::{debug, trace};

/// Tokio-based task executor for desktop.
///
/// Tasks run on the runtime captured at construction time, so `submit` may
/// be called from any thread, including threads that are not inside a
/// runtime context. Every task is tracked so [`TaskExecutor::wait_idle`] can
/// drain outstanding work. Concurrent `wait_idle` callers take turns.
#[derive(Clone)]
pub struct TokioTaskExecutor {
    handle: Handle,
    tracker: TaskTracker,
    idle_lock: Arc<Mutex<()>>,
}

impl TokioTaskExecutor {
    /// Create an executor bound to the runtime of the calling context.
    ///
    /// Fails when called outside of a Tokio runtime.
    pub fn try_current() -> Result<Self> {
        let handle = Handle::try_current().map_err(|e| {
            BridgeError::NotAvailable(format!("no async runtime in current context: {e}"))
        })?;
        Ok(Self::with_handle(handle))
    }

    /// Create an executor bound to an explicit runtime handle.
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle,
            tracker: TaskTracker::new(),
            idle_lock: Arc::new(Mutex::new(())),
        }
    }
}

#[async_trait]
impl TaskExecutor for TokioTaskExecutor {
    fn submit(&self, task: BackgroundTask) {
        self.tracker.spawn_on(task, &self.handle);
        trace!(pending = self.tracker.len(), "Submitted background task");
    }

    async fn wait_idle(&self) {
        // Another caller's `reopen` must not land between our `close` and `wait`.
        let _idle = self.idle_lock.lock().await;

        let pending = self.tracker.len();
        if pending > 0 {
            debug!(pending, "Waiting for background tasks to finish");
        }

        // `wait` only resolves once the tracker is closed and empty. Tasks
        // spawned after `close` are still tracked, so nested submissions are
        // covered too.
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    fn pending_tasks(&self) -> usize {
        self.tracker.len()
    }
}
