//! Runtime utilities that abstract over the underlying async executor.
//!
//! Downstream crates use these wrappers so they never need to depend on Tokio
//! directly. The attribute macros in `core-async-macros` expand to calls into
//! this module.

pub use tokio::runtime::{Builder, Handle, Runtime, TryCurrentError};

/// Runs the provided future to completion on a fresh current-thread runtime.
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("core_async::runtime::block_on: failed to build Tokio runtime")
        .block_on(future)
}

/// Runs the provided future to completion on a fresh multi-threaded runtime.
///
/// Used by `#[core_async::test(multi_thread)]` for tests that need tasks to
/// make progress in parallel with the test body.
pub fn block_on_multi_thread<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("core_async::runtime::block_on_multi_thread: failed to build Tokio runtime")
        .block_on(future)
}
