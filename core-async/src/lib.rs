//! Async runtime facade for the Relisten core.
//!
//! Core crates depend on this crate instead of naming Tokio directly, so the
//! executor can be swapped in one place. Everything here is a thin re-export
//! or wrapper over Tokio.
//!
//! # Modules
//!
//! - `task`: spawning, blocking work and task tracking
//! - `time`: sleep, timeouts and wall-clock helpers
//! - `sync`: async-aware locks and channels
//! - `runtime`: building runtimes and blocking on futures
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(5)).await;
//!         42
//!     });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

// Re-export the async entry-point/test macros so downstream crates never need
// direct Tokio dependencies.
pub use core_async_macros::{main, test};

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
