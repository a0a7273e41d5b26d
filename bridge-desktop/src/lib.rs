//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `FileSystemAccess` using `tokio::fs`, rooted in the platform cache and
//!   data directories
//! - `TaskExecutor` using the Tokio runtime the host is already running
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{TokioFileSystem, TokioTaskExecutor};
//!
//! #[core_async::main]
//! async fn main() {
//!     let fs = TokioFileSystem::new();
//!     let executor = TokioTaskExecutor::try_current().unwrap();
//!
//!     // Use in core configuration
//! }
//! ```

mod background;
mod filesystem;

pub use background::TokioTaskExecutor;
pub use filesystem::TokioFileSystem;
