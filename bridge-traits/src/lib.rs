//! # Host Bridge Traits
//!
//! Capability contracts the Relisten core needs from its host platform.
//!
//! ## Traits
//!
//! - [`FileSystemAccess`](storage::FileSystemAccess) - cache directory and file I/O for the disk tier
//! - [`TaskExecutor`](background::TaskExecutor) - fire-and-forget background work
//! - [`DiagnosticSink`](diagnostics::DiagnosticSink) - non-fatal assertion failures
//! - [`LoggerSink`](logging::LoggerSink) - forward structured logs to host logging
//! - [`Clock`](time::Clock) - time source for deterministic testing
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop`    |
//! | iOS      | host app via FFI    |
//!
//! The core fails fast with `CapabilityMissing` when a required bridge is
//! not supplied and no desktop default is compiled in.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors and keep the offending path in the message.
//!
//! ## Thread Safety
//!
//! Every trait requires `Send + Sync`; implementations are shared across
//! background tasks.

pub mod background;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use background::{BackgroundTask, TaskExecutor, TaskExecutorExt};
pub use diagnostics::{DiagnosticSink, NoopDiagnostics};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use storage::{FileMetadata, FileSystemAccess};
pub use time::{Clock, ManualClock, SystemClock};
