//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the Relisten core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//! - Diagnostic sinks for background failures
//!
//! Every other core crate depends on this one for its logging conventions,
//! its configuration and its event types.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
