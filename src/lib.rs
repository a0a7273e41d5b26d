//! Workspace facade crate.
//!
//! Host applications depend on `relisten-workspace` and pick features instead
//! of wiring each crate individually:
//!
//! - `desktop-shims` (default): the `core-service` composition root with the
//!   desktop bridge implementations.
//! - `cache`: only the tiered response cache and the durable store, for hosts
//!   that bring their own bridges.

#[cfg(feature = "desktop-shims")]
pub use core_service as service;

#[cfg(feature = "cache")]
pub use core_cache as cache;

#[cfg(feature = "cache")]
pub use core_library as library;
