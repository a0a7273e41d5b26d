//! # Diagnostics
//!
//! [`DiagnosticSink`] implementation backed by `tracing`.
//!
//! Background cache writes report failures here instead of returning them.
//! In strict mode (debug builds and tests) a report panics, which aborts the
//! background task that produced it and surfaces the failure in test output;
//! the response pipeline itself is never affected.

use bridge_traits::DiagnosticSink;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::error;

/// Diagnostic sink that logs each report at error level.
#[derive(Debug, Default)]
pub struct TracingDiagnostics {
    strict: bool,
    reported: AtomicU64,
}

impl TracingDiagnostics {
    /// Log-only sink for production builds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that panics after logging.
    pub fn strict() -> Self {
        Self {
            strict: true,
            reported: AtomicU64::new(0),
        }
    }

    /// Strict in debug builds, log-only in release builds.
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            Self::strict()
        } else {
            Self::new()
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Number of failures reported so far.
    pub fn reported(&self) -> u64 {
        self.reported.load(Ordering::Relaxed)
    }
}

impl DiagnosticSink for TracingDiagnostics {
    fn assertion_failure(&self, component: &str, message: &str) {
        self.reported.fetch_add(1, Ordering::Relaxed);
        error!(component, message, "Assertion failure");

        if self.strict {
            panic!("assertion failure in {component}: {message}");
        }
    }
}
