//! Diagnostic Channel
//!
//! Non-fatal failures that should never reach the caller (for example a
//! cache tier write that failed on a background task) are reported here.
//! Production hosts log them; debug and test hosts may choose to treat them
//! as hard failures.

/// Sink for non-fatal assertion failures.
///
/// Implementations must be cheap to call and must not block; they are
/// invoked from background tasks.
pub trait DiagnosticSink: Send + Sync {
    /// Report a failure.
    ///
    /// * `component` - the subsystem reporting (e.g. `"show_cache"`)
    /// * `message` - human-readable description of what failed
    fn assertion_failure(&self, component: &str, message: &str);
}

/// Diagnostic sink that drops every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnostics;

impl DiagnosticSink for NoopDiagnostics {
    fn assertion_failure(&self, _component: &str, _message: &str) {}
}
