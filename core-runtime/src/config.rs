//! # Core Configuration Module
//!
//! Provides configuration management for the Relisten core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the bridges and settings the core needs. It enforces
//! fail-fast validation so a host learns about a missing capability at
//! startup rather than on the first cached response.
//!
//! ## Bridges (with platform defaults)
//!
//! - `FileSystemAccess` - Disk cache I/O (desktop default: tokio fs rooted at
//!   `cache_dir`)
//! - `TaskExecutor` - Background cache writes (desktop default: the Tokio
//!   runtime the builder is called from)
//! - `DiagnosticSink` - Non-fatal write failures (default: `TracingDiagnostics`)
//!
//! Without the `desktop-shims` feature the host must inject the file system
//! and the task executor.
//!
//! Cache tier limits are not configurable here; they are fixed constants of
//! the response cache.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/path/to/relisten.db")
//!     .cache_dir("/path/to/cache")
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Missing database path
//! let config = CoreConfig::builder()
//!     .cache_dir("/path/to/cache")
//!     .build()
//!     .expect("Should fail - missing database path");
//! ```

use crate::diagnostics::TracingDiagnostics;
use crate::error::{Error, Result};
use bridge_traits::{DiagnosticSink, FileSystemAccess, TaskExecutor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Core configuration for the Relisten core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite database file backing the durable store
    pub database_path: PathBuf,

    /// Persistent cache directory; the disk tier lives below it
    pub cache_dir: PathBuf,

    /// File system access abstraction
    pub file_system: Arc<dyn FileSystemAccess>,

    /// Shared pool the cache submits its writes to
    pub task_executor: Arc<dyn TaskExecutor>,

    /// Receiver of background write failures
    pub diagnostics: Arc<dyn DiagnosticSink>,

    /// Whether background write failures should abort the reporting task
    pub strict_cache_assertions: bool,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("cache_dir", &self.cache_dir)
            .field("file_system", &"FileSystemAccess { ... }")
            .field("task_executor", &"TaskExecutor { ... }")
            .field("diagnostics", &"DiagnosticSink { ... }")
            .field("strict_cache_assertions", &self.strict_cache_assertions)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database path is not empty and does not name a directory-like path
    /// - Cache directory is not empty
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.database_path.file_name().is_none() {
            return Err(Error::Config(format!(
                "Database path must name a file: {}",
                self.database_path.display()
            )));
        }

        if self.cache_dir.as_os_str().is_empty() {
            return Err(Error::Config("Cache directory cannot be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn file_system_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "FileSystemAccess implementation is required for the disk cache tier. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default TokioFileSystem. \
                 iOS: inject a file system rooted in the app's Caches directory."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn task_executor_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "TaskExecutor".to_string(),
        message: "TaskExecutor implementation is required for background cache writes. \
                 Desktop: ensure the 'desktop-shims' feature is enabled and build the config \
                 inside a Tokio runtime. iOS: inject an executor backed by a global dispatch queue."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system(
    database_path: &Path,
    cache_dir: &Path,
) -> Result<Arc<dyn FileSystemAccess>> {
    use bridge_desktop::TokioFileSystem;

    let data_dir = database_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cache_dir.to_path_buf());

    let fs: Arc<dyn FileSystemAccess> = Arc::new(TokioFileSystem::with_directories(
        cache_dir.to_path_buf(),
        data_dir,
    ));
    Ok(fs)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system(
    _database_path: &Path,
    _cache_dir: &Path,
) -> Result<Arc<dyn FileSystemAccess>> {
    Err(file_system_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_task_executor() -> Result<Arc<dyn TaskExecutor>> {
    use bridge_desktop::TokioTaskExecutor;

    let executor = TokioTaskExecutor::try_current().map_err(|e| Error::CapabilityMissing {
        capability: "TaskExecutor".to_string(),
        message: format!(
            "The default TokioTaskExecutor binds to the current runtime; \
             build the config inside a Tokio runtime or inject an executor ({e})"
        ),
    })?;

    let executor: Arc<dyn TaskExecutor> = Arc::new(executor);
    Ok(executor)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_task_executor() -> Result<Arc<dyn TaskExecutor>> {
    Err(task_executor_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Set options incrementally, then call [`build()`](CoreConfigBuilder::build).
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    task_executor: Option<Arc<dyn TaskExecutor>>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
    strict_cache_assertions: Option<bool>,
}

impl CoreConfigBuilder {
    /// Sets the database path.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .database_path("/path/to/relisten.db");
    /// ```
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the persistent cache directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .cache_dir("/path/to/cache");
    /// ```
    pub fn cache_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.into());
        self
    }

    /// Sets the file system access implementation.
    ///
    /// If not provided, the desktop default (tokio fs-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Sets the background task executor.
    ///
    /// If not provided, the desktop default binds to the Tokio runtime that
    /// calls [`build()`](CoreConfigBuilder::build).
    pub fn task_executor(mut self, executor: Arc<dyn TaskExecutor>) -> Self {
        self.task_executor = Some(executor);
        self
    }

    /// Sets the diagnostic sink.
    ///
    /// Overrides `strict_cache_assertions`; the injected sink decides what a
    /// report does.
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Makes background write failures panic the reporting task.
    ///
    /// Default: enabled in debug builds, disabled in release builds.
    pub fn strict_cache_assertions(mut self, strict: bool) -> Self {
        self.strict_cache_assertions = Some(strict);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// Returns an error if:
    /// - The database path or cache directory is missing or invalid
    /// - A bridge is missing and no platform default is available
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let cache_dir = self.cache_dir.ok_or_else(|| {
            Error::Config("Cache directory is required. Use .cache_dir() to set it.".to_string())
        })?;

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system(&database_path, &cache_dir)?,
        };

        let task_executor = match self.task_executor {
            Some(executor) => executor,
            None => provide_default_task_executor()?,
        };

        let strict_cache_assertions = self
            .strict_cache_assertions
            .unwrap_or(cfg!(debug_assertions));

        let diagnostics = match self.diagnostics {
            Some(sink) => sink,
            None if strict_cache_assertions => Arc::new(TracingDiagnostics::strict()),
            None => Arc::new(TracingDiagnostics::new()),
        };

        let config = CoreConfig {
            database_path,
            cache_dir,
            file_system,
            task_executor,
            diagnostics,
            strict_cache_assertions,
        };

        config.validate()?;

        Ok(config)
    }
}
