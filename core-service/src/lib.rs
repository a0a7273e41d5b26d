//! Core service façade and bootstrap helpers.
//!
//! This crate is the composition root of the Relisten core. It turns a
//! [`CoreConfig`] into exactly one [`RelistenCacher`] backed by the SQLite
//! durable store, and hands that cacher to the host's response pipeline.
//! Desktop hosts enable the `desktop-shims` feature so the file system and
//! task executor bridges default to `bridge-desktop`.
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/path/to/relisten.db")
//!     .cache_dir("/path/to/cache")
//!     .build()?;
//! let core = core_service::bootstrap(config).await?;
//!
//! let response = core.cacher().process(response);
//! // ...
//! core.shutdown().await;
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{DiagnosticSink, FileSystemAccess, TaskExecutor};
use core_async::sync::broadcast::Receiver;
use core_cache::{RelistenCacher, ResponseTransformer};
use core_library::db::{create_pool, DatabaseConfig};
use core_library::{RelistenStore, SqliteRelistenStore};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus};
use tracing::info;

/// Aggregated handle to everything the cacher depends on.
pub struct CoreDependencies {
    pub file_system: Arc<dyn FileSystemAccess>,
    pub task_executor: Arc<dyn TaskExecutor>,
    pub diagnostics: Arc<dyn DiagnosticSink>,
    pub store: Arc<dyn RelistenStore>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit handles.
    pub fn new(
        file_system: Arc<dyn FileSystemAccess>,
        task_executor: Arc<dyn TaskExecutor>,
        diagnostics: Arc<dyn DiagnosticSink>,
        store: Arc<dyn RelistenStore>,
    ) -> Self {
        Self {
            file_system,
            task_executor,
            diagnostics,
            store,
        }
    }

    /// Take the bridges from `config` and pair them with `store`.
    pub fn from_config(config: &CoreConfig, store: Arc<dyn RelistenStore>) -> Self {
        Self::new(
            Arc::clone(&config.file_system),
            Arc::clone(&config.task_executor),
            Arc::clone(&config.diagnostics),
            store,
        )
    }
}

/// Primary façade exposed to host applications.
///
/// Owns the single response cacher of the process. Clones share it.
#[derive(Clone)]
pub struct CoreService {
    cacher: RelistenCacher,
    events: EventBus,
}

impl CoreService {
    /// Open the cache tiers and build the cacher.
    pub async fn new(deps: CoreDependencies) -> Result<Self> {
        let events = EventBus::default();
        let cacher = RelistenCacher::open(
            deps.file_system,
            deps.store,
            deps.task_executor,
            deps.diagnostics,
        )
        .await?
        .with_event_bus(events.clone());

        Ok(Self { cacher, events })
    }

    /// The response cacher.
    pub fn cacher(&self) -> &RelistenCacher {
        &self.cacher
    }

    /// The cacher as a response pipeline hook.
    pub fn response_transformer(&self) -> Arc<dyn ResponseTransformer> {
        Arc::new(self.cacher.clone())
    }

    /// Subscribe to cache events.
    pub fn subscribe_events(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Flush every pending background write.
    pub async fn shutdown(&self) {
        self.cacher.wait_for_pending_writes().await;
        info!("Core service shut down");
    }
}

/// Build a [`CoreService`] from a validated configuration.
///
/// Opens (and migrates) the SQLite database at `config.database_path`,
/// creating its directory if needed.
pub async fn bootstrap(config: CoreConfig) -> Result<CoreService> {
    config.validate()?;

    if let Some(parent) = config.database_path.parent() {
        config.file_system.create_dir_all(parent).await?;
    }
    let pool = create_pool(DatabaseConfig::new(&config.database_path)).await?;
    let store: Arc<dyn RelistenStore> = Arc::new(SqliteRelistenStore::new(pool));

    let service = CoreService::new(CoreDependencies::from_config(&config, store)).await?;
    info!(
        database = %config.database_path.display(),
        cache_dir = %config.cache_dir.display(),
        "Core service ready"
    );
    Ok(service)
}

#[cfg(all(test, feature = "desktop-shims"))]
mod tests {
    use super::*;
    use core_cache::{Payload, Response};
    use core_library::fixtures;
    use core_runtime::events::CacheEvent;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> CoreConfig {
        CoreConfig::builder()
            .database_path(dir.path().join("data").join("relisten.db"))
            .cache_dir(dir.path().join("cache"))
            .strict_cache_assertions(false)
            .build()
            .unwrap()
    }

    #[core_async::test]
    async fn test_bootstrap_and_cache_show() {
        let dir = TempDir::new().unwrap();
        let core = bootstrap(config(&dir)).await.unwrap();
        let mut events = core.subscribe_events();

        let show = fixtures::show_with_sources("1977-05-08", 2);
        let key = show.cache_key();
        let response = Response::success("/api/v3/shows", Payload::Show(show.clone()));

        assert_eq!(core.response_transformer().process(response.clone()), response);
        core.shutdown().await;

        assert_eq!(core.cacher().show_from_cache(&key).await, Some(show));
        assert_eq!(
            events.try_recv().unwrap(),
            CoreEvent::Cache(CacheEvent::ShowCached { show_uuid: key })
        );
        assert!(dir
            .path()
            .join("cache")
            .join("RelistenCache")
            .join("shows")
            .is_dir());
    }

    #[core_async::test]
    async fn test_cached_entities_survive_restart() {
        let dir = TempDir::new().unwrap();
        let artists = fixtures::artists(3);
        {
            let core = bootstrap(config(&dir)).await.unwrap();
            core.cacher()
                .process(Response::success("/api/v2/artists", Payload::Artists(artists.clone())));
            core.shutdown().await;
        }

        let core = bootstrap(config(&dir)).await.unwrap();
        for artist in &artists {
            assert_eq!(core.cacher().artist_from_cache(artist.id).await.as_ref(), Some(artist));
            assert_eq!(
                core.cacher()
                    .artist_cache()
                    .object(&artist.cache_key())
                    .await
                    .unwrap()
                    .as_ref(),
                Some(artist)
            );
        }
    }
}
