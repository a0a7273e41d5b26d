//! # Response Cacher
//!
//! Write-through cache for catalogue responses. Every successful show or
//! artist-list response is persisted into the durable store and into the
//! per-type memory/disk tiers. All writes run on the host task executor
//! after [`RelistenCacher::process`] has already returned.
//!
//! The store write and the tier write for the same show are independent
//! tasks with no ordering between them. Two responses carrying the same UUID
//! race; the last write to finish in each tier wins.

use crate::config::StorageConfig;
use crate::error::Result;
use crate::response::{Payload, Response, ResponseTransformer};
use crate::storage::HybridStorage;
use bridge_traits::background::{TaskExecutor, TaskExecutorExt};
use bridge_traits::diagnostics::DiagnosticSink;
use bridge_traits::storage::FileSystemAccess;
use core_library::models::{ArtistWithCounts, ShowWithSources};
use core_library::RelistenStore;
use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, error, info, trace};

/// Disk sub-directory and tier name for shows.
pub const SHOW_NAMESPACE: &str = "shows";
/// Disk sub-directory and tier name for artists.
pub const ARTIST_NAMESPACE: &str = "artists";

const SHOW_CACHE_COMPONENT: &str = "show_cache";
const ARTIST_CACHE_COMPONENT: &str = "artist_cache";

pub type ShowCache = HybridStorage<String, ShowWithSources>;
pub type ArtistCache = HybridStorage<String, ArtistWithCounts>;

/// The response cache. Cheap to clone; clones share tiers and store.
#[derive(Clone)]
pub struct RelistenCacher {
    show_cache: Arc<ShowCache>,
    artist_cache: Arc<ArtistCache>,
    store: Arc<dyn RelistenStore>,
    executor: Arc<dyn TaskExecutor>,
    diagnostics: Arc<dyn DiagnosticSink>,
    events: Option<EventBus>,
}

impl RelistenCacher {
    /// Open both tier pairs with the fixed Relisten limits.
    pub async fn open(
        fs: Arc<dyn FileSystemAccess>,
        store: Arc<dyn RelistenStore>,
        executor: Arc<dyn TaskExecutor>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Result<Self> {
        let show_cache = HybridStorage::open(StorageConfig::relisten(SHOW_NAMESPACE), fs.clone()).await?;
        let artist_cache = HybridStorage::open(StorageConfig::relisten(ARTIST_NAMESPACE), fs).await?;

        info!("Response cache ready");
        Ok(Self::with_tiers(
            Arc::new(show_cache),
            Arc::new(artist_cache),
            store,
            executor,
            diagnostics,
        ))
    }

    /// Build from already opened tiers.
    pub fn with_tiers(
        show_cache: Arc<ShowCache>,
        artist_cache: Arc<ArtistCache>,
        store: Arc<dyn RelistenStore>,
        executor: Arc<dyn TaskExecutor>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            show_cache,
            artist_cache,
            store,
            executor,
            diagnostics,
            events: None,
        }
    }

    /// Publish cache events on `events`.
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn show_cache(&self) -> &ShowCache {
        &self.show_cache
    }

    pub fn artist_cache(&self) -> &ArtistCache {
        &self.artist_cache
    }

    /// Wait until every background write scheduled so far has finished.
    pub async fn wait_for_pending_writes(&self) {
        self.executor.wait_idle().await;
    }

    /// Schedule caching for `response` and hand it straight back.
    pub fn process(&self, response: Response) -> Response {
        if let Response::Success(entity) = &response {
            match &entity.payload {
                Payload::Show(show) => self.schedule_show(show.clone()),
                Payload::Artists(artists) => self.schedule_artists(artists.clone()),
                other => trace!(url = %entity.url, kind = ?other.kind(), "Response not cacheable"),
            }
        }
        response
    }

    fn schedule_show(&self, show: ShowWithSources) {
        let cacher = self.clone();
        let stored = show.clone();
        self.executor.spawn_detached(async move {
            cacher.write_show_to_store(&stored).await;
        });

        let cacher = self.clone();
        self.executor.spawn_detached(async move {
            cacher.write_show_to_tiers(show).await;
        });
    }

    fn schedule_artists(&self, artists: Vec<ArtistWithCounts>) {
        let cacher = self.clone();
        self.executor.spawn_detached(async move {
            cacher.write_artists_to_store(&artists).await;

            // Tier writes go ahead whether or not the batch write succeeded.
            for artist in artists {
                let task_cacher = cacher.clone();
                cacher.executor.spawn_detached(async move {
                    task_cacher.write_artist_to_tiers(artist).await;
                });
            }
        });
    }

    async fn write_show_to_store(&self, show: &ShowWithSources) {
        let key = show.cache_key();
        match self.store.cache_show(show).await {
            Ok(()) => debug!(show_uuid = %key, "Stored show"),
            Err(e) => {
                error!(show_uuid = %key, error = %e, "Failed to store show");
                self.emit(CacheEvent::StoreWriteFailed {
                    entity: "show".to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    async fn write_show_to_tiers(&self, show: ShowWithSources) {
        let key = show.cache_key();
        match self.show_cache.set_object(show, key.clone()).await {
            Ok(()) => {
                debug!(show_uuid = %key, "Cached show");
                self.emit(CacheEvent::ShowCached { show_uuid: key });
            }
            Err(e) => self.report_tier_failure(SHOW_CACHE_COMPONENT, key, e),
        }
    }

    async fn write_artists_to_store(&self, artists: &[ArtistWithCounts]) {
        match self.store.cache_artists(artists).await {
            Ok(()) => {
                debug!(count = artists.len(), "Stored artists");
                self.emit(CacheEvent::ArtistsCached {
                    count: artists.len(),
                });
            }
            Err(e) => {
                error!(count = artists.len(), error = %e, "Failed to store artists");
                self.emit(CacheEvent::StoreWriteFailed {
                    entity: "artists".to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    async fn write_artist_to_tiers(&self, artist: ArtistWithCounts) {
        let key = artist.cache_key();
        match self.artist_cache.set_object(artist, key.clone()).await {
            Ok(()) => trace!(artist_uuid = %key, "Cached artist"),
            Err(e) => self.report_tier_failure(ARTIST_CACHE_COMPONENT, key, e),
        }
    }

    fn report_tier_failure(&self, cache: &str, key: String, error: impl Display) {
        let message = format!("failed to cache {key}: {error}");
        self.emit(CacheEvent::TierWriteFailed {
            cache: cache.to_string(),
            key,
            message: error.to_string(),
        });
        self.diagnostics.assertion_failure(cache, &message);
    }

    fn emit(&self, event: CacheEvent) {
        if let Some(events) = &self.events {
            // No subscribers is fine.
            let _ = events.emit(CoreEvent::Cache(event));
        }
    }

    /// Artist by integer id from the durable store.
    pub async fn artist_from_cache(&self, id: i64) -> Option<ArtistWithCounts> {
        lookup(
            self.store.artist_by_id(id).await,
            format!("artist with Id={id}"),
        )
    }

    /// Artist by UUID string from the durable store.
    pub async fn artist_from_cache_by_uuid(&self, uuid: &str) -> Option<ArtistWithCounts> {
        lookup(
            self.store.artist_by_uuid(uuid).await,
            format!("artist with UUID={uuid}"),
        )
    }

    /// Show by UUID string from the durable store.
    pub async fn show_from_cache(&self, uuid: &str) -> Option<ShowWithSources> {
        lookup(
            self.store.show_by_uuid(uuid).await,
            format!("show with UUID={uuid}"),
        )
    }
}

impl ResponseTransformer for RelistenCacher {
    fn process(&self, response: Response) -> Response {
        RelistenCacher::process(self, response)
    }
}

fn lookup<T>(result: core_library::Result<Option<T>>, what: String) -> Option<T> {
    match result {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            error!("Error fetching from cache {what}: not found");
            None
        }
        Err(e) => {
            error!("Error fetching from cache {what}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DISK_MAX_SIZE_BYTES, MEMORY_COUNT_LIMIT, MEMORY_TOTAL_COST_LIMIT};
    use bridge_desktop::{TokioFileSystem, TokioTaskExecutor};
    use bridge_traits::diagnostics::NoopDiagnostics;
    use core_library::db::create_test_pool;
    use core_library::{fixtures, SqliteRelistenStore};
    use tempfile::TempDir;

    async fn cacher(dir: &TempDir) -> RelistenCacher {
        let fs = Arc::new(TokioFileSystem::with_directories(
            dir.path().join("cache"),
            dir.path().join("data"),
        ));
        let store = Arc::new(SqliteRelistenStore::new(create_test_pool().await.unwrap()));
        let executor = Arc::new(TokioTaskExecutor::try_current().unwrap());

        RelistenCacher::open(fs, store, executor, Arc::new(NoopDiagnostics))
            .await
            .unwrap()
    }

    #[core_async::test]
    async fn test_tiers_use_relisten_limits() {
        let dir = TempDir::new().unwrap();
        let cacher = cacher(&dir).await;

        for config in [cacher.show_cache().config(), cacher.artist_cache().config()] {
            assert_eq!(config.disk.name, "RelistenCache");
            assert_eq!(config.disk.max_size_bytes, DISK_MAX_SIZE_BYTES);
            assert_eq!(config.memory.count_limit, MEMORY_COUNT_LIMIT);
            assert_eq!(config.memory.total_cost_limit, MEMORY_TOTAL_COST_LIMIT);
        }
        assert_eq!(cacher.show_cache().config().namespace, SHOW_NAMESPACE);
        assert_eq!(cacher.artist_cache().config().namespace, ARTIST_NAMESPACE);
    }

    #[core_async::test]
    async fn test_show_lands_in_store_and_tiers() {
        let dir = TempDir::new().unwrap();
        let cacher = cacher(&dir).await;
        let show = fixtures::show_with_sources("1977-05-08", 2);
        let key = show.cache_key();

        let response = Response::success("/api/v3/shows/x", Payload::Show(show.clone()));
        assert_eq!(cacher.process(response.clone()), response);
        cacher.wait_for_pending_writes().await;

        assert_eq!(cacher.show_from_cache(&key).await, Some(show.clone()));
        assert_eq!(cacher.show_cache().object(&key).await.unwrap(), Some(show));
    }

    #[core_async::test]
    async fn test_lookup_miss_is_none() {
        let dir = TempDir::new().unwrap();
        let cacher = cacher(&dir).await;

        assert_eq!(cacher.artist_from_cache(42).await, None);
        assert_eq!(
            cacher
                .artist_from_cache_by_uuid("00000000-0000-0000-0000-000000000001")
                .await,
            None
        );
        assert_eq!(cacher.show_from_cache("nope").await, None);
    }

    #[core_async::test]
    async fn test_events_are_published() {
        let dir = TempDir::new().unwrap();
        let bus = EventBus::new(16);
        let mut events = bus.subscribe();
        let cacher = cacher(&dir).await.with_event_bus(bus);

        let artists = fixtures::artists(2);
        cacher.process(Response::success("/api/v2/artists", Payload::Artists(artists)));
        cacher.wait_for_pending_writes().await;

        assert_eq!(
            events.try_recv().unwrap(),
            CoreEvent::Cache(CacheEvent::ArtistsCached { count: 2 })
        );
    }
}
