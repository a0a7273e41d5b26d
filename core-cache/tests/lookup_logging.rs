//! Lookup misses reach the host log sink
//!
//! Lives in its own test binary: the global subscriber can only be
//! installed once per process.

use async_trait::async_trait;
use bridge_desktop::{TokioFileSystem, TokioTaskExecutor};
use bridge_traits::diagnostics::NoopDiagnostics;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::logging::{LogEntry, LogLevel, LoggerSink};
use core_async::time::{sleep, Duration};
use core_cache::RelistenCacher;
use core_library::db::create_test_pool;
use core_library::SqliteRelistenStore;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Default)]
struct RecordingSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingSink {
    fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.level == LogLevel::Error)
            .map(|entry| entry.message.clone())
            .collect()
    }
}

#[async_trait]
impl LoggerSink for RecordingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Error
    }
}

#[core_async::test]
async fn test_lookup_misses_are_logged() {
    let sink = Arc::new(RecordingSink::default());
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_filter("core_cache=error")
            .with_logger_sink(sink.clone()),
    )
    .unwrap();

    let dir = TempDir::new().unwrap();
    let fs = Arc::new(TokioFileSystem::with_directories(
        dir.path().join("cache"),
        dir.path().join("data"),
    ));
    let store = Arc::new(SqliteRelistenStore::new(create_test_pool().await.unwrap()));
    let executor = Arc::new(TokioTaskExecutor::try_current().unwrap());
    let cacher = RelistenCacher::open(fs, store, executor, Arc::new(NoopDiagnostics))
        .await
        .unwrap();

    let uuid = "6FB9A4E0-07B8-4F5D-9C2E-56B6E2C1D0AA";
    assert_eq!(cacher.artist_from_cache(42).await, None);
    assert_eq!(cacher.artist_from_cache_by_uuid(uuid).await, None);
    assert_eq!(cacher.show_from_cache(uuid).await, None);

    // Inside a runtime the sink is fed from spawned tasks.
    for _ in 0..100 {
        if sink.messages().len() >= 3 {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }

    let messages = sink.messages();
    assert_eq!(messages.len(), 3);
    for expected in [
        "Error fetching from cache artist with Id=42: not found".to_string(),
        format!("Error fetching from cache artist with UUID={uuid}: not found"),
        format!("Error fetching from cache show with UUID={uuid}: not found"),
    ] {
        assert!(messages.contains(&expected), "missing log entry: {expected}");
    }
}
