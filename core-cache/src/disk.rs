//! # Disk Tier
//!
//! One JSON file per entry under the tier directory, named by the SHA-256 of
//! the key. Each file carries an envelope with the original key and the
//! expiry instant so collisions and stale entries are detected on read.
//!
//! Writes go to a uniquely named temporary file first and are renamed into
//! place, so concurrent writers of the same key never leave a torn file:
//! the last rename wins and readers see one complete envelope or the other.
//!
//! After each write the tier enforces its byte budget by deleting the
//! oldest files until the total fits again. Files written by this tier are
//! ordered by write sequence; files left over from an earlier run are older
//! than all of them and ordered by modification time.

use crate::config::DiskConfig;
use crate::error::Result;
use crate::stats::DiskStats;
use bridge_traits::storage::FileSystemAccess;
use bridge_traits::time::Clock;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use core_async::sync::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

const ENTRY_EXTENSION: &str = "json";

#[derive(Serialize)]
struct EnvelopeRef<'a, V> {
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at_ms: Option<i64>,
    value: &'a V,
}

#[derive(Deserialize)]
struct Envelope<V> {
    key: String,
    #[serde(default)]
    expires_at_ms: Option<i64>,
    value: V,
}

/// Envelope without the value, for existence checks.
#[derive(Deserialize)]
struct EnvelopeHeader {
    key: String,
    #[serde(default)]
    expires_at_ms: Option<i64>,
}

/// A decoded disk entry.
#[derive(Debug, Clone)]
pub struct DiskEntry<V> {
    pub value: V,
    pub expires_at: Option<DateTime<Utc>>,
    /// Size of the envelope on disk
    pub size: usize,
}

/// Write order of the files this tier has written since it was opened.
#[derive(Default)]
struct WriteOrder {
    next: u64,
    written: HashMap<PathBuf, u64>,
}

impl WriteOrder {
    fn stamp(&mut self, path: &Path) {
        self.next += 1;
        self.written.insert(path.to_path_buf(), self.next);
    }
}

/// Persistent tier rooted at one directory.
pub struct DiskTier {
    directory: PathBuf,
    config: DiskConfig,
    fs: Arc<dyn FileSystemAccess>,
    clock: Arc<dyn Clock>,
    budget_lock: Mutex<WriteOrder>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    write_failures: AtomicU64,
}

impl DiskTier {
    /// Open the tier at `directory`, creating it if needed.
    pub async fn open(
        directory: PathBuf,
        config: DiskConfig,
        fs: Arc<dyn FileSystemAccess>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        fs.create_dir_all(&directory).await?;
        debug!(directory = %directory.display(), "Opened disk tier");

        Ok(Self {
            directory,
            config,
            fs,
            clock,
            budget_lock: Mutex::new(WriteOrder::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn config(&self) -> &DiskConfig {
        &self.config
    }

    /// Expiry instant for an entry written now.
    pub fn expiry_for_new_entry(&self) -> Option<DateTime<Utc>> {
        self.config.expiry.expires_at(self.clock.now())
    }

    /// Serialize `value` into an envelope ready to be written.
    pub fn encode<V: Serialize>(
        key: &str,
        value: &V,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Bytes> {
        let envelope = EnvelopeRef {
            key,
            expires_at_ms: expires_at.map(|at| at.timestamp_millis()),
            value,
        };
        Ok(Bytes::from(serde_json::to_vec(&envelope)?))
    }

    /// File holding the entry for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.directory
            .join(format!("{}.{ENTRY_EXTENSION}", hex::encode(digest)))
    }

    /// Encode and write `value` under `key`.
    pub async fn write<V: Serialize>(&self, key: &str, value: &V) -> Result<()> {
        let encoded = Self::encode(key, value, self.expiry_for_new_entry())?;
        self.write_encoded(key, encoded).await
    }

    /// Write an already encoded envelope under `key`, then enforce the budget.
    #[instrument(skip(self, encoded), fields(bytes = encoded.len()))]
    pub async fn write_encoded(&self, key: &str, encoded: Bytes) -> Result<()> {
        let path = self.path_for(key);
        let temp = path.with_extension(format!("{ENTRY_EXTENSION}.{}.tmp", Uuid::new_v4()));

        if let Err(e) = self.fs.write_file(&temp, encoded).await {
            self.write_failures.fetch_add(1, Ordering::Relaxed);
            return Err(e.into());
        }

        if let Err(e) = self.fs.rename(&temp, &path).await {
            self.write_failures.fetch_add(1, Ordering::Relaxed);
            if let Err(cleanup) = self.fs.delete_file(&temp).await {
                if !cleanup.is_not_found() {
                    warn!(path = %temp.display(), error = %cleanup, "Failed to remove temporary cache file");
                }
            }
            return Err(e.into());
        }

        self.enforce_budget(&path).await?;
        Ok(())
    }

    /// Read and decode the entry for `key`.
    ///
    /// Missing, expired, mismatched and undecodable files are all misses.
    /// Expired and undecodable files are removed.
    pub async fn read<V: DeserializeOwned>(&self, key: &str) -> Result<Option<DiskEntry<V>>> {
        let path = self.path_for(key);

        let data = match self.fs.read_file(&path).await {
            Ok(data) => data,
            Err(e) if e.is_not_found() => return Ok(self.miss()),
            Err(e) => return Err(e.into()),
        };

        let envelope: Envelope<V> = match serde_json::from_slice(&data) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding unreadable cache file");
                self.discard(&path).await;
                return Ok(self.miss());
            }
        };

        if envelope.key != key {
            debug!(key, stored = %envelope.key, "Cache file belongs to another key");
            return Ok(self.miss());
        }

        let expires_at = envelope
            .expires_at_ms
            .and_then(DateTime::<Utc>::from_timestamp_millis);
        if self.is_expired(expires_at) {
            debug!(key, "Cache file expired");
            self.discard(&path).await;
            return Ok(self.miss());
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        Ok(Some(DiskEntry {
            value: envelope.value,
            expires_at,
            size: data.len(),
        }))
    }

    /// Whether a live entry exists for `key`. Does not count as a lookup.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key);

        let data = match self.fs.read_file(&path).await {
            Ok(data) => data,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        Ok(match serde_json::from_slice::<EnvelopeHeader>(&data) {
            Ok(header) => {
                header.key == key
                    && !self.is_expired(
                        header
                            .expires_at_ms
                            .and_then(DateTime::<Utc>::from_timestamp_millis),
                    )
            }
            Err(_) => false,
        })
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        match self.fs.delete_file(&self.path_for(key)).await {
            Err(e) if !e.is_not_found() => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Delete every entry and recreate the empty directory.
    pub async fn remove_all(&self) -> Result<()> {
        let mut order = self.budget_lock.lock().await;
        match self.fs.delete_dir_all(&self.directory).await {
            Err(e) if !e.is_not_found() => return Err(e.into()),
            _ => {}
        }
        order.written.clear();
        self.fs.create_dir_all(&self.directory).await?;
        debug!(directory = %self.directory.display(), "Cleared disk tier");
        Ok(())
    }

    /// Delete every expired or unreadable entry. Returns how many were removed.
    pub async fn remove_expired(&self) -> Result<usize> {
        let _order = self.budget_lock.lock().await;
        let mut removed = 0;

        for path in self.entry_files().await? {
            let data = match self.fs.read_file(&path).await {
                Ok(data) => data,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e.into()),
            };

            let stale = match serde_json::from_slice::<EnvelopeHeader>(&data) {
                Ok(header) => self.is_expired(
                    header
                        .expires_at_ms
                        .and_then(DateTime::<Utc>::from_timestamp_millis),
                ),
                Err(_) => true,
            };

            if stale {
                self.discard(&path).await;
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Bytes used by entry files.
    pub async fn total_size(&self) -> Result<u64> {
        let mut total = 0;
        for path in self.entry_files().await? {
            match self.fs.metadata(&path).await {
                Ok(metadata) => total += metadata.size,
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(total)
    }

    pub async fn stats(&self) -> Result<DiskStats> {
        let files = self.entry_files().await?.len();
        Ok(DiskStats {
            files,
            total_bytes: self.total_size().await?,
            max_size_bytes: self.config.max_size_bytes,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        })
    }

    /// Record `keep` as the newest file, then delete the oldest entry files
    /// until the tier fits its budget. `keep` is never deleted.
    async fn enforce_budget(&self, keep: &Path) -> Result<()> {
        let mut order = self.budget_lock.lock().await;
        order.stamp(keep);

        let mut files = Vec::new();
        let mut total = 0u64;
        for path in self.entry_files().await? {
            match self.fs.metadata(&path).await {
                Ok(metadata) => {
                    total += metadata.size;
                    // Unsequenced files sort first, by modification time.
                    let age = match order.written.get(&path) {
                        Some(&sequence) => (1, sequence as i64),
                        None => (0, metadata.modified_at.unwrap_or(0)),
                    };
                    files.push((age, path, metadata.size));
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
        }

        let listed: HashSet<&PathBuf> = files.iter().map(|(_, path, _)| path).collect();
        order.written.retain(|path, _| listed.contains(path));

        if total <= self.config.max_size_bytes {
            return Ok(());
        }

        files.sort();
        let mut evicted = 0u64;
        for (_, path, size) in files {
            if total <= self.config.max_size_bytes {
                break;
            }
            if path == keep {
                continue;
            }

            match self.fs.delete_file(&path).await {
                Ok(()) => {
                    total = total.saturating_sub(size);
                    evicted += 1;
                    order.written.remove(&path);
                }
                Err(e) if e.is_not_found() => {
                    total = total.saturating_sub(size);
                    order.written.remove(&path);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to evict cache file");
                }
            }
        }

        if evicted > 0 {
            self.evictions.fetch_add(evicted, Ordering::Relaxed);
            debug!(evicted, total, "Evicted disk cache files");
        }
        Ok(())
    }

    async fn entry_files(&self) -> Result<Vec<PathBuf>> {
        let entries = match self.fs.list_directory(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(entries
            .into_iter()
            .filter(|path| path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION))
            .collect())
    }

    fn is_expired(&self, expires_at: Option<DateTime<Utc>>) -> bool {
        expires_at.is_some_and(|at| at <= self.clock.now())
    }

    fn miss<T>(&self) -> Option<T> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    async fn discard(&self, path: &Path) {
        if let Err(e) = self.fs.delete_file(path).await {
            if !e.is_not_found() {
                warn!(path = %path.display(), error = %e, "Failed to remove cache file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Expiry;
    use bridge_desktop::TokioFileSystem;
    use bridge_traits::time::{ManualClock, SystemClock};
    use serde_json::json;
    use tempfile::TempDir;

    async fn open_tier(dir: &TempDir, config: DiskConfig, clock: Arc<dyn Clock>) -> DiskTier {
        let fs = Arc::new(TokioFileSystem::with_directories(
            dir.path().join("cache"),
            dir.path().join("data"),
        ));
        DiskTier::open(dir.path().join("cache").join("tier"), config, fs, clock)
            .await
            .unwrap()
    }

    #[core_async::test]
    async fn test_write_and_read() {
        let dir = TempDir::new().unwrap();
        let tier = open_tier(&dir, DiskConfig::default(), Arc::new(SystemClock)).await;

        tier.write("ABC", &json!({"name": "Cornell"})).await.unwrap();

        let entry = tier.read::<serde_json::Value>("ABC").await.unwrap().unwrap();
        assert_eq!(entry.value["name"], "Cornell");
        assert_eq!(entry.expires_at, None);
        assert!(tier.exists("ABC").await.unwrap());
        assert!(tier.path_for("ABC").exists());

        let name = tier.path_for("ABC");
        let file_name = name.file_name().unwrap().to_string_lossy();
        assert_eq!(file_name.len(), 64 + ".json".len());
    }

    #[core_async::test]
    async fn test_missing_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let tier = open_tier(&dir, DiskConfig::default(), Arc::new(SystemClock)).await;

        assert!(tier.read::<serde_json::Value>("NOPE").await.unwrap().is_none());
        assert!(!tier.exists("NOPE").await.unwrap());
        tier.remove("NOPE").await.unwrap();

        let stats = tier.stats().await.unwrap();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.files, 0);
    }

    #[core_async::test]
    async fn test_corrupt_file_is_discarded() {
        let dir = TempDir::new().unwrap();
        let tier = open_tier(&dir, DiskConfig::default(), Arc::new(SystemClock)).await;

        let path = tier.path_for("BAD");
        std::fs::write(&path, b"{not json").unwrap();

        assert!(tier.read::<serde_json::Value>("BAD").await.unwrap().is_none());
        assert!(!path.exists());
    }

    #[core_async::test]
    async fn test_type_mismatch_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let tier = open_tier(&dir, DiskConfig::default(), Arc::new(SystemClock)).await;

        tier.write("K", &json!("a string")).await.unwrap();
        assert!(tier.read::<Vec<u32>>("K").await.unwrap().is_none());
    }

    #[core_async::test]
    async fn test_expired_entries() {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(DateTime::from_timestamp(1_000, 0).unwrap()));
        let tier = open_tier(
            &dir,
            DiskConfig::default().with_expiry(Expiry::Seconds(10)),
            clock.clone(),
        )
        .await;

        tier.write("OLD", &1).await.unwrap();
        tier.write("GONE", &2).await.unwrap();
        clock.advance(chrono::Duration::seconds(5));
        tier.write("NEW", &3).await.unwrap();

        clock.advance(chrono::Duration::seconds(6));
        assert!(!tier.exists("OLD").await.unwrap());
        assert!(tier.read::<i32>("OLD").await.unwrap().is_none());
        assert!(!tier.path_for("OLD").exists());

        assert_eq!(tier.remove_expired().await.unwrap(), 1);
        assert_eq!(tier.read::<i32>("NEW").await.unwrap().unwrap().value, 3);
    }

    #[core_async::test]
    async fn test_budget_evicts_oldest_but_keeps_latest() {
        let dir = TempDir::new().unwrap();
        let value = "x".repeat(400);
        let size = DiskTier::encode("K0", &value, None).unwrap().len() as u64;
        let tier = open_tier(
            &dir,
            DiskConfig::default().with_max_size(size * 2),
            Arc::new(SystemClock),
        )
        .await;

        for i in 0..5 {
            tier.write(&format!("K{i}"), &value).await.unwrap();
        }

        let stats = tier.stats().await.unwrap();
        assert!(stats.total_bytes <= size * 2);
        assert_eq!(stats.evictions, 3);
        assert!(tier.exists("K4").await.unwrap());
    }

    #[core_async::test]
    async fn test_budget_keeps_most_recent_writes() {
        let dir = TempDir::new().unwrap();
        let value = "x".repeat(100);
        let size = DiskTier::encode("K00", &value, None).unwrap().len() as u64;
        let tier = open_tier(
            &dir,
            DiskConfig::default().with_max_size(size * 5),
            Arc::new(SystemClock),
        )
        .await;

        for i in 0..10 {
            tier.write(&format!("K{i:02}"), &value).await.unwrap();
        }

        let mut kept = Vec::new();
        for i in 0..10 {
            if tier.exists(&format!("K{i:02}")).await.unwrap() {
                kept.push(i);
            }
        }
        assert_eq!(kept, vec![5, 6, 7, 8, 9]);
    }

    #[core_async::test]
    async fn test_rewrite_refreshes_age() {
        let dir = TempDir::new().unwrap();
        let size = DiskTier::encode("A", &0, None).unwrap().len() as u64;
        let tier = open_tier(
            &dir,
            DiskConfig::default().with_max_size(size * 2),
            Arc::new(SystemClock),
        )
        .await;

        tier.write("A", &1).await.unwrap();
        tier.write("B", &1).await.unwrap();
        tier.write("A", &2).await.unwrap();
        tier.write("C", &1).await.unwrap();

        assert!(tier.exists("A").await.unwrap());
        assert!(!tier.exists("B").await.unwrap());
        assert!(tier.exists("C").await.unwrap());
    }

    #[core_async::test]
    async fn test_files_from_earlier_run_are_evicted_first() {
        let dir = TempDir::new().unwrap();
        let size = DiskTier::encode("OLD", &0, None).unwrap().len() as u64;
        let config = DiskConfig::default().with_max_size(size * 2);
        {
            let tier = open_tier(&dir, config.clone(), Arc::new(SystemClock)).await;
            tier.write("OLD", &1).await.unwrap();
        }

        let tier = open_tier(&dir, config, Arc::new(SystemClock)).await;
        tier.write("NEW", &1).await.unwrap();
        tier.write("TOP", &1).await.unwrap();

        assert!(!tier.exists("OLD").await.unwrap());
        assert!(tier.exists("NEW").await.unwrap());
        assert!(tier.exists("TOP").await.unwrap());
    }

    #[core_async::test]
    async fn test_oversized_write_survives_alone() {
        let dir = TempDir::new().unwrap();
        let tier = open_tier(
            &dir,
            DiskConfig::default().with_max_size(16),
            Arc::new(SystemClock),
        )
        .await;

        tier.write("SMALL", &1).await.unwrap();
        tier.write("BIG", &"y".repeat(64)).await.unwrap();

        assert!(tier.exists("BIG").await.unwrap());
        assert!(!tier.exists("SMALL").await.unwrap());
    }

    #[core_async::test]
    async fn test_remove_all() {
        let dir = TempDir::new().unwrap();
        let tier = open_tier(&dir, DiskConfig::default(), Arc::new(SystemClock)).await;

        tier.write("A", &1).await.unwrap();
        tier.write("B", &2).await.unwrap();
        tier.remove_all().await.unwrap();

        assert_eq!(tier.total_size().await.unwrap(), 0);
        assert!(tier.directory().exists());
        tier.write("C", &3).await.unwrap();
        assert!(tier.exists("C").await.unwrap());
    }

    #[core_async::test(multi_thread)]
    async fn test_concurrent_writers_leave_one_complete_file() {
        let dir = TempDir::new().unwrap();
        let tier = Arc::new(open_tier(&dir, DiskConfig::default(), Arc::new(SystemClock)).await);

        let writers: Vec<_> = (0..16)
            .map(|i| {
                let tier = tier.clone();
                core_async::task::spawn(async move {
                    tier.write("SAME", &json!({"writer": i, "padding": "z".repeat(2048)}))
                        .await
                        .unwrap();
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let entry = tier.read::<serde_json::Value>("SAME").await.unwrap().unwrap();
        assert!(entry.value["writer"].as_i64().unwrap() < 16);

        let leftovers = std::fs::read_dir(tier.directory()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
