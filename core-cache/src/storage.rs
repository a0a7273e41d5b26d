//! # Hybrid Storage
//!
//! A memory tier in front of a disk tier for one entity type. Values are
//! serialized once per write; the byte length of that serialization is both
//! the memory cost and the disk file size.

use crate::config::StorageConfig;
use crate::disk::DiskTier;
use crate::error::{CacheError, Result};
use crate::memory::MemoryTier;
use crate::stats::StorageStats;
use bridge_traits::storage::FileSystemAccess;
use bridge_traits::time::{Clock, SystemClock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::hash::Hash;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, trace};

/// Two-tier cache for values of type `V` keyed by `K`.
///
/// Safe to share across tasks; every operation takes `&self`.
pub struct HybridStorage<K: Hash + Eq, V> {
    config: StorageConfig,
    memory: MemoryTier<K, V>,
    disk: DiskTier,
}

impl<K, V> HybridStorage<K, V>
where
    K: Display + Hash + Eq + Clone + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Open the storage below the host's persistent cache directory.
    pub async fn open(config: StorageConfig, fs: Arc<dyn FileSystemAccess>) -> Result<Self> {
        Self::open_with_clock(config, fs, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(
        config: StorageConfig,
        fs: Arc<dyn FileSystemAccess>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate().map_err(CacheError::InvalidConfig)?;

        let directory = fs
            .get_cache_directory()
            .await?
            .join(&config.disk.name)
            .join(&config.namespace);

        let disk = DiskTier::open(directory, config.disk.clone(), fs, clock.clone()).await?;
        let memory = MemoryTier::new(config.memory.clone(), clock);

        info!(
            namespace = %config.namespace,
            directory = %disk.directory().display(),
            "Opened hybrid storage"
        );

        Ok(Self {
            config,
            memory,
            disk,
        })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn directory(&self) -> &Path {
        self.disk.directory()
    }

    /// Write `value` to both tiers. The memory tier is updated before the
    /// disk write starts; a disk failure leaves the memory entry in place.
    #[instrument(skip(self, value, key), fields(namespace = %self.config.namespace, key = %key))]
    pub async fn set_object(&self, value: V, key: K) -> Result<()> {
        let name = key.to_string();
        let encoded = DiskTier::encode(&name, &value, self.disk.expiry_for_new_entry())?;

        let evicted = self.memory.insert(key, value, encoded.len());
        if evicted > 0 {
            debug!(evicted, "Memory tier evicted entries");
        }

        self.disk.write_encoded(&name, encoded).await
    }

    /// Look up `key`, checking memory first. Disk hits are promoted into
    /// memory with the expiry they were written with, unless a newer value
    /// reached memory while the disk read was in flight.
    pub async fn object(&self, key: &K) -> Result<Option<V>> {
        if let Some(value) = self.memory.get(key) {
            return Ok(Some(value));
        }

        let name = key.to_string();
        match self.disk.read::<V>(&name).await? {
            Some(entry) => {
                let promoted = self.memory.insert_if_absent(
                    key.clone(),
                    entry.value.clone(),
                    entry.size,
                    entry.expires_at,
                );
                if !promoted {
                    trace!(key = %key, "Skipped promotion of disk entry");
                }
                Ok(Some(entry.value))
            }
            None => Ok(None),
        }
    }

    /// Whether either tier holds a live entry for `key`.
    pub async fn exists(&self, key: &K) -> Result<bool> {
        if self.memory.contains(key) {
            return Ok(true);
        }
        self.disk.exists(&key.to_string()).await
    }

    pub async fn remove_object(&self, key: &K) -> Result<()> {
        self.memory.remove(key);
        self.disk.remove(&key.to_string()).await
    }

    pub async fn remove_all(&self) -> Result<()> {
        self.memory.clear();
        self.disk.remove_all().await
    }

    /// Drop expired entries from both tiers. Returns the number of disk
    /// files removed.
    pub async fn remove_expired(&self) -> Result<usize> {
        self.memory.remove_expired();
        self.disk.remove_expired().await
    }

    pub async fn stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            memory: self.memory.stats(),
            disk: self.disk.stats().await?,
        })
    }
}
