//! Tier configuration and the fixed Relisten limits

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Directory (below the persistent cache directory) holding the disk tiers.
pub const RELISTEN_CACHE_NAME: &str = "RelistenCache";

/// Disk tier budget per entity type: 100 MiB.
pub const DISK_MAX_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// Memory tier entry limit per entity type.
pub const MEMORY_COUNT_LIMIT: usize = 200;

/// Memory tier cost limit per entity type: 25 MiB of serialized entries.
pub const MEMORY_TOTAL_COST_LIMIT: usize = 25 * 1024 * 1024;

/// When a cached entry stops being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Expiry {
    /// Entries stay until evicted by size policy.
    #[default]
    Never,
    /// Entries expire this many seconds after they were written.
    Seconds(u64),
    /// Entries expire at a fixed instant.
    Date(DateTime<Utc>),
}

impl Expiry {
    /// Expiry instant for an entry written at `now`, or `None` for never.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Expiry::Never => None,
            Expiry::Seconds(secs) => {
                let secs = i64::try_from(*secs).unwrap_or(i64::MAX);
                Some(
                    Duration::try_seconds(secs)
                        .and_then(|offset| now.checked_add_signed(offset))
                        .unwrap_or(DateTime::<Utc>::MAX_UTC),
                )
            }
            Expiry::Date(date) => Some(*date),
        }
    }
}

/// Disk tier settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskConfig {
    /// Directory name below the persistent cache directory
    pub name: String,
    pub expiry: Expiry,
    /// Total byte budget; oldest files are removed beyond it
    pub max_size_bytes: u64,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            name: RELISTEN_CACHE_NAME.to_string(),
            expiry: Expiry::Never,
            max_size_bytes: DISK_MAX_SIZE_BYTES,
        }
    }
}

impl DiskConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size_bytes = bytes;
        self
    }
}

/// Memory tier settings. Whichever limit is crossed first triggers eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryConfig {
    pub expiry: Expiry,
    /// Maximum number of entries
    pub count_limit: usize,
    /// Maximum summed cost (serialized bytes) of all entries
    pub total_cost_limit: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            expiry: Expiry::Never,
            count_limit: MEMORY_COUNT_LIMIT,
            total_cost_limit: MEMORY_TOTAL_COST_LIMIT,
        }
    }
}

impl MemoryConfig {
    pub fn with_expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn with_count_limit(mut self, count: usize) -> Self {
        self.count_limit = count;
        self
    }

    pub fn with_total_cost_limit(mut self, cost: usize) -> Self {
        self.total_cost_limit = cost;
        self
    }
}

/// Configuration of one memory + disk tier pair.
///
/// `namespace` separates entity types sharing the same disk directory:
/// files land in `<cache dir>/<disk.name>/<namespace>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub namespace: String,
    pub disk: DiskConfig,
    pub memory: MemoryConfig,
}

impl StorageConfig {
    /// The fixed Relisten configuration for one entity type.
    pub fn relisten(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            disk: DiskConfig::default(),
            memory: MemoryConfig::default(),
        }
    }

    pub fn with_disk(mut self, disk: DiskConfig) -> Self {
        self.disk = disk;
        self
    }

    pub fn with_memory(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.namespace.is_empty() || self.namespace.contains(['/', '\\']) {
            return Err(format!("invalid namespace {:?}", self.namespace));
        }

        if self.disk.name.is_empty() || self.disk.name.contains(['/', '\\']) {
            return Err(format!("invalid disk cache name {:?}", self.disk.name));
        }

        if self.disk.max_size_bytes == 0 {
            return Err("disk max_size_bytes must be greater than 0".to_string());
        }

        if self.memory.count_limit == 0 {
            return Err("memory count_limit must be at least 1".to_string());
        }

        if self.memory.total_cost_limit == 0 {
            return Err("memory total_cost_limit must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relisten_limits() {
        let config = StorageConfig::relisten("shows");

        assert_eq!(config.disk.name, "RelistenCache");
        assert_eq!(config.disk.expiry, Expiry::Never);
        assert_eq!(config.disk.max_size_bytes, 104_857_600);
        assert_eq!(config.memory.expiry, Expiry::Never);
        assert_eq!(config.memory.count_limit, 200);
        assert_eq!(config.memory.total_cost_limit, 26_214_400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = StorageConfig::relisten("artists")
            .with_disk(DiskConfig::default().with_name("Scratch").with_max_size(1024))
            .with_memory(
                MemoryConfig::default()
                    .with_count_limit(2)
                    .with_total_cost_limit(64)
                    .with_expiry(Expiry::Seconds(30)),
            );

        assert_eq!(config.disk.name, "Scratch");
        assert_eq!(config.disk.max_size_bytes, 1024);
        assert_eq!(config.memory.count_limit, 2);
        assert_eq!(config.memory.expiry, Expiry::Seconds(30));
    }

    #[test]
    fn test_config_validation() {
        assert!(StorageConfig::relisten("").validate().is_err());
        assert!(StorageConfig::relisten("a/b").validate().is_err());

        let zero_disk = StorageConfig::relisten("shows")
            .with_disk(DiskConfig::default().with_max_size(0));
        assert!(zero_disk.validate().is_err());

        let zero_count = StorageConfig::relisten("shows")
            .with_memory(MemoryConfig::default().with_count_limit(0));
        assert!(zero_count.validate().is_err());

        let zero_cost = StorageConfig::relisten("shows")
            .with_memory(MemoryConfig::default().with_total_cost_limit(0));
        assert!(zero_cost.validate().is_err());
    }

    #[test]
    fn test_expiry_instants() {
        let now = DateTime::from_timestamp(1_000, 0).unwrap();

        assert_eq!(Expiry::Never.expires_at(now), None);
        assert_eq!(
            Expiry::Seconds(60).expires_at(now),
            DateTime::from_timestamp(1_060, 0)
        );

        let fixed = DateTime::from_timestamp(5_000, 0).unwrap();
        assert_eq!(Expiry::Date(fixed).expires_at(now), Some(fixed));

        assert_eq!(
            Expiry::Seconds(u64::MAX).expires_at(now),
            Some(DateTime::<Utc>::MAX_UTC)
        );
    }
}
