//! Tier statistics

use serde::{Deserialize, Serialize};

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Snapshot of a memory tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub entries: usize,
    pub total_cost: usize,
    pub count_limit: usize,
    pub total_cost_limit: usize,
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped by count/cost limits or expiry
    pub evictions: u64,
}

impl MemoryStats {
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.hits + self.misses)
    }

    /// Cost usage as a percentage of the cost limit.
    pub fn cost_usage_percentage(&self) -> f64 {
        ratio(self.total_cost as u64, self.total_cost_limit as u64) * 100.0
    }
}

/// Snapshot of a disk tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskStats {
    pub files: usize,
    pub total_bytes: u64,
    pub max_size_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    /// Files removed to stay within the byte budget
    pub evictions: u64,
    pub write_failures: u64,
}

impl DiskStats {
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.hits + self.misses)
    }

    pub fn usage_percentage(&self) -> f64 {
        ratio(self.total_bytes, self.max_size_bytes) * 100.0
    }

    /// Returns true if the tier is near its budget (>90%).
    pub fn is_near_capacity(&self) -> bool {
        self.usage_percentage() > 90.0
    }
}

/// Combined snapshot of a memory + disk tier pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageStats {
    pub memory: MemoryStats,
    pub disk: DiskStats,
}

impl StorageStats {
    /// Fraction of lookups answered without reaching the durable store.
    pub fn combined_hit_rate(&self) -> f64 {
        // Every memory miss becomes a disk lookup.
        ratio(self.memory.hits + self.disk.hits, self.memory.hits + self.memory.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rates() {
        let stats = StorageStats {
            memory: MemoryStats {
                hits: 6,
                misses: 4,
                ..Default::default()
            },
            disk: DiskStats {
                hits: 3,
                misses: 1,
                ..Default::default()
            },
        };

        assert!((stats.memory.hit_rate() - 0.6).abs() < f64::EPSILON);
        assert!((stats.disk.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert!((stats.combined_hit_rate() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_empty_stats() {
        let stats = StorageStats::default();
        assert_eq!(stats.memory.hit_rate(), 0.0);
        assert_eq!(stats.disk.usage_percentage(), 0.0);
        assert_eq!(stats.combined_hit_rate(), 0.0);
    }

    #[test]
    fn test_disk_capacity() {
        let stats = DiskStats {
            total_bytes: 95,
            max_size_bytes: 100,
            ..Default::default()
        };
        assert!(stats.is_near_capacity());
        assert!((stats.usage_percentage() - 95.0).abs() < 1e-9);
    }
}
