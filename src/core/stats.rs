//! Point-in-time filter statistics.

use std::fmt;

/// Snapshot of a filter's shape, occupancy and dispatch configuration.
///
/// Computed on demand by [`CacheBloomFilter::stats`](crate::CacheBloomFilter::stats).
/// Under concurrent inserts `bits_set` and the values derived from it reflect
/// some interleaving of those writes.
///
/// # Examples
///
/// ```
/// use linebloom::CacheBloomFilter;
///
/// let filter = CacheBloomFilter::new(1000, 0.01).unwrap();
/// filter.add_str("apple");
///
/// let stats = filter.stats();
/// assert_eq!(stats.bit_count, 9728);
/// assert_eq!(stats.hash_count, 7);
/// assert!(stats.bits_set >= 1 && stats.bits_set <= 7);
/// assert_eq!(stats.cache_line_size, 64);
/// println!("{stats}");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheStats {
    /// Bit capacity.
    pub bit_count: u64,
    /// Probe positions per key.
    pub hash_count: u32,
    /// Bits currently set.
    pub bits_set: u64,
    /// `bits_set / bit_count`.
    pub load_factor: f64,
    /// `load_factor ^ hash_count`.
    pub estimated_fpp: f64,
    /// Number of cache lines.
    pub cache_line_count: usize,
    /// Bytes per cache line.
    pub cache_line_size: usize,
    /// Heap and inline bytes held by the filter.
    pub memory_usage: usize,
    /// Bytes skipped at the start of the allocation to reach alignment.
    pub alignment_offset: usize,
    /// AVX2 detected.
    pub has_avx2: bool,
    /// NEON detected.
    pub has_neon: bool,
    /// Name of the backend used for bulk operations.
    pub simd_backend: String,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bits {}/{} ({:.2}%), k={}, est. FPP {:.6}, {} lines x {} B, {} B total, \
             offset {} B, backend {}",
            self.bits_set,
            self.bit_count,
            self.load_factor * 100.0,
            self.hash_count,
            self.estimated_fpp,
            self.cache_line_count,
            self.cache_line_size,
            self.memory_usage,
            self.alignment_offset,
            self.simd_backend
        )
    }
}
