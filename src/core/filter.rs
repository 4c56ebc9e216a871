//! The cache-line Bloom filter.
//!
//! # Concurrency Contract
//!
//! | Operation                         | Receiver    | Safe alongside            |
//! |-----------------------------------|-------------|---------------------------|
//! | `add*`, `insert`, `contains*`     | `&self`     | any `&self` operation     |
//! | `pop_count`, `stats`, estimates   | `&self`     | any `&self` (racy snapshot)|
//! | `clear`, `union`, `intersection`  | `&mut self` | nothing (exclusive)       |
//!
//! Bulk operations write the array through a vector backend without per-word
//! atomicity. Taking `&mut self` makes the borrow checker enforce that no
//! `add`/`contains` on the same filter is in flight while they run. To merge
//! into a filter shared across threads, quiesce the writers first (for
//! example by taking it out of its `Arc` or behind a `RwLock` write guard).
//!
//! # Examples
//!
//! ```
//! use linebloom::CacheBloomFilter;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let filter = Arc::new(CacheBloomFilter::new(10_000, 0.01).unwrap());
//!
//! let handles: Vec<_> = (0..4u64)
//!     .map(|t| {
//!         let filter = Arc::clone(&filter);
//!         thread::spawn(move || {
//!             for i in 0..1000 {
//!                 filter.add_u64(t * 1000 + i);
//!             }
//!         })
//!     })
//!     .collect();
//! for h in handles {
//!     h.join().unwrap();
//! }
//!
//! assert!((0..4000).all(|i| filter.contains_u64(i)));
//! ```

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::mem;

use crate::core::bitarray::BitArray;
use crate::core::cacheline::CACHE_LINE_BYTES;
use crate::core::params::FilterParameters;
use crate::core::stats::CacheStats;
use crate::error::{LineBloomError, Result};
use crate::hash::{hash_pair, FilterKey, ProbePositions};
use crate::simd::{self, BackendKind, SimdOps};
use crate::util::atomic::RetryPolicy;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Fixed-capacity, lock-free Bloom filter over cache-line aligned storage.
///
/// Created once through [`CacheBloomFilter::new`] or
/// [`FilterBuilder`](crate::FilterBuilder); capacity never changes.
#[derive(Debug, Clone)]
pub struct CacheBloomFilter {
    bits: BitArray,
    params: FilterParameters,
    ops: &'static dyn SimdOps,
    retry: RetryPolicy,
}

impl CacheBloomFilter {
    /// Create a filter sized for `expected_items` at false positive rate `fpr`.
    ///
    /// Uses the process-wide bulk backend and the default [`RetryPolicy`].
    ///
    /// # Errors
    ///
    /// - [`LineBloomError::InvalidItemCount`] if `expected_items == 0`
    /// - [`LineBloomError::FalsePositiveRateOutOfBounds`] if `fpr` is NaN or
    ///   outside `(0, 1)`
    /// - [`LineBloomError::DegenerateFilterSize`] if sizing yields 0 bits
    /// - [`LineBloomError::InvalidParameters`] if the size overflows or cannot
    ///   be allocated
    ///
    /// # Examples
    ///
    /// ```
    /// use linebloom::{CacheBloomFilter, LineBloomError};
    ///
    /// let filter = CacheBloomFilter::new(1000, 0.01).unwrap();
    /// filter.add(b"key");
    /// assert!(filter.contains(b"key"));
    ///
    /// assert!(matches!(
    ///     CacheBloomFilter::new(0, 0.01),
    ///     Err(LineBloomError::InvalidItemCount { .. })
    /// ));
    /// ```
    pub fn new(expected_items: u64, fpr: f64) -> Result<Self> {
        let params = FilterParameters::derive(expected_items, fpr)?;
        Self::from_parts(params, RetryPolicy::default(), simd::active_backend())
    }

    pub(crate) fn from_parts(
        params: FilterParameters,
        retry: RetryPolicy,
        ops: &'static dyn SimdOps,
    ) -> Result<Self> {
        retry.validate()?;
        let bits = BitArray::new(params.cache_line_count)?;

        tracing::debug!(
            expected_items = params.expected_items,
            target_fpr = params.target_fpr,
            bit_count = params.bit_count,
            raw_bit_count = params.raw_bit_count,
            hash_count = params.hash_count,
            cache_lines = params.cache_line_count,
            alignment_offset = bits.alignment_offset(),
            backend = %ops.kind(),
            "created cache-line bloom filter"
        );

        Ok(Self {
            bits,
            params,
            ops,
            retry,
        })
    }

    #[inline]
    fn positions(&self, key: &[u8]) -> ProbePositions {
        let (h1, h2) = hash_pair(key);
        ProbePositions::new(h1, h2, self.params.hash_count, self.params.bit_count)
    }

    /// Insert raw key bytes.
    ///
    /// Lock-free; once this returns, `contains(key)` is true from every
    /// thread.
    #[inline]
    pub fn add(&self, key: &[u8]) {
        #[cfg(feature = "trace")]
        tracing::trace!(len = key.len(), "add");

        for position in self.positions(key) {
            self.bits.set(position, &self.retry);
        }
    }

    /// Test raw key bytes.
    ///
    /// `false` means definitely absent; `true` means possibly present.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        let found = self.positions(key).all(|position| self.bits.get(position));

        #[cfg(feature = "trace")]
        tracing::trace!(len = key.len(), found, "contains");

        found
    }

    /// Insert a string's UTF-8 bytes.
    #[inline]
    pub fn add_str(&self, key: &str) {
        self.add(key.as_bytes());
    }

    /// Test a string's UTF-8 bytes.
    #[inline]
    #[must_use]
    pub fn contains_str(&self, key: &str) -> bool {
        self.contains(key.as_bytes())
    }

    /// Insert a `u64` as 8 little-endian bytes.
    #[inline]
    pub fn add_u64(&self, key: u64) {
        self.add(&key.to_le_bytes());
    }

    /// Test a `u64` as 8 little-endian bytes.
    #[inline]
    #[must_use]
    pub fn contains_u64(&self, key: u64) -> bool {
        self.contains(&key.to_le_bytes())
    }

    /// Insert any [`FilterKey`].
    ///
    /// ```
    /// use linebloom::CacheBloomFilter;
    ///
    /// let filter = CacheBloomFilter::new(100, 0.01).unwrap();
    /// filter.insert("fig");
    /// filter.insert(&42u32);
    /// assert!(filter.contains_key(&String::from("fig")));
    /// assert!(filter.contains_key(&42u32));
    /// ```
    #[inline]
    pub fn insert<K: FilterKey + ?Sized>(&self, key: &K) {
        key.with_key_bytes(|bytes| self.add(bytes));
    }

    /// Test any [`FilterKey`].
    #[inline]
    #[must_use]
    pub fn contains_key<K: FilterKey + ?Sized>(&self, key: &K) -> bool {
        key.with_key_bytes(|bytes| self.contains(bytes))
    }

    /// Insert every key in `keys`.
    pub fn add_batch<K: FilterKey>(&self, keys: &[K]) {
        for key in keys {
            self.insert(key);
        }
    }

    /// Test every key in `keys`, in order.
    #[must_use]
    pub fn contains_batch<K: FilterKey>(&self, keys: &[K]) -> Vec<bool> {
        keys.iter().map(|key| self.contains_key(key)).collect()
    }

    /// Insert every key in `keys` on the rayon thread pool.
    #[cfg(feature = "rayon")]
    pub fn par_add_batch<K: FilterKey + Sync>(&self, keys: &[K]) {
        keys.par_iter().for_each(|key| self.insert(key));
    }

    /// Test every key in `keys` on the rayon thread pool, preserving order.
    #[cfg(feature = "rayon")]
    #[must_use]
    pub fn par_contains_batch<K: FilterKey + Sync>(&self, keys: &[K]) -> Vec<bool> {
        keys.par_iter().map(|key| self.contains_key(key)).collect()
    }

    /// Reset every bit to zero.
    pub fn clear(&mut self) {
        self.bits.clear(self.ops);
        tracing::debug!(cache_lines = self.bits.line_count(), "cleared filter");
    }

    /// Merge `other` into `self` (`self |= other`).
    ///
    /// Afterwards `self` reports every key either filter reported.
    ///
    /// # Errors
    ///
    /// [`LineBloomError::SizeMismatch`] or
    /// [`LineBloomError::HashCountMismatch`] if the filters were sized
    /// differently. `self` is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use linebloom::CacheBloomFilter;
    ///
    /// let mut a = CacheBloomFilter::new(1000, 0.01).unwrap();
    /// let b = CacheBloomFilter::new(1000, 0.01).unwrap();
    /// a.add_str("left");
    /// b.add_str("right");
    ///
    /// a.union(&b).unwrap();
    /// assert!(a.contains_str("left") && a.contains_str("right"));
    ///
    /// let small = CacheBloomFilter::new(10, 0.01).unwrap();
    /// assert!(a.union(&small).is_err());
    /// ```
    pub fn union(&mut self, other: &Self) -> Result<()> {
        self.check_compatible(other)?;
        self.bits.or_from(&other.bits, self.ops);
        tracing::debug!(cache_lines = self.bits.line_count(), "union");
        Ok(())
    }

    /// Keep only bits set in both filters (`self &= other`).
    ///
    /// Keys added to both filters remain present. The result may report keys
    /// that were in neither original set, at a rate above either input's.
    ///
    /// # Errors
    ///
    /// Same as [`union`](Self::union); `self` is left unchanged.
    pub fn intersection(&mut self, other: &Self) -> Result<()> {
        self.check_compatible(other)?;
        self.bits.and_from(&other.bits, self.ops);
        tracing::debug!(cache_lines = self.bits.line_count(), "intersection");
        Ok(())
    }

    fn check_compatible(&self, other: &Self) -> Result<()> {
        let (left, right) = (self.bits.line_count(), other.bits.line_count());
        if left != right {
            tracing::debug!(left, right, "rejected set operation: size mismatch");
            return Err(LineBloomError::size_mismatch(left, right));
        }
        if self.params.hash_count != other.params.hash_count {
            return Err(LineBloomError::hash_count_mismatch(
                self.params.hash_count,
                other.params.hash_count,
            ));
        }
        Ok(())
    }

    /// Number of set bits.
    ///
    /// Under concurrent `add` calls this is a snapshot of some interleaving
    /// of those writes.
    #[must_use]
    pub fn pop_count(&self) -> u64 {
        self.bits.pop_count(self.ops)
    }

    /// Fraction of bits set.
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        self.pop_count() as f64 / self.bit_count() as f64
    }

    /// Current false positive probability, `load_factor ^ hash_count`.
    #[must_use]
    pub fn estimated_fpp(&self) -> f64 {
        fpp(self.load_factor(), self.params.hash_count)
    }

    /// Approximate number of distinct keys inserted.
    ///
    /// Uses `n ≈ -(m/k) × ln(1 - X/m)`. Returns `u64::MAX` once every bit is
    /// set.
    #[must_use]
    pub fn estimate_cardinality(&self) -> u64 {
        let set = self.pop_count();
        if set == 0 {
            return 0;
        }
        let m = self.bit_count();
        if set >= m {
            return u64::MAX;
        }
        let m = m as f64;
        let k = f64::from(self.params.hash_count);
        let estimate = -(m / k) * (1.0 - set as f64 / m).ln();
        estimate.round().max(0.0) as u64
    }

    /// True if no bit is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pop_count() == 0
    }

    /// Bit capacity, a multiple of 512.
    #[inline]
    #[must_use]
    pub fn bit_count(&self) -> u64 {
        self.params.bit_count
    }

    /// Probe positions per key.
    #[inline]
    #[must_use]
    pub fn hash_count(&self) -> u32 {
        self.params.hash_count
    }

    /// Number of 64-byte lines.
    #[inline]
    #[must_use]
    pub fn cache_line_count(&self) -> usize {
        self.params.cache_line_count
    }

    /// Parameters this filter was sized with.
    #[must_use]
    pub fn parameters(&self) -> &FilterParameters {
        &self.params
    }

    /// Policy used by contended inserts.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Backend used by bulk operations.
    #[must_use]
    pub fn backend(&self) -> BackendKind {
        self.ops.kind()
    }

    /// Bytes held by the filter, including alignment padding.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        mem::size_of::<Self>() + self.bits.memory_usage()
    }

    /// Point-in-time statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let bits_set = self.pop_count();
        let bit_count = self.bit_count();
        let load_factor = bits_set as f64 / bit_count as f64;
        let features = simd::cpu_features();

        CacheStats {
            bit_count,
            hash_count: self.params.hash_count,
            bits_set,
            load_factor,
            estimated_fpp: fpp(load_factor, self.params.hash_count),
            cache_line_count: self.bits.line_count(),
            cache_line_size: CACHE_LINE_BYTES,
            memory_usage: self.memory_usage(),
            alignment_offset: self.bits.alignment_offset(),
            has_avx2: features.has_avx2,
            has_neon: features.has_neon,
            simd_backend: self.ops.kind().name().to_string(),
        }
    }
}

fn fpp(load_factor: f64, hash_count: u32) -> f64 {
    load_factor.powf(f64::from(hash_count))
}
