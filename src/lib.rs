//! linebloom: a cache-line aligned, lock-free Bloom filter.
//!
//! A Bloom filter is a space-efficient probabilistic set. It can produce:
//! - **False positives**: May indicate an element is in the set when it isn't
//! - **Zero false negatives**: If it says an element isn't in the set, it definitely isn't
//!
//! linebloom keeps its bits in 64-byte aligned cache lines of atomic words,
//! inserts without locks, and runs whole-array work (clear, union,
//! intersection, population count) through an AVX2, NEON or scalar backend
//! picked once at runtime.
//!
//! # Quick Start
//!
//! ```
//! use linebloom::CacheBloomFilter;
//!
//! // 1,000 expected items at a 1% false positive rate
//! let filter = CacheBloomFilter::new(1000, 0.01)?;
//!
//! filter.add_str("apple");
//! filter.add_u64(42);
//! filter.add(b"raw bytes");
//!
//! assert!(filter.contains_str("apple"));
//! assert!(filter.contains_u64(42));
//! assert!(filter.contains(b"raw bytes"));
//! # Ok::<(), linebloom::LineBloomError>(())
//! ```
//!
//! # Concurrency
//!
//! `add`/`contains` take `&self` and are lock-free, so an `Arc<CacheBloomFilter>`
//! can be shared by any number of writers and readers. `clear`, `union` and
//! `intersection` take `&mut self`: they rewrite the array without per-word
//! atomicity, and the borrow checker keeps them from overlapping with inserts
//! or lookups on the same filter.
//!
//! ```
//! use linebloom::CacheBloomFilter;
//!
//! let mut hot = CacheBloomFilter::new(10_000, 0.01)?;
//! let cold = CacheBloomFilter::new(10_000, 0.01)?;
//! hot.add_str("recent");
//! cold.add_str("archived");
//!
//! hot.union(&cold)?;
//! assert!(hot.contains_str("archived"));
//! # Ok::<(), linebloom::LineBloomError>(())
//! ```
//!
//! # Feature Flags
//!
//! | Feature | Enables                                                  |
//! |---------|----------------------------------------------------------|
//! | `trace` | Per-key `tracing` events on `add`/`contains`             |
//! | `serde` | `Serialize`/`Deserialize` for stats and config types     |
//! | `rayon` | `par_add_batch` / `par_contains_batch`                   |
//!
//! # Logging
//!
//! Construction, backend selection and bulk operations emit `tracing` events
//! at `debug` level. The crate never installs a subscriber.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Storage, sizing and the filter.
pub mod core;

/// Error types.
pub mod error;

/// Key hashing and probe generation.
pub mod hash;

/// Runtime-dispatched bulk byte operations.
pub mod simd;

/// Lock-free primitives.
pub mod util;

/// Filter builders.
pub mod builder;

pub use builder::FilterBuilder;
pub use core::{CacheBloomFilter, CacheStats, FilterParameters};
pub use error::{LineBloomError, Result};
pub use hash::FilterKey;
pub use simd::{
    active_backend, backend_for, cpu_features, has_avx2, has_neon, has_vector_accel,
    BackendKind, CpuFeatures, SimdOps,
};
pub use util::atomic::RetryPolicy;

/// Prelude for convenient imports.
///
/// ```
/// use linebloom::prelude::*;
///
/// let filter = FilterBuilder::new()
///     .expected_items(100)
///     .false_positive_rate(0.01)
///     .build()?;
/// filter.insert("key");
/// assert!(filter.contains_key("key"));
/// # Ok::<(), LineBloomError>(())
/// ```
pub mod prelude {
    pub use crate::builder::FilterBuilder;
    pub use crate::core::{CacheBloomFilter, CacheStats};
    pub use crate::error::{LineBloomError, Result};
    pub use crate::hash::FilterKey;
    pub use crate::simd::BackendKind;
    pub use crate::util::atomic::RetryPolicy;
}
