//! Core storage, sizing and the filter itself.
//!
//! # Module Organization
//!
//! ```text
//! core/
//! ├── cacheline.rs - Line geometry and bit addressing
//! ├── bitarray.rs  - Aligned atomic word array
//! ├── params.rs    - Parameter derivation
//! ├── stats.rs     - CacheStats snapshot
//! ├── filter.rs    - CacheBloomFilter
//! └── mod.rs       - This file (public API)
//! ```
//!
//! # Layers
//!
//! ```text
//! CacheBloomFilter ── FilterParameters (m, k, lines)
//!        │
//!        ├── BitArray ── lines × 8 × AtomicU64, 64-byte aligned
//!        │
//!        └── &'static dyn SimdOps ── clear / or / and / popcount
//! ```

pub mod bitarray;
pub mod cacheline;
pub mod filter;
pub mod params;
pub mod stats;

pub use bitarray::BitArray;
pub use cacheline::{BitAddress, BITS_PER_LINE, CACHE_LINE_BYTES, WORDS_PER_LINE};
pub use filter::CacheBloomFilter;
pub use params::{expected_fp_rate, optimal_bit_count, optimal_hash_count, FilterParameters};
pub use stats::CacheStats;
