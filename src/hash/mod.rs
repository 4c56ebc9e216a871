//! Key hashing and probe generation.
//!
//! # Module Structure
//!
//! ```text
//! hash/
//! ├── hasher.rs      - Dual 64-bit hash of raw bytes (h1, h2)
//! ├── strategies.rs  - Double-hashing probe position iterator
//! ├── key.rs         - FilterKey: typed keys to bytes
//! └── mod.rs         - This file (public API)
//! ```
//!
//! # Data Flow
//!
//! ```text
//! key ──FilterKey──▶ bytes ──hash_pair──▶ (h1, h2) ──ProbePositions──▶ k positions
//! ```
//!
//! # Examples
//!
//! ```
//! use linebloom::hash::probe_positions;
//!
//! let positions: Vec<u64> = probe_positions(b"apple", 7, 9728).collect();
//! assert_eq!(positions.len(), 7);
//! assert!(positions.iter().all(|&p| p < 9728));
//! ```
//!
//! # References
//!
//! - Kirsch & Mitzenmacher (2006): "Less Hashing, Same Performance: Building a Better Bloom Filter"

pub mod hasher;
pub mod key;
pub mod strategies;

pub use hasher::{hash_pair, hash_primary, hash_secondary, SEED_PRIMARY, SEED_SECONDARY};
pub use key::FilterKey;
pub use strategies::ProbePositions;

/// Hash `bytes` and return its `hash_count` positions in a `bit_count`-bit array.
#[inline]
#[must_use]
pub fn probe_positions(bytes: &[u8], hash_count: u32, bit_count: u64) -> ProbePositions {
    let (h1, h2) = hash_pair(bytes);
    ProbePositions::new(h1, h2, hash_count, bit_count)
}
