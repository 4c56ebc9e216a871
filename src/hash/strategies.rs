//! Probe position generation.
//!
//! ## Double Hashing (Kirsch & Mitzenmacher 2006)
//!
//! For k probes derived from two independent hashes h₁ and h₂:
//!
//! ```text
//! gᵢ(x) = (h₁(x) + i·h₂(x)) mod m      for i in 0..k
//! ```
//!
//! The sum wraps in 64-bit arithmetic before the reduction, so positions are
//! stable across platforms. Positions are yielded lazily; nothing is
//! allocated per key.
//!
//! # References
//!
//! - Kirsch, A., & Mitzenmacher, M. (2006). "Less Hashing, Same Performance: Building a Better Bloom Filter"

use std::iter::FusedIterator;

/// Iterator over the `k` probe positions of one key.
///
/// # Examples
///
/// ```
/// use linebloom::hash::ProbePositions;
///
/// let positions: Vec<u64> = ProbePositions::new(10, 3, 4, 7).collect();
/// assert_eq!(positions, vec![3, 6, 2, 5]); // 10, 13, 16, 19 mod 7
/// ```
#[derive(Debug, Clone)]
pub struct ProbePositions {
    current: u64,
    step: u64,
    remaining: u32,
    modulus: u64,
}

impl ProbePositions {
    /// Positions `(h1 + i·h2) mod bit_count` for `i` in `0..hash_count`.
    ///
    /// # Panics
    ///
    /// Iterating panics if `bit_count == 0` and `hash_count > 0`.
    #[inline]
    #[must_use]
    pub fn new(h1: u64, h2: u64, hash_count: u32, bit_count: u64) -> Self {
        Self {
            current: h1,
            step: h2,
            remaining: hash_count,
            modulus: bit_count,
        }
    }
}

impl Iterator for ProbePositions {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        let position = self.current % self.modulus;
        self.current = self.current.wrapping_add(self.step);
        self.remaining -= 1;
        Some(position)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for ProbePositions {}

impl FusedIterator for ProbePositions {}
