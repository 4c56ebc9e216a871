//! Dual 64-bit hashing of raw key bytes.
//!
//! Two functions share one block structure but use different seeds and
//! rounds. The primary pre-multiplies each word and rotates before the
//! multiply; the secondary adds an xorshift after every multiply. Neither
//! round is linear in the top bit of a word, so equal flips in adjacent words
//! do not cancel. Their outputs are the `h1`/`h2` pair consumed by double
//! hashing.
//!
//! # Block Structure
//!
//! ```text
//! ┌──────────── 32-byte blocks ────────────┐┌─ 8-byte words ─┐┌ tail ┐
//! │ lane0 │ lane1 │ lane2 │ lane3 │ ...    ││ w │ w │ ...    ││b b b │
//! └────────────────────────────────────────┘└────────────────┘└──────┘
//! ```
//!
//! - Each 32-byte block feeds four independent lane accumulators, which are
//!   folded into the main state once all blocks are consumed.
//! - Remaining whole words, then single bytes, are mixed one at a time.
//! - All words are read little-endian, so results are identical on every
//!   platform.
//! - Non-empty input ends with the length folded in and a 64-bit avalanche.
//!
//! Empty input returns the function's seed unchanged.
//!
//! # Examples
//!
//! ```
//! use linebloom::hash::{hash_pair, hash_primary, hash_secondary, SEED_PRIMARY, SEED_SECONDARY};
//!
//! let (h1, h2) = hash_pair(b"apple");
//! assert_eq!(h1, hash_primary(b"apple"));
//! assert_eq!(h2, hash_secondary(b"apple"));
//! assert_ne!(h1, h2);
//!
//! assert_eq!(hash_pair(b""), (SEED_PRIMARY, SEED_SECONDARY));
//! ```

#![allow(clippy::cast_possible_truncation)]

/// Initial state of the primary function.
pub const SEED_PRIMARY: u64 = 0xcbf2_9ce4_8422_2325;

/// Initial state of the secondary function.
pub const SEED_SECONDARY: u64 = 0x9e37_79b9_7f4a_7c15;

const PRIME_PRIMARY: u64 = 0x9e37_79b9_7f4a_7c15;
/// Applied to each input word before it enters the primary state.
const PRIME_PRIMARY_INPUT: u64 = 0x1656_67b1_9e37_79f9;
const PRIME_SECONDARY: u64 = 0xc2b2_ae3d_27d4_eb4f;

/// Spreads the four lane start states apart.
const LANE_OFFSET: u64 = 0x2545_f491_4f6c_dd1d;

const BLOCK_BYTES: usize = 32;
const WORD_BYTES: usize = 8;

/// How one word is folded into the state.
#[derive(Clone, Copy)]
enum Round {
    /// `rotl(state ^ word * input_prime, 31) * prime`.
    Rotate { input_prime: u64 },
    /// `h = (state ^ word) * prime; h ^ (h >> shift)`.
    XorShift { shift: u32 },
}

struct Mixer {
    seed: u64,
    prime: u64,
    round: Round,
}

const PRIMARY: Mixer = Mixer {
    seed: SEED_PRIMARY,
    prime: PRIME_PRIMARY,
    round: Round::Rotate {
        input_prime: PRIME_PRIMARY_INPUT,
    },
};

const SECONDARY: Mixer = Mixer {
    seed: SEED_SECONDARY,
    prime: PRIME_SECONDARY,
    round: Round::XorShift { shift: 29 },
};

impl Mixer {
    #[inline(always)]
    fn step(&self, state: u64, word: u64) -> u64 {
        match self.round {
            Round::Rotate { input_prime } => (state ^ word.wrapping_mul(input_prime))
                .rotate_left(31)
                .wrapping_mul(self.prime),
            Round::XorShift { shift } => {
                let h = (state ^ word).wrapping_mul(self.prime);
                h ^ (h >> shift)
            }
        }
    }

    #[inline]
    fn hash(&self, bytes: &[u8]) -> u64 {
        if bytes.is_empty() {
            return self.seed;
        }

        let mut h = self.seed;
        let mut blocks = bytes.chunks_exact(BLOCK_BYTES);

        if bytes.len() >= BLOCK_BYTES {
            let mut lanes = [0u64; 4];
            for (i, lane) in lanes.iter_mut().enumerate() {
                *lane = self.seed.wrapping_add(LANE_OFFSET.wrapping_mul(i as u64 + 1));
            }

            for block in &mut blocks {
                for (lane, word) in lanes.iter_mut().zip(block.chunks_exact(WORD_BYTES)) {
                    *lane = self.step(*lane, read_u64(word)).rotate_left(31);
                }
            }

            for (i, lane) in lanes.iter().enumerate() {
                h = self.step(h, lane.rotate_left(7 * (i as u32 + 1)));
            }
        }

        let mut words = blocks.remainder().chunks_exact(WORD_BYTES);
        for word in &mut words {
            h = self.step(h, read_u64(word));
        }
        for &byte in words.remainder() {
            h = self.step(h, u64::from(byte));
        }

        avalanche(h ^ bytes.len() as u64)
    }
}

#[inline(always)]
fn read_u64(word: &[u8]) -> u64 {
    let mut buf = [0u8; WORD_BYTES];
    buf.copy_from_slice(word);
    u64::from_le_bytes(buf)
}

/// 64-bit finalizer; every input bit affects every output bit.
#[inline]
fn avalanche(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}

/// Primary hash (`h1`).
#[inline]
#[must_use]
pub fn hash_primary(bytes: &[u8]) -> u64 {
    PRIMARY.hash(bytes)
}

/// Secondary hash (`h2`).
#[inline]
#[must_use]
pub fn hash_secondary(bytes: &[u8]) -> u64 {
    SECONDARY.hash(bytes)
}

/// Both hashes of `bytes`.
#[inline]
#[must_use]
pub fn hash_pair(bytes: &[u8]) -> (u64, u64) {
    (PRIMARY.hash(bytes), SECONDARY.hash(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_empty_returns_seeds() {
        assert_eq!(hash_primary(&[]), SEED_PRIMARY);
        assert_eq!(hash_secondary(&[]), SEED_SECONDARY);
    }

    #[test]
    fn test_deterministic() {
        let data = b"The quick brown fox jumps over the lazy dog";
        assert_eq!(hash_pair(data), hash_pair(data));
    }

    #[test]
    fn test_functions_differ() {
        for input in [&b"a"[..], b"hello", b"12345678", &[0u8; 64]] {
            let (h1, h2) = hash_pair(input);
            assert_ne!(h1, h2);
        }
    }

    #[test]
    fn test_little_endian_words() {
        // The same 8 bytes hash the same regardless of how they were built.
        let from_int = 0x0102_0304_0506_0708u64.to_le_bytes();
        let literal = [8u8, 7, 6, 5, 4, 3, 2, 1];
        assert_eq!(hash_pair(&from_int), hash_pair(&literal));
    }

    #[test]
    fn test_zero_bytes_distinguished_by_length() {
        let mut seen = HashSet::new();
        for len in 1..=80 {
            let zeros = vec![0u8; len];
            assert!(seen.insert(hash_primary(&zeros)), "collision at {len}");
        }
    }

    #[test]
    fn test_every_region_matters() {
        // Flip one byte in the block region, word region and tail region.
        let base: Vec<u8> = (0..45u8).collect();
        let reference = hash_pair(&base);
        for index in [0, 31, 32, 39, 40, 44] {
            let mut changed = base.clone();
            changed[index] ^= 0x80;
            assert_ne!(hash_pair(&changed), reference, "byte {index} ignored");
        }
    }

    #[test]
    fn test_avalanche_spreads_single_bit() {
        let a = hash_primary(&[0u8; 16]);
        let mut flipped = [0u8; 16];
        flipped[3] = 1;
        let b = hash_primary(&flipped);
        let differing = (a ^ b).count_ones();
        assert!(differing > 16, "only {differing} bits changed");
    }

    #[test]
    fn test_top_bit_flips_in_adjacent_words_differ() {
        for len in [16usize, 17, 24, 31, 40] {
            let mut first = vec![0u8; len];
            let mut second = vec![0u8; len];
            first[7] ^= 0x80;
            second[15] ^= 0x80;
            assert_ne!(hash_primary(&first), hash_primary(&second), "h1 len {len}");
            assert_ne!(hash_secondary(&first), hash_secondary(&second), "h2 len {len}");
        }
    }

    #[test]
    fn test_same_flip_in_two_words_changes_hash() {
        let base = b"user:000user:001".to_vec();
        let mut flipped = base.clone();
        flipped[7] ^= 0x80;
        flipped[15] ^= 0x80;
        assert_ne!(hash_primary(&base), hash_primary(&flipped));
        assert_ne!(hash_secondary(&base), hash_secondary(&flipped));
    }

    #[test]
    fn test_block_boundary_lengths() {
        let data: Vec<u8> = (0..=255u8).collect();
        let mut seen = HashSet::new();
        for len in [1, 7, 8, 9, 31, 32, 33, 63, 64, 65, 255] {
            assert!(seen.insert(hash_pair(&data[..len])));
        }
    }
}
