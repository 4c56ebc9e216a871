//! Determinism and collision behaviour of the key hash.

use std::collections::HashSet;

use linebloom::hash::{hash_pair, hash_primary, hash_secondary, probe_positions};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn assert_no_collisions(corpus: &[Vec<u8>]) {
    let mut firsts = HashSet::new();
    let mut seconds = HashSet::new();
    for input in corpus {
        let (h1, h2) = hash_pair(input);
        assert!(firsts.insert(h1), "h1 collision on {input:?}");
        assert!(seconds.insert(h2), "h2 collision on {input:?}");
    }
}

#[test]
fn test_sequential_integers() {
    let corpus: Vec<Vec<u8>> = (0..100_000u64).map(|i| i.to_le_bytes().to_vec()).collect();
    assert_no_collisions(&corpus);
}

#[test]
fn test_sequential_decimal_strings() {
    let corpus: Vec<Vec<u8>> = (0..50_000u64).map(|i| i.to_string().into_bytes()).collect();
    assert_no_collisions(&corpus);
}

#[test]
fn test_repeating_patterns() {
    let mut corpus = Vec::new();
    for byte in [0x00u8, 0xff, 0xaa, 0x55, b'a'] {
        for len in 1..=200 {
            corpus.push(vec![byte; len]);
        }
    }
    for len in 1..=100 {
        corpus.push(b"ab".iter().copied().cycle().take(len).collect());
        corpus.push(b"abc".iter().copied().cycle().take(len).collect());
    }
    let unique: HashSet<_> = corpus.iter().cloned().collect();
    let corpus: Vec<_> = unique.into_iter().collect();
    assert_no_collisions(&corpus);
}

#[test]
fn test_single_bit_flips() {
    let mut rng = StdRng::seed_from_u64(7);
    for len in [1usize, 8, 17, 32, 33, 100] {
        let base: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let mut corpus = vec![base.clone()];
        for byte in 0..len {
            for bit in 0..8 {
                let mut flipped = base.clone();
                flipped[byte] ^= 1 << bit;
                corpus.push(flipped);
            }
        }
        assert_no_collisions(&corpus);
    }
}

#[test]
fn test_top_bit_flips_across_adjacent_words() {
    let mut rng = StdRng::seed_from_u64(11);
    for len in [16usize, 17, 24, 31] {
        let base: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let mut corpus = vec![base.clone()];
        // Top bit of every whole 8-byte word, alone and in adjacent pairs.
        let words = len / 8;
        for word in 0..words {
            let mut single = base.clone();
            single[word * 8 + 7] ^= 0x80;
            corpus.push(single.clone());
            if word + 1 < words {
                let mut pair = single;
                pair[word * 8 + 15] ^= 0x80;
                corpus.push(pair);
            }
        }
        assert_no_collisions(&corpus);
    }
}

#[test]
fn test_prefix_extensions() {
    let data: Vec<u8> = (0..=255u8).cycle().take(600).collect();
    let corpus: Vec<Vec<u8>> = (0..=data.len()).map(|n| data[..n].to_vec()).collect();
    assert_no_collisions(&corpus);
}

#[test]
fn test_empty_input_is_stable() {
    assert_eq!(hash_pair(b""), hash_pair(&[]));
    assert_ne!(hash_primary(b""), hash_secondary(b""));
}

#[test]
fn test_probe_positions_spread_across_lines() {
    // Positions for many keys should touch most of a 64-line array.
    let bit_count = 64 * 512;
    let mut lines = HashSet::new();
    for i in 0..2000u64 {
        for pos in probe_positions(&i.to_le_bytes(), 7, bit_count) {
            lines.insert(pos / 512);
        }
    }
    assert_eq!(lines.len(), 64);
}

proptest! {
    #[test]
    fn hash_is_deterministic(data in prop::collection::vec(any::<u8>(), 0..512)) {
        prop_assert_eq!(hash_pair(&data), hash_pair(&data.clone()));
        prop_assert_eq!(hash_pair(&data).0, hash_primary(&data));
        prop_assert_eq!(hash_pair(&data).1, hash_secondary(&data));
    }

    #[test]
    fn bit_flip_changes_both_hashes(
        data in prop::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut flipped = data.clone();
        let i = index.index(data.len());
        flipped[i] ^= 1 << bit;
        let (a1, a2) = hash_pair(&data);
        let (b1, b2) = hash_pair(&flipped);
        prop_assert_ne!(a1, b1);
        prop_assert_ne!(a2, b2);
    }

    #[test]
    fn positions_in_range(
        data in prop::collection::vec(any::<u8>(), 0..64),
        k in 1u32..32,
        lines in 1u64..64,
    ) {
        let m = lines * 512;
        let positions: Vec<u64> = probe_positions(&data, k, m).collect();
        prop_assert_eq!(positions.len(), k as usize);
        prop_assert!(positions.iter().all(|&p| p < m));
    }
}
