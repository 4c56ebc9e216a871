//! Every available backend must agree byte-for-byte with the scalar one.

use linebloom::simd::{active_backend, backend_for, BackendKind, SimdOps};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const LENGTHS: [usize; 8] = [1, 7, 8, 9, 31, 32, 33, 1024];

fn scalar() -> &'static dyn SimdOps {
    backend_for(BackendKind::Scalar).unwrap()
}

fn available() -> Vec<&'static dyn SimdOps> {
    BackendKind::ALL.into_iter().filter_map(backend_for).collect()
}

fn random_bytes(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| rng.gen()).collect()
}

fn assert_equivalent(ops: &dyn SimdOps, a: &[u8], b: &[u8]) {
    let reference = scalar();
    let kind = ops.kind();
    let len = a.len();

    assert_eq!(ops.popcount(a), reference.popcount(a), "{kind} popcount len {len}");

    let (mut got, mut want) = (a.to_vec(), a.to_vec());
    ops.vector_or(&mut got, b);
    reference.vector_or(&mut want, b);
    assert_eq!(got, want, "{kind} or len {len}");

    let (mut got, mut want) = (a.to_vec(), a.to_vec());
    ops.vector_and(&mut got, b);
    reference.vector_and(&mut want, b);
    assert_eq!(got, want, "{kind} and len {len}");

    let mut cleared = a.to_vec();
    ops.vector_clear(&mut cleared);
    assert!(cleared.iter().all(|&x| x == 0), "{kind} clear len {len}");
}

#[test]
fn test_fixed_lengths_all_backends() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for ops in available() {
        for len in LENGTHS {
            let a = random_bytes(&mut rng, len);
            let b = random_bytes(&mut rng, len);
            assert_equivalent(ops, &a, &b);
        }
    }
}

#[test]
fn test_edge_patterns() {
    for ops in available() {
        for len in LENGTHS {
            let zeros = vec![0u8; len];
            let ones = vec![0xffu8; len];
            assert_equivalent(ops, &zeros, &ones);
            assert_equivalent(ops, &ones, &zeros);
            assert_eq!(ops.popcount(&ones), len as u64 * 8);
        }
    }
}

#[test]
fn test_empty_extent() {
    for ops in available() {
        assert_eq!(ops.popcount(&[]), 0);
        let mut empty: [u8; 0] = [];
        ops.vector_or(&mut empty, &[]);
        ops.vector_and(&mut empty, &[]);
        ops.vector_clear(&mut empty);
    }
}

#[test]
fn test_unaligned_subslices() {
    let mut rng = StdRng::seed_from_u64(42);
    let a = random_bytes(&mut rng, 1100);
    let b = random_bytes(&mut rng, 1100);
    for ops in available() {
        for start in [1usize, 3, 5, 13] {
            assert_equivalent(ops, &a[start..start + 1024], &b[start..start + 1024]);
        }
    }
}

#[test]
fn test_active_backend_is_available() {
    let kind = active_backend().kind();
    assert!(backend_for(kind).is_some());
}

proptest! {
    #[test]
    fn random_lengths_match_scalar(
        pair in (0usize..2048).prop_flat_map(|len| (
            prop::collection::vec(any::<u8>(), len),
            prop::collection::vec(any::<u8>(), len),
        ))
    ) {
        let (a, b) = pair;
        for ops in available() {
            prop_assert_eq!(ops.popcount(&a), scalar().popcount(&a));

            let (mut got, mut want) = (a.clone(), a.clone());
            ops.vector_or(&mut got, &b);
            scalar().vector_or(&mut want, &b);
            prop_assert_eq!(&got, &want);

            let (mut got, mut want) = (a.clone(), a.clone());
            ops.vector_and(&mut got, &b);
            scalar().vector_and(&mut want, &b);
            prop_assert_eq!(&got, &want);
        }
    }
}
