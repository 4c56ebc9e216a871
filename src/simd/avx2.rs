//! AVX2 backend (x86-64).
//!
//! Popcount uses the nibble lookup method (Muła, Kurz & Lemire, 2016): each
//! byte's low and high nibbles index a 16-entry table through `vpshufb`, and
//! `vpsadbw` folds the per-byte counts into four 64-bit lanes.

#![allow(clippy::cast_ptr_alignment)]

use std::arch::x86_64::{
    __m256i, _mm256_add_epi64, _mm256_add_epi8, _mm256_and_si256, _mm256_loadu_si256,
    _mm256_or_si256, _mm256_sad_epu8, _mm256_set1_epi8, _mm256_setr_epi8, _mm256_setzero_si256,
    _mm256_shuffle_epi8, _mm256_srli_epi16, _mm256_storeu_si256,
};

use super::{scalar, BackendKind, SimdOps};

const CHUNK: usize = 32;

/// 256-bit backend. Only reachable through [`super::backend_for`] after AVX2
/// was detected.
#[derive(Debug)]
pub struct Avx2Ops {
    _detected: (),
}

pub(crate) static AVX2: Avx2Ops = Avx2Ops { _detected: () };

impl SimdOps for Avx2Ops {
    fn kind(&self) -> BackendKind {
        BackendKind::Avx2
    }

    fn popcount(&self, bytes: &[u8]) -> u64 {
        // SAFETY: `Avx2Ops` is only handed out when AVX2 is available.
        unsafe { popcount(bytes) }
    }

    fn vector_or(&self, dst: &mut [u8], src: &[u8]) {
        assert_eq!(dst.len(), src.len(), "vector_or length mismatch");
        // SAFETY: AVX2 detected; lengths checked above.
        unsafe { or(dst, src) }
    }

    fn vector_and(&self, dst: &mut [u8], src: &[u8]) {
        assert_eq!(dst.len(), src.len(), "vector_and length mismatch");
        // SAFETY: AVX2 detected; lengths checked above.
        unsafe { and(dst, src) }
    }

    fn vector_clear(&self, dst: &mut [u8]) {
        // SAFETY: AVX2 detected.
        unsafe { clear(dst) }
    }
}

#[target_feature(enable = "avx2")]
unsafe fn popcount(bytes: &[u8]) -> u64 {
    let lookup = _mm256_setr_epi8(
        0, 1, 1, 2, 1, 2, 2, 3, 1, 2, 2, 3, 2, 3, 3, 4, //
        0, 1, 1, 2, 1, 2, 2, 3, 1, 2, 2, 3, 2, 3, 3, 4,
    );
    let low_mask = _mm256_set1_epi8(0x0f);
    let zero = _mm256_setzero_si256();
    let mut acc = _mm256_setzero_si256();

    let full = bytes.len() / CHUNK * CHUNK;
    let ptr = bytes.as_ptr();
    let mut offset = 0;
    while offset < full {
        let v = _mm256_loadu_si256(ptr.add(offset).cast::<__m256i>());
        let lo = _mm256_and_si256(v, low_mask);
        let hi = _mm256_and_si256(_mm256_srli_epi16(v, 4), low_mask);
        let counts = _mm256_add_epi8(
            _mm256_shuffle_epi8(lookup, lo),
            _mm256_shuffle_epi8(lookup, hi),
        );
        acc = _mm256_add_epi64(acc, _mm256_sad_epu8(counts, zero));
        offset += CHUNK;
    }

    let mut lanes = [0u64; 4];
    _mm256_storeu_si256(lanes.as_mut_ptr().cast::<__m256i>(), acc);
    lanes.iter().sum::<u64>() + scalar::popcount(&bytes[full..])
}

#[target_feature(enable = "avx2")]
unsafe fn or(dst: &mut [u8], src: &[u8]) {
    let full = dst.len() / CHUNK * CHUNK;
    let (d, s) = (dst.as_mut_ptr(), src.as_ptr());
    let mut offset = 0;
    while offset < full {
        let a = _mm256_loadu_si256(d.add(offset).cast::<__m256i>());
        let b = _mm256_loadu_si256(s.add(offset).cast::<__m256i>());
        _mm256_storeu_si256(d.add(offset).cast::<__m256i>(), _mm256_or_si256(a, b));
        offset += CHUNK;
    }
    scalar::or(&mut dst[full..], &src[full..]);
}

#[target_feature(enable = "avx2")]
unsafe fn and(dst: &mut [u8], src: &[u8]) {
    let full = dst.len() / CHUNK * CHUNK;
    let (d, s) = (dst.as_mut_ptr(), src.as_ptr());
    let mut offset = 0;
    while offset < full {
        let a = _mm256_loadu_si256(d.add(offset).cast::<__m256i>());
        let b = _mm256_loadu_si256(s.add(offset).cast::<__m256i>());
        _mm256_storeu_si256(d.add(offset).cast::<__m256i>(), _mm256_and_si256(a, b));
        offset += CHUNK;
    }
    scalar::and(&mut dst[full..], &src[full..]);
}

#[target_feature(enable = "avx2")]
unsafe fn clear(dst: &mut [u8]) {
    let full = dst.len() / CHUNK * CHUNK;
    let zero = _mm256_setzero_si256();
    let d = dst.as_mut_ptr();
    let mut offset = 0;
    while offset < full {
        _mm256_storeu_si256(d.add(offset).cast::<__m256i>(), zero);
        offset += CHUNK;
    }
    dst[full..].fill(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::{backend_for, scalar::SCALAR};

    fn pattern(len: usize, seed: u8) -> Vec<u8> {
        (0..len)
            .map(|i| (i as u8).wrapping_mul(37).wrapping_add(seed))
            .collect()
    }

    #[test]
    fn test_matches_scalar() {
        let Some(ops) = backend_for(BackendKind::Avx2) else {
            return;
        };
        for len in [0usize, 1, 31, 32, 33, 64, 95, 1024] {
            let a = pattern(len, 3);
            let b = pattern(len, 200);
            assert_eq!(ops.popcount(&a), SCALAR.popcount(&a), "popcount len {len}");

            let (mut x, mut y) = (a.clone(), a.clone());
            ops.vector_or(&mut x, &b);
            SCALAR.vector_or(&mut y, &b);
            assert_eq!(x, y, "or len {len}");

            let (mut x, mut y) = (a.clone(), a);
            ops.vector_and(&mut x, &b);
            SCALAR.vector_and(&mut y, &b);
            assert_eq!(x, y, "and len {len}");
        }
    }

    #[test]
    fn test_popcount_all_ones() {
        let Some(ops) = backend_for(BackendKind::Avx2) else {
            return;
        };
        assert_eq!(ops.popcount(&[0xff; 4096]), 4096 * 8);
    }

    #[test]
    fn test_clear_with_tail() {
        let Some(ops) = backend_for(BackendKind::Avx2) else {
            return;
        };
        let mut dst = vec![0x5au8; 77];
        ops.vector_clear(&mut dst);
        assert!(dst.iter().all(|&b| b == 0));
    }
}
