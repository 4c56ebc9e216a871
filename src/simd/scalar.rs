//! Portable fallback backend.
//!
//! Works on native-endian 64-bit words, then on the remaining bytes. The
//! free functions double as the tail handlers of the vector backends.

use super::{BackendKind, SimdOps};

const WORD: usize = 8;

/// Word-at-a-time backend usable on every target.
#[derive(Debug)]
pub struct ScalarOps;

pub(crate) static SCALAR: ScalarOps = ScalarOps;

impl SimdOps for ScalarOps {
    fn kind(&self) -> BackendKind {
        BackendKind::Scalar
    }

    fn popcount(&self, bytes: &[u8]) -> u64 {
        popcount(bytes)
    }

    fn vector_or(&self, dst: &mut [u8], src: &[u8]) {
        assert_eq!(dst.len(), src.len(), "vector_or length mismatch");
        or(dst, src);
    }

    fn vector_and(&self, dst: &mut [u8], src: &[u8]) {
        assert_eq!(dst.len(), src.len(), "vector_and length mismatch");
        and(dst, src);
    }

    fn vector_clear(&self, dst: &mut [u8]) {
        dst.fill(0);
    }
}

#[inline(always)]
fn load(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; WORD];
    buf.copy_from_slice(bytes);
    u64::from_ne_bytes(buf)
}

#[inline]
pub(crate) fn popcount(bytes: &[u8]) -> u64 {
    let mut words = bytes.chunks_exact(WORD);
    let mut total: u64 = words.by_ref().map(|w| u64::from(load(w).count_ones())).sum();
    total += words
        .remainder()
        .iter()
        .map(|b| u64::from(b.count_ones()))
        .sum::<u64>();
    total
}

#[inline]
pub(crate) fn or(dst: &mut [u8], src: &[u8]) {
    combine(dst, src, |a, b| a | b, |a, b| a | b);
}

#[inline]
pub(crate) fn and(dst: &mut [u8], src: &[u8]) {
    combine(dst, src, |a, b| a & b, |a, b| a & b);
}

#[inline(always)]
fn combine(
    dst: &mut [u8],
    src: &[u8],
    word_op: impl Fn(u64, u64) -> u64,
    byte_op: impl Fn(u8, u8) -> u8,
) {
    let split = dst.len().min(src.len()) / WORD * WORD;
    let (dst_words, dst_tail) = dst.split_at_mut(split);
    let (src_words, src_tail) = src.split_at(split);

    for (d, s) in dst_words
        .chunks_exact_mut(WORD)
        .zip(src_words.chunks_exact(WORD))
    {
        let v = word_op(load(d), load(s));
        d.copy_from_slice(&v.to_ne_bytes());
    }
    for (d, s) in dst_tail.iter_mut().zip(src_tail) {
        *d = byte_op(*d, *s);
    }
}
