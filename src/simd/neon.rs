//! NEON backend (AArch64).

use std::arch::aarch64::{vaddlvq_u8, vandq_u8, vcntq_u8, vdupq_n_u8, vld1q_u8, vorrq_u8, vst1q_u8};

use super::{scalar, BackendKind, SimdOps};

const CHUNK: usize = 16;

/// 128-bit backend. Only reachable through [`super::backend_for`] after NEON
/// was detected.
#[derive(Debug)]
pub struct NeonOps {
    _detected: (),
}

pub(crate) static NEON: NeonOps = NeonOps { _detected: () };

impl SimdOps for NeonOps {
    fn kind(&self) -> BackendKind {
        BackendKind::Neon
    }

    fn popcount(&self, bytes: &[u8]) -> u64 {
        // SAFETY: `NeonOps` is only handed out when NEON is available.
        unsafe { popcount(bytes) }
    }

    fn vector_or(&self, dst: &mut [u8], src: &[u8]) {
        assert_eq!(dst.len(), src.len(), "vector_or length mismatch");
        // SAFETY: NEON detected; lengths checked above.
        unsafe { or(dst, src) }
    }

    fn vector_and(&self, dst: &mut [u8], src: &[u8]) {
        assert_eq!(dst.len(), src.len(), "vector_and length mismatch");
        // SAFETY: NEON detected; lengths checked above.
        unsafe { and(dst, src) }
    }

    fn vector_clear(&self, dst: &mut [u8]) {
        // SAFETY: NEON detected.
        unsafe { clear(dst) }
    }
}

#[target_feature(enable = "neon")]
unsafe fn popcount(bytes: &[u8]) -> u64 {
    let full = bytes.len() / CHUNK * CHUNK;
    let ptr = bytes.as_ptr();
    let mut total = 0u64;
    let mut offset = 0;
    while offset < full {
        // At most 128 per chunk, so the horizontal add cannot overflow u16.
        total += u64::from(vaddlvq_u8(vcntq_u8(vld1q_u8(ptr.add(offset)))));
        offset += CHUNK;
    }
    total + scalar::popcount(&bytes[full..])
}

#[target_feature(enable = "neon")]
unsafe fn or(dst: &mut [u8], src: &[u8]) {
    let full = dst.len() / CHUNK * CHUNK;
    let (d, s) = (dst.as_mut_ptr(), src.as_ptr());
    let mut offset = 0;
    while offset < full {
        let v = vorrq_u8(vld1q_u8(d.add(offset)), vld1q_u8(s.add(offset)));
        vst1q_u8(d.add(offset), v);
        offset += CHUNK;
    }
    scalar::or(&mut dst[full..], &src[full..]);
}

#[target_feature(enable = "neon")]
unsafe fn and(dst: &mut [u8], src: &[u8]) {
    let full = dst.len() / CHUNK * CHUNK;
    let (d, s) = (dst.as_mut_ptr(), src.as_ptr());
    let mut offset = 0;
    while offset < full {
        let v = vandq_u8(vld1q_u8(d.add(offset)), vld1q_u8(s.add(offset)));
        vst1q_u8(d.add(offset), v);
        offset += CHUNK;
    }
    scalar::and(&mut dst[full..], &src[full..]);
}

#[target_feature(enable = "neon")]
unsafe fn clear(dst: &mut [u8]) {
    let full = dst.len() / CHUNK * CHUNK;
    let zero = vdupq_n_u8(0);
    let d = dst.as_mut_ptr();
    let mut offset = 0;
    while offset < full {
        vst1q_u8(d.add(offset), zero);
        offset += CHUNK;
    }
    dst[full..].fill(0);
}
