//! Runtime-dispatched bulk byte operations.
//!
//! Whole-array work (population count, union, intersection, clear) goes
//! through a [`SimdOps`] backend chosen once per process.
//!
//! # Architecture Support
//!
//! | Backend  | Architecture | Chunk    |
//! |----------|--------------|----------|
//! | AVX2     | x86-64       | 32 bytes |
//! | NEON     | AArch64      | 16 bytes |
//! | Scalar   | any          | 8 bytes  |
//!
//! Every backend accepts extents of any length. Bytes past the last full
//! chunk are handled with the scalar routines, so each backend returns
//! exactly what [`BackendKind::Scalar`] returns for the same input.
//!
//! # Selection
//!
//! The first call to [`active_backend`] probes the CPU and picks the first
//! available of AVX2, NEON, Scalar. The choice is stored in a `OnceLock` and
//! never changes afterwards.
//!
//! # Safety
//!
//! Vector backends are only handed out after runtime feature detection via
//! `is_x86_feature_detected!` / `is_aarch64_feature_detected!`. No unsafe
//! operations are exposed in the public API.
//!
//! # Examples
//!
//! ```
//! use linebloom::simd::{active_backend, backend_for, BackendKind};
//!
//! let ops = active_backend();
//! let mut dst = vec![0b1010u8; 40];
//! ops.vector_or(&mut dst, &vec![0b0101u8; 40]);
//! assert_eq!(ops.popcount(&dst), 40 * 4);
//!
//! let scalar = backend_for(BackendKind::Scalar).unwrap();
//! assert_eq!(scalar.popcount(&dst), ops.popcount(&dst));
//! ```

use std::fmt;
use std::sync::OnceLock;

#[cfg(target_arch = "x86_64")]
pub mod avx2;
#[cfg(target_arch = "aarch64")]
pub mod neon;
pub mod scalar;

/// Bulk operations over raw byte extents.
///
/// Binary operations require `dst` and `src` of equal length and panic
/// otherwise.
pub trait SimdOps: Send + Sync + fmt::Debug {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// Number of set bits in `bytes`.
    fn popcount(&self, bytes: &[u8]) -> u64;

    /// `dst |= src`.
    fn vector_or(&self, dst: &mut [u8], src: &[u8]);

    /// `dst &= src`.
    fn vector_and(&self, dst: &mut [u8], src: &[u8]);

    /// Zero every byte of `dst`.
    fn vector_clear(&self, dst: &mut [u8]);
}

/// Backend identifiers, in selection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BackendKind {
    /// 256-bit AVX2 (x86-64).
    Avx2,
    /// 128-bit NEON (AArch64).
    Neon,
    /// Portable 64-bit word fallback.
    Scalar,
}

impl BackendKind {
    /// All backends, highest priority first.
    pub const ALL: [Self; 3] = [Self::Avx2, Self::Neon, Self::Scalar];

    /// Lower-case backend name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Avx2 => "avx2",
            Self::Neon => "neon",
            Self::Scalar => "scalar",
        }
    }

    /// Bytes processed per vector step.
    #[must_use]
    pub const fn chunk_bytes(self) -> usize {
        match self {
            Self::Avx2 => 32,
            Self::Neon => 16,
            Self::Scalar => 8,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime-detected CPU capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CpuFeatures {
    /// AVX2 support (x86-64 only).
    pub has_avx2: bool,
    /// NEON support (AArch64 only).
    pub has_neon: bool,
}

impl CpuFeatures {
    /// Probe the running CPU.
    #[must_use]
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            Self {
                has_avx2: is_x86_feature_detected!("avx2"),
                has_neon: false,
            }
        }

        #[cfg(target_arch = "aarch64")]
        {
            Self {
                has_avx2: false,
                has_neon: std::arch::is_aarch64_feature_detected!("neon"),
            }
        }

        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            Self {
                has_avx2: false,
                has_neon: false,
            }
        }
    }

    /// True if any vector backend is usable.
    #[must_use]
    pub const fn has_vector_accel(self) -> bool {
        self.has_avx2 || self.has_neon
    }
}

static FEATURES: OnceLock<CpuFeatures> = OnceLock::new();
static BACKEND: OnceLock<&'static dyn SimdOps> = OnceLock::new();

/// Cached CPU capabilities.
#[inline]
#[must_use]
pub fn cpu_features() -> CpuFeatures {
    *FEATURES.get_or_init(CpuFeatures::detect)
}

/// True if AVX2 is available.
#[must_use]
pub fn has_avx2() -> bool {
    cpu_features().has_avx2
}

/// True if NEON is available.
#[must_use]
pub fn has_neon() -> bool {
    cpu_features().has_neon
}

/// True if any vector backend is available.
#[must_use]
pub fn has_vector_accel() -> bool {
    cpu_features().has_vector_accel()
}

/// The process-wide backend, selected on first use.
#[inline]
#[must_use]
pub fn active_backend() -> &'static dyn SimdOps {
    *BACKEND.get_or_init(|| {
        let ops = BackendKind::ALL
            .into_iter()
            .find_map(backend_for)
            .unwrap_or(&scalar::SCALAR);
        tracing::debug!(
            backend = %ops.kind(),
            avx2 = has_avx2(),
            neon = has_neon(),
            "selected bulk operation backend"
        );
        ops
    })
}

/// A specific backend, or `None` if this CPU cannot run it.
#[must_use]
pub fn backend_for(kind: BackendKind) -> Option<&'static dyn SimdOps> {
    match kind {
        BackendKind::Scalar => Some(&scalar::SCALAR),
        BackendKind::Avx2 => avx2_backend(),
        BackendKind::Neon => neon_backend(),
    }
}

#[cfg(target_arch = "x86_64")]
fn avx2_backend() -> Option<&'static dyn SimdOps> {
    if has_avx2() {
        Some(&avx2::AVX2)
    } else {
        None
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn avx2_backend() -> Option<&'static dyn SimdOps> {
    None
}

#[cfg(target_arch = "aarch64")]
fn neon_backend() -> Option<&'static dyn SimdOps> {
    if has_neon() {
        Some(&neon::NEON)
    } else {
        None
    }
}

#[cfg(not(target_arch = "aarch64"))]
fn neon_backend() -> Option<&'static dyn SimdOps> {
    None
}
