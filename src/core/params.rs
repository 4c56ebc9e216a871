//! Parameter derivation for cache-line Bloom filters.
//!
//! # Mathematical Background
//!
//! Given:
//! - `n`: Expected number of elements
//! - `ε`: Target false positive rate
//!
//! Optimal parameters:
//! - `m = ⌈-n × ln(ε) / (ln 2)²⌉` (bits in filter)
//! - `k = max(1, round((m/n) × ln 2))` (number of hash functions)
//!
//! `k` is taken from the formula's `m`, before `m` is rounded up to a whole
//! number of cache lines. The extra bits from rounding only lower the real
//! false positive rate.
//!
//! Expected false positive rate:
//! - `p = (1 - e^(-kn/m))^k`
//!
//! # References
//!
//! - Bloom, Burton H. (1970). "Space/Time Trade-offs in Hash Coding with Allowable Errors"
//! - Kirsch & Mitzenmacher (2006). "Less Hashing, Same Performance: Building a Better Bloom Filter"

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

use std::f64::consts::LN_2;
use std::fmt;

use crate::core::cacheline::{lines_for_bits, BITS_PER_LINE, CACHE_LINE_BYTES};
use crate::error::{LineBloomError, Result};

/// (ln 2)², used by the bit count formula.
const LN2_SQUARED: f64 = LN_2 * LN_2;

/// Largest allocation the filter will attempt, in bytes.
const MAX_ALLOCATION_BYTES: u64 = isize::MAX as u64;

/// Derived, immutable sizing of one filter.
///
/// # Examples
///
/// ```
/// use linebloom::core::params::FilterParameters;
///
/// let params = FilterParameters::derive(1000, 0.01).unwrap();
/// assert_eq!(params.raw_bit_count, 9586);
/// assert_eq!(params.hash_count, 7);
/// assert_eq!(params.cache_line_count, 19);
/// assert_eq!(params.bit_count, 19 * 512);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterParameters {
    /// Element count the filter was sized for.
    pub expected_items: u64,
    /// Requested false positive rate.
    pub target_fpr: f64,
    /// Bit capacity, a whole number of cache lines.
    pub bit_count: u64,
    /// Formula result before cache-line rounding.
    pub raw_bit_count: u64,
    /// Number of probe positions per key, at least 1.
    pub hash_count: u32,
    /// Number of 64-byte lines backing the filter.
    pub cache_line_count: usize,
}

impl FilterParameters {
    /// Derive parameters for `expected_items` elements at `fp_rate`.
    ///
    /// # Errors
    ///
    /// - [`LineBloomError::InvalidItemCount`] if `expected_items == 0`
    /// - [`LineBloomError::FalsePositiveRateOutOfBounds`] if `fp_rate` is NaN
    ///   or outside `(0, 1)`
    /// - [`LineBloomError::DegenerateFilterSize`] if the formula yields 0 bits
    /// - [`LineBloomError::InvalidParameters`] if the size overflows
    pub fn derive(expected_items: u64, fp_rate: f64) -> Result<Self> {
        let raw_bit_count = optimal_bit_count(expected_items, fp_rate)?;
        let hash_count = optimal_hash_count(raw_bit_count, expected_items);

        let cache_line_count = lines_for_bits(raw_bit_count).ok_or_else(|| {
            LineBloomError::invalid_parameters(format!(
                "{raw_bit_count} bits do not fit in addressable cache lines"
            ))
        })?;

        let bytes = (cache_line_count as u64).checked_mul(CACHE_LINE_BYTES as u64);
        if bytes.map_or(true, |b| b > MAX_ALLOCATION_BYTES) {
            return Err(LineBloomError::invalid_parameters(format!(
                "{cache_line_count} cache lines exceed the maximum allocation size"
            )));
        }

        Ok(Self {
            expected_items,
            target_fpr: fp_rate,
            bit_count: cache_line_count as u64 * BITS_PER_LINE as u64,
            raw_bit_count,
            hash_count,
            cache_line_count,
        })
    }

    /// Theoretical false positive rate once `expected_items` are inserted
    /// into the rounded bit array.
    #[must_use]
    pub fn expected_fp_rate(&self) -> f64 {
        theoretical_fp_rate(self.bit_count, self.expected_items, self.hash_count)
    }

    /// Bits per expected element after rounding.
    #[must_use]
    pub fn bits_per_item(&self) -> f64 {
        self.bit_count as f64 / self.expected_items as f64
    }

    /// Bytes occupied by the bit array.
    #[must_use]
    pub fn memory_bytes(&self) -> usize {
        self.cache_line_count * CACHE_LINE_BYTES
    }
}

impl fmt::Display for FilterParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} p={} m={} (raw {}) k={} lines={}",
            self.expected_items,
            self.target_fpr,
            self.bit_count,
            self.raw_bit_count,
            self.hash_count,
            self.cache_line_count
        )
    }
}

/// Calculate the unrounded optimal number of bits.
///
/// Implements `m = ⌈-n × ln(ε) / (ln 2)²⌉`.
///
/// # Errors
///
/// See [`FilterParameters::derive`].
///
/// # Examples
///
/// ```
/// use linebloom::core::params::optimal_bit_count;
///
/// assert_eq!(optimal_bit_count(1000, 0.01).unwrap(), 9586);
/// assert_eq!(optimal_bit_count(1000, 0.001).unwrap(), 14378);
/// ```
pub fn optimal_bit_count(n: u64, fp_rate: f64) -> Result<u64> {
    if n == 0 {
        return Err(LineBloomError::invalid_item_count(n));
    }

    // Negated comparison so NaN is rejected too.
    if !(fp_rate > 0.0 && fp_rate < 1.0) {
        return Err(LineBloomError::fp_rate_out_of_bounds(fp_rate));
    }

    let m = (-(n as f64) * fp_rate.ln() / LN2_SQUARED).ceil();

    if !m.is_finite() || m >= u64::MAX as f64 {
        return Err(LineBloomError::invalid_parameters(format!(
            "calculated filter size {m:.0} bits overflows"
        )));
    }

    if m <= 0.0 {
        return Err(LineBloomError::degenerate_filter_size(n, fp_rate));
    }

    Ok(m as u64)
}

/// Calculate the number of hash functions from the unrounded bit count.
///
/// Implements `k = max(1, round((m/n) × ln 2))`. Returns 1 when `n == 0`.
///
/// # Examples
///
/// ```
/// use linebloom::core::params::optimal_hash_count;
///
/// assert_eq!(optimal_hash_count(9586, 1000), 7);
/// assert_eq!(optimal_hash_count(1, 1000), 1);
/// ```
#[must_use]
pub fn optimal_hash_count(m: u64, n: u64) -> u32 {
    if n == 0 {
        return 1;
    }
    let k = (m as f64 / n as f64 * LN_2).round();
    if k >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        (k as u32).max(1)
    }
}

/// Calculate expected false positive rate for given parameters.
///
/// Implements `p = (1 - e^(-kn/m))^k`.
///
/// # Errors
///
/// [`LineBloomError::InvalidParameters`] if `m == 0` or `k == 0`.
///
/// # Examples
///
/// ```
/// use linebloom::core::params::expected_fp_rate;
///
/// let fp = expected_fp_rate(9586, 1000, 7).unwrap();
/// assert!((fp - 0.01).abs() < 0.001);
/// assert_eq!(expected_fp_rate(9586, 0, 7).unwrap(), 0.0);
/// ```
pub fn expected_fp_rate(m: u64, n: u64, k: u32) -> Result<f64> {
    if m == 0 {
        return Err(LineBloomError::invalid_parameters("bit count must be > 0"));
    }
    if k == 0 {
        return Err(LineBloomError::invalid_parameters("hash count must be >= 1"));
    }
    Ok(theoretical_fp_rate(m, n, k))
}

fn theoretical_fp_rate(m: u64, n: u64, k: u32) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let k = f64::from(k);
    let prob_bit_one = 1.0 - (-(k * n as f64) / m as f64).exp();
    prob_bit_one.powf(k).clamp(0.0, 1.0)
}
