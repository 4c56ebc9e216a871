//! Error types for linebloom operations.
//!
//! Construction-time validation failures are surfaced immediately and never
//! produce a partially usable filter. Set-operation failures (`union`,
//! `intersection`) are recoverable and leave the receiving filter untouched.
//! CAS contention inside `add` is never surfaced at all.
//!
//! # Error Propagation
//!
//! ```
//! use linebloom::{Result, LineBloomError};
//! use linebloom::core::params::FilterParameters;
//!
//! fn sized(n: u64, fp: f64) -> Result<u64> {
//!     let params = FilterParameters::derive(n, fp)?;
//!     Ok(params.bit_count)
//! }
//! # assert!(sized(1000, 0.01).is_ok());
//! # assert!(matches!(sized(0, 0.01), Err(LineBloomError::InvalidItemCount { .. })));
//! ```

#![allow(clippy::module_name_repetitions)]

use thiserror::Error;

/// Result type alias for linebloom operations.
pub type Result<T> = std::result::Result<T, LineBloomError>;

/// Errors that can occur while building or combining filters.
///
/// `Clone` + `PartialEq` are derived so tests can compare errors directly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineBloomError {
    /// Expected element count was zero.
    #[error("Invalid item count: {count}. Expected items must be greater than 0.")]
    InvalidItemCount {
        /// The invalid count that was provided.
        count: u64,
    },

    /// False positive rate was NaN or outside the open interval (0, 1).
    #[error("False positive rate {fp_rate} is out of bounds. Must be in range (0, 1).")]
    FalsePositiveRateOutOfBounds {
        /// The rejected rate.
        fp_rate: f64,
    },

    /// The sizing formula produced zero bits before cache-line rounding.
    #[error(
        "Degenerate filter size: {expected_items} items at false positive rate {fp_rate} \
         yields 0 bits."
    )]
    DegenerateFilterSize {
        /// Requested element count.
        expected_items: u64,
        /// Requested false positive rate.
        fp_rate: f64,
    },

    /// Derived or supplied parameters cannot form a working filter.
    #[error("Invalid Bloom filter parameters: {message}.")]
    InvalidParameters {
        /// Human-readable description of what's invalid.
        message: String,
    },

    /// `union`/`intersection` between filters of different cache-line counts.
    #[error(
        "Filter size mismatch: {left_lines} cache lines vs {right_lines} cache lines."
    )]
    SizeMismatch {
        /// Cache lines in the receiving filter.
        left_lines: usize,
        /// Cache lines in the other filter.
        right_lines: usize,
    },

    /// `union`/`intersection` between filters with different hash counts.
    #[error("Hash count mismatch: {left} hash functions vs {right} hash functions.")]
    HashCountMismatch {
        /// Hash count of the receiving filter.
        left: u32,
        /// Hash count of the other filter.
        right: u32,
    },

    /// A retry policy failed validation.
    #[error("Invalid retry policy: {message}.")]
    InvalidRetryPolicy {
        /// Description of the violated bound.
        message: String,
    },
}

impl LineBloomError {
    /// Create an `InvalidItemCount` error.
    #[must_use]
    pub fn invalid_item_count(count: u64) -> Self {
        Self::InvalidItemCount { count }
    }

    /// Create a `FalsePositiveRateOutOfBounds` error.
    #[must_use]
    pub fn fp_rate_out_of_bounds(fp_rate: f64) -> Self {
        Self::FalsePositiveRateOutOfBounds { fp_rate }
    }

    /// Create a `DegenerateFilterSize` error.
    #[must_use]
    pub fn degenerate_filter_size(expected_items: u64, fp_rate: f64) -> Self {
        Self::DegenerateFilterSize {
            expected_items,
            fp_rate,
        }
    }

    /// Create an `InvalidParameters` error with a formatted message.
    ///
    /// # Examples
    /// ```
    /// use linebloom::LineBloomError;
    ///
    /// let err = LineBloomError::invalid_parameters(format!("{} bits overflows", u64::MAX));
    /// assert!(err.to_string().contains("overflows"));
    /// ```
    #[must_use]
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Create a `SizeMismatch` error.
    #[must_use]
    pub fn size_mismatch(left_lines: usize, right_lines: usize) -> Self {
        Self::SizeMismatch {
            left_lines,
            right_lines,
        }
    }

    /// Create a `HashCountMismatch` error.
    #[must_use]
    pub fn hash_count_mismatch(left: u32, right: u32) -> Self {
        Self::HashCountMismatch { left, right }
    }

    /// Create an `InvalidRetryPolicy` error.
    #[must_use]
    pub fn invalid_retry_policy(message: impl Into<String>) -> Self {
        Self::InvalidRetryPolicy {
            message: message.into(),
        }
    }

    /// True for errors raised while validating construction inputs.
    #[must_use]
    pub fn is_construction_error(&self) -> bool {
        !matches!(
            self,
            Self::SizeMismatch { .. } | Self::HashCountMismatch { .. }
        )
    }
}
