//! Builder for [`CacheBloomFilter`].
//!
//! # Type-State Pattern
//!
//! ```text
//! Initial → WithItems → Complete → CacheBloomFilter
//!     ↓         ↓           ↓
//!   .expected_items()  .false_positive_rate()  .build()
//! ```
//!
//! `retry_policy` and `backend` are optional and may be set in any state.
//!
//! # Examples
//!
//! ## Minimal Configuration
//!
//! ```
//! use linebloom::FilterBuilder;
//!
//! let filter = FilterBuilder::new()
//!     .expected_items(10_000)
//!     .false_positive_rate(0.01)
//!     .build()
//!     .unwrap();
//! assert_eq!(filter.hash_count(), 7);
//! ```
//!
//! ## Full Configuration
//!
//! ```
//! use linebloom::{BackendKind, FilterBuilder, RetryPolicy};
//!
//! let filter = FilterBuilder::new()
//!     .retry_policy(RetryPolicy::new(16, 4).unwrap())
//!     .backend(BackendKind::Scalar)
//!     .expected_items(10_000)
//!     .false_positive_rate(0.001)
//!     .build()
//!     .unwrap();
//! assert_eq!(filter.backend(), BackendKind::Scalar);
//! assert_eq!(filter.retry_policy().fast_retries, 16);
//! ```
//!
//! ## Error Handling
//!
//! ```
//! use linebloom::{FilterBuilder, LineBloomError};
//!
//! let result = FilterBuilder::new()
//!     .expected_items(0)
//!     .false_positive_rate(0.01)
//!     .build();
//! assert!(matches!(result, Err(LineBloomError::InvalidItemCount { .. })));
//! ```

use std::marker::PhantomData;

use crate::core::filter::CacheBloomFilter;
use crate::core::params::FilterParameters;
use crate::error::{LineBloomError, Result};
use crate::simd::{self, BackendKind};
use crate::util::atomic::RetryPolicy;

/// Type-state marker: Initial state (no parameters set).
#[derive(Debug)]
pub struct Initial;

/// Type-state marker: Items count is set.
#[derive(Debug)]
pub struct WithItems;

/// Type-state marker: All required parameters set.
#[derive(Debug)]
pub struct Complete;

/// Builder for cache-line filters with type-state guarantees.
#[derive(Debug)]
pub struct FilterBuilder<State> {
    expected_items: u64,
    fp_rate: f64,
    retry: RetryPolicy,
    backend: Option<BackendKind>,
    _state: PhantomData<State>,
}

impl FilterBuilder<Initial> {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            expected_items: 0,
            fp_rate: 0.0,
            retry: RetryPolicy::default(),
            backend: None,
            _state: PhantomData,
        }
    }

    /// Set the expected number of items (required, must be > 0).
    #[must_use]
    pub fn expected_items(self, items: u64) -> FilterBuilder<WithItems> {
        self.transition(|b| b.expected_items = items)
    }
}

impl Default for FilterBuilder<Initial> {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterBuilder<WithItems> {
    /// Set the target false positive rate (required, in `(0, 1)`).
    #[must_use]
    pub fn false_positive_rate(self, fp_rate: f64) -> FilterBuilder<Complete> {
        self.transition(|b| b.fp_rate = fp_rate)
    }
}

impl<State> FilterBuilder<State> {
    /// Contended-insert policy. Defaults to [`RetryPolicy::default`].
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Force a bulk-operation backend instead of the auto-selected one.
    #[must_use]
    pub fn backend(mut self, kind: BackendKind) -> Self {
        self.backend = Some(kind);
        self
    }

    fn transition<Next>(self, apply: impl FnOnce(&mut Self)) -> FilterBuilder<Next> {
        let mut this = self;
        apply(&mut this);
        FilterBuilder {
            expected_items: this.expected_items,
            fp_rate: this.fp_rate,
            retry: this.retry,
            backend: this.backend,
            _state: PhantomData,
        }
    }
}

impl FilterBuilder<Complete> {
    /// Derive parameters without allocating.
    ///
    /// # Errors
    ///
    /// See [`FilterParameters::derive`].
    pub fn parameters(&self) -> Result<FilterParameters> {
        FilterParameters::derive(self.expected_items, self.fp_rate)
    }

    /// Build the filter.
    ///
    /// # Errors
    ///
    /// - Any error from [`FilterParameters::derive`]
    /// - [`LineBloomError::InvalidRetryPolicy`] for an out-of-range policy
    /// - [`LineBloomError::InvalidParameters`] if the requested backend is not
    ///   supported by this CPU
    pub fn build(self) -> Result<CacheBloomFilter> {
        let params = self.parameters()?;
        let ops = match self.backend {
            None => simd::active_backend(),
            Some(kind) => simd::backend_for(kind).ok_or_else(|| {
                LineBloomError::invalid_parameters(format!(
                    "{kind} backend is not available on this CPU"
                ))
            })?,
        };
        CacheBloomFilter::from_parts(params, self.retry, ops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_build() {
        let filter = FilterBuilder::new()
            .expected_items(1000)
            .false_positive_rate(0.01)
            .build()
            .unwrap();
        assert_eq!(filter.bit_count(), 9728);
        assert_eq!(*filter.retry_policy(), RetryPolicy::default());
        assert_eq!(filter.backend(), simd::active_backend().kind());
    }

    #[test]
    fn test_optional_settings_survive_transitions() {
        let policy = RetryPolicy::new(3, 2).unwrap();
        let filter = FilterBuilder::new()
            .retry_policy(policy)
            .expected_items(100)
            .backend(BackendKind::Scalar)
            .false_positive_rate(0.05)
            .build()
            .unwrap();
        assert_eq!(*filter.retry_policy(), policy);
        assert_eq!(filter.backend(), BackendKind::Scalar);
    }

    #[test]
    fn test_invalid_fp_rate() {
        let result = FilterBuilder::new()
            .expected_items(100)
            .false_positive_rate(f64::NAN)
            .build();
        assert!(matches!(
            result,
            Err(LineBloomError::FalsePositiveRateOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_invalid_retry_policy() {
        let policy = RetryPolicy {
            fast_retries: 1,
            max_backoff_exponent: 99,
        };
        let result = FilterBuilder::new()
            .expected_items(100)
            .false_positive_rate(0.01)
            .retry_policy(policy)
            .build();
        assert!(matches!(
            result,
            Err(LineBloomError::InvalidRetryPolicy { .. })
        ));
    }

    #[test]
    fn test_unavailable_backend_is_error() {
        for kind in [BackendKind::Avx2, BackendKind::Neon] {
            let result = FilterBuilder::new()
                .expected_items(100)
                .false_positive_rate(0.01)
                .backend(kind)
                .build();
            if simd::backend_for(kind).is_some() {
                assert_eq!(result.unwrap().backend(), kind);
            } else {
                assert!(matches!(
                    result,
                    Err(LineBloomError::InvalidParameters { .. })
                ));
            }
        }
    }

    #[test]
    fn test_parameters_preview() {
        let params = FilterBuilder::new()
            .expected_items(1000)
            .false_positive_rate(0.01)
            .parameters()
            .unwrap();
        assert_eq!(params.hash_count, 7);
        assert_eq!(params.cache_line_count, 19);
    }
}
