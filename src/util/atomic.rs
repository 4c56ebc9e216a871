//! Lock-free bit setting with bounded spinning.
//!
//! This module holds the compare-and-swap loop behind every `add`, plus the
//! retry policy that controls how hard a contended writer spins before it
//! starts yielding its time slice.
//!
//! # Memory Ordering
//!
//! - The initial probe uses `Acquire`, so a bit observed as set carries the
//!   writes that happened before the store which set it.
//! - The CAS succeeds with `AcqRel` and fails with `Acquire`.
//!
//! Together with `Acquire` loads on the query side this rules out false
//! negatives between an `add` that has returned and any later `contains`.
//!
//! # Progress
//!
//! A CAS on a word only fails when another thread changed that word, so some
//! thread always makes progress. The loop itself never gives up: once the
//! policy's spin budget is spent it keeps retrying between `yield_now` calls.

use std::hint;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crate::error::{LineBloomError, Result};

/// Largest accepted backoff exponent (`2^16` spin-loop hints per wait).
pub const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Tuning knobs for the contended path of [`set_bit`].
///
/// `fast_retries` is the number of immediate CAS retries before any backoff.
/// After that each wait spins `2^step` times, `step` growing by one per
/// failure until it reaches `max_backoff_exponent`; from then on the thread
/// yields between attempts.
///
/// # Examples
///
/// ```
/// use linebloom::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.fast_retries, 64);
/// assert_eq!(policy.max_backoff_exponent, 6);
///
/// let eager = RetryPolicy::new(4, 2).unwrap();
/// assert!(eager.validate().is_ok());
/// assert!(RetryPolicy::new(4, 40).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryPolicy {
    /// Immediate retries before exponential backoff starts.
    pub fast_retries: u32,
    /// Cap on the backoff exponent; beyond it the thread yields.
    pub max_backoff_exponent: u32,
}

impl RetryPolicy {
    /// Default number of immediate retries.
    pub const DEFAULT_FAST_RETRIES: u32 = 64;

    /// Default backoff exponent cap.
    pub const DEFAULT_MAX_BACKOFF_EXPONENT: u32 = 6;

    /// Create a validated policy.
    ///
    /// # Errors
    ///
    /// Returns [`LineBloomError::InvalidRetryPolicy`] when
    /// `max_backoff_exponent` exceeds [`MAX_BACKOFF_EXPONENT`].
    pub fn new(fast_retries: u32, max_backoff_exponent: u32) -> Result<Self> {
        let policy = Self {
            fast_retries,
            max_backoff_exponent,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Check the policy's bounds.
    ///
    /// # Errors
    ///
    /// Returns [`LineBloomError::InvalidRetryPolicy`] when the exponent cap is
    /// out of range.
    pub fn validate(&self) -> Result<()> {
        if self.max_backoff_exponent > MAX_BACKOFF_EXPONENT {
            return Err(LineBloomError::invalid_retry_policy(format!(
                "max_backoff_exponent {} exceeds {}",
                self.max_backoff_exponent, MAX_BACKOFF_EXPONENT
            )));
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            fast_retries: Self::DEFAULT_FAST_RETRIES,
            max_backoff_exponent: Self::DEFAULT_MAX_BACKOFF_EXPONENT,
        }
    }
}

/// Per-call backoff state driven by a [`RetryPolicy`].
#[derive(Debug)]
pub struct Backoff<'a> {
    policy: &'a RetryPolicy,
    attempts: u32,
    step: u32,
}

impl<'a> Backoff<'a> {
    /// Fresh state for one contended operation.
    #[inline]
    #[must_use]
    pub fn new(policy: &'a RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            step: 0,
        }
    }

    /// Wait before the next retry.
    #[inline]
    pub fn snooze(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
        if self.attempts <= self.policy.fast_retries {
            hint::spin_loop();
            return;
        }

        if self.step < self.policy.max_backoff_exponent {
            for _ in 0..(1u32 << self.step) {
                hint::spin_loop();
            }
            self.step += 1;
            if self.step == self.policy.max_backoff_exponent {
                tracing::trace!(
                    attempts = self.attempts,
                    "bit set contended past spin budget; yielding"
                );
            }
        } else {
            thread::yield_now();
        }
    }

    /// Number of waits so far.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// True once the spin budget is spent and waits yield the thread.
    #[inline]
    #[must_use]
    pub fn is_yielding(&self) -> bool {
        self.attempts > self.policy.fast_retries && self.step >= self.policy.max_backoff_exponent
    }
}

/// Set the bits of `mask` in `word`.
///
/// Returns `true` if this call changed the word, `false` if every bit in
/// `mask` was already set when observed.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use linebloom::RetryPolicy;
/// use linebloom::util::atomic::set_bit;
///
/// let word = AtomicU64::new(0);
/// let policy = RetryPolicy::default();
/// assert!(set_bit(&word, 1 << 5, &policy));
/// assert!(!set_bit(&word, 1 << 5, &policy));
/// assert_eq!(word.load(Ordering::Relaxed), 1 << 5);
/// ```
#[inline]
pub fn set_bit(word: &AtomicU64, mask: u64, policy: &RetryPolicy) -> bool {
    let mut current = word.load(Ordering::Acquire);
    if current & mask == mask {
        return false;
    }

    let mut backoff = Backoff::new(policy);
    loop {
        match word.compare_exchange_weak(
            current,
            current | mask,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => return true,
            Err(actual) => {
                if actual & mask == mask {
                    return false;
                }
                current = actual;
                backoff.snooze();
            }
        }
    }
}
