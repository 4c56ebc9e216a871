//! Low-level utilities.
//!
//! # Modules
//!
//! - [`atomic`] - Lock-free bit setting and the contended-path retry policy

pub mod atomic;

pub use atomic::{Backoff, RetryPolicy};
