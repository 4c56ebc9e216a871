//! Builder pattern for filter construction.
//!
//! # Design Philosophy
//!
//! ## Type-State Pattern
//!
//! The builder progresses through states, with `build()` only available once
//! both required parameters were given.
//!
//! ## Error Handling
//!
//! - **Compile-time errors**: Missing required parameters
//! - **Runtime errors**: Invalid parameter values, unavailable backends
//!
//! # Builder Parameters
//!
//! | Parameter             | Required | Default                     |
//! |-----------------------|----------|-----------------------------|
//! | `expected_items`      | yes      |                             |
//! | `false_positive_rate` | yes      |                             |
//! | `retry_policy`        | no       | 64 fast retries, exponent 6 |
//! | `backend`             | no       | best detected backend       |

#![allow(clippy::module_name_repetitions)]

pub mod filter;

pub use filter::{Complete, FilterBuilder, Initial, WithItems};
