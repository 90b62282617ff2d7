//! # confseq-core
//!
//! Core types and error definitions shared across the confseq workspace:
//! the `Real`/`Time` aliases and the `Error` hierarchy used by
//! `confseq-math` and the root `confseq` crate.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod errors;

/// Floating-point type used throughout the library.
pub type Real = f64;

/// A time index measured in observations (the predictable sequence's `t`,
/// counting from 1).
pub type Time = usize;

/// Alias used for array sizes / indices.
pub type Size = usize;

/// Large finite value substituted for a truncation bound that would
/// otherwise overflow to `+∞` (spec §4.2 step 3, §7): keeps intermediate
/// capital-process products finite instead of propagating an infinity that
/// would make `0 * inf` a NaN hazard two steps downstream.
pub const TRUNCATION_SENTINEL: Real = 1000.0;
