//! Error types for confseq.
//!
//! The core never panics on bad input; every fallible entry point returns
//! this `Error`. The `ensure!`/`fail!` macros keep precondition checks
//! one-line at call sites, the same role they play in the wider corpus this
//! crate is built alongside.

use thiserror::Error;

/// The top-level error type used throughout confseq.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// An input fell outside its documented range (x ∉ [0,1], alpha ∉ (0,1),
    /// N ≤ 0, tau ∉ (0,1], k < 1, mismatched family/weight lengths, …).
    /// Detected eagerly, before any numerical work happens.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// A cumulative product or bet computation produced a NaN that survived
    /// the documented fallback (e.g. 0·∞ in the capital recursion).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// General runtime error for conditions that don't fit the two above
    /// (e.g. the unimplemented hedged/dKelly stubs).
    #[error("{0}")]
    Runtime(String),
}

/// Shorthand `Result` type used throughout confseq.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Rejects a precondition violation with `Error::Precondition`.
///
/// # Example
/// ```
/// use confseq_core::{ensure, errors::Error};
/// fn positive(x: f64) -> confseq_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Numerical(...))` immediately.
///
/// # Example
/// ```
/// use confseq_core::{fail_numerical, errors::Error};
/// fn always_err() -> confseq_core::errors::Result<()> {
///     fail_numerical!("martingale value is NaN at position {}", 3);
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail_numerical {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Numerical(format!($($msg)*)))
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
