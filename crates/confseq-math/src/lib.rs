//! # confseq-math
//!
//! The vectorized substrate confseq's bets, capital processes, and
//! martingales fold over: the `Array` newtype over `nalgebra::DVector<f64>`
//! with `cumsum`/`cumprod`/`clamp_each`.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod array;

pub use array::Array;
