//! # confseq
//!
//! Anytime-valid confidence sequences for the mean of a `[0, 1]`-bounded
//! process, built on betting martingales (Waudby-Smith & Ramdas). Every
//! entry point is safe to evaluate after any number of observations: the
//! coverage guarantee holds simultaneously across all `t`, not just at a
//! single fixed sample size.
//!
//! The pieces, bottom-up:
//!
//! - [`bet`]: predictable bet generators (λ_t sequences).
//! - [`capital`]: single-family truncated capital processes → [`capital::martingale`].
//! - [`martingale`]: weighted combinations of capital processes → [`martingale::diversified_martingale`].
//! - [`logical`]: the without-replacement logical confidence sequence.
//! - [`inverter`]: grid inversion of a martingale into a [`ConfidenceSequence`].
//! - [`closedform`]: Hoeffding and empirical-Bernstein CS without grid inversion.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bet;
pub mod capital;
pub mod closedform;
pub mod inverter;
pub mod logical;
pub mod martingale;
pub mod sequence;

pub use bet::{BetGenerator, BetParams, FixedHoeffding, PredictableMixtureEb};
pub use capital::{martingale, MartingaleParams};
pub use closedform::{empbern_cs, hoeffding_cs};
pub use inverter::{ci_sequence, confidence_sequence, cs_from_martingale, dkelly_cs, fixed_time_ci, hedged_cs, InverterParams};
pub use logical::logical_cs;
pub use martingale::{diversified_martingale, FamilyMember, MartingaleFamily};
pub use sequence::ConfidenceSequence;

pub use confseq_core::errors::{Error, Result};
pub use confseq_core::Real;
