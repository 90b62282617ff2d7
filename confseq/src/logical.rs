//! The logical confidence sequence for sampling without replacement (spec
//! §4.4.1): bounds derived purely from `[0, 1]`-boundedness and the running
//! sum, with no martingale involved.

use confseq_core::errors::Result;
use confseq_core::{ensure, Real};
use confseq_math::Array;

use crate::bet::validate_observations;
use crate::sequence::ConfidenceSequence;

/// `l_t = S_t / N`, `u_t = 1 - (t - S_t) / N`, where `S_t` is the running
/// sum of the first `t` observations drawn from a finite population of size
/// `N`.
pub fn logical_cs(x: &[Real], population_size: u64) -> Result<ConfidenceSequence> {
    ensure!(population_size > 0, "population_size (N) must be positive");
    validate_observations(x)?;

    let n = population_size as Real;
    let cum_x = Array::from_slice(x).cumsum();

    let mut lower = Vec::with_capacity(x.len());
    let mut upper = Vec::with_capacity(x.len());

    for (idx, &s_t) in cum_x.iter().enumerate() {
        let t = (idx + 1) as Real;
        lower.push(s_t / n);
        upper.push(1.0 - (t - s_t) / n);
    }

    Ok(ConfidenceSequence::new(lower, upper))
}
