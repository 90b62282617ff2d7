//! Closed-form confidence sequences that bypass grid inversion entirely
//! (spec §4.5).

use confseq_core::errors::Result;
use confseq_core::{ensure, Real};
use confseq_math::Array;

use crate::bet::{validate_observations, BetGenerator, BetParams, FixedHoeffding, PredictableMixtureEb};
use crate::sequence::ConfidenceSequence;

/// Hoeffding predictable-mixture confidence sequence.
///
/// `lambda_params`, if given, must have the same length as `x`; otherwise
/// the default `lambda_t = min(1, sqrt(8 ln(2/alpha) / (t ln(t+1))))` is
/// used. When the running sum of bets is still zero, mu_hat is defined as
/// ½ and the margin is +infinity, so the interval is `[0, 1]`.
pub fn hoeffding_cs(x: &[Real], alpha: Real, lambda_params: Option<&[Real]>, running_intersection: bool) -> Result<ConfidenceSequence> {
    ensure!(alpha > 0.0 && alpha < 1.0, "alpha must be in (0, 1), got {alpha}");
    validate_observations(x)?;

    let lambdas: Vec<Real> = match lambda_params {
        Some(lp) => {
            ensure!(lp.len() == x.len(), "lambda_params length ({}) must match x length ({})", lp.len(), x.len());
            lp.to_vec()
        }
        None => FixedHoeffding::new(alpha).bets(x, 0.5)?,
    };

    let log_term = (2.0 / alpha).ln();

    let lambda_x: Vec<Real> = x.iter().zip(&lambdas).map(|(&xt, &lam)| lam * xt).collect();
    let lambda_sq: Vec<Real> = lambdas.iter().map(|&lam| lam * lam).collect();

    let cum_lambda = Array::from_slice(&lambdas).cumsum();
    let cum_lambda_x = Array::from_vec(lambda_x).cumsum();
    let cum_lambda_sq = Array::from_vec(lambda_sq).cumsum();

    let mut lower = Vec::with_capacity(x.len());
    let mut upper = Vec::with_capacity(x.len());

    for idx in 0..x.len() {
        let sum_lambda = cum_lambda[idx];
        let margin = (cum_lambda_sq[idx] / 8.0 + log_term) / sum_lambda;
        let mut mu_hat = cum_lambda_x[idx] / sum_lambda;
        if mu_hat.is_nan() {
            mu_hat = 0.5;
        }

        lower.push((mu_hat - margin).max(0.0));
        upper.push((mu_hat + margin).min(1.0));
    }

    let mut cs = ConfidenceSequence::new(lower, upper);
    if running_intersection {
        cs = cs.running_intersect();
    }
    Ok(cs)
}

/// Empirical-Bernstein predictable-mixture confidence sequence, built from
/// the §4.1 bets at significance level `alpha / 2`.
pub fn empbern_cs(x: &[Real], alpha: Real, truncation: Option<Real>, running_intersection: bool, fixed_n: Option<usize>) -> Result<ConfidenceSequence> {
    ensure!(alpha > 0.0 && alpha < 1.0, "alpha must be in (0, 1), got {alpha}");
    let truncation = truncation.unwrap_or(0.5);
    ensure!(truncation > 0.0, "truncation must be positive, got {truncation}");
    validate_observations(x)?;

    let mut bet_params = BetParams::default().with_alpha(alpha / 2.0).with_truncation(truncation);
    if let Some(n) = fixed_n {
        bet_params = bet_params.with_fixed_horizon(n);
    }
    let lambdas = PredictableMixtureEb::new(bet_params).bets(x, 0.5)?;

    let log_term = (2.0 / alpha).ln();

    // s_hat_{t-1}, the unweighted running mean one step behind (s_hat_0 := 0),
    // read off the same running sum via Array::cumsum.
    let cum_x = Array::from_slice(x).cumsum();
    let mean_prev: Vec<Real> = (0..x.len())
        .map(|idx| if idx == 0 { 0.0 } else { cum_x[idx - 1] / idx as Real })
        .collect();

    let psi_terms: Vec<Real> = x
        .iter()
        .zip(&mean_prev)
        .zip(&lambdas)
        .map(|((&xt, &mp), &lam)| (xt - mp).powi(2) * (-(1.0 - lam).ln() - lam))
        .collect();
    let cum_psi = Array::from_vec(psi_terms).cumsum();

    let lambda_x: Vec<Real> = x.iter().zip(&lambdas).map(|(&xt, &lam)| lam * xt).collect();
    let cum_lambda = Array::from_slice(&lambdas).cumsum();
    let cum_lambda_x = Array::from_vec(lambda_x).cumsum();

    let mut lower = Vec::with_capacity(x.len());
    let mut upper = Vec::with_capacity(x.len());

    for idx in 0..x.len() {
        let sum_lambda = cum_lambda[idx];
        let margin = (log_term + cum_psi[idx]) / sum_lambda;
        let mu_hat = cum_lambda_x[idx] / sum_lambda;

        lower.push((mu_hat - margin).max(0.0));
        upper.push((mu_hat + margin).min(1.0));
    }

    let mut cs = ConfidenceSequence::new(lower, upper);
    if running_intersection {
        cs = cs.running_intersect();
    }
    Ok(cs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hoeffding_interval_contains_constant_stream_mean() {
        let x = vec![0.4; 30];
        let cs = hoeffding_cs(&x, 0.05, None, false).unwrap();
        let (l, u) = cs.tail();
        assert!(l <= 0.4 && 0.4 <= u);
    }

    #[test]
    fn hoeffding_zero_lambda_gives_the_full_unit_interval() {
        let x = vec![0.3, 0.3];
        let cs = hoeffding_cs(&x, 0.05, Some(&[0.0, 0.0]), false).unwrap();
        assert!((cs.lower[0] - 0.0).abs() < 1e-12);
        assert!((cs.upper[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn hoeffding_rejects_mismatched_lambda_params_length() {
        let x = vec![0.3, 0.3, 0.3];
        assert!(hoeffding_cs(&x, 0.05, Some(&[0.1, 0.1]), false).is_err());
    }

    #[test]
    fn empbern_interval_contains_constant_stream_mean() {
        let x = vec![0.6; 30];
        let cs = empbern_cs(&x, 0.05, None, false, None).unwrap();
        let (l, u) = cs.tail();
        assert!(l <= 0.6 && 0.6 <= u);
    }

    #[test]
    fn empbern_running_intersection_is_monotone_nondecreasing_lower() {
        let x = vec![0.2, 0.7, 0.4, 0.9, 0.1, 0.5];
        let cs = empbern_cs(&x, 0.05, None, true, None).unwrap();
        for pair in cs.lower.windows(2) {
            assert!(pair[1] >= pair[0] - 1e-12);
        }
    }
}
