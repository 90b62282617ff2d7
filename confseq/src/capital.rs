//! Truncated positive/negative capital processes and the single-family
//! martingale built from them (spec §4.2).

use std::sync::Arc;

use confseq_core::errors::Result;
use confseq_core::{ensure, fail_numerical, Real, TRUNCATION_SENTINEL};
use confseq_math::Array;

use crate::bet::{validate_observations, BetGenerator, BetParams, PredictableMixtureEb};

/// Parameters controlling [`martingale`] (spec §4.2, §6).
///
/// `bets_negative` defaults to `bets_positive` when left unset (the teacher's
/// original asymmetric default), and both default to a
/// [`PredictableMixtureEb`] built from `alpha` when neither is supplied.
#[derive(Clone)]
pub struct MartingaleParams {
    alpha: Real,
    bets_positive: Option<Arc<dyn BetGenerator>>,
    bets_negative: Option<Arc<dyn BetGenerator>>,
    population_size: Option<u64>,
    convex_comb: bool,
    theta: Real,
    trunc_scale: Real,
    m_trunc: bool,
}

impl Default for MartingaleParams {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            bets_positive: None,
            bets_negative: None,
            population_size: None,
            convex_comb: false,
            theta: 0.5,
            trunc_scale: 0.5,
            m_trunc: true,
        }
    }
}

impl MartingaleParams {
    /// Significance level α ∈ (0, 1), used to build the default bet generators.
    pub fn with_alpha(mut self, alpha: Real) -> Self {
        self.alpha = alpha;
        self
    }

    /// Override the positive-branch bet generator.
    pub fn with_bets_positive(mut self, gen: impl BetGenerator + 'static) -> Self {
        self.bets_positive = Some(Arc::new(gen));
        self
    }

    /// Override the positive-branch bet generator with a pre-built `Arc`
    /// (used when sharing a generator across family members).
    pub fn with_bets_positive_arc(mut self, gen: Arc<dyn BetGenerator>) -> Self {
        self.bets_positive = Some(gen);
        self
    }

    /// Override the negative-branch bet generator.
    pub fn with_bets_negative(mut self, gen: impl BetGenerator + 'static) -> Self {
        self.bets_negative = Some(Arc::new(gen));
        self
    }

    /// Override the negative-branch bet generator with a pre-built `Arc`.
    pub fn with_bets_negative_arc(mut self, gen: Arc<dyn BetGenerator>) -> Self {
        self.bets_negative = Some(gen);
        self
    }

    /// Finite population size N, switching the null mean from a constant `m`
    /// to the without-replacement-adjusted μ_t(m).
    pub fn with_population_size(mut self, n: u64) -> Self {
        self.population_size = Some(n);
        self
    }

    /// Combine the positive/negative branches as a convex combination
    /// instead of a max (default: max).
    pub fn with_convex_comb(mut self, yes: bool) -> Self {
        self.convex_comb = yes;
        self
    }

    /// Weight θ ∈ [0, 1] given to the positive branch.
    pub fn with_theta(mut self, theta: Real) -> Self {
        self.theta = theta;
        self
    }

    /// Truncation scale τ ∈ (0, 1] (default ½).
    pub fn with_trunc_scale(mut self, tau: Real) -> Self {
        self.trunc_scale = tau;
        self
    }

    /// Whether truncation bounds depend on μ_t (default `true`); when
    /// `false` both branches are clipped to the constant `trunc_scale`.
    pub fn with_m_trunc(mut self, yes: bool) -> Self {
        self.m_trunc = yes;
        self
    }

    /// Defaults tuned the way the original's `betting_ci` tunes them for the
    /// fixed-time pathway ([`crate::inverter::fixed_time_ci`]): `m_trunc =
    /// false` with `trunc_scale = 1`, i.e. both branches clipped to the
    /// constant 1 rather than the m-dependent bound the general
    /// [`MartingaleParams::default`] uses.
    pub fn default_fixed_time() -> Self {
        Self::default().with_trunc_scale(1.0).with_m_trunc(false)
    }

    /// Defaults tuned the way the original's `betting_ci_seq` tunes them for
    /// repeated fixed-time calls ([`crate::inverter::ci_sequence`] replaying
    /// [`crate::inverter::fixed_time_ci`]): `trunc_scale = 0.9`, `m_trunc`
    /// left at the general default (`true`).
    pub fn default_ci_sequence() -> Self {
        Self::default().with_trunc_scale(0.9)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.alpha > 0.0 && self.alpha < 1.0, "alpha must be in (0, 1), got {}", self.alpha);
        ensure!(
            self.trunc_scale > 0.0 && self.trunc_scale <= 1.0,
            "trunc_scale (tau) must be in (0, 1], got {}",
            self.trunc_scale
        );
        ensure!((0.0..=1.0).contains(&self.theta), "theta must be in [0, 1], got {}", self.theta);
        if let Some(n) = self.population_size {
            ensure!(n > 0, "population_size (N) must be positive");
        }
        Ok(())
    }

    fn resolved_positive(&self) -> Arc<dyn BetGenerator> {
        self.bets_positive
            .clone()
            .unwrap_or_else(|| Arc::new(PredictableMixtureEb::new(BetParams::default().with_alpha(self.alpha))))
    }

    fn resolved_negative(&self) -> Arc<dyn BetGenerator> {
        self.bets_negative
            .clone()
            .or_else(|| self.bets_positive.clone())
            .unwrap_or_else(|| Arc::new(PredictableMixtureEb::new(BetParams::default().with_alpha(self.alpha))))
    }
}

/// Effective null mean μ_t(m) at each time step (spec §4.2 step 1): the
/// constant `m` under sampling with replacement, or the without-replacement
/// adjustment when `population_size` is set.
fn effective_null_mean(x: &[Real], m: Real, population_size: Option<u64>) -> Vec<Real> {
    match population_size {
        None => vec![m; x.len()],
        Some(n) => {
            let n = n as Real;
            let mut sum_prev = 0.0;
            let mut mu = Vec::with_capacity(x.len());
            for (idx, &xt) in x.iter().enumerate() {
                let t = (idx + 1) as Real;
                mu.push((n * m - sum_prev) / (n - (t - 1.0)));
                sum_prev += xt;
            }
            mu
        }
    }
}

/// Truncation bounds for the positive/negative branches (spec §4.2 step 3):
/// `upper_t = tau / mu_t`, `lower_t = tau / (1 - mu_t)`, each clamped to
/// [`TRUNCATION_SENTINEL`] instead of +∞ so the downstream products never
/// multiply by an infinity.
fn truncation_bounds(mu: &[Real], m_trunc: bool, trunc_scale: Real) -> (Vec<Real>, Vec<Real>) {
    if !m_trunc {
        return (vec![trunc_scale; mu.len()], vec![trunc_scale; mu.len()]);
    }

    let mut upper = Vec::with_capacity(mu.len());
    let mut lower = Vec::with_capacity(mu.len());
    for (i, &mu_t) in mu.iter().enumerate() {
        let mut u = trunc_scale / mu_t;
        if u.is_infinite() {
            tracing::debug!(position = i, side = "upper", "clamping truncation bound to sentinel instead of infinity");
            u = TRUNCATION_SENTINEL;
        }
        let mut l = trunc_scale / (1.0 - mu_t);
        if l.is_infinite() {
            tracing::debug!(position = i, side = "lower", "clamping truncation bound to sentinel instead of infinity");
            l = TRUNCATION_SENTINEL;
        }
        upper.push(u);
        lower.push(l);
    }
    (upper, lower)
}

fn clip(values: &[Real], lo: &[Real], hi: &[Real]) -> Array {
    Array::from_slice(values).clamp_each(&Array::from_slice(lo), &Array::from_slice(hi))
}

/// The single-family martingale built from truncated positive/negative
/// capital processes (spec §4.2, §6): for `theta == 1.0` this reduces to the
/// positive-branch capital process alone, for `theta == 0.0` to the negative
/// branch alone.
pub fn martingale(x: &[Real], m: Real, params: &MartingaleParams) -> Result<Vec<Real>> {
    params.validate()?;
    validate_observations(x)?;
    ensure!((0.0..=1.0).contains(&m), "m must be in [0, 1], got {m}");

    let bets_pos = params.resolved_positive();
    let bets_neg = params.resolved_negative();

    let lambda_pos = bets_pos.bets(x, m)?;
    let lambda_neg = bets_neg.bets(x, m)?;

    let mu = effective_null_mean(x, m, params.population_size);
    let (upper, lower) = truncation_bounds(&mu, params.m_trunc, params.trunc_scale);
    let neg_lower: Vec<Real> = lower.iter().map(|&l| -l).collect();
    let neg_upper: Vec<Real> = upper.iter().map(|&u| -u).collect();

    // The negative branch's clipping bounds are the positive branch's
    // bounds with upper/lower swapped — this asymmetry comes straight from
    // the martingale this crate reimplements, not an oversight here.
    let lambda_pos_clipped = clip(&lambda_pos, &neg_lower, &upper);
    let lambda_neg_clipped = clip(&lambda_neg, &neg_upper, &lower);

    let x_arr = Array::from_slice(x);
    let mu_arr = Array::from_slice(&mu);
    let diff = &x_arr - &mu_arr;

    let pos_terms: Vec<Real> = (0..x.len()).map(|i| 1.0 + lambda_pos_clipped[i] * diff[i]).collect();
    let neg_terms: Vec<Real> = (0..x.len()).map(|i| 1.0 - lambda_neg_clipped[i] * diff[i]).collect();

    let cap_pos = Array::from_vec(pos_terms).cumprod();
    let cap_neg = Array::from_vec(neg_terms).cumprod();

    let theta = params.theta;
    let mut result: Vec<Real> = (0..x.len())
        .map(|i| {
            if theta == 1.0 {
                cap_pos[i]
            } else if theta == 0.0 {
                cap_neg[i]
            } else if params.convex_comb {
                theta * cap_pos[i] + (1.0 - theta) * cap_neg[i]
            } else {
                (theta * cap_pos[i]).max((1.0 - theta) * cap_neg[i])
            }
        })
        .collect();

    // At mu_t outside (0, 1) the null is logically impossible; the process
    // is defined to reject it outright.
    for (i, &mu_t) in mu.iter().enumerate() {
        if mu_t <= 0.0 || mu_t >= 1.0 {
            result[i] = Real::INFINITY;
        }
    }

    for (i, &v) in result.iter().enumerate() {
        if v.is_nan() {
            fail_numerical!("martingale value at position {i} is NaN");
        }
        if v < 0.0 {
            fail_numerical!("martingale value at position {i} is negative ({v}), violating the truncation invariant");
        }
    }

    Ok(result)
}
