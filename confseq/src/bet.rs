//! Predictable bet generators (spec §4.1, plus the Hoeffding default used by
//! §4.5's closed-form CS).
//!
//! A [`BetGenerator`] is a single capability — produce λ[1..n] from a prefix
//! of observations and a candidate mean `m` — standing in for the bet
//! closures the original code passes around as plain functions. The shape
//! mirrors the one-method, blanket-default trait the teacher uses for its
//! stochastic processes.

use confseq_core::errors::Result;
use confseq_core::{ensure, Real};
use confseq_math::Array;

/// Rejects any observation outside `[0, 1]` (spec §3 data invariant).
pub(crate) fn validate_observations(x: &[Real]) -> Result<()> {
    for (i, &xi) in x.iter().enumerate() {
        ensure!(
            (0.0..=1.0).contains(&xi) && !xi.is_nan(),
            "observation x[{i}] = {xi} is outside [0, 1]"
        );
    }
    Ok(())
}

/// Produces a predictable sequence of bets from a stream.
///
/// λ_t must be a function of `x[..t-1]` and `m` only — no implementation in
/// this crate looks at `x[t]` when computing `bets(x, m)[t]`.
pub trait BetGenerator: Send + Sync {
    /// Produce the bet sequence λ[1..n] for `x` against null mean `m`.
    fn bets(&self, x: &[Real], m: Real) -> Result<Vec<Real>>;
}

/// Parameters for the predictable-mixture empirical-Bernstein bet (spec §4.1).
#[derive(Debug, Clone, Copy)]
pub struct BetParams {
    alpha: Real,
    fixed_horizon: Option<usize>,
    prior_mean: Real,
    prior_variance: Real,
    fake_obs: Real,
    truncation: Real,
    scale: Real,
}

impl Default for BetParams {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            fixed_horizon: None,
            prior_mean: 0.5,
            prior_variance: 0.25,
            fake_obs: 1.0,
            truncation: Real::INFINITY,
            scale: 1.0,
        }
    }
}

impl BetParams {
    /// Significance level α ∈ (0, 1).
    pub fn with_alpha(mut self, alpha: Real) -> Self {
        self.alpha = alpha;
        self
    }

    /// Fixed sample-size horizon, replacing `t·ln(1+t)` in the denominator
    /// with a constant.
    pub fn with_fixed_horizon(mut self, n: usize) -> Self {
        self.fixed_horizon = Some(n);
        self
    }

    /// Prior mean μ₀ ∈ [0, 1] (default ½).
    pub fn with_prior_mean(mut self, mu0: Real) -> Self {
        self.prior_mean = mu0;
        self
    }

    /// Prior variance σ₀² ∈ (0, ¼] (default ¼).
    pub fn with_prior_variance(mut self, sigma0_sq: Real) -> Self {
        self.prior_variance = sigma0_sq;
        self
    }

    /// Fake-observation weight k ≥ 1 (default 1).
    pub fn with_fake_obs(mut self, k: Real) -> Self {
        self.fake_obs = k;
        self
    }

    /// Truncation cap T > 0 (default +∞, i.e. untruncated).
    pub fn with_truncation(mut self, t: Real) -> Self {
        self.truncation = t;
        self
    }

    /// Scale factor s > 0 (default 1).
    pub fn with_scale(mut self, s: Real) -> Self {
        self.scale = s;
        self
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.alpha > 0.0 && self.alpha < 1.0,
            "alpha must be in (0, 1), got {}",
            self.alpha
        );
        ensure!(
            (0.0..=1.0).contains(&self.prior_mean),
            "prior_mean must be in [0, 1], got {}",
            self.prior_mean
        );
        ensure!(
            self.prior_variance > 0.0 && self.prior_variance <= 0.25,
            "prior_variance must be in (0, 0.25], got {}",
            self.prior_variance
        );
        ensure!(self.fake_obs >= 1.0, "fake_obs (k) must be >= 1, got {}", self.fake_obs);
        ensure!(self.truncation > 0.0, "truncation must be positive, got {}", self.truncation);
        ensure!(self.scale > 0.0, "scale must be positive, got {}", self.scale);
        if let Some(n) = self.fixed_horizon {
            ensure!(n > 0, "fixed_horizon must be positive");
        }
        Ok(())
    }
}

/// The predictable-mixture empirical-Bernstein bet of spec §4.1:
///
/// ```text
/// lambda_t = s * min(T, sqrt(2 ln(1/alpha) / (t * ln(1+t) * v_{t-1})))
/// ```
///
/// using the regularized running mean/variance (ŝ_t, v_t) seeded by the
/// prior (μ₀, σ₀²) and fake-observation weight k. `t * ln(1+t)` is replaced
/// by a fixed horizon when one is supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredictableMixtureEb {
    params: BetParams,
}

impl PredictableMixtureEb {
    /// Build a generator from the given parameters. Construction itself
    /// never fails — validation happens inside [`BetGenerator::bets`].
    pub fn new(params: BetParams) -> Self {
        Self { params }
    }
}

impl BetGenerator for PredictableMixtureEb {
    fn bets(&self, x: &[Real], _m: Real) -> Result<Vec<Real>> {
        self.params.validate()?;
        validate_observations(x)?;

        let p = &self.params;
        let n = x.len();

        // Regularized running mean \hat{s}_t = (k*mu0 + S_t) / (t+k), S_t
        // being the plain running sum of observations via Array::cumsum.
        let cum_x = Array::from_slice(x).cumsum();
        let mean: Vec<Real> = (0..n)
            .map(|idx| {
                let t = (idx + 1) as Real;
                (p.fake_obs * p.prior_mean + cum_x[idx]) / (t + p.fake_obs)
            })
            .collect();

        // Running variance v_t folds the squared regularized-mean errors
        // through another cumsum before being regularized the same way.
        let sq_err: Vec<Real> = (0..n).map(|idx| (x[idx] - mean[idx]).powi(2)).collect();
        let cum_sq_err = Array::from_vec(sq_err).cumsum();

        let mut lambdas = Vec::with_capacity(n);
        let mut variance_prev = p.prior_variance; // v_{t-1}, starts at v_0

        for idx in 0..n {
            let t = (idx + 1) as Real;

            let denom = match p.fixed_horizon {
                Some(n_star) => n_star as Real,
                None => t * (1.0 + t).ln(),
            };
            let raw = (2.0 * (1.0 / p.alpha).ln() / (denom * variance_prev)).sqrt();
            let lambda = if raw.is_nan() { 0.0 } else { p.scale * p.truncation.min(raw) };
            lambdas.push(lambda);

            variance_prev = (p.fake_obs * p.prior_variance + cum_sq_err[idx]) / (t + p.fake_obs);
        }

        Ok(lambdas)
    }
}

/// The default Hoeffding predictable-mixture bet of spec §4.5:
///
/// ```text
/// lambda_t = min(1, sqrt(8 ln(2/alpha) / (t * ln(t+1))))
/// ```
///
/// independent of both `x` and `m`.
#[derive(Debug, Clone, Copy)]
pub struct FixedHoeffding {
    alpha: Real,
}

impl FixedHoeffding {
    /// Build a generator for the given significance level.
    pub fn new(alpha: Real) -> Self {
        Self { alpha }
    }
}

impl BetGenerator for FixedHoeffding {
    fn bets(&self, x: &[Real], _m: Real) -> Result<Vec<Real>> {
        ensure!(self.alpha > 0.0 && self.alpha < 1.0, "alpha must be in (0, 1), got {}", self.alpha);
        validate_observations(x)?;

        Ok((1..=x.len())
            .map(|t| {
                let t = t as Real;
                (8.0 * (2.0 / self.alpha).ln() / (t * (t + 1.0).ln())).min(1.0)
            })
            .collect())
    }
}
