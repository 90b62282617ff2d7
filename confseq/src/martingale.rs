//! Diversified martingale: a weighted combination of capital processes over
//! a family of bet-generator pairs (spec §4.3).

use std::sync::Arc;

use confseq_core::errors::Result;
use confseq_core::{ensure, fail_numerical, Real};

use crate::bet::BetGenerator;
use crate::capital::{martingale, MartingaleParams};

/// One `(bets_positive, bets_negative)` pair making up a member of a
/// [`MartingaleFamily`].
#[derive(Clone)]
pub struct FamilyMember {
    bets_positive: Arc<dyn BetGenerator>,
    bets_negative: Arc<dyn BetGenerator>,
}

impl FamilyMember {
    /// Build a member from distinct positive/negative generators.
    pub fn new(bets_positive: impl BetGenerator + 'static, bets_negative: impl BetGenerator + 'static) -> Self {
        Self { bets_positive: Arc::new(bets_positive), bets_negative: Arc::new(bets_negative) }
    }

    /// Build a member that uses the same generator for both branches.
    pub fn symmetric(bets: impl BetGenerator + 'static) -> Self {
        let g: Arc<dyn BetGenerator> = Arc::new(bets);
        Self { bets_positive: g.clone(), bets_negative: g }
    }
}

/// An ordered family of bet-generator pairs plus a weight vector (spec
/// §4.3). With no explicit weights the family is weighted uniformly.
pub struct MartingaleFamily {
    members: Vec<FamilyMember>,
    weights: Option<Vec<Real>>,
}

impl MartingaleFamily {
    /// Build a family from its members, defaulting to uniform weights.
    pub fn new(members: Vec<FamilyMember>) -> Self {
        Self { members, weights: None }
    }

    /// Override the uniform default with explicit weights (must sum to 1).
    pub fn with_weights(mut self, weights: Vec<Real>) -> Self {
        self.weights = Some(weights);
        self
    }

    fn resolved_weights(&self) -> Result<Vec<Real>> {
        let k = self.members.len();
        ensure!(k > 0, "martingale family must have at least one member");
        match &self.weights {
            None => Ok(vec![1.0 / k as Real; k]),
            Some(w) => {
                ensure!(w.len() == k, "weights length ({}) must match family size ({k})", w.len());
                ensure!(w.iter().all(|&wi| wi >= 0.0), "weights must be non-negative");
                let total: Real = w.iter().sum();
                ensure!((total - 1.0).abs() < 1e-9, "weights must sum to 1, got {total}");
                Ok(w.clone())
            }
        }
    }
}

/// The diversified martingale `M_t = sum_k w_k * M_t^(k)` (spec §4.3), built
/// by running [`martingale`] once per family member and combining with its
/// weight.
///
/// A zero-weighted member that happens to go to infinity contributes 0 to
/// the sum rather than `0 * inf = NaN`.
pub fn diversified_martingale(x: &[Real], m: Real, family: &MartingaleFamily, base: &MartingaleParams) -> Result<Vec<Real>> {
    let weights = family.resolved_weights()?;

    let mut total = vec![0.0; x.len()];
    for (member, &w) in family.members.iter().zip(&weights) {
        let params = base
            .clone()
            .with_bets_positive_arc(member.bets_positive.clone())
            .with_bets_negative_arc(member.bets_negative.clone());
        let m_k = martingale(x, m, &params)?;
        for (t, &v) in m_k.iter().enumerate() {
            total[t] += if w == 0.0 { 0.0 } else { w * v };
        }
    }

    for (i, &v) in total.iter().enumerate() {
        if v.is_nan() {
            fail_numerical!("diversified martingale value at position {i} is NaN");
        }
    }

    Ok(total)
}
