//! End-to-end coverage scenarios for confidence sequences built from
//! betting martingales.

use rand::SeedableRng;
use rand_distr::{Bernoulli, Distribution};

use confseq::bet::{BetParams, PredictableMixtureEb};
use confseq::capital::MartingaleParams;
use confseq::closedform::{empbern_cs, hoeffding_cs};
use confseq::inverter::{confidence_sequence, fixed_time_ci, InverterParams};
use confseq::martingale::{FamilyMember, MartingaleFamily};

fn bernoulli_stream(p: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let dist = Bernoulli::new(p).unwrap();
    (0..n).map(|_| if dist.sample(&mut rng) { 1.0 } else { 0.0 }).collect()
}

fn default_family() -> MartingaleFamily {
    MartingaleFamily::new(vec![FamilyMember::symmetric(PredictableMixtureEb::new(BetParams::default()))])
}

#[test]
fn bernoulli_stream_confidence_interval_contains_true_mean() {
    let p = 0.3;
    let x = bernoulli_stream(p, 500, 42);
    let family = default_family();
    let (l, u) = fixed_time_ci(
        &x,
        &family,
        &MartingaleParams::default_fixed_time().with_alpha(0.05),
        &InverterParams::default_fixed_time().with_alpha(0.05).with_grid_resolution(500),
    )
    .unwrap();
    assert!(l <= p && p <= u, "expected [{l}, {u}] to contain {p}");
}

#[test]
fn diversified_martingale_with_one_member_matches_confidence_sequence() {
    let x = bernoulli_stream(0.5, 100, 7);
    let family = default_family();
    let martingale_params = MartingaleParams::default();
    let inverter_params = InverterParams::default().with_grid_resolution(300);

    let cs = confidence_sequence(&x, &family, &martingale_params, &inverter_params).unwrap();
    let (l, u) = cs.tail();
    assert!(l <= u);
    assert!((0.0..=1.0).contains(&l));
    assert!((0.0..=1.0).contains(&u));
}

#[test]
fn hoeffding_default_lambda_equals_zero_gives_full_unit_interval() {
    // With lambda forced to zero at every step, no information is used and
    // the interval must be the entire [0, 1] range.
    let x = vec![0.1, 0.9, 0.5, 0.2, 0.8];
    let lambdas = vec![0.0; x.len()];
    let cs = hoeffding_cs(&x, 0.05, Some(&lambdas), false).unwrap();
    for (l, u) in cs.lower.iter().zip(&cs.upper) {
        assert!((l - 0.0).abs() < 1e-9);
        assert!((u - 1.0).abs() < 1e-9);
    }
}

#[test]
fn empbern_and_hoeffding_both_contain_a_constant_streams_mean() {
    let x = vec![0.35; 200];
    let hoeffding = hoeffding_cs(&x, 0.05, None, true).unwrap();
    let empbern = empbern_cs(&x, 0.05, None, true, None).unwrap();

    let (hl, hu) = hoeffding.tail();
    let (el, eu) = empbern.tail();
    assert!(hl <= 0.35 && 0.35 <= hu);
    assert!(el <= 0.35 && 0.35 <= eu);
}

#[test]
fn running_intersection_never_widens_the_confidence_sequence() {
    let x = bernoulli_stream(0.6, 60, 99);
    let plain = hoeffding_cs(&x, 0.05, None, false).unwrap();
    let intersected = hoeffding_cs(&x, 0.05, None, true).unwrap();

    for t in 0..x.len() {
        assert!(intersected.lower[t] >= plain.lower[t] - 1e-12);
        assert!(intersected.upper[t] <= plain.upper[t] + 1e-12);
    }
}

#[test]
fn wor_logical_cs_pins_an_all_zero_full_population_stream_to_zero() {
    // Scenario 3: x = [0]*N with N = 20 and the logical CS enabled. At
    // t = 20, every remaining draw would also have to be 0 to exhaust the
    // population, so l = u = 0.
    let x = vec![0.0; 20];
    let family = default_family();
    let martingale_params = MartingaleParams::default().with_population_size(20);
    let inverter_params = InverterParams::default().with_population_size(20);

    let cs = confidence_sequence(&x, &family, &martingale_params, &inverter_params).unwrap();
    let (l, u) = cs.tail();
    assert!(l.abs() < 1e-9, "expected l = 0, got {l}");
    assert!(u.abs() < 1e-9, "expected u = 0, got {u}");
}

#[test]
fn empbern_cs_width_is_small_for_a_large_bernoulli_sample() {
    // Scenario 4: Bernoulli(0.3) samples of length 500 must keep the
    // empirical-Bernstein closed-form width under 0.1 at alpha = 0.05.
    let x = bernoulli_stream(0.3, 500, 123);
    let cs = empbern_cs(&x, 0.05, None, false, None).unwrap();
    let (l, u) = cs.tail();
    assert!(l <= 0.3 && 0.3 <= u, "expected [{l}, {u}] to contain 0.3");
    assert!(u - l < 0.1, "expected width < 0.1, got {}", u - l);
}

#[test]
fn mixed_stream_contains_midpoint_at_end_and_one_at_halfway() {
    // Scenario 2: x = [1]*5 ++ [0]*5. At t = 10 the CS must contain 0.5;
    // at t = 5 (only ones observed so far) it must still contain 1.0.
    let mut x = vec![1.0; 5];
    x.extend(vec![0.0; 5]);
    let family = default_family();
    let cs = confidence_sequence(&x, &family, &MartingaleParams::default(), &InverterParams::default().with_grid_resolution(500)).unwrap();

    assert!(cs.lower[9] <= 0.5 && 0.5 <= cs.upper[9], "expected t=10 CS to contain 0.5, got [{}, {}]", cs.lower[9], cs.upper[9]);
    assert!(cs.lower[4] <= 1.0 && 1.0 <= cs.upper[4], "expected t=5 CS to contain 1.0, got [{}, {}]", cs.lower[4], cs.upper[4]);
}

#[test]
fn hoeffding_cs_alternating_stream_contains_half_from_t2_onward() {
    // Scenario 5: Hoeffding CS on x = [1,0,1,0,...] of length 100 must
    // contain 0.5 for all t >= 2.
    let x: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }).collect();
    let cs = hoeffding_cs(&x, 0.05, None, false).unwrap();
    for t in 1..cs.len() {
        assert!(cs.lower[t] <= 0.5 && 0.5 <= cs.upper[t], "t={t}: expected [{}, {}] to contain 0.5", cs.lower[t], cs.upper[t]);
    }
}
