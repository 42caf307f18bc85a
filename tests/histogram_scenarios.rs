//! Fixed-expectation scenarios (spec.md §8, S1-S6).

use generational_arena::Arena;
use glam::DVec3;

use saxs_engine::atoms::FormFactorType;
use saxs_engine::distribution::Distribution1D;
use saxs_engine::AtomRecord;
use saxs_engine::Axis;
use saxs_engine::EngineConfig;
use saxs_engine::HistogramVariant;
use saxs_engine::Molecule;
use saxs_engine::ParameterName;
use saxs_engine::PartialHistogramEngine;
use saxs_engine::SimpleDataset;
use saxs_engine::SmartFitter;

fn atom(x: f64, y: f64, z: f64) -> AtomRecord {
    AtomRecord::new(DVec3::new(x, y, z), 1.0, FormFactorType::CarbonAliphatic)
}

fn config(min: f64, max: f64, bin_count: usize) -> EngineConfig {
    EngineConfig::new(Axis::new(min, max, bin_count).unwrap(), vec![0.0, 0.1, 0.2], 4, false, HistogramVariant::ExplicitFf).unwrap()
}

/// S1: two atoms 1 Å apart, Δ=0.5 Å bins. `self_aa` lands at bin 0 (self
/// correlation) and bin 2 (d=1.0 / 0.5 = bin index 2); total sums to 4.
#[test]
fn s1_two_atom_body_lands_in_bins_zero_and_two() {
    let mut arena = Arena::new();
    let mut mol = Molecule::new();
    mol.add_body(&mut arena, vec![atom(0.0, 0.0, 0.0), atom(1.0, 0.0, 0.0)]);

    let mut engine = PartialHistogramEngine::new(config(0.0, 10.0, 20), &mut mol, Some(1)).unwrap();
    let total = engine.total_distribution();

    assert_eq!(total.get(0), 2.0);
    assert_eq!(total.get(2), 2.0);
    assert!((total.sum() - 4.0).abs() < 1e-9);

    // Re-running calculate without any mutation must reproduce the same total.
    let again = engine.calculate(&mol);
    assert_eq!(again, total);
}

/// S2: translating the sole body by (10, 0, 0) changes nothing about the
/// body's own self histogram or the reconstituted total — there is no
/// second body or hydration layer for the translation to perturb.
#[test]
fn s2_translating_the_only_body_leaves_total_unchanged() {
    let mut arena = Arena::new();
    let mut mol = Molecule::new();
    mol.add_body(&mut arena, vec![atom(0.0, 0.0, 0.0), atom(1.0, 0.0, 0.0)]);

    let mut engine = PartialHistogramEngine::new(config(0.0, 10.0, 20), &mut mol, Some(1)).unwrap();
    let before = engine.total_distribution();

    let id = mol.iterate_bodies().next().unwrap().unique_id();
    mol.body_mut(id).unwrap().translate(DVec3::new(10.0, 0.0, 0.0));
    let after = engine.calculate(&mol);

    assert_eq!(before, after);
}

/// S3: two bodies, body-0 = {(0,0,0), (1,0,0)}, body-1 = {(0,1,0)}. Bin 0
/// (self-correlation) sums to 3; the cross/internal d=1 bin accounts for
/// the rest of the total pair weight.
#[test]
fn s3_two_body_molecule_self_correlation_bin() {
    let mut arena = Arena::new();
    let mut mol = Molecule::new();
    mol.add_body(&mut arena, vec![atom(0.0, 0.0, 0.0), atom(1.0, 0.0, 0.0)]);
    mol.add_body(&mut arena, vec![atom(0.0, 1.0, 0.0)]);

    let mut engine = PartialHistogramEngine::new(config(0.0, 10.0, 20), &mut mol, Some(1)).unwrap();
    let total = engine.total_distribution();

    assert_eq!(total.get(0), 3.0);
    // 3 total atoms: self-correlation (3) + internal A-A pair (d=1, factor
    // 2 => 2) + 2 cross pairs at d=1 (factor 1 each => 2). Total = 7.
    assert!((total.sum() - 7.0).abs() < 1e-9);
}

/// S4: a synthetic dataset generated from the model at cw=2.0 must be
/// recovered by SmartFitter with only SCALING_WATER enabled.
#[test]
fn s4_smart_fitter_recovers_known_scaling_water() {
    let mut arena = Arena::new();
    let mut mol = Molecule::new();
    mol.add_body(&mut arena, vec![atom(0.0, 0.0, 0.0), atom(3.0, 0.0, 0.0)]);
    mol.set_hydration(vec![AtomRecord::new(DVec3::new(1.5, 1.0, 0.0), 1.0, FormFactorType::Water)]);

    let q: Vec<f64> = (0..40).map(|i| i as f64 * 0.02).collect();
    let cfg = EngineConfig::new(Axis::new(0.0, 20.0, 80).unwrap(), q, 8, false, HistogramVariant::ExplicitFf).unwrap();
    let mut engine = PartialHistogramEngine::new(cfg, &mut mol, Some(1)).unwrap();
    let mut composite = engine.calculate_all(&mol);
    composite.apply_hydration_scaling_factor(2.0);
    let truth = composite.compose_intensity();

    let sigma = vec![1e-6; truth.q.len()];
    let data = SimpleDataset::new(truth.q.clone(), truth.intensity.clone(), sigma);

    let fresh = engine.calculate_all(&mol);
    let result = SmartFitter::fit(fresh, &data, &[ParameterName::ScalingWater], 200);

    assert_eq!(result.parameters.len(), 1);
    assert!((result.parameters[0].value - 2.0).abs() < 1e-3, "recovered cw={}", result.parameters[0].value);
}

/// S5: scaling every sigma by a constant leaves the recovered parameters
/// unchanged and scales chi-square by 1/c^2.
#[test]
fn s5_uniform_sigma_scaling_leaves_parameters_unchanged() {
    let mut arena = Arena::new();
    let mut mol = Molecule::new();
    mol.add_body(&mut arena, vec![atom(0.0, 0.0, 0.0), atom(3.0, 0.0, 0.0)]);
    mol.set_hydration(vec![AtomRecord::new(DVec3::new(1.5, 1.0, 0.0), 1.0, FormFactorType::Water)]);

    let q: Vec<f64> = (0..40).map(|i| i as f64 * 0.02).collect();
    let cfg = EngineConfig::new(Axis::new(0.0, 20.0, 80).unwrap(), q, 8, false, HistogramVariant::ExplicitFf).unwrap();
    let mut engine = PartialHistogramEngine::new(cfg, &mut mol, Some(1)).unwrap();
    let mut composite = engine.calculate_all(&mol);
    composite.apply_hydration_scaling_factor(1.7);
    let truth = composite.compose_intensity();

    let c = 3.0;
    let sigma_a = vec![1e-3; truth.q.len()];
    let sigma_b: Vec<f64> = sigma_a.iter().map(|s| s * c).collect();
    let data_a = SimpleDataset::new(truth.q.clone(), truth.intensity.clone(), sigma_a);
    let data_b = SimpleDataset::new(truth.q.clone(), truth.intensity.clone(), sigma_b);

    let result_a = SmartFitter::fit(engine.calculate_all(&mol), &data_a, &[ParameterName::ScalingWater], 200);
    let result_b = SmartFitter::fit(engine.calculate_all(&mol), &data_b, &[ParameterName::ScalingWater], 200);

    assert!((result_a.parameters[0].value - result_b.parameters[0].value).abs() < 1e-3);
    assert!((result_a.chi2 / (c * c) - result_b.chi2).abs() / result_a.chi2.max(1e-12) < 1e-2);
}

/// S6: no hydration atoms at all — `cross_aw`/`self_ww` are zero
/// everywhere, so enabling SCALING_WATER is a degenerate request and the
/// fitter must downgrade it rather than optimize a flat direction.
#[test]
fn s6_empty_hydration_downgrades_scaling_water() {
    let mut arena = Arena::new();
    let mut mol = Molecule::new();
    mol.add_body(&mut arena, vec![atom(0.0, 0.0, 0.0), atom(3.0, 0.0, 0.0)]);

    let q: Vec<f64> = (0..20).map(|i| i as f64 * 0.03).collect();
    let cfg = EngineConfig::new(Axis::new(0.0, 20.0, 80).unwrap(), q, 8, false, HistogramVariant::ExplicitFf).unwrap();
    let mut engine = PartialHistogramEngine::new(cfg, &mut mol, Some(1)).unwrap();
    let composite = engine.calculate_all(&mol);
    let profile = composite.compose_intensity();

    let sigma = vec![1.0; profile.q.len()];
    let data = SimpleDataset::new(profile.q.clone(), profile.intensity.clone(), sigma);

    let result = SmartFitter::fit(composite, &data, &[ParameterName::ScalingWater], 50);
    assert!(result.parameters.is_empty(), "SCALING_WATER should have been downgraded, got {:?}", result.parameters);
}

// Sanity helper used above: confirms Distribution1D exposes `get`/`sum` so
// the scenarios can assert on specific bins without reaching into engine
// internals.
#[allow(dead_code)]
fn _uses_distribution1d(d: &Distribution1D) -> f64 {
    d.sum()
}
