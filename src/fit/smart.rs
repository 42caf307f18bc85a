use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::State;
use argmin::solver::neldermead::NelderMead;

use crate::composite::CompositeDistanceHistogram;
use crate::fit::dataset::SimpleDataset;
use crate::fit::linear::LinearFitter;
use crate::result::FitResult;
use crate::result::FitStatus;
use crate::result::FittedParameter;
use crate::result::ParameterName;

/// Applies one trial parameter vector (in `enabled`'s order) to `composite`,
/// falling back to `fixed`'s value for anything not being optimized.
fn apply_params(composite: &mut CompositeDistanceHistogram, enabled: &[ParameterName], trial: &[f64], fixed: &HashMap<ParameterName, f64>) {
    for name in ParameterName::CANONICAL_ORDER {
        let value = match enabled.iter().position(|n| *n == name) {
            Some(pos) => trial[pos],
            None => *fixed.get(&name).unwrap_or(&name.default_initial_value()),
        };
        match name {
            ParameterName::ScalingWater => composite.apply_hydration_scaling_factor(value),
            ParameterName::ScalingExv => composite.apply_exv_scaling_factor(value),
            ParameterName::ScalingRho => composite.apply_solvent_density_factor(value),
            ParameterName::DebyeWallerAtomic => composite.apply_atomic_debye_waller_factor(value),
            ParameterName::DebyeWallerExv => composite.apply_exv_debye_waller_factor(value),
        }
    }
}

/// True if nudging `name` away from its default leaves `compose_intensity`
/// unchanged at every q, with every other enabled parameter held at its
/// default — i.e. the channel `name` scales is identically zero.
fn is_degenerate(composite: &Rc<RefCell<CompositeDistanceHistogram>>, enabled: &[ParameterName], fixed: &HashMap<ParameterName, f64>, name: ParameterName) -> bool {
    let baseline: Vec<f64> = enabled.iter().map(|n| n.default_initial_value()).collect();
    let mut perturbed = baseline.clone();
    let idx = enabled.iter().position(|&n| n == name).expect("name must be in enabled");
    perturbed[idx] += 1.0;

    let mut c = composite.borrow_mut();
    apply_params(&mut c, enabled, &baseline, fixed);
    let before = c.compose_intensity();
    apply_params(&mut c, enabled, &perturbed, fixed);
    let after = c.compose_intensity();
    apply_params(&mut c, enabled, &baseline, fixed);

    before.intensity.iter().zip(after.intensity.iter()).all(|(b, a)| (b - a).abs() < 1e-12)
}

fn chi2_at(composite: &Rc<RefCell<CompositeDistanceHistogram>>, enabled: &[ParameterName], trial: &[f64], fixed: &HashMap<ParameterName, f64>, data: &SimpleDataset) -> f64 {
    let mut c = composite.borrow_mut();
    apply_params(&mut c, enabled, trial, fixed);
    let profile = c.compose_intensity();
    LinearFitter::fit(&profile, data).chi2
}

struct SaxsCost {
    composite: Rc<RefCell<CompositeDistanceHistogram>>,
    data: SimpleDataset,
    enabled: Vec<ParameterName>,
    fixed: HashMap<ParameterName, f64>,
}

impl CostFunction for SaxsCost {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, trial: &Vec<f64>) -> Result<f64, argmin::core::Error> {
        Ok(chi2_at(&self.composite, &self.enabled, trial, &self.fixed, &self.data))
    }
}

/// Central-difference curvature estimate of chi-square at the optimum,
/// converted to a 1-sigma parameter uncertainty via `sigma = sqrt(2 /
/// d2chi2)` (the usual delta-chi-square = 1 confidence-interval
/// definition for a Gaussian likelihood).
fn estimate_uncertainty(composite: &Rc<RefCell<CompositeDistanceHistogram>>, enabled: &[ParameterName], best: &[f64], fixed: &HashMap<ParameterName, f64>, data: &SimpleDataset, index: usize) -> f64 {
    let h = (best[index].abs() * 1e-3).max(1e-4);
    let mut plus = best.to_vec();
    plus[index] += h;
    let mut minus = best.to_vec();
    minus[index] -= h;
    let c0 = chi2_at(composite, enabled, best, fixed, data);
    let c_plus = chi2_at(composite, enabled, &plus, fixed, data);
    let c_minus = chi2_at(composite, enabled, &minus, fixed, data);
    let second_derivative = (c_plus - 2.0 * c0 + c_minus) / (h * h);
    if second_derivative > 1e-12 {
        (2.0 / second_derivative).sqrt()
    } else {
        f64::INFINITY
    }
}

/// Two-level fitter (spec.md §4.7): an outer derivative-free Nelder-Mead
/// search over the enabled nonlinear parameters (`cw, cx, cρ, Ba, Bx`),
/// each trial evaluated by recomposing `I(q)` and solving
/// [`crate::fit::linear::LinearFitter`]'s closed-form scale/background fit
/// as the inner loop — the same split `feos-core` uses between its outer
/// Levenberg-Marquardt loop and an inner closed-form step for linear
/// sub-parameters.
pub struct SmartFitter;

impl SmartFitter {
    /// `requested` parameters are reordered to
    /// [`ParameterName::CANONICAL_ORDER`]; any the histogram variant
    /// cannot support (exv-related parameters under
    /// [`crate::config::HistogramVariant::SimpleAvg`]) are dropped with a
    /// `log::warn!` rather than failing the fit outright — a capability
    /// downgrade, not a precondition violation.
    pub fn fit(composite: CompositeDistanceHistogram, data: &SimpleDataset, requested: &[ParameterName], max_iters: u64) -> FitResult {
        let supports_exv = composite.variant().supports_excluded_volume();
        let mut enabled: Vec<ParameterName> = ParameterName::CANONICAL_ORDER.into_iter().filter(|name| requested.contains(name)).collect();
        if !supports_exv {
            let dropped: Vec<ParameterName> = enabled.iter().copied().filter(|n| n.requires_excluded_volume()).collect();
            if !dropped.is_empty() {
                log::warn!(
                    "histogram variant {:?} has no excluded-volume channel; dropping requested parameters {:?}",
                    composite.variant(),
                    dropped
                );
                enabled.retain(|n| !n.requires_excluded_volume());
            }
        }

        let mut fixed: HashMap<ParameterName, f64> = ParameterName::CANONICAL_ORDER.into_iter().filter(|n| !enabled.contains(n)).map(|n| (n, n.default_initial_value())).collect();

        let composite = Rc::new(RefCell::new(composite));

        // Degenerate-parameter downgrade (spec.md S6): a parameter whose
        // channel is entirely zero (e.g. SCALING_WATER with no hydration
        // atoms) has no effect on compose_intensity at all. Detect this by
        // perturbing each enabled parameter in isolation and comparing the
        // resulting profile to the baseline; an unchanged profile means the
        // direction is flat and the outer optimizer could never constrain
        // it, so it's dropped with a warning rather than left to wander.
        let degenerate: Vec<ParameterName> = enabled
            .iter()
            .copied()
            .filter(|&name| is_degenerate(&composite, &enabled, &fixed, name))
            .collect();
        if !degenerate.is_empty() {
            log::warn!("parameters {:?} have no effect on the current histogram; dropping to avoid an unconstrained optimization direction", degenerate);
            enabled.retain(|n| !degenerate.contains(n));
            for name in &degenerate {
                fixed.insert(*name, name.default_initial_value());
            }
        }

        if enabled.is_empty() {
            return finish(composite, &[], &[], &fixed, data, 1, FitStatus::Converged);
        }

        let x0: Vec<f64> = enabled.iter().map(|n| n.default_initial_value()).collect();
        let step = 0.1_f64;
        let mut simplex = vec![x0.clone()];
        for (i, v) in x0.iter().enumerate() {
            let mut vertex = x0.clone();
            vertex[i] += if v.abs() > 1e-9 { v * step } else { step };
            simplex.push(vertex);
        }
        let solver = NelderMead::new(simplex);

        let cost = SaxsCost {
            composite: Rc::clone(&composite),
            data: data.clone(),
            enabled: enabled.clone(),
            fixed: fixed.clone(),
        };

        match Executor::new(cost, solver).configure(|state| state.max_iters(max_iters)).run() {
            Ok(result) => {
                let iters = result.state().get_iter();
                let status = if iters < max_iters { FitStatus::Converged } else { FitStatus::MaxIterationsReached };
                let best = result.state().get_best_param().cloned().unwrap_or(x0);
                finish(composite, &enabled, &best, &fixed, data, iters as usize, status)
            }
            Err(err) => {
                log::warn!("Nelder-Mead optimization did not produce a result, falling back to the initial guess: {err}");
                finish(composite, &enabled, &x0, &fixed, data, 0, FitStatus::NonImproving)
            }
        }
    }
}

fn finish(
    composite: Rc<RefCell<CompositeDistanceHistogram>>,
    enabled: &[ParameterName],
    best: &[f64],
    fixed: &HashMap<ParameterName, f64>,
    data: &SimpleDataset,
    fevals: usize,
    status: FitStatus,
) -> FitResult {
    apply_params(&mut composite.borrow_mut(), enabled, best, fixed);
    let profile = composite.borrow().compose_intensity();
    let linear = LinearFitter::fit(&profile, data);
    let residuals = LinearFitter::residuals(&profile, data, &linear);

    let parameters = enabled
        .iter()
        .enumerate()
        .map(|(i, &name)| FittedParameter {
            name,
            value: best[i],
            uncertainty: estimate_uncertainty(&composite, enabled, best, fixed, data, i),
            bounds: name.default_bounds(),
        })
        .collect();

    // Degrees of freedom: data points minus (enabled nonlinear parameters
    // + the 2 linear parameters the inner fitter always solves for).
    let dof = data.len() as i64 - enabled.len() as i64 - 2;

    FitResult {
        parameters,
        chi2: linear.chi2,
        dof,
        residuals,
        status,
        fevals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::CATALOG_SIZE;
    use crate::config::Axis;
    use crate::config::EngineConfig;
    use crate::config::HistogramVariant;
    use crate::distribution::Distribution1D;
    use crate::distribution::Distribution2D;
    use crate::distribution::Distribution3D;

    fn sample_composite(variant: HistogramVariant) -> CompositeDistanceHistogram {
        let q: Vec<f64> = (0..15).map(|i| i as f64 * 0.05).collect();
        let cfg = EngineConfig::new(Axis::new(0.0, 50.0, 200).unwrap(), q, 8, false, variant).unwrap();
        let bin_count = cfg.d_axis().bin_count();
        let mut aa = Distribution3D::zeros(CATALOG_SIZE, bin_count);
        aa.add(crate::atoms::FormFactorType::CarbonAliphatic, crate::atoms::FormFactorType::CarbonAliphatic, 20, 12.0);
        let aw = Distribution2D::zeros(CATALOG_SIZE, bin_count);
        let ww = Distribution1D::zeros(bin_count);
        let ax = Distribution2D::zeros(CATALOG_SIZE, bin_count);
        let xx = Distribution1D::zeros(bin_count);
        let wx = Distribution1D::zeros(bin_count);
        CompositeDistanceHistogram::new(&cfg, aa, aw, ww, ax, xx, wx)
    }

    #[test]
    fn drops_exv_parameters_for_simple_avg() {
        let composite = sample_composite(HistogramVariant::SimpleAvg);
        let q: Vec<f64> = (0..10).map(|i| i as f64 * 0.07).collect();
        let intensity = vec![1.0; 10];
        let sigma = vec![1.0; 10];
        let data = SimpleDataset::new(q, intensity, sigma);
        let result = SmartFitter::fit(composite, &data, &[ParameterName::ScalingExv, ParameterName::ScalingWater], 50);
        assert!(result.parameters.iter().all(|p| p.name != ParameterName::ScalingExv));
    }

    #[test]
    fn degenerate_scaling_water_is_dropped_when_hydration_is_empty() {
        // sample_composite's aw/ww channels are both all-zero (no
        // hydration atoms were ever folded in), so SCALING_WATER has no
        // effect on compose_intensity at all — spec.md S6's
        // empty-hydration capability downgrade.
        let composite = sample_composite(HistogramVariant::ExplicitFf);
        let q: Vec<f64> = (0..10).map(|i| i as f64 * 0.07).collect();
        let intensity = vec![1.0; 10];
        let sigma = vec![1.0; 10];
        let data = SimpleDataset::new(q, intensity, sigma);
        let result = SmartFitter::fit(composite, &data, &[ParameterName::ScalingWater], 50);
        assert!(result.parameters.is_empty());
    }

    #[test]
    fn empty_request_still_runs_the_linear_inner_fit() {
        let composite = sample_composite(HistogramVariant::ExplicitFf);
        let q: Vec<f64> = (0..10).map(|i| i as f64 * 0.07).collect();
        let intensity = vec![1.0; 10];
        let sigma = vec![1.0; 10];
        let data = SimpleDataset::new(q, intensity, sigma);
        let result = SmartFitter::fit(composite, &data, &[], 50);
        assert!(result.parameters.is_empty());
        assert_eq!(result.status, FitStatus::Converged);
    }
}
