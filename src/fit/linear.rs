use crate::fit::dataset::SimpleDataset;
use crate::result::ScatteringProfile;
use crate::spline::NaturalCubicSpline;

/// Outcome of the closed-form `I_exp ≈ a * I_calc + b` fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub scale: f64,
    pub background: f64,
    pub chi2: f64,
}

/// The inner loop of the two-level fit (spec.md §4.7): given a computed
/// profile (on whatever q-grid the engine used) and experimental data on
/// its own grid, finds the scale and background that minimize weighted
/// chi-square in closed form — no iteration needed, since `(a, b)` enter
/// linearly.
///
/// Grounded on the same normal-equations approach `feos-core`'s Levenberg
/// residual weighting uses ahead of its nonlinear stage, adapted here to
/// the fully closed-form two-parameter case.
pub struct LinearFitter;

impl LinearFitter {
    /// Resamples `computed` onto `data`'s q-grid via a natural cubic
    /// spline, then solves the weighted normal equations for `(a, b)`.
    pub fn fit(computed: &ScatteringProfile, data: &SimpleDataset) -> LinearFit {
        assert!(computed.q.len() >= 2, "need at least two computed points to resample from");
        let spline = NaturalCubicSpline::new(&computed.q, &computed.intensity);

        let mut sw = 0.0;
        let mut swx = 0.0;
        let mut swy = 0.0;
        let mut swxx = 0.0;
        let mut swxy = 0.0;
        for i in 0..data.len() {
            let w = 1.0 / (data.sigma()[i] * data.sigma()[i]);
            let x = spline.evaluate(data.q()[i]);
            let y = data.intensity()[i];
            sw += w;
            swx += w * x;
            swy += w * y;
            swxx += w * x * x;
            swxy += w * x * y;
        }

        let denom = sw * swxx - swx * swx;
        let (scale, background) = if denom.abs() > 1e-12 {
            let a = (sw * swxy - swx * swy) / denom;
            let b = (swxx * swy - swx * swxy) / denom;
            (a, b)
        } else {
            // Degenerate design matrix (e.g. every computed point lands at
            // the same value) — fall back to a pure scale fit through the
            // origin rather than producing NaN.
            let a = if swxx > 1e-12 { swxy / swxx } else { 0.0 };
            (a, 0.0)
        };

        let mut chi2 = 0.0;
        for i in 0..data.len() {
            let w = 1.0 / (data.sigma()[i] * data.sigma()[i]);
            let x = spline.evaluate(data.q()[i]);
            let residual = data.intensity()[i] - (scale * x + background);
            chi2 += w * residual * residual;
        }

        LinearFit {
            scale,
            background,
            chi2,
        }
    }

    /// Per-point residuals `(I_exp - a*I_calc - b) / sigma`, for a caller
    /// that wants the full residual vector rather than just chi-square.
    pub fn residuals(computed: &ScatteringProfile, data: &SimpleDataset, fit: &LinearFit) -> Vec<f64> {
        let spline = NaturalCubicSpline::new(&computed.q, &computed.intensity);
        (0..data.len())
            .map(|i| {
                let x = spline.evaluate(data.q()[i]);
                (data.intensity()[i] - (fit.scale * x + fit.background)) / data.sigma()[i]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_linear_relationship() {
        let q: Vec<f64> = (0..20).map(|i| i as f64 * 0.05).collect();
        let computed_intensity: Vec<f64> = q.iter().map(|&qi| (-qi).exp()).collect();
        let computed = ScatteringProfile::new(q.clone(), computed_intensity);

        let exp_q: Vec<f64> = (0..15).map(|i| i as f64 * 0.06 + 0.01).collect();
        let exp_intensity: Vec<f64> = exp_q.iter().map(|&qi| 3.0 * (-qi).exp() + 0.5).collect();
        let sigma = vec![1.0; exp_q.len()];
        let data = SimpleDataset::new(exp_q, exp_intensity, sigma);

        let fit = LinearFitter::fit(&computed, &data);
        assert!((fit.scale - 3.0).abs() < 1e-3);
        assert!((fit.background - 0.5).abs() < 1e-3);
        assert!(fit.chi2 < 1e-3);
    }
}
