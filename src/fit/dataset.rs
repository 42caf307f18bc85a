/// Experimental data to fit a computed profile against: `q`, measured
/// intensity, and its uncertainty (used as the chi-square weight).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimpleDataset {
    q: Vec<f64>,
    intensity: Vec<f64>,
    sigma: Vec<f64>,
}

impl SimpleDataset {
    /// `sigma` entries must be strictly positive — a zero or negative
    /// uncertainty would make that point's chi-square contribution
    /// infinite or ill-signed. Non-positive entries are clamped to the
    /// smallest positive sigma in the set (or `1.0` if none exists),
    /// matching how a capability downgrade is handled elsewhere: a
    /// malformed single point degrades that point's weight rather than
    /// aborting the whole fit.
    pub fn new(q: Vec<f64>, intensity: Vec<f64>, sigma: Vec<f64>) -> Self {
        assert_eq!(q.len(), intensity.len());
        assert_eq!(q.len(), sigma.len());
        let fallback = sigma.iter().copied().filter(|&s| s > 0.0).fold(f64::INFINITY, f64::min);
        let fallback = if fallback.is_finite() { fallback } else { 1.0 };
        let sigma = sigma.into_iter().map(|s| if s > 0.0 { s } else { fallback }).collect();
        Self { q, intensity, sigma }
    }

    pub fn q(&self) -> &[f64] {
        &self.q
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    pub fn sigma(&self) -> &[f64] {
        &self.sigma
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_sigma_falls_back_to_smallest_positive() {
        let d = SimpleDataset::new(vec![0.0, 0.1, 0.2], vec![1.0, 2.0, 3.0], vec![0.5, 0.0, -1.0]);
        assert_eq!(d.sigma(), &[0.5, 0.5, 0.5]);
    }
}
