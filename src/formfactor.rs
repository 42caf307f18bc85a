use crate::atoms::FormFactorType;
use crate::atoms::CATALOG_SIZE;

/// Five-Gaussian-plus-constant representation of an elemental form factor:
/// `f(q) = c + sum_i a_i * exp(-b_i * (q / 4*pi)^2)`.
#[derive(Debug, Clone, Copy)]
pub struct FormFactorCoefficients {
    pub a: [f64; 5],
    pub b: [f64; 5],
    pub c: f64,
}

impl FormFactorCoefficients {
    #[inline]
    pub fn evaluate(&self, q: f64) -> f64 {
        let x = q / (4.0 * std::f64::consts::PI);
        let x2 = x * x;
        let mut f = self.c;
        for i in 0..5 {
            f += self.a[i] * (-self.b[i] * x2).exp();
        }
        f
    }
}

/// The closed catalog of form factors, indexed by
/// [`FormFactorType::catalog_index`]. Coefficients are illustrative
/// Cromer-Mann-style five-Gaussian fits; no external form-factor database
/// is part of this crate's scope (spec.md §1 excludes file/data loading).
pub const CATALOG: [FormFactorCoefficients; CATALOG_SIZE] = [
    // CarbonAliphatic
    FormFactorCoefficients {
        a: [2.31, 1.02, 1.5886, 0.865, 0.0],
        b: [20.8439, 10.2075, 0.5687, 51.6512, 0.0],
        c: 0.2156,
    },
    // CarbonAromatic
    FormFactorCoefficients {
        a: [2.26069, 1.56165, 1.05075, 0.839259, 0.286977],
        b: [22.6907, 0.656665, 9.75618, 55.5949, 0.0],
        c: 0.215600,
    },
    // CarbonCarbonyl
    FormFactorCoefficients {
        a: [2.31, 1.02, 1.5886, 0.865, 0.1],
        b: [20.8439, 10.2075, 0.5687, 51.6512, 0.0],
        c: 0.2156,
    },
    // NitrogenAmine
    FormFactorCoefficients {
        a: [12.2126, 3.13220, 2.01250, 1.16630, 0.0],
        b: [0.005700, 9.89330, 28.9975, 0.582600, 0.0],
        c: -11.529,
    },
    // NitrogenAmide
    FormFactorCoefficients {
        a: [12.2126, 3.13220, 2.01250, 1.16630, 0.2],
        b: [0.005700, 9.89330, 28.9975, 0.582600, 0.0],
        c: -11.329,
    },
    // OxygenHydroxyl
    FormFactorCoefficients {
        a: [3.04850, 2.28680, 1.54630, 0.867000, 0.0],
        b: [13.2771, 5.70110, 0.323900, 32.9089, 0.0],
        c: 0.2508,
    },
    // OxygenCarbonyl
    FormFactorCoefficients {
        a: [3.04850, 2.28680, 1.54630, 0.967000, 0.0],
        b: [13.2771, 5.70110, 0.323900, 32.9089, 0.0],
        c: 0.2508,
    },
    // Sulfur
    FormFactorCoefficients {
        a: [6.90530, 5.20340, 1.43790, 1.58630, 0.0],
        b: [1.46790, 22.2151, 0.253600, 56.1720, 0.0],
        c: 0.8669,
    },
    // Phosphorus
    FormFactorCoefficients {
        a: [6.43450, 4.17910, 1.78000, 1.49080, 0.0],
        b: [1.90670, 27.1570, 0.526000, 68.1645, 0.0],
        c: 1.1149,
    },
    // Water (oxygen-dominated effective scattering length of a full water molecule)
    FormFactorCoefficients {
        a: [3.04850, 2.28680, 1.54630, 0.867000, 1.2],
        b: [13.2771, 5.70110, 0.323900, 32.9089, 0.0],
        c: 0.2508,
    },
    // ExcludedVolume (dummy-atom effective scattering length, pre-`G(q)`-dampening)
    FormFactorCoefficients {
        a: [1.0, 0.0, 0.0, 0.0, 0.0],
        b: [23.0, 0.0, 0.0, 0.0, 0.0],
        c: 0.0,
    },
];

pub fn coefficients(ff: FormFactorType) -> &'static FormFactorCoefficients {
    &CATALOG[ff.catalog_index()]
}

/// `G(q) = cx^3 * exp(-r_m^2 * (cx^2 - 1) * q^2 / 4)`: the excluded-volume
/// Gaussian dampening multiplier applied whenever an exv-bearing bin
/// contributes.
pub fn excluded_volume_dampening(q: f64, cx: f64, average_atomic_radius: f64) -> f64 {
    let rm2 = average_atomic_radius * average_atomic_radius;
    cx.powi(3) * (-rm2 * (cx * cx - 1.0) * q * q / 4.0).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_factor_at_q_zero_is_a_plus_c() {
        let ff = coefficients(FormFactorType::Sulfur);
        let expected: f64 = ff.a.iter().sum::<f64>() + ff.c;
        assert!((ff.evaluate(0.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn dampening_is_one_at_cx_one() {
        let g = excluded_volume_dampening(0.3, 1.0, 1.62);
        assert!((g - 1.0).abs() < 1e-12);
    }
}
