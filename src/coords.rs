use glam::DVec3;

use crate::atoms::AtomRecord;
use crate::atoms::FormFactorType;

/// Dense read-only snapshot of one body's (or the hydration layer's)
/// atoms, laid out as a struct-of-arrays for positions/weights plus a
/// parallel array of form-factor types.
///
/// This is an SoA/AoS hybrid in the sense spec.md asks for: positions are
/// split into three contiguous `f64` arrays (so a vectorizing compiler can
/// load four/eight contiguous lanes without deinterleaving an
/// array-of-`DVec3`), while weight and ff-type stay zipped alongside them
/// at the same index — there's exactly one array of each attribute, never
/// an array of `AtomRecord`.
///
/// Lifetime is a single histogram computation pass: an external
/// (rigid-motion) change to the source body invalidates it and the engine
/// must rebuild it before the next pass touches that body.
#[derive(Debug, Clone)]
pub struct CompactCoords {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    weight: Vec<f64>,
    ff_type: Vec<FormFactorType>,
}

impl CompactCoords {
    pub fn from_atoms(atoms: &[AtomRecord]) -> Self {
        let n = atoms.len();
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        let mut z = Vec::with_capacity(n);
        let mut weight = Vec::with_capacity(n);
        let mut ff_type = Vec::with_capacity(n);
        for atom in atoms {
            x.push(atom.position.x);
            y.push(atom.position.y);
            z.push(atom.position.z);
            weight.push(atom.weight);
            ff_type.push(atom.ff_type);
        }
        Self {
            x,
            y,
            z,
            weight,
            ff_type,
        }
    }

    pub fn from_positions(positions: &[DVec3], ff_type: FormFactorType) -> Self {
        let n = positions.len();
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        let mut z = Vec::with_capacity(n);
        for p in positions {
            x.push(p.x);
            y.push(p.y);
            z.push(p.z);
        }
        Self {
            x,
            y,
            z,
            weight: vec![1.0; n],
            ff_type: vec![ff_type; n],
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    #[inline]
    pub fn position(&self, i: usize) -> DVec3 {
        DVec3::new(self.x[i], self.y[i], self.z[i])
    }

    #[inline]
    pub fn weight(&self, i: usize) -> f64 {
        self.weight[i]
    }

    #[inline]
    pub fn ff_type(&self, i: usize) -> FormFactorType {
        self.ff_type[i]
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn z(&self) -> &[f64] {
        &self.z
    }

    pub fn weights(&self) -> &[f64] {
        &self.weight
    }

    pub fn ff_types(&self) -> &[FormFactorType] {
        &self.ff_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::FormFactorType;

    #[test]
    fn round_trips_positions_and_weights() {
        let atoms = vec![
            AtomRecord::new(DVec3::new(1.0, 2.0, 3.0), 6.0, FormFactorType::CarbonAliphatic),
            AtomRecord::new(DVec3::new(4.0, 5.0, 6.0), 8.0, FormFactorType::OxygenHydroxyl),
        ];
        let coords = CompactCoords::from_atoms(&atoms);
        assert_eq!(coords.len(), 2);
        assert_eq!(coords.position(1), DVec3::new(4.0, 5.0, 6.0));
        assert_eq!(coords.weight(0), 6.0);
        assert_eq!(coords.ff_type(1), FormFactorType::OxygenHydroxyl);
    }
}
