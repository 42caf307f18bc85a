use glam::DVec3;

/// Closed catalog of form-factor classes. `Water` and `ExcludedVolume` are
/// the two reserved slots spec.md calls out: `Water` is used only by
/// hydration-layer atoms, `ExcludedVolume` only by grid-generated dummy
/// atoms. Ordinary atoms never carry either.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FormFactorType {
    CarbonAliphatic = 0,
    CarbonAromatic = 1,
    CarbonCarbonyl = 2,
    NitrogenAmine = 3,
    NitrogenAmide = 4,
    OxygenHydroxyl = 5,
    OxygenCarbonyl = 6,
    Sulfur = 7,
    Phosphorus = 8,
    Water = 9,
    ExcludedVolume = 10,
}

/// Number of distinct form-factor classes; every 2D/3D distribution
/// allocates `CATALOG_SIZE` (or `CATALOG_SIZE^2`) slots along its
/// ff-resolved axes.
pub const CATALOG_SIZE: usize = 11;

impl FormFactorType {
    pub const ALL: [FormFactorType; CATALOG_SIZE] = [
        FormFactorType::CarbonAliphatic,
        FormFactorType::CarbonAromatic,
        FormFactorType::CarbonCarbonyl,
        FormFactorType::NitrogenAmine,
        FormFactorType::NitrogenAmide,
        FormFactorType::OxygenHydroxyl,
        FormFactorType::OxygenCarbonyl,
        FormFactorType::Sulfur,
        FormFactorType::Phosphorus,
        FormFactorType::Water,
        FormFactorType::ExcludedVolume,
    ];

    /// Dense index into ff-resolved distribution and form-factor tables.
    #[inline]
    pub fn catalog_index(&self) -> usize {
        *self as usize
    }

    pub fn is_water(&self) -> bool {
        matches!(self, FormFactorType::Water)
    }

    pub fn is_excluded_volume(&self) -> bool {
        matches!(self, FormFactorType::ExcludedVolume)
    }
}

/// An immutable scattering center: position, effective electron charge
/// (weight), and form-factor class.
///
/// `AtomRecord` is `Copy` — at 40 bytes it is cheap enough to move through
/// the pairwise kernels by value rather than by reference, which keeps the
/// hot loops (see [`crate::kernel`]) free of lifetime plumbing.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AtomRecord {
    pub position: DVec3,
    pub weight: f64,
    pub ff_type: FormFactorType,
}

impl AtomRecord {
    pub fn new(position: DVec3, weight: f64, ff_type: FormFactorType) -> Self {
        Self {
            position,
            weight,
            ff_type,
        }
    }
}
