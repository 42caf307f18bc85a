use std::cell::RefCell;
use std::rc::Rc;

use crate::atoms::FormFactorType;
use crate::config::EngineConfig;
use crate::config::HistogramVariant;
use crate::debye::DebyeTransform;
use crate::debye::FormFactorProductTable;
use crate::distribution::Distribution1D;
use crate::distribution::Distribution2D;
use crate::distribution::Distribution3D;
use crate::formfactor;
use crate::result::ScatteringProfile;

/// One coherent snapshot of a [`crate::engine::PartialHistogramEngine`]'s
/// output, owning its own copies of every partial — changes to the engine
/// after [`crate::engine::PartialHistogramEngine::calculate_all`] never
/// retroactively mutate a `CompositeDistanceHistogram` already handed to a
/// caller.
///
/// Per spec.md §9's redesign note ("polymorphic histogram families"), this
/// is deliberately one fixed-shape struct rather than a trait-object
/// family: every variant shares the same six partials (`aa`, `aw`, `ww`,
/// `ax`, `xx`, `wx`) and differs only in [`CompositeDistanceHistogram::compose_intensity`]'s
/// per-channel assembly and which scaling parameters have any effect.
pub struct CompositeDistanceHistogram {
    variant: HistogramVariant,
    q_axis: Vec<f64>,
    average_atomic_radius: f64,

    aa: Distribution3D,
    aw: Distribution2D,
    ww: Distribution1D,
    ax: Distribution2D,
    xx: Distribution1D,
    wx: Distribution1D,

    products: Rc<FormFactorProductTable>,
    transform: Rc<DebyeTransform>,

    cw: f64,
    cx: f64,
    crho: f64,
    ba: f64,
    bx: f64,

    raw_aa: RefCell<Option<Vec<f64>>>,
    raw_aw: RefCell<Option<Vec<f64>>>,
    raw_ww: RefCell<Option<Vec<f64>>>,
    raw_ax: RefCell<Option<Vec<f64>>>,
    raw_xx: RefCell<Option<Vec<f64>>>,
    raw_wx: RefCell<Option<Vec<f64>>>,

    total_cache: RefCell<Option<Vec<f64>>>,
}

impl CompositeDistanceHistogram {
    pub fn new(
        config: &EngineConfig,
        aa: Distribution3D,
        aw: Distribution2D,
        ww: Distribution1D,
        ax: Distribution2D,
        xx: Distribution1D,
        wx: Distribution1D,
    ) -> Self {
        let transform = Rc::new(DebyeTransform::new(config.q_axis(), config.d_axis()));
        let products = Rc::new(FormFactorProductTable::new(config.q_axis()));
        Self {
            variant: config.histogram_variant(),
            q_axis: config.q_axis().to_vec(),
            average_atomic_radius: config.average_atomic_radius(),
            aa,
            aw,
            ww,
            ax,
            xx,
            wx,
            products,
            transform,
            cw: 1.0,
            cx: 1.0,
            crho: 1.0,
            ba: 0.0,
            bx: 0.0,
            raw_aa: RefCell::new(None),
            raw_aw: RefCell::new(None),
            raw_ww: RefCell::new(None),
            raw_ax: RefCell::new(None),
            raw_xx: RefCell::new(None),
            raw_wx: RefCell::new(None),
            total_cache: RefCell::new(None),
        }
    }

    pub fn variant(&self) -> HistogramVariant {
        self.variant
    }

    pub fn q_axis(&self) -> &[f64] {
        &self.q_axis
    }

    pub fn apply_hydration_scaling_factor(&mut self, cw: f64) {
        self.cw = cw;
        self.invalidate_water_dependent();
    }

    pub fn apply_exv_scaling_factor(&mut self, cx: f64) {
        self.cx = cx;
        self.invalidate_exv_dependent();
    }

    pub fn apply_solvent_density_factor(&mut self, crho: f64) {
        self.crho = crho;
        self.invalidate_exv_dependent();
    }

    pub fn apply_atomic_debye_waller_factor(&mut self, ba: f64) {
        self.ba = ba;
        self.raw_aa.borrow_mut().take();
        self.raw_aw.borrow_mut().take();
        self.raw_ww.borrow_mut().take();
        self.raw_ax.borrow_mut().take();
        self.raw_wx.borrow_mut().take();
        self.total_cache.borrow_mut().take();
    }

    pub fn apply_exv_debye_waller_factor(&mut self, bx: f64) {
        self.bx = bx;
        self.raw_xx.borrow_mut().take();
        self.raw_ax.borrow_mut().take();
        self.raw_wx.borrow_mut().take();
        self.total_cache.borrow_mut().take();
    }

    fn invalidate_water_dependent(&mut self) {
        self.raw_aw.borrow_mut().take();
        self.raw_ww.borrow_mut().take();
        self.raw_wx.borrow_mut().take();
        self.total_cache.borrow_mut().take();
    }

    fn invalidate_exv_dependent(&mut self) {
        self.raw_ax.borrow_mut().take();
        self.raw_xx.borrow_mut().take();
        self.raw_wx.borrow_mut().take();
        self.total_cache.borrow_mut().take();
    }

    /// `exp(-B * q^2)`.
    fn dampening(&self, b: f64, q: f64) -> f64 {
        (-b * q * q).exp()
    }

    fn exv_dampening(&self, q: f64) -> f64 {
        formfactor::excluded_volume_dampening(q, self.cx, self.average_atomic_radius)
    }

    fn raw_aa(&self) -> Vec<f64> {
        self.cached(&self.raw_aa, || self.transform.transform_ff_resolved(&self.aa, &self.products, |_, _, _| 1.0))
    }

    fn raw_aw(&self) -> Vec<f64> {
        self.cached(&self.raw_aw, || self.collapsed_2d_transform(&self.aw, FormFactorType::Water))
    }

    fn raw_ww(&self) -> Vec<f64> {
        self.cached(&self.raw_ww, || self.transform.transform(&self.ww))
    }

    fn raw_ax(&self) -> Vec<f64> {
        self.cached(&self.raw_ax, || self.collapsed_2d_transform(&self.ax, FormFactorType::ExcludedVolume))
    }

    fn raw_xx(&self) -> Vec<f64> {
        self.cached(&self.raw_xx, || self.transform.transform(&self.xx))
    }

    fn raw_wx(&self) -> Vec<f64> {
        self.cached(&self.raw_wx, || self.transform.transform(&self.wx))
    }

    fn cached(&self, cell: &RefCell<Option<Vec<f64>>>, compute: impl FnOnce() -> Vec<f64>) -> Vec<f64> {
        if let Some(v) = cell.borrow().as_ref() {
            return v.clone();
        }
        let v = compute();
        *cell.borrow_mut() = Some(v.clone());
        v
    }

    /// A [`Distribution2D`] is ff-resolved on one axis only (the atom's
    /// type); the water/exv partner is always a single known ff, so its
    /// form-factor product is `f_atom(q) * f_partner(q)` per row.
    fn collapsed_2d_transform(&self, dist: &Distribution2D, partner_ff: FormFactorType) -> Vec<f64> {
        let mut out = vec![0.0; self.q_axis.len()];
        for &ff in FormFactorType::ALL.iter() {
            let row = dist.row(ff);
            if row.iter().all(|&v| v == 0.0) {
                continue;
            }
            for qi in 0..self.q_axis.len() {
                let mut acc = 0.0;
                for (bin, &p) in row.iter().enumerate() {
                    if p != 0.0 {
                        acc += p * self.sinc_value(qi, bin);
                    }
                }
                out[qi] += acc * self.products.product(ff, partner_ff, qi);
            }
        }
        out
    }

    fn sinc_value(&self, q_index: usize, bin: usize) -> f64 {
        // Delegates to the same sinc table the transform uses for the
        // plain 1D case, keeping exactly one sinc table per axis pair.
        self.transform.transform_sinc(q_index, bin)
    }

    /// `I_aa(q)`, dampened by `exp(-Ba q^2)` but with no cross-channel
    /// scaling applied — useful for diagnosing the atom-atom channel in
    /// isolation.
    pub fn get_profile_aa(&self) -> ScatteringProfile {
        let raw = self.raw_aa();
        let out = self.q_axis.iter().zip(raw).map(|(&q, v)| v * self.dampening(self.ba, q)).collect();
        ScatteringProfile::new(self.q_axis.clone(), out)
    }

    pub fn get_profile_aw(&self) -> ScatteringProfile {
        let raw = self.raw_aw();
        let out = self.q_axis.iter().zip(raw).map(|(&q, v)| self.cw * v * self.dampening(self.ba, q)).collect();
        ScatteringProfile::new(self.q_axis.clone(), out)
    }

    pub fn get_profile_ww(&self) -> ScatteringProfile {
        let raw = self.raw_ww();
        let out = self
            .q_axis
            .iter()
            .zip(raw)
            .map(|(&q, v)| self.cw * self.cw * v * self.dampening(self.ba, q))
            .collect();
        ScatteringProfile::new(self.q_axis.clone(), out)
    }

    pub fn get_profile_ax(&self) -> ScatteringProfile {
        let raw = self.raw_ax();
        let out = self
            .q_axis
            .iter()
            .zip(raw)
            .map(|(&q, v)| self.exv_dampening(q) * v * self.dampening(self.combined_b(), q))
            .collect();
        ScatteringProfile::new(self.q_axis.clone(), out)
    }

    pub fn get_profile_xx(&self) -> ScatteringProfile {
        let raw = self.raw_xx();
        let out = self
            .q_axis
            .iter()
            .zip(raw)
            .map(|(&q, v)| self.exv_dampening(q) * self.exv_dampening(q) * v * self.dampening(self.bx, q))
            .collect();
        ScatteringProfile::new(self.q_axis.clone(), out)
    }

    pub fn get_profile_wx(&self) -> ScatteringProfile {
        let raw = self.raw_wx();
        let out = self
            .q_axis
            .iter()
            .zip(raw)
            .map(|(&q, v)| self.cw * self.exv_dampening(q) * v * self.dampening(self.combined_b(), q))
            .collect();
        ScatteringProfile::new(self.q_axis.clone(), out)
    }

    fn combined_b(&self) -> f64 {
        0.5 * (self.ba + self.bx)
    }

    /// The fully-composed `I(q)`. Reduces to `I_aa + 2*I_aw + I_ww - 2*I_ax
    /// + I_xx - 2*I_wx` when `cw=cx=crho=1, Ba=Bx=0` — see DESIGN.md for
    /// why exv channels enter with a minus sign (they represent displaced
    /// solvent, not additional scattering mass) and for the solvent-density
    /// correction term's derivation.
    pub fn compose_intensity(&self) -> ScatteringProfile {
        if let Some(v) = self.total_cache.borrow().as_ref() {
            return ScatteringProfile::new(self.q_axis.clone(), v.clone());
        }

        let aa = self.raw_aa();
        let aw = self.raw_aw();
        let ww = self.raw_ww();
        let supports_exv = self.variant.supports_excluded_volume();
        let (ax, xx, wx) = if supports_exv {
            (self.raw_ax(), self.raw_xx(), self.raw_wx())
        } else {
            (vec![0.0; self.q_axis.len()], vec![0.0; self.q_axis.len()], vec![0.0; self.q_axis.len()])
        };

        let mut out = vec![0.0; self.q_axis.len()];
        for (qi, &q) in self.q_axis.iter().enumerate() {
            let d_atomic = self.dampening(self.ba, q);
            let mut value = aa[qi] * d_atomic + 2.0 * self.cw * aw[qi] * d_atomic + self.cw * self.cw * ww[qi] * d_atomic;
            if supports_exv {
                let g = self.exv_dampening(q);
                let d_mixed = self.dampening(self.combined_b(), q);
                let d_exv = self.dampening(self.bx, q);
                value -= 2.0 * g * ax[qi] * d_mixed;
                value += g * g * xx[qi] * d_exv;
                value -= 2.0 * g * self.cw * wx[qi] * d_mixed;
                value += (self.crho - 1.0) * g * g * xx[qi] * d_exv;
            }
            out[qi] = value;
        }

        *self.total_cache.borrow_mut() = Some(out.clone());
        ScatteringProfile::new(self.q_axis.clone(), out)
    }
}
