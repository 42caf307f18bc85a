mod dist1d;
mod dist2d;
mod dist3d;
mod weighted;

pub use dist1d::Distribution1D;
pub use dist2d::Distribution2D;
pub use dist3d::Distribution3D;
pub use weighted::WeightedDistribution1D;
pub use weighted::WeightedDistribution3D;
