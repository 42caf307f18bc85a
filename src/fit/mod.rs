pub mod dataset;
pub mod linear;
pub mod smart;

pub use dataset::SimpleDataset;
pub use linear::LinearFit;
pub use linear::LinearFitter;
pub use smart::SmartFitter;
