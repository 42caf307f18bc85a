//! Partial distance-histogram SAXS intensity calculator and parameter
//! fitter.
//!
//! A caller supplies a [`molecule::MoleculeProvider`] (its own rigid-body
//! representation, or the bundled [`molecule::Molecule`]); a
//! [`engine::PartialHistogramEngine`] maintains a cache of per-body and
//! per-pair distance histograms, refreshing only the parts a
//! [`state::StateManager`] dirty flag says changed; and a
//! [`composite::CompositeDistanceHistogram`] assembles the cached partials
//! into `I(q)`, optionally fit against experimental data with
//! [`fit::SmartFitter`].

pub mod atoms;
pub mod body;
pub mod composite;
pub mod config;
pub mod coords;
pub mod debye;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod fit;
pub mod formfactor;
pub mod kernel;
pub mod molecule;
pub mod pool;
pub mod result;
pub mod spline;
pub mod state;

pub use atoms::AtomRecord;
pub use atoms::FormFactorType;
pub use body::Body;
pub use body::BodyId;
pub use body::BodyProvider;
pub use composite::CompositeDistanceHistogram;
pub use config::Axis;
pub use config::EngineConfig;
pub use config::HistogramVariant;
pub use config::OverflowPolicy;
pub use coords::CompactCoords;
pub use engine::PartialHistogramEngine;
pub use error::EngineError;
pub use fit::LinearFit;
pub use fit::LinearFitter;
pub use fit::SimpleDataset;
pub use fit::SmartFitter;
pub use molecule::Molecule;
pub use molecule::MoleculeProvider;
pub use result::FitResult;
pub use result::FitStatus;
pub use result::FittedParameter;
pub use result::ParameterName;
pub use result::ScatteringProfile;
pub use state::StateManager;
