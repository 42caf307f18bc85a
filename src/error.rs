use thiserror::Error;

/// Precondition failures raised at construction time.
///
/// These are the only errors this crate returns as `Result`s — per the
/// precondition/capability-downgrade/numerical/shape-mismatch taxonomy,
/// only precondition violations are fatal at a point where the caller can
/// still back out before any histogram computation begins. Everything
/// that happens once a [`crate::engine::PartialHistogramEngine`] exists is
/// either an internal invariant (enforced with `debug_assert!`/`panic!`,
/// since construction already ruled it out) or a recoverable condition
/// surfaced through `FitResult::status` or a `log::warn!`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("molecule has {registered} registered signallers but {bodies} bodies")]
    SignallerCountMismatch { registered: usize, bodies: usize },

    #[error("a body was registered without ever receiving a signaller")]
    MissingSignaller,

    #[error("distance axis is degenerate: min={min}, max={max}, bin_count={bin_count}")]
    InvalidDistanceAxis {
        min: f64,
        max: f64,
        bin_count: usize,
    },

    #[error("q-axis has no values")]
    EmptyQAxis,

    #[error("job_size must be positive")]
    InvalidJobSize,

    #[error("excluded-volume parameters require the grid-based histogram variant")]
    ExvRequiresGridVariant,
}
