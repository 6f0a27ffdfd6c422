//! Default values for every configuration key.

pub use crate::dedup::{
    DEFAULT_BORDER_THRESHOLD, DEFAULT_DIRECTION_THRESHOLD, DEFAULT_MEAN_THRESHOLD,
};

/// Dedup threshold multiplier (1.0 = base thresholds).
pub const DEFAULT_COMPRESSION_FACTOR: f64 = 1.0;

/// Whether near-duplicate tiles are merged.
pub const DEFAULT_DEDUP_ENABLED: bool = true;

/// Unique tiles encoded per parallel batch.
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Largest accepted batch size.
pub const MAX_BATCH_SIZE: usize = 65_536;
