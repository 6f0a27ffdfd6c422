//! Near-duplicate tile detection.
//!
//! Candidate tiles are compared against every previously accepted tile in
//! acceptance order. A cheap nine-term [`FastStat`] fingerprint filters most
//! pairs; survivors are compared along their borders only.
//!
//! The border test is lossy: tiles whose perimeters are identical are merged
//! even if their interiors differ, whatever their fingerprints say.
//!
//! ```
//! use image::{Rgba, RgbaImage};
//! use smfkit::dedup::{DedupOutcome, DedupThresholds, TileDeduplicator};
//!
//! let mut dedup = TileDeduplicator::new(DedupThresholds::default());
//! let grass = RgbaImage::from_pixel(32, 32, Rgba([40, 120, 40, 255]));
//! assert_eq!(dedup.dedup(&grass), DedupOutcome::Unique(0));
//! assert_eq!(dedup.dedup(&grass), DedupOutcome::Reused(0));
//! ```

mod compare;
mod deduplicator;
mod stat;

pub use compare::{border_ring, compare_borders, compare_tiles};
pub use deduplicator::{
    DedupOutcome, DedupThresholds, TileDeduplicator, DEFAULT_BORDER_THRESHOLD,
    DEFAULT_DIRECTION_THRESHOLD, DEFAULT_MEAN_THRESHOLD,
};
pub use stat::FastStat;

#[cfg(test)]
mod tests;
