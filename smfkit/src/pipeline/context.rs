//! Working state of a single conversion.

use crate::config::BuildConfig;
use crate::dedup::TileDeduplicator;
use crate::dxt::TileCodec;
use image::RgbaImage;

/// Counters reported at the end of a tile build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Tiles cut from the source image
    pub tiles_total: u64,
    /// Tiles appended to the archive
    pub tiles_unique: u64,
    /// Tiles replaced by an earlier close match
    pub tiles_reused: u64,
}

impl BuildStats {
    /// Fraction of tiles that were deduplicated.
    pub fn reuse_ratio(&self) -> f64 {
        if self.tiles_total == 0 {
            0.0
        } else {
            self.tiles_reused as f64 / self.tiles_total as f64
        }
    }
}

/// Buffers and state owned by one build. Nothing is shared between builds.
pub struct BuildContext {
    pub(crate) config: BuildConfig,
    pub(crate) codec: TileCodec,
    pub(crate) dedup: TileDeduplicator,
    /// Unique tiles waiting to be encoded, in acceptance order
    pub(crate) pending: Vec<RgbaImage>,
    pub(crate) stats: BuildStats,
}

impl BuildContext {
    pub fn new(config: BuildConfig) -> Self {
        let dedup = if config.dedup_enabled() {
            TileDeduplicator::new(config.thresholds())
        } else {
            TileDeduplicator::disabled()
        };
        Self {
            config,
            codec: TileCodec::default(),
            dedup,
            pending: Vec::with_capacity(config.batch_size()),
            stats: BuildStats::default(),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }
}
