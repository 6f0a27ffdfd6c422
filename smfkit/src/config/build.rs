//! Per-conversion tunables.

use super::defaults::*;
use super::settings::ConfigFile;
use crate::dedup::DedupThresholds;
use crate::dxt::{DEFAULT_TILE_MIPS, DEFAULT_TILE_SIZE};

/// Settings for one build.
///
/// # Example
///
/// ```
/// use smfkit::config::BuildConfig;
///
/// let config = BuildConfig::default()
///     .with_compression_factor(2.0)
///     .with_batch_size(64);
/// assert_eq!(config.thresholds().mean, 4.0);
/// assert_eq!(config.batch_size(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildConfig {
    tile_size: u32,
    mip_count: usize,
    dedup_enabled: bool,
    compression_factor: f64,
    base_thresholds: DedupThresholds,
    batch_size: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            mip_count: DEFAULT_TILE_MIPS,
            dedup_enabled: DEFAULT_DEDUP_ENABLED,
            compression_factor: DEFAULT_COMPRESSION_FACTOR,
            base_thresholds: DedupThresholds::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl BuildConfig {
    pub fn with_dedup(mut self, enabled: bool) -> Self {
        self.dedup_enabled = enabled;
        self
    }

    pub fn with_compression_factor(mut self, factor: f64) -> Self {
        self.compression_factor = factor;
        self
    }

    pub fn with_base_thresholds(mut self, thresholds: DedupThresholds) -> Self {
        self.base_thresholds = thresholds;
        self
    }

    /// Batch size is clamped to at least 1.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn mip_count(&self) -> usize {
        self.mip_count
    }

    pub fn dedup_enabled(&self) -> bool {
        self.dedup_enabled
    }

    pub fn compression_factor(&self) -> f64 {
        self.compression_factor
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Base thresholds scaled by the compression factor.
    pub fn thresholds(&self) -> DedupThresholds {
        DedupThresholds::from_factor(self.base_thresholds, self.compression_factor)
    }
}

impl From<&ConfigFile> for BuildConfig {
    fn from(file: &ConfigFile) -> Self {
        Self::default()
            .with_dedup(file.dedup.enabled)
            .with_compression_factor(file.dedup.compression_factor)
            .with_base_thresholds(DedupThresholds {
                mean: file.dedup.mean_threshold,
                direction: file.dedup.direction_threshold,
                border: file.dedup.border_threshold,
            })
            .with_batch_size(file.encode.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BuildConfig::default();
        assert_eq!(config.tile_size(), 32);
        assert_eq!(config.mip_count(), 4);
        assert!(config.dedup_enabled());
        assert_eq!(config.thresholds(), DedupThresholds::default());
    }

    #[test]
    fn test_from_config_file() {
        let mut file = ConfigFile::default();
        file.dedup.compression_factor = 0.5;
        file.dedup.border_threshold = 100.0;
        file.encode.batch_size = 0;
        let config = BuildConfig::from(&file);
        assert_eq!(config.thresholds().border, 50.0);
        assert_eq!(config.thresholds().mean, 1.0);
        assert_eq!(config.batch_size(), 1);
    }
}
