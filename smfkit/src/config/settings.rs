//! Settings structs, one per `[section]` of the INI file.

use super::defaults::*;
use std::path::PathBuf;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub dedup: DedupSettings,
    pub encode: EncodeSettings,
    pub logging: LoggingSettings,
}

/// `[dedup]`
#[derive(Debug, Clone, PartialEq)]
pub struct DedupSettings {
    pub enabled: bool,
    pub compression_factor: f64,
    pub mean_threshold: f64,
    pub direction_threshold: f64,
    pub border_threshold: f64,
}

/// `[encode]`
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSettings {
    pub batch_size: usize,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoggingSettings {
    /// Optional log file; logs go to stderr only when unset
    pub file: Option<PathBuf>,
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_DEDUP_ENABLED,
            compression_factor: DEFAULT_COMPRESSION_FACTOR,
            mean_threshold: DEFAULT_MEAN_THRESHOLD,
            direction_threshold: DEFAULT_DIRECTION_THRESHOLD,
            border_threshold: DEFAULT_BORDER_THRESHOLD,
        }
    }
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            dedup: DedupSettings::default(),
            encode: EncodeSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}
