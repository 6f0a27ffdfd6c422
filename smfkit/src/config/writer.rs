//! INI serialization for config.ini.

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let log_file = config
        .logging
        .file
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    format!(
        r#"[dedup]
; Merge near-duplicate tiles when building tile archives
enabled = {}
; Multiplier applied to all three thresholds below (0 disables merging)
compression_factor = {}
; Largest per-channel difference in mean colour
mean_threshold = {}
; Largest per-channel difference in the centre-weighted colour terms
direction_threshold = {}
; Largest summed squared RGB difference along the tile border
border_threshold = {}

[encode]
; Unique tiles compressed per parallel batch
batch_size = {}

[logging]
; Optional log file (in addition to stderr)
file = {}
"#,
        config.dedup.enabled,
        config.dedup.compression_factor,
        config.dedup.mean_threshold,
        config.dedup.direction_threshold,
        config.dedup.border_threshold,
        config.encode.batch_size,
        log_file,
    )
}
