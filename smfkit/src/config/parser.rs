//! INI parsing: the single place where key names map to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::defaults::MAX_BATCH_SIZE;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [dedup] section
    if let Some(section) = ini.section(Some("dedup")) {
        if let Some(v) = section.get("enabled") {
            config.dedup.enabled = parse_bool("dedup", "enabled", v)?;
        }
        if let Some(v) = section.get("compression_factor") {
            config.dedup.compression_factor = parse_non_negative("dedup", "compression_factor", v)?;
        }
        if let Some(v) = section.get("mean_threshold") {
            config.dedup.mean_threshold = parse_non_negative("dedup", "mean_threshold", v)?;
        }
        if let Some(v) = section.get("direction_threshold") {
            config.dedup.direction_threshold =
                parse_non_negative("dedup", "direction_threshold", v)?;
        }
        if let Some(v) = section.get("border_threshold") {
            config.dedup.border_threshold = parse_non_negative("dedup", "border_threshold", v)?;
        }
    }

    // [encode] section
    if let Some(section) = ini.section(Some("encode")) {
        if let Some(v) = section.get("batch_size") {
            config.encode.batch_size = v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=MAX_BATCH_SIZE).contains(n))
                .ok_or_else(|| ConfigFileError::InvalidValue {
                    section: "encode".to_string(),
                    key: "batch_size".to_string(),
                    value: v.to_string(),
                    reason: format!("must be an integer between 1 and {}", MAX_BATCH_SIZE),
                })?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            config.logging.file = if v.is_empty() {
                None
            } else {
                Some(expand_tilde(v))
            };
        }
    }

    Ok(config)
}

fn parse_bool(section: &str, key: &str, v: &str) -> Result<bool, ConfigFileError> {
    match v.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: v.to_string(),
            reason: "must be true or false".to_string(),
        }),
    }
}

fn parse_non_negative(section: &str, key: &str, v: &str) -> Result<f64, ConfigFileError> {
    v.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0)
        .ok_or_else(|| ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: v.to_string(),
            reason: "must be a non-negative number".to_string(),
        })
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ConfigFile, ConfigFileError> {
        parse_ini(&Ini::load_from_str(text).unwrap())
    }

    #[test]
    fn test_overlays_defaults() {
        let config = parse("[dedup]\nenabled = no\nborder_threshold = 1200\n").unwrap();
        assert!(!config.dedup.enabled);
        assert_eq!(config.dedup.border_threshold, 1200.0);
        assert_eq!(config.dedup.mean_threshold, 2.0);
    }

    #[test]
    fn test_rejects_negative_factor() {
        assert!(parse("[dedup]\ncompression_factor = -1\n").is_err());
    }

    #[test]
    fn test_rejects_bad_batch_size() {
        assert!(parse("[encode]\nbatch_size = 0\n").is_err());
        assert!(parse("[encode]\nbatch_size = many\n").is_err());
        assert_eq!(parse("[encode]\nbatch_size = 32\n").unwrap().encode.batch_size, 32);
    }

    #[test]
    fn test_empty_log_file_is_none() {
        assert!(parse("[logging]\nfile =\n").unwrap().logging.file.is_none());
    }
}
