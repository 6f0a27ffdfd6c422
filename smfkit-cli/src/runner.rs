//! CLI runner for common setup and operations.
//!
//! Encapsulates logging initialization and config loading so command
//! handlers start from the same state.

use std::path::{Path, PathBuf};

use smfkit::config::{BuildConfig, ConfigFile};
use smfkit::logging::{init_logging, LoggingGuard};
use tracing::{debug, info};

use crate::error::CliError;

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// `--log-file` wins over the config's `[logging] file`; without either,
    /// logs go to stderr only.
    pub fn new(options: &GlobalOptions) -> Result<Self, CliError> {
        let config = match &options.config {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let log_file = options
            .log_file
            .clone()
            .or_else(|| config.logging.file.clone());

        let logging_guard = init_logging(log_file.as_deref(), options.verbose)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        if let Some(path) = &options.config {
            debug!(path = %path.display(), "Loaded config");
        }

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Build settings from the config file.
    pub fn build_config(&self) -> BuildConfig {
        BuildConfig::from(&self.config)
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("smfkit v{}", smfkit::VERSION);
        debug!("smfkit CLI: {} command", command);
    }
}

/// Load an input image, mapping failures to a CLI error naming the file.
pub fn open_image(path: &Path) -> Result<image::DynamicImage, CliError> {
    image::open(path).map_err(|error| CliError::Image {
        path: path.to_path_buf(),
        error,
    })
}

/// Save an image, mapping failures to a CLI error naming the file.
pub fn save_image(image: &image::RgbaImage, path: &Path) -> Result<(), CliError> {
    image.save(path).map_err(|e| CliError::FileWrite {
        path: path.to_path_buf(),
        error: match e {
            image::ImageError::IoError(io) => io,
            other => std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
        },
    })
}
