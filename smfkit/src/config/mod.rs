//! Configuration: per-build tunables and the user config file.
//!
//! # Example
//!
//! ```no_run
//! use smfkit::config::{BuildConfig, ConfigFile};
//!
//! let file = ConfigFile::load()?;
//! let build = BuildConfig::from(&file).with_dedup(false);
//! # Ok::<(), smfkit::config::ConfigFileError>(())
//! ```

mod build;
pub mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use build::BuildConfig;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, DedupSettings, EncodeSettings, LoggingSettings};
