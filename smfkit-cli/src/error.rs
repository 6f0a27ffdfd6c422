//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use smfkit::config::ConfigFileError;
use smfkit::pipeline::PipelineError;
use smfkit::smf::SmfError;
use smfkit::smt::SmtError;
use smfkit::tilemap::TileMapError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Bad combination of command-line arguments
    InvalidArgument(String),
    /// Compile or decompile failed
    Pipeline(PipelineError),
    /// Map container error
    Smf(SmfError),
    /// Tile archive error
    Smt(SmtError),
    /// Tile map error
    TileMap(TileMapError),
    /// Failed to read an input image
    Image { path: PathBuf, error: image::ImageError },
    /// Failed to write output file
    FileWrite { path: PathBuf, error: std::io::Error },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Smt(SmtError::AlreadyExists(_))
            | CliError::Smf(SmfError::AlreadyExists(_))
            | CliError::Pipeline(PipelineError::Smf(SmfError::AlreadyExists(_)))
            | CliError::Pipeline(PipelineError::Smt(SmtError::AlreadyExists(_))) => {
                eprintln!();
                eprintln!("Pass --overwrite to replace the existing file.");
            }
            CliError::Smt(SmtError::SizeMismatch { .. })
            | CliError::Pipeline(PipelineError::Smt(SmtError::SizeMismatch { .. })) => {
                eprintln!();
                eprintln!("Run 'smfkit smt repair <archive>' to fix the tile count first.");
            }
            CliError::Pipeline(PipelineError::NotTileAligned { .. }) => {
                eprintln!();
                eprintln!("The diffuse image must be 512 pixels per map unit in each direction.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::InvalidArgument(msg) => write!(f, "{}", msg),
            CliError::Pipeline(e) => write!(f, "{}", e),
            CliError::Smf(e) => write!(f, "{}", e),
            CliError::Smt(e) => write!(f, "{}", e),
            CliError::TileMap(e) => write!(f, "{}", e),
            CliError::Image { path, error } => {
                write!(f, "Failed to read image '{}': {}", path.display(), error)
            }
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Pipeline(e) => Some(e),
            CliError::Smf(e) => Some(e),
            CliError::Smt(e) => Some(e),
            CliError::TileMap(e) => Some(e),
            CliError::Image { error, .. } => Some(error),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Pipeline(e)
    }
}

impl From<SmfError> for CliError {
    fn from(e: SmfError) -> Self {
        CliError::Smf(e)
    }
}

impl From<SmtError> for CliError {
    fn from(e: SmtError) -> Self {
        CliError::Smt(e)
    }
}

impl From<TileMapError> for CliError {
    fn from(e: TileMapError) -> Self {
        CliError::TileMap(e)
    }
}
