//! Tile cache errors.

use crate::smf::SmfError;
use crate::smt::SmtError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TileCacheError {
    #[error("Tile {index} not found (cache holds {len} tiles)")]
    NotFound { index: u32, len: u32 },

    /// Tile belongs to an archive referenced by a map but missing on disk
    #[error("Tile {index} lives in unresolved archive {path}")]
    Unresolved { index: u32, path: PathBuf },

    /// File is neither an image, a tile archive nor a map container
    #[error("Unrecognised tile source: {0}")]
    UnknownSource(PathBuf),

    #[error("Tile cache exceeds the 32-bit tile index space")]
    Overflow,

    #[error(transparent)]
    Smt(#[from] SmtError),

    #[error(transparent)]
    Smf(#[from] SmfError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Tile cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}
