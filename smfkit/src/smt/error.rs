//! Tile archive errors.

use crate::dxt::DxtError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by [`SmtArchive`](super::SmtArchive).
#[derive(Debug, Error)]
pub enum SmtError {
    /// I/O failure on the archive file
    #[error("Tile archive I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File does not start with the tile archive magic
    #[error("Not a tile archive (bad magic): {0}")]
    BadMagic(PathBuf),

    /// Header version is not supported
    #[error("Unsupported tile archive version {0} (expected 1)")]
    UnsupportedVersion(i32),

    /// Header tile size is not supported
    #[error("Unsupported tile size {0} (expected 32)")]
    UnsupportedTileSize(i32),

    /// Header compression type is not supported
    #[error("Unsupported compression type {0} (expected 1 = DXT1)")]
    UnsupportedCompression(i32),

    /// Target exists and overwrite was not requested
    #[error("Tile archive already exists: {0}")]
    AlreadyExists(PathBuf),

    /// Tile index beyond the archive's tile count
    #[error("Tile index {index} out of range (archive has {count} tiles)")]
    TileOutOfRange { index: u32, count: u32 },

    /// Header declares a negative tile count
    #[error("Tile archive declares a negative tile count ({0})")]
    NegativeCount(i32),

    /// Declared tile count disagrees with the file length; appending would
    /// bury or orphan tile data
    #[error("Tile archive size mismatch: header declares {declared} bytes of tiles, file holds {actual}")]
    SizeMismatch { declared: u64, actual: u64 },

    /// Archive would exceed the 32-bit tile counter
    #[error("Tile archive is full ({0} tiles)")]
    Full(u32),

    /// Tile encoding or decoding failed
    #[error("Tile codec error: {0}")]
    Codec(#[from] DxtError),
}
