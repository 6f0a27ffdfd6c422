//! DXT codec error type.

use thiserror::Error;

/// Errors raised while compressing or decompressing DXT1 data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DxtError {
    /// Surface dimensions are zero or not a multiple of the 4×4 block size
    #[error("Invalid dimensions: {0}×{1}")]
    InvalidDimensions(u32, u32),

    /// Image handed to a tile codec does not match its tile size
    #[error("Tile is {width}×{height}, expected {expected}×{expected}")]
    WrongTileSize {
        width: u32,
        height: u32,
        expected: u32,
    },

    /// Compressed buffer has the wrong length for its declared layout
    #[error("Compressed data is {actual} bytes, expected {expected}")]
    BlockLength { expected: usize, actual: usize },

    /// Requested mip level does not exist in the chain
    #[error("Mip level {level} out of range (chain has {count} levels)")]
    MipOutOfRange { level: usize, count: usize },
}
