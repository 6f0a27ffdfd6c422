//! Pipeline errors.

use crate::dxt::DxtError;
use crate::smf::SmfError;
use crate::smt::SmtError;
use crate::tilecache::TileCacheError;
use crate::tilemap::TileMapError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while compiling or decompiling a map.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source image dimensions are not a whole number of tiles
    #[error("Image is {width}×{height}, not a multiple of the {tile_size}px tile size")]
    NotTileAligned {
        width: u32,
        height: u32,
        tile_size: u32,
    },

    /// Reused tile map points past the end of the reused archive
    #[error("Tile map references tile {max_index} but {archive} has only {tile_count} tiles")]
    TileMapExceedsArchive {
        max_index: u32,
        tile_count: u32,
        archive: PathBuf,
    },

    /// Invalid combination of job inputs
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Smf(#[from] SmfError),

    #[error(transparent)]
    Smt(#[from] SmtError),

    #[error(transparent)]
    TileMap(#[from] TileMapError),

    #[error(transparent)]
    TileCache(#[from] TileCacheError),

    #[error("Tile codec error: {0}")]
    Codec(#[from] DxtError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
