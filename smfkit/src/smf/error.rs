//! Map container errors.

use super::section::Section;
use crate::dxt::DxtError;
use crate::filemap::OverlapError;
use crate::tilemap::TileMapError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by [`SmfContainer`](super::SmfContainer).
#[derive(Debug, Error)]
pub enum SmfError {
    #[error("Map container I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File does not start with the map container magic
    #[error("Not a map container (bad magic): {0}")]
    NotAContainer(PathBuf),

    #[error("Unsupported map container version {0} (expected 1)")]
    UnsupportedVersion(i32),

    #[error("Unsupported map tile size {0} (expected 32)")]
    UnsupportedTileSize(i32),

    #[error("Map container already exists: {0}")]
    AlreadyExists(PathBuf),

    /// Opened container written before its sections were read
    #[error("Map container {0} was opened but not read; refusing to overwrite its sections")]
    NotLoaded(PathBuf),

    /// Section extends past the end of the file
    #[error("Section {section} at offset {offset} runs past end of file ({file_len} bytes)")]
    Truncated {
        section: &'static str,
        offset: u64,
        file_len: u64,
    },

    /// Extension header declares an impossible byte size
    #[error("Extension {index} declares invalid size {size}")]
    BadExtension { index: usize, size: i32 },

    #[error("Invalid map size {width}×{length} squares: {reason}")]
    InvalidSize {
        width: i64,
        length: i64,
        reason: &'static str,
    },

    #[error("Invalid height range: min {min} must be below max {max}")]
    InvalidHeightRange { min: f32, max: f32 },

    /// Feature record names a type that is not in the type table
    #[error("Feature {index} has type {type_index}, but only {count} types are defined")]
    FeatureTypeOutOfRange {
        index: usize,
        type_index: i32,
        count: usize,
    },

    #[error("Feature CSV line {line}: {reason}")]
    FeatureCsv { line: usize, reason: String },

    #[error("Tile map is {actual_width}×{actual_height}, map needs {width}×{height}")]
    TileMapSize {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("{0} is not a raster section")]
    NotRaster(Section),

    /// Section disabled for this container (e.g. grass without vegetation)
    #[error("Section {0} is not present in this map")]
    Absent(Section),

    #[error("Raster {section} is {actual} bytes, expected {expected}")]
    RasterLength {
        section: Section,
        expected: u64,
        actual: u64,
    },

    /// Computed layout aliases two sections
    #[error("Layout error: {0}")]
    Overlap(#[from] OverlapError),

    /// A section offset does not fit the 32-bit pointer fields
    #[error("Section {section} at offset {offset} does not fit a 32-bit pointer")]
    TooLarge { section: &'static str, offset: u64 },

    #[error(transparent)]
    TileMap(#[from] TileMapError),

    #[error("Minimap codec error: {0}")]
    Codec(#[from] DxtError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
