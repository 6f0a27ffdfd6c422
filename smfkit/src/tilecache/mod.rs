//! Global tile lookup across several sources.
//!
//! Images, tile archives and map containers are registered in order; each
//! occupies the next contiguous range of tile indices. A map container
//! contributes the archives it lists, in its own order, so the map's tile
//! indices resolve to the same tiles here.

mod cache;
mod error;

pub use cache::{SourceKind, TileCache, TileSource};
pub use error::TileCacheError;
