//! SMT tile archives.
//!
//! An archive is a 32-byte header followed by `tile_count` fixed-size DXT1
//! tile blocks (680 bytes each for 32×32 tiles with 4 mips). Tiles are only
//! ever appended; a tile's index never changes once written.
//!
//! # Example
//!
//! ```no_run
//! use image::RgbaImage;
//! use smfkit::smt::SmtArchive;
//!
//! let mut archive = SmtArchive::create("map.smt", true)?;
//! let index = archive.append_tile(&RgbaImage::new(32, 32))?;
//! let tile = archive.get_tile(index)?;
//! # Ok::<(), smfkit::smt::SmtError>(())
//! ```

mod archive;
mod error;
mod header;

pub use archive::{RepairReport, SizeCheck, SmtArchive};
pub use error::SmtError;
pub use header::{is_smt, SmtHeader, COMPRESSION_DXT1, SMT_HEADER_BYTES, SMT_MAGIC, SMT_VERSION};
