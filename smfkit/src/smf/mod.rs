//! SMF map containers.
//!
//! A container is a fixed 80-byte header, a list of extension records, and a
//! sequence of sections whose offsets the header records:
//!
//! ```text
//! header │ extensions │ height │ type │ tile index │ minimap │ metal │ features │ grass
//! ```
//!
//! Every section size is derived from the map dimensions (plus the archive
//! list and feature table for the two variable sections), and every offset is
//! derived from the sizes before it. See [`Layout`].
//!
//! # Example
//!
//! ```no_run
//! use smfkit::smf::{Components, SmfContainer};
//!
//! let mut map = SmfContainer::create("island.smf", true)?;
//! map.set_size(8, 8)?;
//! map.set_height_range(-50.0, 300.0)?;
//! map.add_archive("island.smt", 1)?;
//! map.write(Components::ALL)?;
//! # Ok::<(), smfkit::smf::SmfError>(())
//! ```

mod container;
mod error;
mod extension;
mod features;
mod header;
mod layout;
mod raster;
mod section;
mod tiles;

pub use container::{PointerMismatch, ReadReport, SmfContainer, SQUARES_PER_UNIT};
pub use error::SmfError;
pub use extension::{Extension, EXTENSION_VEGETATION};
pub use features::{Feature, FeatureList};
pub use header::{is_smf, SmfHeader, SMF_HEADER_BYTES, SMF_MAGIC, SMF_VERSION};
pub use layout::Layout;
pub use raster::{
    dequantize_height, quantize_height, raster_from_image, raster_to_image, BlankIo, Gray16Image,
    ImageIo, RasterIo, RasterRequest,
};
pub use section::{Components, RasterFormat, RasterSpec, Section};
pub use tiles::{total_tiles, ArchiveRef};
