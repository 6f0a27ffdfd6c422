//! DXT1 (BC1) texture coding for tiles and the minimap.
//!
//! # Layout
//!
//! - Block: 8 bytes per 4×4 pixels, two RGB565 endpoints plus 2-bit indices
//! - Tile: a square image and a fixed number of box-filtered mips,
//!   concatenated largest first (`680` bytes for 32×32 with 4 levels)
//! - Minimap: 1024×1024 with 9 levels, `699048` bytes
//!
//! # Example
//!
//! ```
//! use image::{Rgba, RgbaImage};
//! use smfkit::dxt::TileCodec;
//!
//! let codec = TileCodec::default();
//! let tile = RgbaImage::from_pixel(32, 32, Rgba([255, 0, 0, 255]));
//! let block = codec.encode(&tile).unwrap();
//! assert_eq!(block.len(), 680);
//! assert_eq!(codec.decode(&block).unwrap(), tile);
//! ```

mod bc1;
mod codec;
mod conversion;
mod mipmap;
mod types;

pub use bc1::{Bc1Decoder, Bc1Encoder, BC1_BLOCK_BYTES};
pub use codec::{
    chain_bytes, compress_chain, compress_image, decode_minimap, decompress_image,
    encode_minimap, mip_layout, surface_bytes, MipLevel, TileCodec, DEFAULT_TILE_MIPS,
    DEFAULT_TILE_SIZE, MINIMAP_BYTES, MINIMAP_MIPS, MINIMAP_SIZE,
};
pub use conversion::{bc1_palette, rgb565_to_rgb888, rgb888_to_rgb565};
pub use mipmap::MipmapGenerator;
pub use types::DxtError;
