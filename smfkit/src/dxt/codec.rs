//! Surface and tile level DXT1 coding.
//!
//! A compressed tile is its mip chain compressed level by level and
//! concatenated largest first. For a 32×32 tile with 4 levels that is
//! 512 + 128 + 32 + 8 = 680 bytes, the per-tile stride of a tile archive.

use crate::dxt::bc1::{Bc1Decoder, Bc1Encoder, BC1_BLOCK_BYTES};
use crate::dxt::mipmap::MipmapGenerator;
use crate::dxt::types::DxtError;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Default tile edge length in texels.
pub const DEFAULT_TILE_SIZE: u32 = 32;

/// Default number of mip levels stored per tile.
pub const DEFAULT_TILE_MIPS: usize = 4;

/// Minimap edge length in texels.
pub const MINIMAP_SIZE: u32 = 1024;

/// Mip levels stored for the minimap (1024 down to 4).
pub const MINIMAP_MIPS: usize = 9;

/// Total compressed size of the minimap section.
pub const MINIMAP_BYTES: usize = 699_048;

/// Position of one mip level inside a compressed chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipLevel {
    /// Edge length of the level in pixels
    pub size: u32,
    /// Byte offset of the level from the start of the chain
    pub offset: usize,
    /// Compressed length of the level
    pub len: usize,
}

/// Compressed byte length of a `width × height` DXT1 surface.
pub fn surface_bytes(width: u32, height: u32) -> usize {
    width.div_ceil(4) as usize * height.div_ceil(4) as usize * BC1_BLOCK_BYTES
}

/// Locate `level` in a chain whose top level is `size × size`.
///
/// Each level halves the pixel edge and so divides the byte length by four.
pub fn mip_layout(size: u32, level: usize) -> MipLevel {
    let mut offset = 0;
    for l in 0..level {
        let s = (size >> l).max(1);
        offset += surface_bytes(s, s);
    }
    let s = (size >> level).max(1);
    MipLevel {
        size: s,
        offset,
        len: surface_bytes(s, s),
    }
}

/// Total compressed bytes of a `count`-level chain.
pub fn chain_bytes(size: u32, count: usize) -> usize {
    mip_layout(size, count).offset
}

/// Compress a whole surface block by block.
///
/// # Errors
///
/// Dimensions must be non-zero multiples of 4.
pub fn compress_image(image: &RgbaImage) -> Result<Vec<u8>, DxtError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || width % 4 != 0 || height % 4 != 0 {
        return Err(DxtError::InvalidDimensions(width, height));
    }

    let mut output = Vec::with_capacity(surface_bytes(width, height));
    for by in 0..height / 4 {
        for bx in 0..width / 4 {
            let mut block = [[0u8; 4]; 16];
            for (i, px) in block.iter_mut().enumerate() {
                let x = bx * 4 + (i as u32 % 4);
                let y = by * 4 + (i as u32 / 4);
                *px = image.get_pixel(x, y).0;
            }
            output.extend_from_slice(&Bc1Encoder::compress_block(&block));
        }
    }
    Ok(output)
}

/// Decompress a `width × height` surface.
pub fn decompress_image(data: &[u8], width: u32, height: u32) -> Result<RgbaImage, DxtError> {
    if width == 0 || height == 0 || width % 4 != 0 || height % 4 != 0 {
        return Err(DxtError::InvalidDimensions(width, height));
    }
    let expected = surface_bytes(width, height);
    if data.len() != expected {
        return Err(DxtError::BlockLength {
            expected,
            actual: data.len(),
        });
    }

    let mut image = RgbaImage::new(width, height);
    let blocks_wide = width / 4;
    for (n, chunk) in data.chunks_exact(BC1_BLOCK_BYTES).enumerate() {
        let mut block = [0u8; 8];
        block.copy_from_slice(chunk);
        let pixels = Bc1Decoder::decompress_block(&block);
        let bx = n as u32 % blocks_wide;
        let by = n as u32 / blocks_wide;
        for (i, px) in pixels.iter().enumerate() {
            image.put_pixel(bx * 4 + i as u32 % 4, by * 4 + i as u32 / 4, Rgba(*px));
        }
    }
    Ok(image)
}

/// Compress a square image together with its mip chain.
pub fn compress_chain(image: &RgbaImage, count: usize) -> Result<Vec<u8>, DxtError> {
    let mips = MipmapGenerator::generate_chain_with_count(image, count);
    if mips.len() != count {
        return Err(DxtError::MipOutOfRange {
            level: count - 1,
            count: mips.len(),
        });
    }
    let mut out = Vec::with_capacity(chain_bytes(image.width(), count));
    for mip in &mips {
        out.extend_from_slice(&compress_image(mip)?);
    }
    Ok(out)
}

/// Fixed-size tile codec: a square tile plus a fixed-length mip chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCodec {
    tile_size: u32,
    mip_count: usize,
}

impl Default for TileCodec {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            mip_count: DEFAULT_TILE_MIPS,
        }
    }
}

impl TileCodec {
    /// Create a codec for `tile_size` tiles with `mip_count` levels.
    ///
    /// The smallest level must still be at least one 4×4 block.
    pub fn new(tile_size: u32, mip_count: usize) -> Result<Self, DxtError> {
        let smallest = tile_size >> mip_count.saturating_sub(1);
        if mip_count == 0 || tile_size % 4 != 0 || smallest < 4 || smallest % 4 != 0 {
            return Err(DxtError::InvalidDimensions(tile_size, tile_size));
        }
        Ok(Self {
            tile_size,
            mip_count,
        })
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn mip_count(&self) -> usize {
        self.mip_count
    }

    /// Compressed bytes of one tile (680 for the default codec).
    pub fn tile_bytes(&self) -> usize {
        chain_bytes(self.tile_size, self.mip_count)
    }

    /// Compress a tile and its mips into one fixed-size block.
    pub fn encode(&self, tile: &RgbaImage) -> Result<Vec<u8>, DxtError> {
        if tile.dimensions() != (self.tile_size, self.tile_size) {
            return Err(DxtError::WrongTileSize {
                width: tile.width(),
                height: tile.height(),
                expected: self.tile_size,
            });
        }
        let out = compress_chain(tile, self.mip_count)?;
        debug_assert_eq!(out.len(), self.tile_bytes());
        Ok(out)
    }

    /// Decompress the full-resolution level of a tile block.
    pub fn decode(&self, block: &[u8]) -> Result<RgbaImage, DxtError> {
        self.decode_mip(block, 0)
    }

    /// Decompress one mip level of a tile block.
    pub fn decode_mip(&self, block: &[u8], level: usize) -> Result<RgbaImage, DxtError> {
        if block.len() != self.tile_bytes() {
            return Err(DxtError::BlockLength {
                expected: self.tile_bytes(),
                actual: block.len(),
            });
        }
        if level >= self.mip_count {
            return Err(DxtError::MipOutOfRange {
                level,
                count: self.mip_count,
            });
        }
        let mip = mip_layout(self.tile_size, level);
        decompress_image(&block[mip.offset..mip.offset + mip.len], mip.size, mip.size)
    }
}

/// Resize to 1024² if needed and compress with the full 9-level chain.
pub fn encode_minimap(image: &RgbaImage) -> Result<Vec<u8>, DxtError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(DxtError::InvalidDimensions(image.width(), image.height()));
    }
    let out = if image.dimensions() == (MINIMAP_SIZE, MINIMAP_SIZE) {
        compress_chain(image, MINIMAP_MIPS)?
    } else {
        let resized = imageops::resize(image, MINIMAP_SIZE, MINIMAP_SIZE, FilterType::Triangle);
        compress_chain(&resized, MINIMAP_MIPS)?
    };
    Ok(out)
}

/// Decompress the top level of a minimap section.
pub fn decode_minimap(data: &[u8]) -> Result<RgbaImage, DxtError> {
    if data.len() != MINIMAP_BYTES {
        return Err(DxtError::BlockLength {
            expected: MINIMAP_BYTES,
            actual: data.len(),
        });
    }
    let top = mip_layout(MINIMAP_SIZE, 0);
    decompress_image(&data[..top.len], MINIMAP_SIZE, MINIMAP_SIZE)
}
