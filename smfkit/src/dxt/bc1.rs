//! BC1/DXT1 block compression and decompression.
//!
//! A BC1 block stores a 4×4 pixel region in 8 bytes:
//! - 2 bytes: color0 (RGB565, little-endian)
//! - 2 bytes: color1 (RGB565, little-endian)
//! - 4 bytes: sixteen 2-bit palette indices, pixel 0 in the lowest bits
//!
//! See [`bc1_palette`] for how the endpoints expand into four colours.

use crate::dxt::conversion::{bc1_palette, color_distance_squared, rgb888_to_rgb565};

/// Bytes in one compressed 4×4 block.
pub const BC1_BLOCK_BYTES: usize = 8;

/// BC1 block encoder.
pub struct Bc1Encoder;

impl Bc1Encoder {
    /// Compress sixteen RGBA pixels (row-major) into one block.
    ///
    /// Endpoints come from the colour bounding box. Distinct endpoints are
    /// ordered `color0 > color1` so the block decodes in four-colour mode.
    /// Alpha is ignored: tiles are opaque.
    pub fn compress_block(pixels: &[[u8; 4]; 16]) -> [u8; 8] {
        let (max, min) = Self::find_endpoints(pixels);
        let (c0, c1) = if max >= min { (max, min) } else { (min, max) };

        let indices = Self::generate_indices(pixels, c0, c1);

        let mut output = [0u8; 8];
        output[0..2].copy_from_slice(&c0.to_le_bytes());
        output[2..4].copy_from_slice(&c1.to_le_bytes());
        output[4..8].copy_from_slice(&indices.to_le_bytes());
        output
    }

    /// Bounding-box endpoints as (max, min) RGB565 values.
    fn find_endpoints(pixels: &[[u8; 4]; 16]) -> (u16, u16) {
        let mut lo = [255u8; 3];
        let mut hi = [0u8; 3];
        for p in pixels {
            for c in 0..3 {
                lo[c] = lo[c].min(p[c]);
                hi[c] = hi[c].max(p[c]);
            }
        }
        (
            rgb888_to_rgb565(hi[0], hi[1], hi[2]),
            rgb888_to_rgb565(lo[0], lo[1], lo[2]),
        )
    }

    /// Pick the nearest palette entry for every pixel.
    ///
    /// In three-colour mode (equal endpoints) entry 3 is transparent and is
    /// never chosen for an opaque tile.
    fn generate_indices(pixels: &[[u8; 4]; 16], c0: u16, c1: u16) -> u32 {
        let palette = bc1_palette(c0, c1);
        let usable = if c0 > c1 { 4 } else { 3 };

        let mut indices = 0u32;
        for (i, pixel) in pixels.iter().enumerate() {
            let mut best = 0usize;
            let mut best_dist = u32::MAX;
            for (idx, entry) in palette.iter().take(usable).enumerate() {
                let dist = color_distance_squared(pixel, entry);
                if dist < best_dist {
                    best_dist = dist;
                    best = idx;
                }
            }
            indices |= (best as u32) << (i * 2);
        }
        indices
    }
}

/// BC1 block decoder.
pub struct Bc1Decoder;

impl Bc1Decoder {
    /// Expand one 8-byte block into sixteen RGBA pixels (row-major).
    pub fn decompress_block(block: &[u8; 8]) -> [[u8; 4]; 16] {
        let c0 = u16::from_le_bytes([block[0], block[1]]);
        let c1 = u16::from_le_bytes([block[2], block[3]]);
        let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
        let palette = bc1_palette(c0, c1);

        let mut pixels = [[0u8; 4]; 16];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = palette[((indices >> (i * 2)) & 0x3) as usize];
        }
        pixels
    }
}

#[cfg(test)]
#[allow(clippy::needless_range_loop)]
mod tests {
    use super::*;
    use crate::dxt::conversion::rgb565_to_rgb888;

    fn endpoints(block: &[u8; 8]) -> (u16, u16) {
        (
            u16::from_le_bytes([block[0], block[1]]),
            u16::from_le_bytes([block[2], block[3]]),
        )
    }

    #[test]
    fn test_solid_colour_roundtrips_exactly() {
        for colour in [[0u8, 0, 0, 255], [255, 255, 255, 255], [255, 0, 0, 255]] {
            let block = Bc1Encoder::compress_block(&[colour; 16]);
            let pixels = Bc1Decoder::decompress_block(&block);
            for p in pixels {
                assert_eq!(p, colour);
            }
        }
    }

    #[test]
    fn test_solid_colour_uses_index_zero() {
        let block = Bc1Encoder::compress_block(&[[100, 150, 200, 255]; 16]);
        let (c0, c1) = endpoints(&block);
        assert_eq!(c0, c1);
        assert_eq!(&block[4..8], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_two_colours_select_endpoints() {
        let mut pixels = [[0u8, 0, 0, 255]; 16];
        for i in 8..16 {
            pixels[i] = [255, 255, 255, 255];
        }
        let block = Bc1Encoder::compress_block(&pixels);
        let (c0, c1) = endpoints(&block);
        assert_eq!((c0, c1), (0xFFFF, 0x0000));

        let decoded = Bc1Decoder::decompress_block(&block);
        for i in 0..8 {
            assert_eq!(decoded[i], [0, 0, 0, 255]);
        }
        for i in 8..16 {
            assert_eq!(decoded[i], [255, 255, 255, 255]);
        }
    }

    #[test]
    fn test_gradient_is_four_colour_mode() {
        let mut pixels = [[0u8, 0, 0, 255]; 16];
        for i in 0..16 {
            let v = (i * 255 / 15) as u8;
            pixels[i] = [v, v, v, 255];
        }
        let block = Bc1Encoder::compress_block(&pixels);
        let (c0, c1) = endpoints(&block);
        assert!(c0 > c1, "c0 {:04X} should exceed c1 {:04X}", c0, c1);

        let decoded = Bc1Decoder::decompress_block(&block);
        for i in 0..16 {
            let err = (decoded[i][0] as i16 - pixels[i][0] as i16).abs();
            assert!(err <= 48, "pixel {} off by {}", i, err);
        }
    }

    #[test]
    fn test_decoder_four_colour_branch() {
        // c0 = white, c1 = black, indices 0,1,2,3 repeated
        let block = [0xFF, 0xFF, 0x00, 0x00, 0xE4, 0xE4, 0xE4, 0xE4];
        let pixels = Bc1Decoder::decompress_block(&block);
        assert_eq!(pixels[0], [255, 255, 255, 255]);
        assert_eq!(pixels[1], [0, 0, 0, 255]);
        assert_eq!(pixels[2], [170, 170, 170, 255]);
        assert_eq!(pixels[3], [85, 85, 85, 255]);
    }

    #[test]
    fn test_decoder_three_colour_branch() {
        // c0 = black < c1 = white: code 2 is the midpoint, code 3 transparent
        let block = [0x00, 0x00, 0xFF, 0xFF, 0xE4, 0xE4, 0xE4, 0xE4];
        let pixels = Bc1Decoder::decompress_block(&block);
        assert_eq!(pixels[0], [0, 0, 0, 255]);
        assert_eq!(pixels[1], [255, 255, 255, 255]);
        assert_eq!(pixels[2], [127, 127, 127, 255]);
        assert_eq!(pixels[3], [0, 0, 0, 0]);
    }

    #[test]
    fn test_find_endpoints_covers_all_channels() {
        let mut pixels = [[0u8, 0, 0, 255]; 16];
        pixels[0] = [255, 0, 0, 255];
        pixels[1] = [0, 255, 0, 255];
        pixels[2] = [0, 0, 255, 255];
        let (max, min) = Bc1Encoder::find_endpoints(&pixels);
        assert_eq!(rgb565_to_rgb888(max), [255, 255, 255]);
        assert_eq!(rgb565_to_rgb888(min), [0, 0, 0]);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let mut pixels = [[0u8; 4]; 16];
        for i in 0..16 {
            pixels[i] = [(i * 13) as u8, (i * 7) as u8, (255 - i * 11) as u8, 255];
        }
        assert_eq!(
            Bc1Encoder::compress_block(&pixels),
            Bc1Encoder::compress_block(&pixels)
        );
    }
}
