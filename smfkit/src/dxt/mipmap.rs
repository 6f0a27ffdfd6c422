//! Box-filtered mip chains.

use image::{Rgba, RgbaImage};

/// Mip chain generator.
pub struct MipmapGenerator;

impl MipmapGenerator {
    /// Build `count` levels starting with `source` itself.
    ///
    /// Stops early once a level reaches 1 pixel on either side, so the
    /// result may be shorter than requested.
    pub fn generate_chain_with_count(source: &RgbaImage, count: usize) -> Vec<RgbaImage> {
        let mut chain = Vec::with_capacity(count);
        if count == 0 {
            return chain;
        }
        chain.push(source.clone());

        while chain.len() < count {
            let Some(last) = chain.last() else { break };
            if last.width() <= 1 || last.height() <= 1 {
                break;
            }
            let next = Self::downsample_box_2x(last);
            chain.push(next);
        }
        chain
    }

    /// Halve both dimensions, each output pixel the rounded mean of a 2×2 block.
    pub fn downsample_box_2x(source: &RgbaImage) -> RgbaImage {
        let width = (source.width() / 2).max(1);
        let height = (source.height() / 2).max(1);

        RgbaImage::from_fn(width, height, |x, y| {
            let x0 = (x * 2).min(source.width() - 1);
            let y0 = (y * 2).min(source.height() - 1);
            let x1 = (x0 + 1).min(source.width() - 1);
            let y1 = (y0 + 1).min(source.height() - 1);
            let quad = [
                source.get_pixel(x0, y0),
                source.get_pixel(x1, y0),
                source.get_pixel(x0, y1),
                source.get_pixel(x1, y1),
            ];
            let mut out = [0u8; 4];
            for (c, slot) in out.iter_mut().enumerate() {
                let sum: u16 = quad.iter().map(|p| p[c] as u16).sum();
                *slot = ((sum + 2) / 4) as u8;
            }
            Rgba(out)
        })
    }
}
