//! Border comparison.

use image::RgbaImage;

/// Perimeter pixels of a tile in row-major order, RGB only.
///
/// The top and bottom rows contribute every pixel; rows in between contribute
/// their first and last pixel.
pub fn border_ring(tile: &RgbaImage) -> Vec<[u8; 3]> {
    let (width, height) = tile.dimensions();
    let mut ring = Vec::with_capacity(2 * (width + height) as usize);
    for y in 0..height {
        if y == 0 || y + 1 == height {
            for x in 0..width {
                let p = tile.get_pixel(x, y).0;
                ring.push([p[0], p[1], p[2]]);
            }
        } else {
            for x in [0, width.saturating_sub(1)] {
                let p = tile.get_pixel(x, y).0;
                ring.push([p[0], p[1], p[2]]);
            }
            if width == 1 {
                ring.pop();
            }
        }
    }
    ring
}

/// Compare two border rings, stopping once the running sum of squared
/// channel differences reaches `threshold`.
pub fn compare_borders(a: &[[u8; 3]], b: &[[u8; 3]], threshold: f64) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut sum = 0.0;
    for (pa, pb) in a.iter().zip(b) {
        for c in 0..3 {
            let d = pa[c] as f64 - pb[c] as f64;
            sum += d * d;
        }
        if sum >= threshold {
            return false;
        }
    }
    sum < threshold
}

/// Whether two tiles match along their perimeter.
///
/// Interior pixels are never inspected: two tiles with equal borders compare
/// equal whatever their centres hold.
pub fn compare_tiles(a: &RgbaImage, b: &RgbaImage, border_threshold: f64) -> bool {
    if a.dimensions() != b.dimensions() {
        return false;
    }
    compare_borders(&border_ring(a), &border_ring(b), border_threshold)
}
