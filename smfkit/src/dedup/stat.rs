//! Tile fingerprints.

use image::RgbaImage;

/// Nine-term colour fingerprint of a tile.
///
/// `mean` is the per-channel average colour. `dir_x` and `dir_y` are the
/// per-channel averages weighted by the pixel's signed distance from the tile
/// centre along each axis, so they capture which way the colour mass leans.
/// All sums are divided by the pixel count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FastStat {
    pub mean: [f64; 3],
    pub dir_x: [f64; 3],
    pub dir_y: [f64; 3],
}

impl FastStat {
    pub fn of(tile: &RgbaImage) -> Self {
        let (width, height) = tile.dimensions();
        let count = (width as f64 * height as f64).max(1.0);
        let cx = (width as f64 - 1.0) / 2.0;
        let cy = (height as f64 - 1.0) / 2.0;

        let mut mean = [0.0; 3];
        let mut dir_x = [0.0; 3];
        let mut dir_y = [0.0; 3];
        for (x, y, px) in tile.enumerate_pixels() {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            for c in 0..3 {
                let v = px.0[c] as f64;
                mean[c] += v;
                dir_x[c] += v * dx;
                dir_y[c] += v * dy;
            }
        }
        for c in 0..3 {
            mean[c] /= count;
            dir_x[c] /= count;
            dir_y[c] /= count;
        }

        Self { mean, dir_x, dir_y }
    }

    /// Whether every term lies strictly within its threshold of `other`.
    pub fn is_close(&self, other: &FastStat, mean_threshold: f64, direction_threshold: f64) -> bool {
        (0..3).all(|c| {
            (self.mean[c] - other.mean[c]).abs() < mean_threshold
                && (self.dir_x[c] - other.dir_x[c]).abs() < direction_threshold
                && (self.dir_y[c] - other.dir_y[c]).abs() < direction_threshold
        })
    }
}
