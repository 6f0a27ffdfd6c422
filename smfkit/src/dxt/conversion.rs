//! RGB565 packing and palette arithmetic shared by the BC1 encoder and decoder.

/// Pack an 8-bit-per-channel colour into RGB565.
///
/// Bits 15-11 red, 10-5 green, 4-0 blue. Channels are truncated, matching
/// the bounding-box endpoint search.
pub fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

/// Expand RGB565 to 8 bits per channel, replicating the high bits into the
/// low ones so that 0x1F maps to 255.
pub fn rgb565_to_rgb888(color: u16) -> [u8; 3] {
    let r5 = (color >> 11) & 0x1F;
    let g6 = (color >> 5) & 0x3F;
    let b5 = color & 0x1F;
    [
        ((r5 << 3) | (r5 >> 2)) as u8,
        ((g6 << 2) | (g6 >> 4)) as u8,
        ((b5 << 3) | (b5 >> 2)) as u8,
    ]
}

/// Weighted squared distance between a pixel and a palette entry.
///
/// Green is weighted highest, blue lowest (R=3, G=6, B=1).
pub fn color_distance_squared(a: &[u8; 4], b: &[u8; 4]) -> u32 {
    let dr = (a[0] as i32 - b[0] as i32) * 3;
    let dg = (a[1] as i32 - b[1] as i32) * 6;
    let db = a[2] as i32 - b[2] as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Build the four-entry BC1 palette for a pair of endpoints.
///
/// When `c0 > c1` the block is in four-colour mode: entries 2 and 3 are the
/// 2:1 and 1:2 blends. Otherwise the block is in three-colour mode: entry 2
/// is the 1:1 blend and entry 3 is transparent black.
pub fn bc1_palette(c0: u16, c1: u16) -> [[u8; 4]; 4] {
    let a = rgb565_to_rgb888(c0);
    let b = rgb565_to_rgb888(c1);
    let opaque = |c: [u8; 3]| [c[0], c[1], c[2], 255];

    if c0 > c1 {
        let blend = |wa: u16, wb: u16| {
            let mix = |i: usize| ((wa * a[i] as u16 + wb * b[i] as u16) / 3) as u8;
            [mix(0), mix(1), mix(2), 255]
        };
        [opaque(a), opaque(b), blend(2, 1), blend(1, 2)]
    } else {
        let half = |i: usize| ((a[i] as u16 + b[i] as u16) / 2) as u8;
        [opaque(a), opaque(b), [half(0), half(1), half(2), 255], [0, 0, 0, 0]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb565_primaries() {
        assert_eq!(rgb888_to_rgb565(0, 0, 0), 0x0000);
        assert_eq!(rgb888_to_rgb565(255, 255, 255), 0xFFFF);
        assert_eq!(rgb888_to_rgb565(255, 0, 0), 0xF800);
        assert_eq!(rgb888_to_rgb565(0, 255, 0), 0x07E0);
        assert_eq!(rgb888_to_rgb565(0, 0, 255), 0x001F);
    }

    #[test]
    fn test_rgb565_expansion_hits_extremes() {
        assert_eq!(rgb565_to_rgb888(0xFFFF), [255, 255, 255]);
        assert_eq!(rgb565_to_rgb888(0x0000), [0, 0, 0]);
        assert_eq!(rgb565_to_rgb888(0xF800), [255, 0, 0]);
    }

    #[test]
    fn test_rgb565_precision_loss_is_bounded() {
        for v in [0u8, 17, 64, 123, 200, 254, 255] {
            let back = rgb565_to_rgb888(rgb888_to_rgb565(v, v, v));
            assert!((v as i16 - back[0] as i16).abs() <= 7, "red {v} -> {}", back[0]);
            assert!((v as i16 - back[1] as i16).abs() <= 3, "green {v} -> {}", back[1]);
            assert!((v as i16 - back[2] as i16).abs() <= 7, "blue {v} -> {}", back[2]);
        }
    }

    #[test]
    fn test_four_colour_palette() {
        let white = 0xFFFF;
        let black = 0x0000;
        let p = bc1_palette(white, black);
        assert_eq!(p[0], [255, 255, 255, 255]);
        assert_eq!(p[1], [0, 0, 0, 255]);
        assert_eq!(p[2], [170, 170, 170, 255]);
        assert_eq!(p[3], [85, 85, 85, 255]);
    }

    #[test]
    fn test_three_colour_palette_has_transparent_entry() {
        let p = bc1_palette(0x0000, 0xFFFF);
        assert_eq!(p[2], [127, 127, 127, 255]);
        assert_eq!(p[3], [0, 0, 0, 0]);
    }

    #[test]
    fn test_equal_endpoints_use_three_colour_mode() {
        let red = rgb888_to_rgb565(255, 0, 0);
        let p = bc1_palette(red, red);
        assert_eq!(p[2], [255, 0, 0, 255]);
        assert_eq!(p[3][3], 0);
    }

    #[test]
    fn test_distance_weights_green_over_blue() {
        let black = [0, 0, 0, 255];
        assert!(
            color_distance_squared(&black, &[0, 100, 0, 255])
                > color_distance_squared(&black, &[0, 0, 100, 255])
        );
        assert_eq!(color_distance_squared(&black, &black), 0);
    }
}
