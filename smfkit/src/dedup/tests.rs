use super::*;
use image::{Rgba, RgbaImage};

fn solid(r: u8, g: u8, b: u8) -> RgbaImage {
    RgbaImage::from_pixel(32, 32, Rgba([r, g, b, 255]))
}

/// Grey tile with white dots at the given interior positions.
fn dotted(dots: &[(u32, u32)]) -> RgbaImage {
    let mut tile = solid(100, 100, 100);
    for &(x, y) in dots {
        tile.put_pixel(x, y, Rgba([255, 255, 255, 255]));
    }
    tile
}

#[test]
fn test_fast_stat_of_solid_tile() {
    let stat = FastStat::of(&solid(10, 20, 30));
    assert_eq!(stat.mean, [10.0, 20.0, 30.0]);
    for c in 0..3 {
        assert!(stat.dir_x[c].abs() < 1e-9);
        assert!(stat.dir_y[c].abs() < 1e-9);
    }
}

#[test]
fn test_fast_stat_direction_sign() {
    // Bright right half leans positive on x, neutral on y
    let tile = RgbaImage::from_fn(32, 32, |x, _| {
        if x >= 16 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    });
    let stat = FastStat::of(&tile);
    assert!(stat.dir_x[0] > 0.0);
    assert!(stat.dir_y[0].abs() < 1e-9);
}

#[test]
fn test_thresholds_scale_with_factor() {
    let t = DedupThresholds::from_factor(DedupThresholds::default(), 2.5);
    assert_eq!(t.mean, 5.0);
    assert_eq!(t.direction, 10.0);
    assert_eq!(t.border, 15000.0);
}

#[test]
fn test_border_ring_length() {
    assert_eq!(border_ring(&solid(0, 0, 0)).len(), 124);
}

#[test]
fn test_compare_tiles_ignores_interior() {
    let a = dotted(&[(10, 10), (21, 21)]);
    let b = dotted(&[(10, 21), (21, 10)]);
    assert_ne!(a, b);
    assert!(compare_tiles(&a, &b, 1.0));
}

#[test]
fn test_compare_tiles_is_strict() {
    let a = solid(0, 0, 0);
    let mut b = solid(0, 0, 0);
    // One border pixel differs by 10 on red: squared difference 100
    b.put_pixel(0, 0, Rgba([10, 0, 0, 255]));
    assert!(!compare_tiles(&a, &b, 100.0));
    assert!(compare_tiles(&a, &b, 100.5));
}

#[test]
fn test_compare_tiles_rejects_size_mismatch() {
    let small = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]));
    assert!(!compare_tiles(&solid(0, 0, 0), &small, f64::MAX));
}

#[test]
fn test_identical_tiles_dedup() {
    let mut dedup = TileDeduplicator::new(DedupThresholds::default());
    let tile = solid(90, 140, 60);
    assert_eq!(dedup.dedup(&tile), DedupOutcome::Unique(0));
    assert_eq!(dedup.dedup(&tile.clone()), DedupOutcome::Reused(0));
    assert_eq!(dedup.len(), 1);
}

#[test]
fn test_equal_borders_with_different_interiors_dedup() {
    let mut dedup = TileDeduplicator::new(DedupThresholds::default());
    let a = dotted(&[(10, 10), (21, 21)]);
    let b = dotted(&[(10, 21), (21, 10)]);
    assert_eq!(FastStat::of(&a), FastStat::of(&b));
    assert_eq!(dedup.dedup(&a), DedupOutcome::Unique(0));
    assert_eq!(dedup.dedup(&b), DedupOutcome::Reused(0));
}

/// Grey tile with a white square filling part of the interior.
fn patched(size: u32) -> RgbaImage {
    let mut tile = solid(100, 100, 100);
    for y in 1..=size {
        for x in 1..=size {
            tile.put_pixel(x, y, Rgba([255, 255, 255, 255]));
        }
    }
    tile
}

#[test]
fn test_exact_border_overrides_fingerprint() {
    let mut dedup = TileDeduplicator::new(DedupThresholds::default());
    let plain = solid(100, 100, 100);
    let bright = patched(30);
    assert!(!FastStat::of(&plain).is_close(&FastStat::of(&bright), 2.0, 4.0));
    assert_eq!(dedup.dedup(&plain), DedupOutcome::Unique(0));
    assert_eq!(dedup.dedup(&bright), DedupOutcome::Reused(0));
    assert_eq!(dedup.len(), 1);
}

#[test]
fn test_exact_border_respects_insertion_order() {
    let mut dedup = TileDeduplicator::new(DedupThresholds::default());
    dedup.insert(&solid(100, 100, 101));
    dedup.insert(&patched(20));
    // Entry 0 is close on both tests and precedes the exact border hit.
    assert_eq!(dedup.find_close_match(&solid(100, 100, 100), None), Some(0));
    assert_eq!(dedup.find_close_match(&patched(30), None), Some(1));
    assert_eq!(dedup.find_close_match(&patched(30), Some(1)), None);
}

#[test]
fn test_zero_factor_ignores_exact_borders() {
    let mut dedup =
        TileDeduplicator::new(DedupThresholds::from_factor(DedupThresholds::default(), 0.0));
    dedup.insert(&solid(100, 100, 100));
    assert_eq!(dedup.dedup(&patched(30)), DedupOutcome::Unique(1));
}

#[test]
fn test_distinct_colours_stay_unique() {
    let mut dedup = TileDeduplicator::new(DedupThresholds::default());
    assert_eq!(dedup.dedup(&solid(255, 0, 0)), DedupOutcome::Unique(0));
    assert_eq!(dedup.dedup(&solid(0, 255, 0)), DedupOutcome::Unique(1));
    assert_eq!(dedup.dedup(&solid(0, 0, 255)), DedupOutcome::Unique(2));
}

#[test]
fn test_first_match_in_insertion_order_wins() {
    let mut dedup = TileDeduplicator::new(DedupThresholds::from_factor(
        DedupThresholds::default(),
        10.0,
    ));
    dedup.insert(&solid(100, 100, 100));
    dedup.insert(&solid(101, 101, 101));
    assert_eq!(dedup.find_close_match(&solid(101, 101, 101), None), Some(0));
    assert_eq!(dedup.find_close_match(&solid(101, 101, 101), Some(0)), Some(1));
}

#[test]
fn test_disabled_never_matches() {
    let mut dedup = TileDeduplicator::disabled();
    let tile = solid(1, 2, 3);
    assert_eq!(dedup.dedup(&tile), DedupOutcome::Unique(0));
    assert_eq!(dedup.dedup(&tile), DedupOutcome::Unique(1));
    assert_eq!(dedup.find_close_match(&tile, None), None);
}

#[test]
fn test_zero_factor_disables_matching() {
    let mut dedup =
        TileDeduplicator::new(DedupThresholds::from_factor(DedupThresholds::default(), 0.0));
    let tile = solid(5, 5, 5);
    dedup.insert(&tile);
    assert_eq!(dedup.find_close_match(&tile, None), None);
}
