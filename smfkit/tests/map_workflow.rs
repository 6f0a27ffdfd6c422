//! Integration tests for map containers, tile archives and the build
//! pipelines, exercised through the public API only.

use std::fs;
use std::path::Path;

use image::{DynamicImage, GrayImage, Luma, Rgb, Rgb32FImage, Rgba, RgbaImage};
use smfkit::config::BuildConfig;
use smfkit::pipeline::{CompileJob, DecompileJob, TileArchiveBuilder};
use smfkit::smf::{
    dequantize_height, raster_from_image, BlankIo, Components, Extension, ImageIo, RasterIo,
    RasterRequest, Section, SmfContainer, SmfError,
};
use smfkit::smt::SmtArchive;
use smfkit::tilecache::TileCache;
use smfkit::tilemap::TileMap;
use tempfile::TempDir;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

fn height_samples(map: &SmfContainer) -> Vec<u16> {
    map.raster(Section::Height)
        .unwrap()
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect()
}

#[test]
fn test_gray8_height_image_is_widened() {
    let dir = TempDir::new().unwrap();
    let height = dir.path().join("height.png");
    GrayImage::from_pixel(9, 9, Luma([128])).save(&height).unwrap();

    let path = dir.path().join("small.smf");
    let mut map = SmfContainer::create(&path, false).unwrap();
    map.set_size_squares(8, 8).unwrap();
    map.set_raster_io(Box::new(ImageIo::new().with(Section::Height, &height)));
    map.write(Components::ALL).unwrap();

    let mut back = SmfContainer::open(&path).unwrap();
    assert!(back.read().unwrap().is_clean());
    let samples = height_samples(&back);
    assert_eq!(samples.len(), 81);
    assert!(samples.iter().all(|&h| h == 32896));
}

#[test]
fn test_height_image_is_resized_to_map() {
    let dir = TempDir::new().unwrap();
    let height = dir.path().join("height.png");
    image::ImageBuffer::from_pixel(33, 33, Luma([1000u16]))
        .save(&height)
        .unwrap();

    let path = dir.path().join("resized.smf");
    let mut map = SmfContainer::create(&path, false).unwrap();
    map.set_size_squares(8, 16).unwrap();
    map.set_raster_io(Box::new(ImageIo::new().with(Section::Height, &height)));
    map.write(Components::ALL).unwrap();

    let mut back = SmfContainer::open(&path).unwrap();
    back.read().unwrap();
    let samples = height_samples(&back);
    assert_eq!(samples.len(), 9 * 17);
    assert!(samples.iter().all(|&h| h == 1000));
}

/// Supplies a flat height field in world units; other sections are blank.
struct FlatHeight(f32);

impl RasterIo for FlatHeight {
    fn supply(&self, request: &RasterRequest) -> Result<Vec<u8>, SmfError> {
        if request.section != Section::Height {
            return BlankIo.supply(request);
        }
        let spec = request.spec;
        let field = Rgb32FImage::from_pixel(spec.width, spec.height, Rgb([self.0; 3]));
        raster_from_image(&DynamicImage::ImageRgb32F(field), request)
    }
}

#[test]
fn test_world_heights_are_quantized_across_range() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plateau.smf");
    let mut map = SmfContainer::create(&path, false).unwrap();
    map.set_size_squares(8, 8).unwrap();
    map.set_height_range(0.0, 100.0).unwrap();
    map.set_raster_io(Box::new(FlatHeight(37.5)));
    map.write(Components::ALL).unwrap();

    let mut back = SmfContainer::open(&path).unwrap();
    assert!(back.read().unwrap().is_clean());
    assert_eq!(back.header().min_height, 0.0);
    assert_eq!(back.header().max_height, 100.0);
    let samples = height_samples(&back);
    assert_eq!(samples.len(), 81);
    assert!(samples.iter().all(|&h| h == 24576), "{:?}", &samples[..9]);
    assert!((dequantize_height(samples[0], 0.0, 100.0) - 37.5).abs() < 0.01);
}

/// Splice an extension record the library does not know into a map file.
fn inject_unknown_extension(path: &Path, tag: i32, payload: &[u8]) {
    let bytes = fs::read(path).unwrap();
    let record_len = 8 + payload.len();

    let mut out = bytes[..80].to_vec();
    // Section pointers at 52..76 move down by the inserted record.
    for field in (52..76).step_by(4) {
        let ptr = i32::from_le_bytes(out[field..field + 4].try_into().unwrap());
        out[field..field + 4].copy_from_slice(&(ptr + record_len as i32).to_le_bytes());
    }
    out[76..80].copy_from_slice(&1i32.to_le_bytes());
    out.extend_from_slice(&(record_len as i32).to_le_bytes());
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&bytes[80..]);
    fs::write(path, out).unwrap();
}

#[test]
fn test_unknown_extension_survives_rewrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ext.smf");
    let mut map = SmfContainer::create(&path, false).unwrap();
    map.set_size_squares(8, 8).unwrap();
    map.set_raster(Section::Metal, vec![5; 16]).unwrap();
    map.write(Components::ALL).unwrap();

    inject_unknown_extension(&path, 77, b"opaque!!");

    let mut map = SmfContainer::open(&path).unwrap();
    let report = map.read().unwrap();
    assert_eq!(report.unknown_extensions, 1);
    assert!(report.is_clean());
    assert_eq!(map.raster(Section::Metal).unwrap(), &[5u8; 16]);

    map.enable_grass(true).unwrap();
    map.write(map.dirty()).unwrap();

    let mut back = SmfContainer::open(&path).unwrap();
    assert!(back.read().unwrap().is_clean());
    assert!(back.has_grass());
    assert!(back.extensions().contains(&Extension::Unknown {
        tag: 77,
        payload: b"opaque!!".to_vec(),
    }));
    assert_eq!(back.raster(Section::Metal).unwrap(), &[5u8; 16]);
    assert_eq!(fs::metadata(&path).unwrap().len(), back.layout().end());
}

/// One map unit of diffuse: every tile green except (0,0) red and (1,0) blue.
fn three_tile_diffuse() -> RgbaImage {
    RgbaImage::from_fn(512, 512, |x, y| match (x / 32, y / 32) {
        (0, 0) => RED,
        (1, 0) => BLUE,
        _ => GREEN,
    })
}

#[test]
fn test_compile_builds_three_tile_archive() {
    let dir = TempDir::new().unwrap();
    let diffuse = dir.path().join("diffuse.png");
    three_tile_diffuse().save(&diffuse).unwrap();

    let smf = dir.path().join("quilt.smf");
    let report = CompileJob::new(&smf, 1, 1)
        .with_diffuse(&diffuse)
        .run()
        .unwrap();

    assert_eq!(report.tile_count, 3);
    let stats = report.stats.unwrap();
    assert_eq!(stats.tiles_total, 256);
    assert_eq!(stats.tiles_unique, 3);

    let smt = report.smt.unwrap();
    assert_eq!(SmtArchive::open(&smt).unwrap().tile_count(), 3);

    let mut map = SmfContainer::open(&smf).unwrap();
    map.read().unwrap();
    assert_eq!(map.archives().len(), 1);
    assert_eq!(map.archives()[0].tile_count, 3);
    let tm = map.tilemap();
    assert_eq!((tm.width(), tm.height()), (16, 16));
    assert_eq!(tm.get(0, 0).unwrap(), 0);
    assert_eq!(tm.get(1, 0).unwrap(), 1);
    assert_eq!(tm.get(2, 0).unwrap(), 2);
    assert_eq!(tm.get(15, 15).unwrap(), 2);

    let mut cache = TileCache::new(32);
    cache.add_source(&smf).unwrap();
    assert_eq!(cache.len(), 3);
    let stitched = cache.stitch(tm).unwrap();
    assert_eq!(stitched.dimensions(), (512, 512));
    assert_eq!(stitched.get_pixel(3, 3), &RED);
    assert_eq!(stitched.get_pixel(40, 3), &BLUE);
    assert_eq!(stitched.get_pixel(300, 300), &GREEN);
}

#[test]
fn test_compile_reuses_tiles_of_shared_archive() {
    let dir = TempDir::new().unwrap();
    let diffuse = dir.path().join("diffuse.png");
    three_tile_diffuse().save(&diffuse).unwrap();
    let shared = dir.path().join("common.smt");
    let mut archive = SmtArchive::create(&shared, false).unwrap();
    archive.append_tile(&RgbaImage::from_pixel(32, 32, RED)).unwrap();
    drop(archive);

    let smf = dir.path().join("quilt.smf");
    let report = CompileJob::new(&smf, 1, 1)
        .with_diffuse(&diffuse)
        .with_shared_tiles(&shared)
        .run()
        .unwrap();
    assert_eq!(report.tile_count, 3);
    assert_eq!(report.shared_smt.as_deref(), Some(shared.as_path()));

    // Only blue and green are new.
    let mut own = SmtArchive::open(report.smt.unwrap()).unwrap();
    assert_eq!(own.tile_count(), 2);
    assert_eq!(own.get_tile(0).unwrap().get_pixel(3, 3), &BLUE);
    assert_eq!(SmtArchive::open(&shared).unwrap().tile_count(), 1);

    let mut map = SmfContainer::open(&smf).unwrap();
    map.read().unwrap();
    let names: Vec<_> = map.archives().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["common.smt", "quilt.smt"]);
    let tm = map.tilemap();
    assert_eq!(tm.get(0, 0).unwrap(), 0);
    assert_eq!(tm.get(1, 0).unwrap(), 1);
    assert_eq!(tm.get(2, 0).unwrap(), 2);

    let mut cache = TileCache::new(32);
    cache.add_source(&smf).unwrap();
    let stitched = cache.stitch(tm).unwrap();
    assert_eq!(stitched.get_pixel(3, 3), &RED);
    assert_eq!(stitched.get_pixel(40, 3), &BLUE);
    assert_eq!(stitched.get_pixel(300, 300), &GREEN);
}

#[test]
fn test_fully_shared_compile_writes_no_archive() {
    let dir = TempDir::new().unwrap();
    let diffuse = dir.path().join("diffuse.png");
    RgbaImage::from_pixel(512, 512, GREEN).save(&diffuse).unwrap();
    let shared = dir.path().join("common.smt");
    let mut archive = SmtArchive::create(&shared, false).unwrap();
    archive.append_tile(&RgbaImage::from_pixel(32, 32, GREEN)).unwrap();
    drop(archive);

    let smf = dir.path().join("meadow.smf");
    let report = CompileJob::new(&smf, 1, 1)
        .with_diffuse(&diffuse)
        .with_shared_tiles(&shared)
        .run()
        .unwrap();
    assert!(report.smt.is_none());
    assert!(!dir.path().join("meadow.smt").exists());

    let mut map = SmfContainer::open(&smf).unwrap();
    map.read().unwrap();
    assert_eq!(map.archives().len(), 1);
    assert!(map.tilemap().as_slice().iter().all(|&i| i == 0));
}

#[test]
fn test_compile_then_decompile_restores_sources() {
    let dir = TempDir::new().unwrap();
    let metal = dir.path().join("metal.png");
    GrayImage::from_fn(32, 32, |x, _| Luma([if x < 16 { 0 } else { 200 }]))
        .save(&metal)
        .unwrap();
    let features = dir.path().join("features.csv");
    fs::write(&features, "tree,1,2,3\ntree,4,5,6,90\nrock,7,8,9\n").unwrap();
    let tilemap_csv = dir.path().join("tiles.csv");
    let mut tm = TileMap::new(16, 16);
    tm.set(3, 3, 1).unwrap();
    tm.save_csv(&tilemap_csv).unwrap();
    let smt = dir.path().join("shared.smt");
    let mut archive = SmtArchive::create(&smt, false).unwrap();
    archive.append_tile(&RgbaImage::from_pixel(32, 32, RED)).unwrap();
    archive.append_tile(&RgbaImage::from_pixel(32, 32, BLUE)).unwrap();
    drop(archive);

    let smf = dir.path().join("shared.smf");
    let report = CompileJob::new(&smf, 1, 1)
        .with_height_range(-50.0, 400.0)
        .with_metal(&metal)
        .with_features(&features)
        .with_existing_tiles(&smt, &tilemap_csv)
        .run()
        .unwrap();
    assert_eq!(report.features, 3);
    assert_eq!(report.tile_count, 2);

    let out = dir.path().join("out");
    let report = DecompileJob::new(&smf, &out).with_diffuse(true).run().unwrap();
    assert_eq!(report.pointer_mismatches, 0);

    let metal_back = image::open(out.join("metal.png")).unwrap().to_luma8();
    assert_eq!(metal_back.dimensions(), (32, 32));
    assert_eq!(metal_back.get_pixel(0, 0).0[0], 0);
    assert_eq!(metal_back.get_pixel(31, 0).0[0], 200);

    assert_eq!(TileMap::load_csv(out.join("tilemap.csv")).unwrap(), tm);

    let features_back = fs::read_to_string(out.join("features.csv")).unwrap();
    assert_eq!(features_back.lines().filter(|l| l.starts_with("tree")).count(), 2);
    assert_eq!(features_back.lines().filter(|l| l.starts_with("rock")).count(), 1);

    let diffuse = image::open(out.join("diffuse.png")).unwrap().to_rgba8();
    assert_eq!(diffuse.get_pixel(3 * 32 + 5, 3 * 32 + 5), &BLUE);
    assert_eq!(diffuse.get_pixel(0, 0), &RED);
}

/// Flat grey tile with one brighter pixel somewhere inside the border ring.
fn speckled(x: u32, y: u32) -> RgbaImage {
    let mut tile = RgbaImage::from_pixel(32, 32, Rgba([100, 100, 100, 255]));
    tile.put_pixel(x, y, Rgba([110, 110, 110, 255]));
    tile
}

/// Flat grey tile whose whole interior is painted white.
fn bright_interior() -> RgbaImage {
    let mut tile = RgbaImage::from_pixel(32, 32, Rgba([100, 100, 100, 255]));
    for y in 1..31 {
        for x in 1..31 {
            tile.put_pixel(x, y, Rgba([255, 255, 255, 255]));
        }
    }
    tile
}

fn side_by_side(a: &RgbaImage, b: &RgbaImage) -> RgbaImage {
    let mut out = RgbaImage::new(64, 32);
    image::imageops::replace(&mut out, a, 0, 0);
    image::imageops::replace(&mut out, b, 32, 0);
    out
}

#[test]
fn test_interior_differences_are_deduplicated() {
    let dir = TempDir::new().unwrap();
    let image = side_by_side(&speckled(8, 8), &speckled(20, 17));
    let mut archive = SmtArchive::create(dir.path().join("a.smt"), false).unwrap();
    let mut builder = TileArchiveBuilder::new(BuildConfig::default());
    let map = builder.build(&image, &mut archive).unwrap();
    assert_eq!(map.as_slice(), &[0, 0]);

    // Same grey border, interior far outside the fingerprint thresholds.
    let image = side_by_side(&speckled(8, 8), &bright_interior());
    let mut archive = SmtArchive::create(dir.path().join("b.smt"), false).unwrap();
    let mut builder = TileArchiveBuilder::new(BuildConfig::default());
    let map = builder.build(&image, &mut archive).unwrap();
    assert_eq!(map.as_slice(), &[0, 0]);
    assert_eq!(archive.tile_count(), 1);
    assert_eq!(builder.stats().tiles_reused, 1);

    let mut archive = SmtArchive::create(dir.path().join("c.smt"), false).unwrap();
    let mut builder = TileArchiveBuilder::new(BuildConfig::default().with_dedup(false));
    let map = builder.build(&image, &mut archive).unwrap();
    assert_eq!(map.as_slice(), &[0, 1]);
    assert_eq!(archive.tile_count(), 2);
}

#[test]
fn test_border_differences_keep_tiles_apart() {
    let dir = TempDir::new().unwrap();
    let mut edged = speckled(8, 8);
    for x in 0..32 {
        edged.put_pixel(x, 0, Rgba([180, 180, 180, 255]));
    }
    let image = side_by_side(&speckled(8, 8), &edged);

    let mut archive = SmtArchive::create(dir.path().join("a.smt"), false).unwrap();
    let mut builder = TileArchiveBuilder::new(BuildConfig::default().with_compression_factor(50.0));
    let map = builder.build(&image, &mut archive).unwrap();
    assert_eq!(map.as_slice(), &[0, 1]);
}
