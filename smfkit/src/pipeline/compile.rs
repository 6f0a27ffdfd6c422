//! Images → map container (+ tile archive).

use super::builder::{BuildProgressCallback, TileArchiveBuilder};
use super::context::BuildStats;
use super::error::PipelineError;
use crate::config::BuildConfig;
use crate::smf::{Components, ImageIo, Section, SmfContainer, SQUARES_PER_UNIT};
use crate::smt::SmtArchive;
use crate::tilemap::TileMap;
use image::imageops::{self, FilterType};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Diffuse texels per map square.
const TEXELS_PER_SQUARE: u32 = 8;

/// Where the map's tiles come from.
#[derive(Debug, Clone)]
pub enum TileInput {
    /// No tiles; the map references no archive
    None,
    /// Cut, deduplicate and compress a diffuse image into a new archive
    Diffuse(PathBuf),
    /// Reference an existing archive with a prepared tile map
    Existing { smt: PathBuf, tilemap_csv: PathBuf },
}

/// What a compile produced.
#[derive(Debug, Clone)]
pub struct CompileReport {
    pub smf: PathBuf,
    /// Archive written by this compile, if any
    pub smt: Option<PathBuf>,
    /// Shared archive whose tiles the diffuse build reused
    pub shared_smt: Option<PathBuf>,
    /// Tiles addressable by the map across all its archives
    pub tile_count: u32,
    pub stats: Option<BuildStats>,
    pub features: usize,
}

/// Build one map container from its source images.
///
/// # Example
///
/// ```no_run
/// use smfkit::pipeline::CompileJob;
///
/// let report = CompileJob::new("out/island.smf", 8, 8)
///     .with_height_range(-40.0, 250.0)
///     .with_height("src/height.png")
///     .with_diffuse("src/diffuse.png")
///     .run()?;
/// println!("{} unique tiles", report.tile_count);
/// # Ok::<(), smfkit::pipeline::PipelineError>(())
/// ```
pub struct CompileJob {
    output: PathBuf,
    width_units: u32,
    length_units: u32,
    min_height: f32,
    max_height: f32,
    rasters: ImageIo,
    grass: bool,
    features: Option<PathBuf>,
    tiles: TileInput,
    shared: Option<PathBuf>,
    config: BuildConfig,
    overwrite: bool,
    progress: Option<BuildProgressCallback>,
}

impl CompileJob {
    pub fn new(output: impl Into<PathBuf>, width_units: u32, length_units: u32) -> Self {
        Self {
            output: output.into(),
            width_units,
            length_units,
            min_height: 10.0,
            max_height: 256.0,
            rasters: ImageIo::new(),
            grass: false,
            features: None,
            tiles: TileInput::None,
            shared: None,
            config: BuildConfig::default(),
            overwrite: false,
            progress: None,
        }
    }

    pub fn with_height_range(mut self, min: f32, max: f32) -> Self {
        self.min_height = min;
        self.max_height = max;
        self
    }

    pub fn with_height(mut self, path: impl Into<PathBuf>) -> Self {
        self.rasters.set(Section::Height, path);
        self
    }

    pub fn with_type_map(mut self, path: impl Into<PathBuf>) -> Self {
        self.rasters.set(Section::Type, path);
        self
    }

    pub fn with_metal(mut self, path: impl Into<PathBuf>) -> Self {
        self.rasters.set(Section::Metal, path);
        self
    }

    pub fn with_minimap(mut self, path: impl Into<PathBuf>) -> Self {
        self.rasters.set(Section::Minimap, path);
        self
    }

    /// Supplying a grass image enables the vegetation extension.
    pub fn with_grass(mut self, path: impl Into<PathBuf>) -> Self {
        self.rasters.set(Section::Grass, path);
        self.grass = true;
        self
    }

    pub fn with_features(mut self, csv: impl Into<PathBuf>) -> Self {
        self.features = Some(csv.into());
        self
    }

    pub fn with_diffuse(mut self, path: impl Into<PathBuf>) -> Self {
        self.tiles = TileInput::Diffuse(path.into());
        self
    }

    /// Let a diffuse build reuse the tiles of an existing archive.
    ///
    /// The map lists `smt` first and the new archive second; only tiles
    /// with no match in `smt` are written to the new archive.
    pub fn with_shared_tiles(mut self, smt: impl Into<PathBuf>) -> Self {
        self.shared = Some(smt.into());
        self
    }

    pub fn with_existing_tiles(mut self, smt: impl Into<PathBuf>, tilemap_csv: impl Into<PathBuf>) -> Self {
        self.tiles = TileInput::Existing {
            smt: smt.into(),
            tilemap_csv: tilemap_csv.into(),
        };
        self
    }

    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_progress(mut self, callback: BuildProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Path of the archive a diffuse build writes: `<stem>.smt` beside the map.
    pub fn archive_path(&self) -> PathBuf {
        self.output.with_extension("smt")
    }

    pub fn run(self) -> Result<CompileReport, PipelineError> {
        info!(output = %self.output.display(), width = self.width_units, length = self.length_units, "Compiling map");

        if self.shared.is_some() && !matches!(self.tiles, TileInput::Diffuse(_)) {
            return Err(PipelineError::InvalidInput(
                "shared tiles can only be reused by a diffuse build".to_string(),
            ));
        }

        let mut map = SmfContainer::create(&self.output, self.overwrite)?;
        map.set_size(self.width_units, self.length_units)?;
        map.set_height_range(self.min_height, self.max_height)?;
        map.enable_grass(self.grass)?;

        let mut report = CompileReport {
            smf: self.output.clone(),
            smt: None,
            shared_smt: None,
            tile_count: 0,
            stats: None,
            features: 0,
        };

        match &self.tiles {
            TileInput::None => {
                warn!("No diffuse image or tile archive given; map references no tiles");
            }
            TileInput::Diffuse(diffuse) => {
                let smt_path = self.archive_path();
                let mut shared_archive = match &self.shared {
                    Some(shared) if same_file(shared, &smt_path) => {
                        return Err(PipelineError::InvalidInput(format!(
                            "shared archive {} is also the output archive",
                            shared.display()
                        )));
                    }
                    Some(shared) => Some(SmtArchive::open(shared)?),
                    None => None,
                };
                let mut archive = SmtArchive::create(&smt_path, self.overwrite)?;

                let expected = (
                    self.width_units * SQUARES_PER_UNIT * TEXELS_PER_SQUARE,
                    self.length_units * SQUARES_PER_UNIT * TEXELS_PER_SQUARE,
                );
                let mut image = image::open(diffuse)?.to_rgba8();
                if image.dimensions() != expected {
                    warn!(
                        from = ?image.dimensions(),
                        to = ?expected,
                        "Diffuse image does not match map size, resizing"
                    );
                    image = imageops::resize(&image, expected.0, expected.1, FilterType::Triangle);
                }

                let mut builder = TileArchiveBuilder::new(self.config);
                if let Some(cb) = &self.progress {
                    builder = builder.with_progress(cb.clone());
                }
                if let Some(shared) = shared_archive.as_mut() {
                    let seeded = builder.seed_from(shared)?;
                    map.add_archive(archive_name(shared.path(), &self.output), seeded)?;
                    report.shared_smt = Some(shared.path().to_path_buf());
                }
                let tilemap = builder.build(&image, &mut archive)?;
                let written = archive.tile_count();
                report.tile_count = builder.seeded() + written;

                if written == 0 && builder.seeded() > 0 {
                    drop(archive);
                    std::fs::remove_file(&smt_path)?;
                    info!("Every tile matched the shared archive; no new archive written");
                } else {
                    map.add_archive(archive_name(&smt_path, &self.output), written)?;
                    report.smt = Some(smt_path);
                }
                map.set_tilemap(tilemap)?;
                report.stats = Some(builder.stats());
            }
            TileInput::Existing { smt, tilemap_csv } => {
                let archive = SmtArchive::open(smt)?;
                let tilemap = TileMap::load_csv(tilemap_csv)?;
                if let Some(max_index) = tilemap.max_index() {
                    if max_index >= archive.tile_count() {
                        return Err(PipelineError::TileMapExceedsArchive {
                            max_index,
                            tile_count: archive.tile_count(),
                            archive: smt.clone(),
                        });
                    }
                }
                map.add_archive(archive_name(smt, &self.output), archive.tile_count())?;
                map.set_tilemap(tilemap)?;
                report.tile_count = archive.tile_count();
            }
        }

        if let Some(csv) = &self.features {
            report.features = map.add_features_from_csv(csv)?;
        }

        map.set_raster_io(Box::new(self.rasters.clone()));
        map.write(Components::ALL)?;

        info!(output = %self.output.display(), tiles = report.tile_count, features = report.features, "Map compiled");
        Ok(report)
    }
}

/// Whether two paths name the same existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Name under which the map lists `archive`.
///
/// Archives beside the map are listed by file name; anything else by its
/// absolute path, which still resolves relative to the map's directory.
fn archive_name(archive: &Path, map: &Path) -> String {
    let archive_dir = archive.parent().and_then(|p| p.canonicalize().ok());
    let map_dir = map.parent().and_then(|p| p.canonicalize().ok());
    match (archive.file_name(), archive_dir == map_dir && archive_dir.is_some()) {
        (Some(name), true) => name.to_string_lossy().into_owned(),
        _ => std::path::absolute(archive)
            .unwrap_or_else(|_| archive.to_path_buf())
            .to_string_lossy()
            .into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_archive_path_is_beside_map() {
        let job = CompileJob::new("/maps/island.smf", 1, 1);
        assert_eq!(job.archive_path(), PathBuf::from("/maps/island.smt"));
    }

    #[test]
    fn test_archive_name_prefers_file_name() {
        let dir = TempDir::new().unwrap();
        let map = dir.path().join("m.smf");
        let smt = dir.path().join("m.smt");
        assert_eq!(archive_name(&smt, &map), "m.smt");

        let other = TempDir::new().unwrap();
        let far = other.path().join("shared.smt");
        let name = archive_name(&far, &map);
        assert!(Path::new(&name).is_absolute());
        assert!(name.ends_with("shared.smt"));
    }

    #[test]
    fn test_shared_tiles_need_a_diffuse() {
        let dir = TempDir::new().unwrap();
        let err = CompileJob::new(dir.path().join("m.smf"), 1, 1)
            .with_shared_tiles(dir.path().join("shared.smt"))
            .run()
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn test_shared_archive_cannot_be_the_output() {
        let dir = TempDir::new().unwrap();
        let smt = dir.path().join("m.smt");
        SmtArchive::create(&smt, false).unwrap();
        let diffuse = dir.path().join("d.png");
        image::RgbaImage::new(512, 512).save(&diffuse).unwrap();

        let err = CompileJob::new(dir.path().join("m.smf"), 1, 1)
            .with_diffuse(&diffuse)
            .with_shared_tiles(&smt)
            .with_overwrite(true)
            .run()
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(SmtArchive::open(&smt).unwrap().tile_count(), 0);
    }

    #[test]
    fn test_existing_tiles_must_cover_tilemap() {
        let dir = TempDir::new().unwrap();
        let smt = dir.path().join("t.smt");
        let mut archive = SmtArchive::create(&smt, false).unwrap();
        archive.append_tile(&image::RgbaImage::new(32, 32)).unwrap();

        let mut tm = TileMap::new(16, 16);
        tm.set(3, 3, 5).unwrap();
        let csv = dir.path().join("tm.csv");
        tm.save_csv(&csv).unwrap();

        let err = CompileJob::new(dir.path().join("m.smf"), 1, 1)
            .with_existing_tiles(&smt, &csv)
            .run()
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::TileMapExceedsArchive {
                max_index: 5,
                tile_count: 1,
                ..
            }
        ));
    }
}
