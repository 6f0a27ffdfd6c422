//! Map container → editable images and CSV files.

use super::error::PipelineError;
use crate::smf::{raster_to_image, Section, SmfContainer};
use crate::tilecache::TileCache;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What a decompile wrote.
#[derive(Debug, Clone, Default)]
pub struct DecompileReport {
    pub files: Vec<PathBuf>,
    pub pointer_mismatches: usize,
}

/// Extract every section of a map into `output_dir`.
///
/// Writes `height.png` (16-bit), `type.png`, `metal.png`, `minimap.png`,
/// `grass.png` when present, `tilemap.csv`, `features.csv`, and with
/// [`with_diffuse`](Self::with_diffuse) the stitched `diffuse.png`.
pub struct DecompileJob {
    input: PathBuf,
    output_dir: PathBuf,
    diffuse: bool,
}

impl DecompileJob {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            diffuse: false,
        }
    }

    pub fn with_diffuse(mut self, diffuse: bool) -> Self {
        self.diffuse = diffuse;
        self
    }

    pub fn run(self) -> Result<DecompileReport, PipelineError> {
        let mut map = SmfContainer::open(&self.input)?;
        let read = map.read()?;
        fs::create_dir_all(&self.output_dir)?;

        let mut report = DecompileReport {
            pointer_mismatches: read.pointer_mismatches.len(),
            ..DecompileReport::default()
        };

        for section in Section::RASTERS {
            let (Some(spec), Some(data)) = (map.spec(section), map.raster(section)) else {
                continue;
            };
            let image = raster_to_image(section, data, &spec)?;
            let path = self.output_path(&format!("{}.png", section.name()));
            image.save(&path)?;
            report.files.push(path);
        }

        let tilemap_path = self.output_path("tilemap.csv");
        map.tilemap().save_csv(&tilemap_path)?;
        report.files.push(tilemap_path);

        let features_path = self.output_path("features.csv");
        fs::write(&features_path, map.features().to_csv())?;
        report.files.push(features_path);

        if self.diffuse {
            let mut cache = TileCache::new(map.header().tile_size as u32);
            cache.add_source(&self.input)?;
            if cache.len() == 0 {
                warn!("Map lists no tile archives, skipping diffuse");
            } else {
                let diffuse = cache.stitch(map.tilemap())?;
                let path = self.output_path("diffuse.png");
                diffuse.save(&path)?;
                report.files.push(path);
            }
        }

        info!(
            input = %self.input.display(),
            output = %self.output_dir.display(),
            files = report.files.len(),
            "Map decompiled"
        );
        Ok(report)
    }

    fn output_path(&self, name: &str) -> PathBuf {
        Path::new(&self.output_dir).join(name)
    }
}
