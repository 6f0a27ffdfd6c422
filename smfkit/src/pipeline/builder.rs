//! Diffuse image → tile archive + tile map.

use super::context::{BuildContext, BuildStats};
use super::error::PipelineError;
use crate::config::BuildConfig;
use crate::dedup::DedupOutcome;
use crate::smt::SmtArchive;
use crate::tilemap::TileMap;
use image::imageops;
use image::RgbaImage;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

/// Progress of a tile build, reported once per tile row.
#[derive(Debug, Clone, Copy)]
pub struct BuildProgress {
    pub rows_done: u32,
    pub rows_total: u32,
    pub unique: u64,
}

/// Progress callback. Must be `Send + Sync` as builds may run on a worker thread.
pub type BuildProgressCallback = Arc<dyn Fn(BuildProgress) + Send + Sync>;

/// Cuts an image into tiles, deduplicates them and appends the unique ones.
///
/// Deduplication is strictly sequential, so the first of several close tiles
/// always wins. Only the DXT1 encoding of accepted tiles runs in parallel,
/// in batches; each batch is appended in acceptance order.
pub struct TileArchiveBuilder {
    ctx: BuildContext,
    progress: Option<BuildProgressCallback>,
    /// Tiles offered by a shared archive; they own indices `0..seeded`.
    seeded: u32,
}

impl TileArchiveBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            ctx: BuildContext::new(config),
            progress: None,
            seeded: 0,
        }
    }

    pub fn with_progress(mut self, callback: BuildProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn stats(&self) -> BuildStats {
        self.ctx.stats()
    }

    /// Number of tiles taken from shared archives by [`seed_from`](Self::seed_from).
    pub fn seeded(&self) -> u32 {
        self.seeded
    }

    /// Offer every tile of `shared` as a match candidate for later builds.
    ///
    /// Seeded tiles keep their own indices, so a map built afterwards
    /// addresses `shared` first and the build archive after it. Must be
    /// called before [`build`](Self::build). Returns the number of tiles seeded.
    pub fn seed_from(&mut self, shared: &mut SmtArchive) -> Result<u32, PipelineError> {
        if self.ctx.dedup.len() != self.seeded as usize {
            return Err(PipelineError::InvalidInput(
                "shared tiles must be seeded before building".to_string(),
            ));
        }
        let count = shared.tile_count();
        for index in 0..count {
            let tile = shared.get_tile(index)?;
            self.ctx.dedup.insert(&tile);
        }
        self.seeded += count;
        info!(path = %shared.path().display(), tiles = count, "Seeded shared tiles");
        Ok(count)
    }

    /// Tile `image` into `archive`, returning the tile map.
    ///
    /// Indices in the map are archive-wide: if the archive already holds
    /// tiles, new tiles are numbered after them. Matches against seeded
    /// tiles keep the shared archive's index; new tiles follow all seeded ones.
    pub fn build(&mut self, image: &RgbaImage, archive: &mut SmtArchive) -> Result<TileMap, PipelineError> {
        let ts = self.ctx.config.tile_size();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 || width % ts != 0 || height % ts != 0 {
            return Err(PipelineError::NotTileAligned {
                width,
                height,
                tile_size: ts,
            });
        }

        let (cols, rows) = (width / ts, height / ts);
        let base = archive.tile_count();
        let mut tilemap = TileMap::new(cols, rows);
        let seeded = self.seeded;
        info!(cols, rows, base, seeded, "Building tile archive");

        for ty in 0..rows {
            for tx in 0..cols {
                let tile = imageops::crop_imm(image, tx * ts, ty * ts, ts, ts).to_image();
                self.ctx.stats.tiles_total += 1;
                let local = match self.ctx.dedup.dedup(&tile) {
                    DedupOutcome::Reused(i) => {
                        self.ctx.stats.tiles_reused += 1;
                        i
                    }
                    DedupOutcome::Unique(i) => {
                        self.ctx.stats.tiles_unique += 1;
                        self.ctx.pending.push(tile);
                        if self.ctx.pending.len() >= self.ctx.config.batch_size() {
                            self.flush(archive)?;
                        }
                        i
                    }
                };
                let index = if local < seeded { local } else { base + local };
                tilemap.set(tx, ty, index)?;
            }

            if let Some(cb) = &self.progress {
                cb(BuildProgress {
                    rows_done: ty + 1,
                    rows_total: rows,
                    unique: self.ctx.stats.tiles_unique,
                });
            }
        }
        self.flush(archive)?;

        let stats = self.ctx.stats;
        info!(
            total = stats.tiles_total,
            unique = stats.tiles_unique,
            reused = stats.tiles_reused,
            "Tile archive built"
        );
        Ok(tilemap)
    }

    /// Encode pending tiles in parallel and append them in order.
    fn flush(&mut self, archive: &mut SmtArchive) -> Result<(), PipelineError> {
        if self.ctx.pending.is_empty() {
            return Ok(());
        }
        let codec = self.ctx.codec;
        let blocks: Vec<Vec<u8>> = self
            .ctx
            .pending
            .par_iter()
            .map(|tile| codec.encode(tile))
            .collect::<Result<_, _>>()?;
        archive.append_batch(&blocks)?;
        debug!(count = blocks.len(), total = archive.tile_count(), "Flushed tile batch");
        self.ctx.pending.clear();
        Ok(())
    }
}
