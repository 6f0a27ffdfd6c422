//! Unified tile index space over images, archives and map references.

use super::error::TileCacheError;
use crate::smf::{is_smf, SmfContainer};
use crate::smt::{is_smt, SmtArchive};
use crate::tilemap::TileMap;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where a span of tiles comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A standalone image, exactly one tile
    Image,
    /// A tile archive on disk
    Archive,
    /// An archive named by a map container that could not be found
    ContainerReference,
}

/// A half-open range `[start, end)` of global tile indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSource {
    pub start: u32,
    pub end: u32,
    pub kind: SourceKind,
    pub path: PathBuf,
}

impl TileSource {
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Ordered list of tile sources presenting one contiguous index space.
pub struct TileCache {
    tile_size: u32,
    sources: Vec<TileSource>,
    archives: HashMap<usize, SmtArchive>,
}

impl TileCache {
    pub fn new(tile_size: u32) -> Self {
        Self {
            tile_size,
            sources: Vec::new(),
            archives: HashMap::new(),
        }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Total tiles across every source.
    pub fn len(&self) -> u32 {
        self.sources.last().map_or(0, |s| s.end)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sources(&self) -> &[TileSource] {
        &self.sources
    }

    /// Register a file and return how many tiles it contributed.
    ///
    /// Probes, in order: an image the `image` crate can read (one tile), a
    /// tile archive, then a map container whose referenced archives are
    /// resolved relative to the container's directory.
    pub fn add_source(&mut self, path: impl AsRef<Path>) -> Result<usize, TileCacheError> {
        let path = path.as_ref();

        if image::ImageFormat::from_path(path).is_ok() && image::image_dimensions(path).is_ok() {
            self.push(SourceKind::Image, path, 1)?;
            debug!(path = %path.display(), "Added image tile");
            return Ok(1);
        }

        if is_smt(path) {
            let archive = SmtArchive::open(path)?;
            let count = archive.tile_count();
            self.push_archive(path, archive, count)?;
            info!(path = %path.display(), tiles = count, "Added tile archive");
            return Ok(count as usize);
        }

        if is_smf(path) {
            return self.add_container(path);
        }

        Err(TileCacheError::UnknownSource(path.to_path_buf()))
    }

    fn add_container(&mut self, path: &Path) -> Result<usize, TileCacheError> {
        let mut map = SmfContainer::open(path)?;
        map.read()?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        let mut added = 0usize;
        for reference in map.archives() {
            let resolved = dir.join(&reference.name);
            let declared = reference.tile_count;
            if is_smt(&resolved) {
                let archive = SmtArchive::open(&resolved)?;
                if archive.tile_count() != declared {
                    warn!(
                        path = %resolved.display(),
                        declared,
                        actual = archive.tile_count(),
                        "Archive tile count differs from the count the map lists"
                    );
                }
                self.push_archive(&resolved, archive, declared)?;
            } else {
                warn!(
                    map = %path.display(),
                    archive = %resolved.display(),
                    "Referenced tile archive not found; its tiles are unresolved"
                );
                self.push(SourceKind::ContainerReference, &resolved, declared)?;
            }
            added += declared as usize;
        }

        info!(path = %path.display(), archives = map.archives().len(), tiles = added, "Added map container");
        Ok(added)
    }

    fn push(&mut self, kind: SourceKind, path: &Path, count: u32) -> Result<(), TileCacheError> {
        let start = self.len();
        let end = start.checked_add(count).ok_or(TileCacheError::Overflow)?;
        if count > 0 {
            self.sources.push(TileSource {
                start,
                end,
                kind,
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn push_archive(&mut self, path: &Path, archive: SmtArchive, count: u32) -> Result<(), TileCacheError> {
        self.push(SourceKind::Archive, path, count)?;
        if count > 0 {
            self.archives.insert(self.sources.len() - 1, archive);
        }
        Ok(())
    }

    fn locate_position(&self, index: u32) -> Option<usize> {
        let pos = self.sources.partition_point(|s| s.end <= index);
        (pos < self.sources.len()).then_some(pos)
    }

    /// Source covering global tile `index`.
    pub fn locate(&self, index: u32) -> Option<&TileSource> {
        self.locate_position(index).map(|i| &self.sources[i])
    }

    /// Fetch tile `index` as a `tile_size × tile_size` image.
    pub fn get_tile(&mut self, index: u32) -> Result<RgbaImage, TileCacheError> {
        let pos = self.locate_position(index).ok_or(TileCacheError::NotFound {
            index,
            len: self.len(),
        })?;
        let source = &self.sources[pos];

        match source.kind {
            SourceKind::Image => {
                let image = image::open(&source.path)?.to_rgba8();
                if image.dimensions() == (self.tile_size, self.tile_size) {
                    Ok(image)
                } else {
                    Ok(imageops::resize(
                        &image,
                        self.tile_size,
                        self.tile_size,
                        FilterType::Triangle,
                    ))
                }
            }
            SourceKind::Archive => {
                let local = index - source.start;
                let archive = self
                    .archives
                    .get_mut(&pos)
                    .ok_or_else(|| TileCacheError::Unresolved {
                        index,
                        path: source.path.clone(),
                    })?;
                Ok(archive.get_tile(local)?)
            }
            SourceKind::ContainerReference => Err(TileCacheError::Unresolved {
                index,
                path: source.path.clone(),
            }),
        }
    }

    /// Reassemble a full image from a tile map.
    ///
    /// Each distinct index is decoded once.
    pub fn stitch(&mut self, tilemap: &TileMap) -> Result<RgbaImage, TileCacheError> {
        let ts = self.tile_size;
        let mut image = RgbaImage::new(tilemap.width() * ts, tilemap.height() * ts);
        let mut decoded: HashMap<u32, RgbaImage> = HashMap::new();

        for (i, index) in tilemap.iter().enumerate() {
            if !decoded.contains_key(&index) {
                let tile = self.get_tile(index)?;
                decoded.insert(index, tile);
            }
            let tile = &decoded[&index];
            let x = (i as u32 % tilemap.width()) * ts;
            let y = (i as u32 / tilemap.width()) * ts;
            imageops::replace(&mut image, tile, x as i64, y as i64);
        }

        debug!(
            width = image.width(),
            height = image.height(),
            distinct = decoded.len(),
            "Stitched tiles"
        );
        Ok(image)
    }
}

impl std::fmt::Debug for TileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileCache")
            .field("tile_size", &self.tile_size)
            .field("sources", &self.sources)
            .finish()
    }
}
