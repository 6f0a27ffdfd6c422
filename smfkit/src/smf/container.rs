//! In-memory map container with dirty tracking.

use super::error::SmfError;
use super::extension::Extension;
use super::features::FeatureList;
use super::header::{validate_size, SmfHeader, SMF_HEADER_BYTES};
use super::layout::Layout;
use super::raster::{BlankIo, RasterIo, RasterRequest};
use super::section::{Components, RasterSpec, Section};
use super::tiles::{self, ArchiveRef};
use crate::filemap::OverlapError;
use crate::tilemap::TileMap;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Squares per map unit.
pub const SQUARES_PER_UNIT: u32 = 64;

/// Squares per tile index cell.
const SQUARES_PER_TILE: u32 = 4;

/// A declared section offset that differs from the one derived from sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerMismatch {
    pub section: Section,
    pub declared: u64,
    pub derived: u64,
}

/// Anomalies found by [`SmfContainer::read`]. None of them is fatal.
#[derive(Debug, Clone, Default)]
pub struct ReadReport {
    pub pointer_mismatches: Vec<PointerMismatch>,
    pub overlaps: Vec<OverlapError>,
    pub unknown_extensions: usize,
}

impl ReadReport {
    pub fn is_clean(&self) -> bool {
        self.pointer_mismatches.is_empty() && self.overlaps.is_empty()
    }
}

/// A Spring map file.
///
/// Mutators only touch memory and mark the affected sections dirty. Nothing
/// reaches disk until [`write`](Self::write), which always writes the header
/// last so an interrupted write never leaves a header pointing at sections
/// that were not written.
///
/// An opened container holds only its header until [`read`](Self::read);
/// writing it before then fails with [`SmfError::NotLoaded`].
pub struct SmfContainer {
    path: PathBuf,
    header: SmfHeader,
    extensions: Vec<Extension>,
    archives: Vec<ArchiveRef>,
    tilemap: TileMap,
    features: FeatureList,
    rasters: BTreeMap<Section, Vec<u8>>,
    specs: BTreeMap<Section, RasterSpec>,
    layout: Layout,
    on_disk: Option<Layout>,
    dirty: Components,
    /// Sections in memory are the container's full content
    loaded: bool,
    raster_io: Box<dyn RasterIo>,
}

impl SmfContainer {
    /// Start a new container that will be written to `path`.
    ///
    /// The file is not touched until the first write. The map has no size
    /// yet; call [`set_size`](Self::set_size) before writing.
    pub fn create(path: impl AsRef<Path>, overwrite: bool) -> Result<Self, SmfError> {
        let path = path.as_ref();
        if path.exists() && !overwrite {
            return Err(SmfError::AlreadyExists(path.to_path_buf()));
        }
        let header = SmfHeader {
            map_id: rand::random::<i32>() & i32::MAX,
            ..SmfHeader::default()
        };
        let mut container = Self::with_header(path, header, Vec::new());
        container.loaded = true;
        Ok(container)
    }

    /// Open an existing container and validate its header and extensions.
    ///
    /// Sections are not loaded; call [`read`](Self::read).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SmfError> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let (header, extensions) = read_head(&mut reader, path)?;
        Ok(Self::with_header(path, header, extensions))
    }

    /// The tile map stays empty here; it is sized by `read` or `set_size`.
    fn with_header(path: &Path, header: SmfHeader, extensions: Vec<Extension>) -> Self {
        let mut container = Self {
            path: path.to_path_buf(),
            header,
            extensions,
            archives: Vec::new(),
            tilemap: TileMap::default(),
            features: FeatureList::new(),
            rasters: BTreeMap::new(),
            specs: BTreeMap::new(),
            layout: Layout::default(),
            on_disk: None,
            dirty: Components::NONE,
            loaded: false,
            raster_io: Box::new(BlankIo),
        };
        container.update_specs();
        container
    }

    /// Load every section from disk at its declared offset.
    ///
    /// Declared offsets are compared against the offsets derived from the
    /// section sizes; disagreements and overlapping intervals are logged and
    /// reported, not treated as errors.
    pub fn read(&mut self) -> Result<ReadReport, SmfError> {
        let file = File::open(&self.path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let (header, extensions) = read_head(&mut reader, &self.path)?;
        self.header = header;
        self.extensions = extensions;
        self.update_specs();

        let mut report = ReadReport {
            unknown_extensions: self
                .extensions
                .iter()
                .filter(|e| matches!(e, Extension::Unknown { .. }))
                .count(),
            ..ReadReport::default()
        };

        let (gw, gh) = self.grid_size();
        let tiles_ptr = self.header.tiles_ptr as u64;
        seek_section(&mut reader, Section::Tiles, tiles_ptr, file_len)?;
        // The grid alone must fit in the file before it is allocated.
        if tiles_ptr + tiles::section_len(&[], gw, gh) > file_len {
            return Err(SmfError::Truncated {
                section: Section::Tiles.name(),
                offset: tiles_ptr,
                file_len,
            });
        }
        let (archives, tilemap) = tiles::read_section(&mut reader, gw, gh)
            .map_err(|e| eof_as_truncated(e, Section::Tiles, tiles_ptr, file_len))?;

        let features_ptr = self.header.features_ptr as u64;
        seek_section(&mut reader, Section::Features, features_ptr, file_len)?;
        let features = FeatureList::read_from(&mut reader)
            .map_err(|e| eof_as_truncated(e, Section::Features, features_ptr, file_len))?;

        let mut rasters = BTreeMap::new();
        for (&section, spec) in &self.specs {
            let offset = self.declared_pointer(section).unwrap_or(0).max(0) as u64;
            let len = spec.byte_len();
            if offset + len > file_len {
                return Err(SmfError::Truncated {
                    section: section.name(),
                    offset,
                    file_len,
                });
            }
            reader.seek(SeekFrom::Start(offset))?;
            let mut data = vec![0u8; len as usize];
            reader.read_exact(&mut data)?;
            rasters.insert(section, data);
        }

        self.archives = archives;
        self.tilemap = tilemap;
        self.features = features;
        self.rasters = rasters;

        let lengths = self.section_lengths();
        let declared = Layout::declared(
            self.extensions_len(),
            lengths.iter().map(|&(section, len)| {
                let offset = self.declared_pointer(section).unwrap_or(0).max(0) as u64;
                (section, offset, len)
            }),
        );
        let derived = Layout::compute(self.extensions_len(), lengths)?;

        for section in Section::ORDER {
            if let (Some(d), Some(c)) = (declared.offset(section), derived.offset(section)) {
                if d != c {
                    warn!(section = %section, declared = d, derived = c, "Section offset differs from derived layout");
                    report.pointer_mismatches.push(PointerMismatch {
                        section,
                        declared: d,
                        derived: c,
                    });
                }
            }
        }
        for overlap in declared.overlaps() {
            warn!("{}", overlap);
            report.overlaps.push(overlap);
        }

        self.layout = declared.clone();
        self.on_disk = Some(declared);
        self.dirty = Components::NONE;
        self.loaded = true;

        info!(
            path = %self.path.display(),
            width = self.header.width,
            length = self.header.length,
            archives = self.archives.len(),
            features = self.features.len(),
            "Read map container"
        );
        Ok(report)
    }

    /// Write the sections in `mask` plus any whose placement moved since
    /// the last write, then the header.
    ///
    /// # Errors
    ///
    /// [`SmfError::NotLoaded`] for an opened container that was never
    /// [`read`](Self::read).
    pub fn write(&mut self, mask: Components) -> Result<(), SmfError> {
        if !self.loaded {
            return Err(SmfError::NotLoaded(self.path.clone()));
        }
        validate_size(self.header.width as i64, self.header.length as i64)?;
        self.update_ptrs()?;

        let moved = match &self.on_disk {
            Some(previous) => self.layout.changed_from(previous),
            None => Components::ALL,
        };
        let present = self.present();
        let mask = (mask | moved) & present;

        if let Some(max) = self.tilemap.max_index() {
            let total = tiles::total_tiles(&self.archives);
            if total > 0 && max as u64 >= total {
                warn!(max, total, "Tile map references tiles beyond the listed archives");
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);

        for section in mask.sections() {
            let Some(region) = self.layout.region(section).cloned() else {
                continue;
            };
            let bytes = self.section_bytes(section)?;
            if bytes.len() as u64 != region.len() {
                return Err(SmfError::RasterLength {
                    section,
                    expected: region.len(),
                    actual: bytes.len() as u64,
                });
            }
            writer.seek(SeekFrom::Start(region.begin))?;
            writer.write_all(&bytes)?;
            debug!(section = %section, offset = region.begin, len = region.len(), "Wrote section");
        }

        writer.seek(SeekFrom::Start(0))?;
        self.header.write_to(&mut writer)?;
        for ext in &self.extensions {
            ext.write_to(&mut writer)?;
        }
        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.set_len(self.layout.end())?;
        file.sync_all()?;

        self.on_disk = Some(self.layout.clone());
        self.dirty.remove(mask);

        info!(path = %self.path.display(), sections = %mask, bytes = self.layout.end(), "Wrote map container");
        Ok(())
    }

    /// Write every dirty section.
    pub fn write_dirty(&mut self) -> Result<(), SmfError> {
        self.write(self.dirty)
    }

    fn section_bytes(&self, section: Section) -> Result<Vec<u8>, SmfError> {
        match section {
            Section::Tiles => {
                let mut buf = Vec::new();
                tiles::write_section(&mut buf, &self.archives, &self.tilemap)?;
                Ok(buf)
            }
            Section::Features => {
                let mut buf = Vec::new();
                self.features.write_to(&mut buf)?;
                Ok(buf)
            }
            _ => {
                if let Some(data) = self.rasters.get(&section) {
                    return Ok(data.clone());
                }
                let spec = self.specs.get(&section).copied().ok_or(SmfError::Absent(section))?;
                self.raster_io.supply(&RasterRequest {
                    section,
                    spec,
                    min_height: self.header.min_height,
                    max_height: self.header.max_height,
                })
            }
        }
    }

    /// Re-derive every raster's geometry from the map size.
    pub fn update_specs(&mut self) {
        let w = self.header.width.max(0) as u32;
        let l = self.header.length.max(0) as u32;
        let grass = self.has_grass();
        self.specs = Section::RASTERS
            .into_iter()
            .filter(|s| *s != Section::Grass || grass)
            .filter_map(|s| RasterSpec::for_section(s, w, l).map(|spec| (s, spec)))
            .collect();
    }

    /// Recompute section offsets and store them in the header.
    ///
    /// # Errors
    ///
    /// [`SmfError::Overlap`] on aliasing, [`SmfError::TooLarge`] when an
    /// offset does not fit the 32-bit pointer fields.
    pub fn update_ptrs(&mut self) -> Result<(), SmfError> {
        let layout = Layout::compute(self.extensions_len(), self.section_lengths())?;

        self.header.height_ptr = layout.pointer(Section::Height);
        self.header.type_ptr = layout.pointer(Section::Type);
        self.header.tiles_ptr = layout.pointer(Section::Tiles);
        self.header.minimap_ptr = layout.pointer(Section::Minimap);
        self.header.metal_ptr = layout.pointer(Section::Metal);
        self.header.features_ptr = layout.pointer(Section::Features);
        self.header.extension_count = self.extensions.len() as i32;
        let grass_ptr = layout.pointer(Section::Grass);
        for ext in &mut self.extensions {
            if let Extension::Vegetation { grass_ptr: ptr } = ext {
                *ptr = grass_ptr;
            }
        }

        for region in layout.regions() {
            debug!(region = %region, "Layout");
        }
        self.layout = layout;
        Ok(())
    }

    fn section_lengths(&self) -> Vec<(Section, u64)> {
        let mut lengths: Vec<(Section, u64)> = self
            .specs
            .iter()
            .map(|(s, spec)| (*s, spec.byte_len()))
            .collect();
        let (gw, gh) = self.grid_size();
        lengths.push((Section::Tiles, tiles::section_len(&self.archives, gw, gh)));
        lengths.push((Section::Features, self.features.byte_len()));
        lengths
    }

    fn extensions_len(&self) -> u64 {
        self.extensions.iter().map(Extension::byte_size).sum()
    }

    fn present(&self) -> Components {
        let mut c = Components::TILES | Components::FEATURES;
        for s in self.specs.keys() {
            c |= s.component();
        }
        c
    }

    fn declared_pointer(&self, section: Section) -> Option<i32> {
        let h = &self.header;
        match section {
            Section::Height => Some(h.height_ptr),
            Section::Type => Some(h.type_ptr),
            Section::Tiles => Some(h.tiles_ptr),
            Section::Minimap => Some(h.minimap_ptr),
            Section::Metal => Some(h.metal_ptr),
            Section::Features => Some(h.features_ptr),
            Section::Grass => self.extensions.iter().find_map(|e| match e {
                Extension::Vegetation { grass_ptr } => Some(*grass_ptr),
                Extension::Unknown { .. } => None,
            }),
        }
    }

    fn grid_size(&self) -> (u32, u32) {
        (
            self.header.width.max(0) as u32 / SQUARES_PER_TILE,
            self.header.length.max(0) as u32 / SQUARES_PER_TILE,
        )
    }

    /// Mark `sections` dirty and relayout, forcing a rewrite of anything that moved.
    fn touch(&mut self, sections: Components) -> Result<(), SmfError> {
        self.dirty |= sections;
        self.update_ptrs()
    }

    // Mutators

    /// Set the map size in map units (64 squares each).
    pub fn set_size(&mut self, width_units: u32, length_units: u32) -> Result<(), SmfError> {
        let invalid = |reason| SmfError::InvalidSize {
            width: width_units as i64 * SQUARES_PER_UNIT as i64,
            length: length_units as i64 * SQUARES_PER_UNIT as i64,
            reason,
        };
        if width_units == 0 || length_units == 0 {
            return Err(invalid("map size must be at least one unit"));
        }
        let w = width_units
            .checked_mul(SQUARES_PER_UNIT)
            .ok_or_else(|| invalid("dimensions exceed 32 bits"))?;
        let l = length_units
            .checked_mul(SQUARES_PER_UNIT)
            .ok_or_else(|| invalid("dimensions exceed 32 bits"))?;
        self.set_size_squares(w, l)
    }

    /// Set the map size in squares. Both dimensions must be positive
    /// multiples of 4.
    ///
    /// Resizing discards in-memory rasters and resets the tile map. On error
    /// the container is left unchanged.
    pub fn set_size_squares(&mut self, width: u32, length: u32) -> Result<(), SmfError> {
        validate_size(width as i64, length as i64)?;
        if (width as i32, length as i32) == (self.header.width, self.header.length) {
            return Ok(());
        }

        let old_size = (self.header.width, self.header.length);
        let old_rasters = std::mem::take(&mut self.rasters);
        let old_tilemap = std::mem::take(&mut self.tilemap);

        self.header.width = width as i32;
        self.header.length = length as i32;
        self.update_specs();

        // Layout first: the grid is only allocated once the size is known to fit.
        if let Err(e) = self.update_ptrs() {
            self.header.width = old_size.0;
            self.header.length = old_size.1;
            self.rasters = old_rasters;
            self.tilemap = old_tilemap;
            self.update_specs();
            return Err(e);
        }
        let (gw, gh) = self.grid_size();
        self.tilemap = TileMap::new(gw, gh);
        self.dirty = Components::ALL;
        debug!(width, length, "Map resized");
        Ok(())
    }

    pub fn set_height_range(&mut self, min: f32, max: f32) -> Result<(), SmfError> {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(SmfError::InvalidHeightRange { min, max });
        }
        self.header.min_height = min;
        self.header.max_height = max;
        Ok(())
    }

    pub fn set_map_id(&mut self, id: i32) {
        self.header.map_id = id;
    }

    /// Add or remove the vegetation extension and its grass raster.
    pub fn enable_grass(&mut self, enabled: bool) -> Result<(), SmfError> {
        if enabled == self.has_grass() {
            return Ok(());
        }
        if enabled {
            self.extensions.push(Extension::Vegetation { grass_ptr: 0 });
        } else {
            self.extensions
                .retain(|e| !matches!(e, Extension::Vegetation { .. }));
            self.rasters.remove(&Section::Grass);
        }
        self.update_specs();
        self.touch(Components::GRASS)
    }

    pub fn has_grass(&self) -> bool {
        self.extensions
            .iter()
            .any(|e| matches!(e, Extension::Vegetation { .. }))
    }

    /// Reference a tile archive. Archives are indexed in the order added.
    pub fn add_archive(&mut self, name: impl Into<String>, tile_count: u32) -> Result<(), SmfError> {
        self.archives.push(ArchiveRef {
            name: name.into(),
            tile_count,
        });
        self.touch(Components::TILES)
    }

    pub fn clear_archives(&mut self) -> Result<(), SmfError> {
        self.archives.clear();
        self.touch(Components::TILES)
    }

    /// Replace the tile index grid. It must be `width/4 × length/4`.
    pub fn set_tilemap(&mut self, tilemap: TileMap) -> Result<(), SmfError> {
        let (width, height) = self.grid_size();
        if (tilemap.width(), tilemap.height()) != (width, height) {
            return Err(SmfError::TileMapSize {
                width,
                height,
                actual_width: tilemap.width(),
                actual_height: tilemap.height(),
            });
        }
        self.tilemap = tilemap;
        self.touch(Components::TILES)
    }

    pub fn add_feature(
        &mut self,
        name: &str,
        x: f32,
        y: f32,
        z: f32,
        rotation: f32,
        scale: f32,
    ) -> Result<(), SmfError> {
        self.features.add(name, x, y, z, rotation, scale);
        self.touch(Components::FEATURES)
    }

    /// Append features from a CSV file, returning how many were added.
    pub fn add_features_from_csv(&mut self, path: impl AsRef<Path>) -> Result<usize, SmfError> {
        let added = self.features.load_csv(path)?;
        self.touch(Components::FEATURES)?;
        Ok(added)
    }

    pub fn clear_features(&mut self) -> Result<(), SmfError> {
        self.features.clear();
        self.touch(Components::FEATURES)
    }

    /// Store raw bytes for a raster section.
    pub fn set_raster(&mut self, section: Section, data: Vec<u8>) -> Result<(), SmfError> {
        if !section.is_raster() {
            return Err(SmfError::NotRaster(section));
        }
        let spec = self.specs.get(&section).ok_or(SmfError::Absent(section))?;
        if data.len() as u64 != spec.byte_len() {
            return Err(SmfError::RasterLength {
                section,
                expected: spec.byte_len(),
                actual: data.len() as u64,
            });
        }
        self.rasters.insert(section, data);
        self.dirty |= section.component();
        Ok(())
    }

    /// Source for rasters that have no in-memory bytes at write time.
    pub fn set_raster_io(&mut self, io: Box<dyn RasterIo>) {
        self.raster_io = io;
    }

    // Getters

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &SmfHeader {
        &self.header
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn spec(&self, section: Section) -> Option<RasterSpec> {
        self.specs.get(&section).copied()
    }

    pub fn raster(&self, section: Section) -> Option<&[u8]> {
        self.rasters.get(&section).map(Vec::as_slice)
    }

    pub fn archives(&self) -> &[ArchiveRef] {
        &self.archives
    }

    pub fn tilemap(&self) -> &TileMap {
        &self.tilemap
    }

    pub fn features(&self) -> &FeatureList {
        &self.features
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn dirty(&self) -> Components {
        self.dirty
    }

    /// Human-readable multi-line summary.
    pub fn info(&self) -> String {
        let h = &self.header;
        let (gw, gh) = self.grid_size();
        let mut lines = vec![
            format!("Map container: {}", self.path.display()),
            format!("  Version:      {}", h.version),
            format!("  Map ID:       {}", h.map_id),
            format!(
                "  Size:         {}×{} squares ({}×{} units)",
                h.width,
                h.length,
                h.width / SQUARES_PER_UNIT as i32,
                h.length / SQUARES_PER_UNIT as i32
            ),
            format!("  Tile grid:    {}×{}", gw, gh),
            format!("  Height range: {} .. {}", h.min_height, h.max_height),
            "  Sections:".to_string(),
        ];
        for section in Section::ORDER {
            if let Some(r) = self.layout.region(section) {
                lines.push(format!(
                    "    {:<9} offset {:>10}  {:>10} bytes",
                    section.name(),
                    r.begin,
                    r.len()
                ));
            }
        }
        lines.push(format!(
            "  Archives:     {} ({} tiles)",
            self.archives.len(),
            tiles::total_tiles(&self.archives)
        ));
        for a in &self.archives {
            lines.push(format!("    {} ({} tiles)", a.name, a.tile_count));
        }
        lines.push(format!(
            "  Features:     {} ({} types)",
            self.features.len(),
            self.features.types().len()
        ));
        lines.push(format!("  Extensions:   {}", self.extensions.len()));
        for ext in &self.extensions {
            match ext {
                Extension::Vegetation { grass_ptr } => {
                    lines.push(format!("    vegetation (grass at {})", grass_ptr))
                }
                Extension::Unknown { tag, payload } => {
                    lines.push(format!("    unknown tag {} ({} bytes)", tag, payload.len()))
                }
            }
        }
        lines.join("\n")
    }
}

impl std::fmt::Debug for SmfContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmfContainer")
            .field("path", &self.path)
            .field("header", &self.header)
            .field("extensions", &self.extensions)
            .field("archives", &self.archives)
            .field("dirty", &self.dirty)
            .finish()
    }
}

fn read_head<R: Read>(reader: &mut R, path: &Path) -> Result<(SmfHeader, Vec<Extension>), SmfError> {
    let header = SmfHeader::read_from(reader, path)?;
    header.validate()?;
    let count = header.extension_count.max(0) as usize;
    let mut extensions = Vec::with_capacity(count.min(16));
    for index in 0..count {
        extensions.push(Extension::read_from(reader, index)?);
    }
    Ok((header, extensions))
}

fn seek_section<R: Seek>(reader: &mut R, section: Section, offset: u64, file_len: u64) -> Result<(), SmfError> {
    if offset < SMF_HEADER_BYTES || offset >= file_len {
        return Err(SmfError::Truncated {
            section: section.name(),
            offset,
            file_len,
        });
    }
    reader.seek(SeekFrom::Start(offset))?;
    Ok(())
}

fn eof_as_truncated(err: SmfError, section: Section, offset: u64, file_len: u64) -> SmfError {
    match err {
        SmfError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => SmfError::Truncated {
            section: section.name(),
            offset,
            file_len,
        },
        other => other,
    }
}
