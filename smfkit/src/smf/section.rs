//! Section identifiers, raster geometry and dirty masks.

use crate::dxt::{chain_bytes, MINIMAP_MIPS, MINIMAP_SIZE};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Data sections of a map container, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Height,
    Type,
    Tiles,
    Minimap,
    Metal,
    Features,
    Grass,
}

impl Section {
    /// Every section in the order it is laid out on disk.
    pub const ORDER: [Section; 7] = [
        Section::Height,
        Section::Type,
        Section::Tiles,
        Section::Minimap,
        Section::Metal,
        Section::Features,
        Section::Grass,
    ];

    /// Sections stored as plain rasters.
    pub const RASTERS: [Section; 5] = [
        Section::Height,
        Section::Type,
        Section::Minimap,
        Section::Metal,
        Section::Grass,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Section::Height => "height",
            Section::Type => "type",
            Section::Tiles => "tiles",
            Section::Minimap => "minimap",
            Section::Metal => "metal",
            Section::Features => "features",
            Section::Grass => "grass",
        }
    }

    pub fn component(self) -> Components {
        Components(1 << self as u32)
    }

    pub fn is_raster(self) -> bool {
        Self::RASTERS.contains(&self)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ORDER.into_iter().find(|s| s.name() == name)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of sections, used to track what needs writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Components(u32);

impl Components {
    pub const NONE: Components = Components(0);
    pub const HEIGHT: Components = Components(1 << Section::Height as u32);
    pub const TYPE: Components = Components(1 << Section::Type as u32);
    pub const TILES: Components = Components(1 << Section::Tiles as u32);
    pub const MINIMAP: Components = Components(1 << Section::Minimap as u32);
    pub const METAL: Components = Components(1 << Section::Metal as u32);
    pub const FEATURES: Components = Components(1 << Section::Features as u32);
    pub const GRASS: Components = Components(1 << Section::Grass as u32);
    pub const ALL: Components = Components((1 << Section::ORDER.len()) - 1);

    pub fn contains(self, other: Components) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn has(self, section: Section) -> bool {
        self.contains(section.component())
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Components) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Components) {
        self.0 &= !other.0;
    }

    /// Sections in the set, in file order.
    pub fn sections(self) -> impl Iterator<Item = Section> {
        Section::ORDER.into_iter().filter(move |s| self.has(*s))
    }
}

impl BitOr for Components {
    type Output = Components;
    fn bitor(self, rhs: Self) -> Self {
        Components(self.0 | rhs.0)
    }
}

impl BitOrAssign for Components {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Components {
    type Output = Components;
    fn bitand(self, rhs: Self) -> Self {
        Components(self.0 & rhs.0)
    }
}

impl Not for Components {
    type Output = Components;
    fn not(self) -> Self {
        Components(!self.0 & Self::ALL.0)
    }
}

impl fmt::Display for Components {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.sections().map(Section::name).collect();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Pixel storage of a raster section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    /// Little-endian `u16` per sample
    Gray16,
    Gray8,
    /// DXT1 mip chain
    Dxt1 { mips: usize },
}

/// Geometry of one raster section, derived from the map size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterSpec {
    pub width: u32,
    pub height: u32,
    pub format: RasterFormat,
}

impl RasterSpec {
    pub fn byte_len(&self) -> u64 {
        let pixels = self.width as u64 * self.height as u64;
        match self.format {
            RasterFormat::Gray16 => pixels * 2,
            RasterFormat::Gray8 => pixels,
            RasterFormat::Dxt1 { mips } => chain_bytes(self.width, mips) as u64,
        }
    }

    /// Spec of `section` for a `width × length` squares map.
    ///
    /// `None` for sections that are not rasters.
    pub fn for_section(section: Section, width: u32, length: u32) -> Option<Self> {
        let (w, h, format) = match section {
            Section::Height => (width + 1, length + 1, RasterFormat::Gray16),
            Section::Type | Section::Metal => (width / 2, length / 2, RasterFormat::Gray8),
            Section::Grass => (width / 4, length / 4, RasterFormat::Gray8),
            Section::Minimap => (
                MINIMAP_SIZE,
                MINIMAP_SIZE,
                RasterFormat::Dxt1 { mips: MINIMAP_MIPS },
            ),
            Section::Tiles | Section::Features => return None,
        };
        Some(Self {
            width: w,
            height: h,
            format,
        })
    }
}
