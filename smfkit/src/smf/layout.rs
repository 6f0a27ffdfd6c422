//! Section offset derivation.
//!
//! Offsets are never stored independently of sizes: every pointer is the sum
//! of the lengths before it, and every interval passes through a
//! [`ByteRegionMap`] so aliasing is caught before anything is written.

use super::error::SmfError;
use super::header::SMF_HEADER_BYTES;
use super::section::{Components, Section};
use crate::filemap::{ByteRegion, ByteRegionMap};

pub(crate) const HEADER_REGION: &str = "header";
pub(crate) const EXTENSIONS_REGION: &str = "extensions";

/// Computed or declared placement of every section.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    regions: ByteRegionMap,
}

impl Layout {
    /// Lay out sections back to back after the header and extensions.
    ///
    /// `lengths` gives the byte length of each present section; absent
    /// sections (e.g. grass without vegetation) are skipped.
    ///
    /// # Errors
    ///
    /// [`SmfError::Overlap`] if two intervals alias, [`SmfError::TooLarge`]
    /// if any section would start or end beyond `i32::MAX`.
    pub fn compute(
        extensions_len: u64,
        lengths: impl IntoIterator<Item = (Section, u64)>,
    ) -> Result<Self, SmfError> {
        let mut sorted: Vec<(Section, u64)> = lengths.into_iter().collect();
        sorted.sort_by_key(|(s, _)| *s);

        let mut regions = ByteRegionMap::new();
        regions.add(HEADER_REGION, 0, SMF_HEADER_BYTES)?;
        regions.add(EXTENSIONS_REGION, SMF_HEADER_BYTES, extensions_len)?;

        let mut cursor = SMF_HEADER_BYTES + extensions_len;
        for (section, len) in sorted {
            check_pointer(section.name(), cursor)?;
            let end = cursor.checked_add(len).ok_or(SmfError::TooLarge {
                section: section.name(),
                offset: u64::MAX,
            })?;
            regions.add(section.name(), cursor, len)?;
            cursor = end;
        }
        check_pointer("end of file", cursor)?;

        Ok(Self { regions })
    }

    /// Layout as declared by an existing file. Intervals are not checked;
    /// call [`overlaps`](Self::overlaps) to list collisions.
    pub fn declared(
        extensions_len: u64,
        placed: impl IntoIterator<Item = (Section, u64, u64)>,
    ) -> Self {
        let mut regions = ByteRegionMap::new();
        regions.add_unchecked(HEADER_REGION, 0, SMF_HEADER_BYTES);
        regions.add_unchecked(EXTENSIONS_REGION, SMF_HEADER_BYTES, extensions_len);
        for (section, offset, len) in placed {
            regions.add_unchecked(section.name(), offset, len);
        }
        Self { regions }
    }

    pub fn region(&self, section: Section) -> Option<&ByteRegion> {
        self.regions.get(section.name())
    }

    pub fn offset(&self, section: Section) -> Option<u64> {
        self.region(section).map(|r| r.begin)
    }

    /// Offset as a header pointer, 0 for absent sections.
    pub fn pointer(&self, section: Section) -> i32 {
        self.offset(section).map_or(0, |o| o as i32)
    }

    /// Total file length.
    pub fn end(&self) -> u64 {
        self.regions.end()
    }

    pub fn regions(&self) -> &[ByteRegion] {
        self.regions.regions()
    }

    pub fn overlaps(&self) -> Vec<crate::filemap::OverlapError> {
        self.regions.check_all()
    }

    /// Sections whose placement differs between the two layouts.
    pub fn changed_from(&self, other: &Layout) -> Components {
        let mut changed = Components::NONE;
        for section in Section::ORDER {
            let a = self.region(section).map(|r| (r.begin, r.end));
            let b = other.region(section).map(|r| (r.begin, r.end));
            if a != b {
                changed |= section.component();
            }
        }
        changed
    }
}

fn check_pointer(name: &'static str, offset: u64) -> Result<(), SmfError> {
    if offset > i32::MAX as u64 {
        return Err(SmfError::TooLarge {
            section: name,
            offset,
        });
    }
    Ok(())
}
