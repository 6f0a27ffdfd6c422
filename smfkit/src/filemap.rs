//! Byte region bookkeeping for binary file layouts.
//!
//! The container codec computes every section offset from the sizes of the
//! sections before it. [`ByteRegionMap`] records each computed interval and
//! refuses any interval that aliases one already registered, so a bug in the
//! size derivation surfaces as an error instead of a silently corrupted file.

use std::fmt;
use thiserror::Error;

/// A named half-open byte interval `[begin, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteRegion {
    /// Human-readable region name (e.g. "height", "features")
    pub name: String,
    /// First byte of the region
    pub begin: u64,
    /// One past the last byte of the region
    pub end: u64,
}

impl ByteRegion {
    /// Length of the region in bytes.
    pub fn len(&self) -> u64 {
        self.end - self.begin
    }

    /// Whether the region covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Whether two regions share at least one byte.
    pub fn overlaps(&self, other: &ByteRegion) -> bool {
        !self.is_empty() && !other.is_empty() && self.begin < other.end && other.begin < self.end
    }
}

impl fmt::Display for ByteRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, {})", self.name, self.begin, self.end)
    }
}

/// Two registered regions alias each other.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Byte region {new} overlaps {existing}")]
pub struct OverlapError {
    /// The region being added
    pub new: ByteRegion,
    /// The previously registered region it collides with
    pub existing: ByteRegion,
}

/// Interval map used to validate computed file layouts.
#[derive(Debug, Clone, Default)]
pub struct ByteRegionMap {
    regions: Vec<ByteRegion>,
}

impl ByteRegionMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `[begin, begin + len)` under `name`.
    ///
    /// Zero-length regions are recorded but never collide with anything.
    ///
    /// # Errors
    ///
    /// Returns [`OverlapError`] naming both regions when the new interval
    /// intersects one already in the map. The map is left unchanged.
    pub fn add(&mut self, name: impl Into<String>, begin: u64, len: u64) -> Result<(), OverlapError> {
        let region = ByteRegion {
            name: name.into(),
            begin,
            end: begin + len,
        };

        if let Some(existing) = self.regions.iter().find(|r| r.overlaps(&region)) {
            return Err(OverlapError {
                new: region,
                existing: existing.clone(),
            });
        }

        let pos = self
            .regions
            .partition_point(|r| (r.begin, r.end) <= (region.begin, region.end));
        self.regions.insert(pos, region);
        Ok(())
    }

    /// Register a region without checking it, for layouts read from disk.
    ///
    /// Use [`check_all`](Self::check_all) afterwards to list collisions.
    pub fn add_unchecked(&mut self, name: impl Into<String>, begin: u64, len: u64) {
        let region = ByteRegion {
            name: name.into(),
            begin,
            end: begin + len,
        };
        let pos = self
            .regions
            .partition_point(|r| (r.begin, r.end) <= (region.begin, region.end));
        self.regions.insert(pos, region);
    }

    /// Every pair of overlapping regions currently in the map.
    pub fn check_all(&self) -> Vec<OverlapError> {
        let mut found = Vec::new();
        for (i, a) in self.regions.iter().enumerate() {
            for b in &self.regions[i + 1..] {
                // Sorted by start: once b starts past a's end nothing later can overlap.
                if b.begin >= a.end {
                    break;
                }
                if a.overlaps(b) {
                    found.push(OverlapError {
                        new: b.clone(),
                        existing: a.clone(),
                    });
                }
            }
        }
        found
    }

    /// Registered regions ordered by start offset.
    pub fn regions(&self) -> &[ByteRegion] {
        &self.regions
    }

    /// Highest end offset of any region (0 when empty).
    pub fn end(&self) -> u64 {
        self.regions.iter().map(|r| r.end).max().unwrap_or(0)
    }

    /// Look up a region by name.
    pub fn get(&self, name: &str) -> Option<&ByteRegion> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Remove every region.
    pub fn clear(&mut self) {
        self.regions.clear();
    }
}
