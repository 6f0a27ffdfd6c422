//! Sequential near-duplicate detection.

use super::compare::{border_ring, compare_borders};
use super::stat::FastStat;
use image::RgbaImage;
use std::collections::HashMap;
use tracing::trace;

/// Base threshold on the mean colour terms.
pub const DEFAULT_MEAN_THRESHOLD: f64 = 2.0;

/// Base threshold on the directional terms.
pub const DEFAULT_DIRECTION_THRESHOLD: f64 = 4.0;

/// Base threshold on the summed squared border difference.
pub const DEFAULT_BORDER_THRESHOLD: f64 = 6000.0;

/// Match thresholds. A candidate matches when every difference is strictly
/// below its threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DedupThresholds {
    pub mean: f64,
    pub direction: f64,
    pub border: f64,
}

impl Default for DedupThresholds {
    fn default() -> Self {
        Self {
            mean: DEFAULT_MEAN_THRESHOLD,
            direction: DEFAULT_DIRECTION_THRESHOLD,
            border: DEFAULT_BORDER_THRESHOLD,
        }
    }
}

impl DedupThresholds {
    /// Scale every base threshold by the compression factor.
    pub fn from_factor(base: DedupThresholds, factor: f64) -> Self {
        Self {
            mean: base.mean * factor,
            direction: base.direction * factor,
            border: base.border * factor,
        }
    }
}

/// What [`TileDeduplicator::dedup`] decided for a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    /// Close enough to an accepted tile; reuse its index
    Reused(u32),
    /// Accepted as a new unique tile at this index
    Unique(u32),
}

impl DedupOutcome {
    pub fn index(self) -> u32 {
        match self {
            DedupOutcome::Reused(i) | DedupOutcome::Unique(i) => i,
        }
    }
}

struct Entry {
    stat: FastStat,
    ring: Vec<[u8; 3]>,
}

/// Accepted-tile list scanned in insertion order.
///
/// Only fingerprints and borders are retained, never the full tile. A tile
/// whose border ring is identical to an accepted tile's always matches, even
/// when the fingerprints disagree because the interiors differ.
pub struct TileDeduplicator {
    thresholds: DedupThresholds,
    enabled: bool,
    entries: Vec<Entry>,
    /// First accepted index for each distinct border ring.
    exact_borders: HashMap<Vec<[u8; 3]>, u32>,
}

impl TileDeduplicator {
    pub fn new(thresholds: DedupThresholds) -> Self {
        Self {
            thresholds,
            enabled: true,
            entries: Vec::new(),
            exact_borders: HashMap::new(),
        }
    }

    /// A deduplicator that accepts every tile as unique.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(DedupThresholds::default())
        }
    }

    pub fn thresholds(&self) -> DedupThresholds {
        self.thresholds
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of accepted tiles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First accepted tile that matches `candidate`, skipping `exclude`.
    pub fn find_close_match(&self, candidate: &RgbaImage, exclude: Option<u32>) -> Option<u32> {
        if !self.enabled {
            return None;
        }
        let stat = FastStat::of(candidate);
        let ring = border_ring(candidate);
        self.find_entry(&stat, &ring, exclude)
    }

    /// Earliest entry that is either close on fingerprint and border, or has
    /// exactly the same border ring.
    fn find_entry(&self, stat: &FastStat, ring: &[[u8; 3]], exclude: Option<u32>) -> Option<u32> {
        let t = &self.thresholds;
        let exact = if t.border > 0.0 {
            self.exact_borders
                .get(ring)
                .copied()
                .filter(|i| Some(*i) != exclude)
        } else {
            None
        };
        // Entries at or past the exact hit cannot win on insertion order.
        let limit = exact.map_or(self.entries.len(), |i| i as usize);

        self.entries[..limit]
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i as u32) != exclude)
            .find(|(_, e)| {
                e.stat.is_close(stat, t.mean, t.direction) && compare_borders(&e.ring, ring, t.border)
            })
            .map(|(i, _)| i as u32)
            .or(exact)
    }

    fn push(&mut self, stat: FastStat, ring: Vec<[u8; 3]>) -> u32 {
        let index = self.entries.len() as u32;
        self.exact_borders.entry(ring.clone()).or_insert(index);
        self.entries.push(Entry { stat, ring });
        index
    }

    /// Accept `tile` as unique and return its index.
    pub fn insert(&mut self, tile: &RgbaImage) -> u32 {
        self.push(FastStat::of(tile), border_ring(tile))
    }

    /// Reuse a matching accepted tile or accept `tile` as new.
    pub fn dedup(&mut self, tile: &RgbaImage) -> DedupOutcome {
        let stat = FastStat::of(tile);
        let ring = border_ring(tile);
        if self.enabled {
            if let Some(index) = self.find_entry(&stat, &ring, None) {
                trace!(index, "Reusing close tile");
                return DedupOutcome::Reused(index);
            }
        }
        DedupOutcome::Unique(self.push(stat, ring))
    }
}
