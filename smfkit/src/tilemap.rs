//! Tile index grid.
//!
//! One `u32` archive-wide tile index per 32×32 texel tile, row-major. The grid
//! is stored in the map container as little-endian words and exchanged with
//! users as a CSV companion file (one row per line).

use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised by [`TileMap`].
#[derive(Debug, Error)]
pub enum TileMapError {
    #[error("Tile map position ({x}, {y}) out of bounds for {width}×{height}")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("Tile map data is {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },

    #[error("Tile map CSV line {line}: invalid index '{value}'")]
    Parse { line: usize, value: String },

    #[error("Tile map CSV line {line} has {actual} columns, expected {expected}")]
    Ragged {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Tile map CSV is empty")]
    Empty,

    #[error("Tile map I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Row-major grid of tile indices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TileMap {
    width: u32,
    height: u32,
    cells: Vec<u32>,
}

impl TileMap {
    /// Zero-filled `width × height` map.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells.iter().copied()
    }

    fn offset(&self, x: u32, y: u32) -> Result<usize, TileMapError> {
        if x >= self.width || y >= self.height {
            return Err(TileMapError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: u32, y: u32) -> Result<u32, TileMapError> {
        Ok(self.cells[self.offset(x, y)?])
    }

    pub fn set(&mut self, x: u32, y: u32, index: u32) -> Result<(), TileMapError> {
        let i = self.offset(x, y)?;
        self.cells[i] = index;
        Ok(())
    }

    /// Largest index in the map, `None` when empty.
    pub fn max_index(&self) -> Option<u32> {
        self.cells.iter().copied().max()
    }

    /// Little-endian binary form.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.cells.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    pub fn from_bytes(width: u32, height: u32, data: &[u8]) -> Result<Self, TileMapError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TileMapError::Length {
                expected,
                actual: data.len(),
            });
        }
        let cells = data
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() * 4);
        for row in self.cells.chunks(self.width.max(1) as usize) {
            let line: Vec<String> = row.iter().map(u32::to_string).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out
    }

    /// Parse CSV text. Blank lines are skipped; every row must have the same
    /// number of columns.
    pub fn from_csv(text: &str) -> Result<Self, TileMapError> {
        let mut width = None;
        let mut height = 0u32;
        let mut cells = Vec::new();

        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let before = cells.len();
            for value in line.split(',') {
                let value = value.trim();
                let index = value.parse::<u32>().map_err(|_| TileMapError::Parse {
                    line: n + 1,
                    value: value.to_string(),
                })?;
                cells.push(index);
            }
            let columns = cells.len() - before;
            match width {
                None => width = Some(columns),
                Some(w) if w != columns => {
                    return Err(TileMapError::Ragged {
                        line: n + 1,
                        expected: w,
                        actual: columns,
                    })
                }
                Some(_) => {}
            }
            height += 1;
        }

        let width = width.ok_or(TileMapError::Empty)?;
        Ok(Self {
            width: width as u32,
            height,
            cells,
        })
    }

    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<(), TileMapError> {
        fs::write(path, self.to_csv())?;
        Ok(())
    }

    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self, TileMapError> {
        Self::from_csv(&fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zero_filled() {
        let map = TileMap::new(4, 3);
        assert_eq!(map.len(), 12);
        assert!(map.iter().all(|v| v == 0));
        assert_eq!(map.max_index(), Some(0));
    }

    #[test]
    fn test_set_get_bounds() {
        let mut map = TileMap::new(2, 2);
        map.set(1, 1, 7).unwrap();
        assert_eq!(map.get(1, 1).unwrap(), 7);
        assert_eq!(map.as_slice(), &[0, 0, 0, 7]);
        assert!(matches!(
            map.set(2, 0, 1),
            Err(TileMapError::OutOfBounds { x: 2, y: 0, .. })
        ));
    }

    #[test]
    fn test_bytes_are_little_endian() {
        let mut map = TileMap::new(2, 1);
        map.set(1, 0, 0x0102_0304).unwrap();
        let bytes = map.to_bytes();
        assert_eq!(bytes, [0, 0, 0, 0, 4, 3, 2, 1]);
        assert_eq!(TileMap::from_bytes(2, 1, &bytes).unwrap(), map);
        assert!(TileMap::from_bytes(3, 1, &bytes).is_err());
    }

    #[test]
    fn test_csv_roundtrip() {
        let mut map = TileMap::new(3, 2);
        for (i, (x, y)) in [(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)].iter().enumerate() {
            map.set(*x, *y, i as u32 * 10).unwrap();
        }
        let csv = map.to_csv();
        assert_eq!(csv, "0,10,20\n30,40,50\n");
        assert_eq!(TileMap::from_csv(&csv).unwrap(), map);
    }

    #[test]
    fn test_csv_skips_blank_lines() {
        let map = TileMap::from_csv("\n1, 2\n\n3,4\n\n").unwrap();
        assert_eq!((map.width(), map.height()), (2, 2));
        assert_eq!(map.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_csv_rejects_ragged_rows() {
        let err = TileMap::from_csv("1,2\n3\n").unwrap_err();
        assert!(matches!(
            err,
            TileMapError::Ragged {
                line: 2,
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_csv_rejects_garbage() {
        assert!(matches!(
            TileMap::from_csv("1,x\n"),
            Err(TileMapError::Parse { line: 1, .. })
        ));
        assert!(matches!(TileMap::from_csv("\n\n"), Err(TileMapError::Empty)));
    }

    #[test]
    fn test_csv_file_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tilemap.csv");
        let mut map = TileMap::new(2, 2);
        map.set(0, 1, 99).unwrap();
        map.save_csv(&path).unwrap();
        assert_eq!(TileMap::load_csv(&path).unwrap(), map);
    }
}
