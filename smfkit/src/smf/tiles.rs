//! Tile index section.
//!
//! ```text
//! i32 archive_count
//! i32 total_tiles
//! archive_count × { i32 tile_count, NUL-terminated archive name }
//! (w/4 × l/4) × u32 tile index
//! ```

use super::error::SmfError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crate::binary::{ReadFieldExt, WriteFieldExt};
use crate::tilemap::TileMap;
use std::io::{Read, Write};

const TILE_HEADER_BYTES: u64 = 8;
const MAX_ARCHIVE_NAME: usize = 1024;

/// A tile archive referenced by a map, with the tile count it contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRef {
    pub name: String,
    pub tile_count: u32,
}

/// Total tiles contributed by `archives`.
pub fn total_tiles(archives: &[ArchiveRef]) -> u64 {
    archives.iter().map(|a| a.tile_count as u64).sum()
}

/// Byte length of the section for the given archive list and grid size.
pub fn section_len(archives: &[ArchiveRef], grid_width: u32, grid_height: u32) -> u64 {
    let names: u64 = archives.iter().map(|a| 4 + a.name.len() as u64 + 1).sum();
    TILE_HEADER_BYTES + names + grid_width as u64 * grid_height as u64 * 4
}

pub fn read_section<R: Read>(
    reader: &mut R,
    grid_width: u32,
    grid_height: u32,
) -> Result<(Vec<ArchiveRef>, TileMap), SmfError> {
    let archive_count = reader.read_i32::<LittleEndian>()?.max(0) as usize;
    let _total = reader.read_i32::<LittleEndian>()?;

    let mut archives = Vec::with_capacity(archive_count.min(256));
    for _ in 0..archive_count {
        let tile_count = reader.read_i32::<LittleEndian>()?.max(0) as u32;
        let name = reader.read_cstring(MAX_ARCHIVE_NAME)?;
        archives.push(ArchiveRef { name, tile_count });
    }

    let grid = reader.read_bytes(grid_width as usize * grid_height as usize * 4)?;
    let tilemap = TileMap::from_bytes(grid_width, grid_height, &grid)?;
    Ok((archives, tilemap))
}

pub fn write_section<W: Write>(
    writer: &mut W,
    archives: &[ArchiveRef],
    tilemap: &TileMap,
) -> Result<(), SmfError> {
    writer.write_i32::<LittleEndian>(archives.len() as i32)?;
    writer.write_i32::<LittleEndian>(total_tiles(archives).min(i32::MAX as u64) as i32)?;
    for archive in archives {
        writer.write_i32::<LittleEndian>(archive.tile_count as i32)?;
        writer.write_cstring(&archive.name)?;
    }
    writer.write_all(&tilemap.to_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_section_roundtrip() {
        let archives = vec![
            ArchiveRef {
                name: "map.smt".into(),
                tile_count: 3,
            },
            ArchiveRef {
                name: "extra.smt".into(),
                tile_count: 2,
            },
        ];
        let mut tilemap = TileMap::new(2, 2);
        tilemap.set(1, 1, 4).unwrap();

        let mut buf = Vec::new();
        write_section(&mut buf, &archives, &tilemap).unwrap();
        assert_eq!(buf.len() as u64, section_len(&archives, 2, 2));
        assert_eq!(&buf[4..8], &5i32.to_le_bytes());

        let (a, t) = read_section(&mut Cursor::new(buf), 2, 2).unwrap();
        assert_eq!(a, archives);
        assert_eq!(t, tilemap);
    }
}
