//! SMF header codec.
//!
//! ```text
//! offset  size  field
//!      0    16  magic "spring map file\0"
//!     16     4  version (1)
//!     20     4  map id
//!     24     4  width in squares
//!     28     4  length in squares
//!     32     4  square size (8)
//!     36     4  texels per square (8)
//!     40     4  tile size (32)
//!     44     4  min height (f32)
//!     48     4  max height (f32)
//!     52     4  height map offset
//!     56     4  type map offset
//!     60     4  tile index offset
//!     64     4  minimap offset
//!     68     4  metal map offset
//!     72     4  feature section offset
//!     76     4  extension count
//! ```

use super::error::SmfError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use std::path::Path;

pub const SMF_MAGIC: &[u8; 16] = b"spring map file\0";
pub const SMF_VERSION: i32 = 1;
pub const SMF_HEADER_BYTES: u64 = 80;
pub const SQUARE_SIZE: i32 = 8;
pub const TEXELS_PER_SQUARE: i32 = 8;
pub const MAP_TILE_SIZE: i32 = 32;

/// Map container header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmfHeader {
    pub version: i32,
    pub map_id: i32,
    /// Width in squares
    pub width: i32,
    /// Length in squares
    pub length: i32,
    pub square_size: i32,
    pub texels_per_square: i32,
    pub tile_size: i32,
    pub min_height: f32,
    pub max_height: f32,
    pub height_ptr: i32,
    pub type_ptr: i32,
    pub tiles_ptr: i32,
    pub minimap_ptr: i32,
    pub metal_ptr: i32,
    pub features_ptr: i32,
    pub extension_count: i32,
}

impl Default for SmfHeader {
    fn default() -> Self {
        Self {
            version: SMF_VERSION,
            map_id: 0,
            width: 0,
            length: 0,
            square_size: SQUARE_SIZE,
            texels_per_square: TEXELS_PER_SQUARE,
            tile_size: MAP_TILE_SIZE,
            min_height: 10.0,
            max_height: 256.0,
            height_ptr: 0,
            type_ptr: 0,
            tiles_ptr: 0,
            minimap_ptr: 0,
            metal_ptr: 0,
            features_ptr: 0,
            extension_count: 0,
        }
    }
}

impl SmfHeader {
    pub fn read_from<R: Read>(reader: &mut R, path: &Path) -> Result<Self, SmfError> {
        let mut magic = [0u8; 16];
        reader.read_exact(&mut magic).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => SmfError::NotAContainer(path.to_path_buf()),
            _ => SmfError::Io(e),
        })?;
        if &magic != SMF_MAGIC {
            return Err(SmfError::NotAContainer(path.to_path_buf()));
        }

        Ok(Self {
            version: reader.read_i32::<LittleEndian>()?,
            map_id: reader.read_i32::<LittleEndian>()?,
            width: reader.read_i32::<LittleEndian>()?,
            length: reader.read_i32::<LittleEndian>()?,
            square_size: reader.read_i32::<LittleEndian>()?,
            texels_per_square: reader.read_i32::<LittleEndian>()?,
            tile_size: reader.read_i32::<LittleEndian>()?,
            min_height: reader.read_f32::<LittleEndian>()?,
            max_height: reader.read_f32::<LittleEndian>()?,
            height_ptr: reader.read_i32::<LittleEndian>()?,
            type_ptr: reader.read_i32::<LittleEndian>()?,
            tiles_ptr: reader.read_i32::<LittleEndian>()?,
            minimap_ptr: reader.read_i32::<LittleEndian>()?,
            metal_ptr: reader.read_i32::<LittleEndian>()?,
            features_ptr: reader.read_i32::<LittleEndian>()?,
            extension_count: reader.read_i32::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), SmfError> {
        writer.write_all(SMF_MAGIC)?;
        for v in [
            self.version,
            self.map_id,
            self.width,
            self.length,
            self.square_size,
            self.texels_per_square,
            self.tile_size,
        ] {
            writer.write_i32::<LittleEndian>(v)?;
        }
        writer.write_f32::<LittleEndian>(self.min_height)?;
        writer.write_f32::<LittleEndian>(self.max_height)?;
        for v in [
            self.height_ptr,
            self.type_ptr,
            self.tiles_ptr,
            self.minimap_ptr,
            self.metal_ptr,
            self.features_ptr,
            self.extension_count,
        ] {
            writer.write_i32::<LittleEndian>(v)?;
        }
        Ok(())
    }

    /// Reject headers this crate cannot interpret.
    pub fn validate(&self) -> Result<(), SmfError> {
        if self.version != SMF_VERSION {
            return Err(SmfError::UnsupportedVersion(self.version));
        }
        if self.tile_size != MAP_TILE_SIZE {
            return Err(SmfError::UnsupportedTileSize(self.tile_size));
        }
        validate_size(self.width as i64, self.length as i64)
    }
}

/// Map dimensions must be positive multiples of 4 squares.
pub(crate) fn validate_size(width: i64, length: i64) -> Result<(), SmfError> {
    let reason = if width <= 0 || length <= 0 {
        "dimensions must be positive"
    } else if width % 4 != 0 || length % 4 != 0 {
        "dimensions must be multiples of 4 squares"
    } else if width > i32::MAX as i64 || length > i32::MAX as i64 {
        "dimensions exceed 32 bits"
    } else {
        return Ok(());
    };
    Err(SmfError::InvalidSize {
        width,
        length,
        reason,
    })
}

/// Cheap probe: does the file at `path` start with the map container magic?
pub fn is_smf(path: &Path) -> bool {
    let Ok(mut file) = std::fs::File::open(path) else {
        return false;
    };
    let mut magic = [0u8; 16];
    file.read_exact(&mut magic).is_ok() && &magic == SMF_MAGIC
}
