//! SMT header codec.
//!
//! ```text
//! offset  size  field
//!      0    16  magic "spring tilefile\0"
//!     16     4  version (1)
//!     20     4  tile count
//!     24     4  tile size (32)
//!     28     4  compression type (1 = DXT1)
//! ```

use super::error::SmtError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use std::path::Path;

/// Magic string at the start of every tile archive.
pub const SMT_MAGIC: &[u8; 16] = b"spring tilefile\0";

/// Only supported archive version.
pub const SMT_VERSION: i32 = 1;

/// Header length in bytes.
pub const SMT_HEADER_BYTES: u64 = 32;

/// Compression type tag for DXT1 tiles.
pub const COMPRESSION_DXT1: i32 = 1;

/// Tile archive header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmtHeader {
    pub version: i32,
    pub tile_count: i32,
    pub tile_size: i32,
    pub compression: i32,
}

impl Default for SmtHeader {
    fn default() -> Self {
        Self {
            version: SMT_VERSION,
            tile_count: 0,
            tile_size: 32,
            compression: COMPRESSION_DXT1,
        }
    }
}

impl SmtHeader {
    /// Parse a header, checking only the magic.
    ///
    /// `path` is used for the error message.
    pub fn read_from<R: Read>(reader: &mut R, path: &Path) -> Result<Self, SmtError> {
        let mut magic = [0u8; 16];
        reader.read_exact(&mut magic).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => SmtError::BadMagic(path.to_path_buf()),
            _ => SmtError::Io(e),
        })?;
        if &magic != SMT_MAGIC {
            return Err(SmtError::BadMagic(path.to_path_buf()));
        }

        Ok(Self {
            version: reader.read_i32::<LittleEndian>()?,
            tile_count: reader.read_i32::<LittleEndian>()?,
            tile_size: reader.read_i32::<LittleEndian>()?,
            compression: reader.read_i32::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), SmtError> {
        writer.write_all(SMT_MAGIC)?;
        writer.write_i32::<LittleEndian>(self.version)?;
        writer.write_i32::<LittleEndian>(self.tile_count)?;
        writer.write_i32::<LittleEndian>(self.tile_size)?;
        writer.write_i32::<LittleEndian>(self.compression)?;
        Ok(())
    }

    /// Reject versions, tile sizes and compression types this crate cannot read.
    pub fn validate(&self) -> Result<(), SmtError> {
        if self.version != SMT_VERSION {
            return Err(SmtError::UnsupportedVersion(self.version));
        }
        if self.tile_size != 32 {
            return Err(SmtError::UnsupportedTileSize(self.tile_size));
        }
        if self.compression != COMPRESSION_DXT1 {
            return Err(SmtError::UnsupportedCompression(self.compression));
        }
        Ok(())
    }
}

/// Cheap probe: does the file at `path` start with the archive magic?
pub fn is_smt(path: &Path) -> bool {
    let Ok(mut file) = std::fs::File::open(path) else {
        return false;
    };
    let mut magic = [0u8; 16];
    file.read_exact(&mut magic).is_ok() && &magic == SMT_MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_is_32_bytes() {
        let mut buf = Vec::new();
        SmtHeader::default().write_to(&mut buf).unwrap();
        assert_eq!(buf.len() as u64, SMT_HEADER_BYTES);
        assert_eq!(&buf[..16], SMT_MAGIC);
        assert_eq!(&buf[16..20], &[1, 0, 0, 0]);
        assert_eq!(&buf[24..28], &[32, 0, 0, 0]);
    }

    #[test]
    fn test_header_roundtrip() {
        let header = SmtHeader {
            tile_count: 1234,
            ..SmtHeader::default()
        };
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        let back = SmtHeader::read_from(&mut Cursor::new(buf), Path::new("x.smt")).unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn test_bad_magic() {
        let mut buf = vec![0u8; 32];
        buf[..5].copy_from_slice(b"DDS |");
        let err = SmtHeader::read_from(&mut Cursor::new(buf), Path::new("x.dds")).unwrap_err();
        assert!(matches!(err, SmtError::BadMagic(_)));
    }

    #[test]
    fn test_short_file_is_bad_magic() {
        let err = SmtHeader::read_from(&mut Cursor::new(vec![1, 2, 3]), Path::new("x")).unwrap_err();
        assert!(matches!(err, SmtError::BadMagic(_)));
    }

    #[test]
    fn test_validate_rejects_unsupported_fields() {
        let ok = SmtHeader::default();
        assert!(ok.validate().is_ok());

        let v2 = SmtHeader { version: 2, ..ok };
        assert!(matches!(v2.validate(), Err(SmtError::UnsupportedVersion(2))));

        let t64 = SmtHeader { tile_size: 64, ..ok };
        assert!(matches!(t64.validate(), Err(SmtError::UnsupportedTileSize(64))));

        let c0 = SmtHeader { compression: 0, ..ok };
        assert!(matches!(c0.validate(), Err(SmtError::UnsupportedCompression(0))));
    }
}
