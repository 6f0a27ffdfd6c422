//! Header extensions.
//!
//! Each extension is `{byte_size: i32, type: i32, payload}` where `byte_size`
//! counts the whole record. Only vegetation (type 1) is interpreted; other
//! types are carried through unchanged.

use super::error::SmfError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crate::binary::ReadFieldExt;
use std::io::{Read, Write};
use tracing::warn;

/// Extension type tag of the vegetation (grass) extension.
pub const EXTENSION_VEGETATION: i32 = 1;

const EXTENSION_HEADER_BYTES: i32 = 8;
const VEGETATION_BYTES: i32 = 12;

/// Largest payload accepted for an unknown extension.
const MAX_UNKNOWN_PAYLOAD: i32 = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    /// Grass map stored at `grass_ptr`, `w/4 × l/4` bytes
    Vegetation { grass_ptr: i32 },
    /// Unrecognised extension, kept verbatim
    Unknown { tag: i32, payload: Vec<u8> },
}

impl Extension {
    pub fn tag(&self) -> i32 {
        match self {
            Extension::Vegetation { .. } => EXTENSION_VEGETATION,
            Extension::Unknown { tag, .. } => *tag,
        }
    }

    /// Size of the whole record on disk.
    pub fn byte_size(&self) -> u64 {
        match self {
            Extension::Vegetation { .. } => VEGETATION_BYTES as u64,
            Extension::Unknown { payload, .. } => EXTENSION_HEADER_BYTES as u64 + payload.len() as u64,
        }
    }

    /// Parse the `index`-th extension record.
    pub fn read_from<R: Read>(reader: &mut R, index: usize) -> Result<Self, SmfError> {
        let size = reader.read_i32::<LittleEndian>()?;
        let tag = reader.read_i32::<LittleEndian>()?;
        if !(EXTENSION_HEADER_BYTES..=EXTENSION_HEADER_BYTES + MAX_UNKNOWN_PAYLOAD).contains(&size) {
            return Err(SmfError::BadExtension { index, size });
        }

        if tag == EXTENSION_VEGETATION && size == VEGETATION_BYTES {
            return Ok(Extension::Vegetation {
                grass_ptr: reader.read_i32::<LittleEndian>()?,
            });
        }

        let payload = reader.read_bytes((size - EXTENSION_HEADER_BYTES) as usize)?;
        warn!(index, tag, size, "Unknown map extension, preserving verbatim");
        Ok(Extension::Unknown { tag, payload })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), SmfError> {
        writer.write_i32::<LittleEndian>(self.byte_size() as i32)?;
        writer.write_i32::<LittleEndian>(self.tag())?;
        match self {
            Extension::Vegetation { grass_ptr } => writer.write_i32::<LittleEndian>(*grass_ptr)?,
            Extension::Unknown { payload, .. } => writer.write_all(payload)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_vegetation_record() {
        let ext = Extension::Vegetation { grass_ptr: 4096 };
        let mut buf = Vec::new();
        ext.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), 12);
        assert_eq!(&buf[..8], &[12, 0, 0, 0, 1, 0, 0, 0]);
        assert_eq!(Extension::read_from(&mut Cursor::new(buf), 0).unwrap(), ext);
    }

    #[test]
    fn test_unknown_extension_preserved() {
        let ext = Extension::Unknown {
            tag: 77,
            payload: vec![9, 8, 7, 6, 5],
        };
        let mut buf = Vec::new();
        ext.write_to(&mut buf).unwrap();
        assert_eq!(ext.byte_size(), 13);
        let back = Extension::read_from(&mut Cursor::new(buf.clone()), 0).unwrap();
        assert_eq!(back, ext);

        let mut again = Vec::new();
        back.write_to(&mut again).unwrap();
        assert_eq!(again, buf);
    }

    #[test]
    fn test_rejects_short_size() {
        let mut buf = Vec::new();
        buf.write_i32::<LittleEndian>(4).unwrap();
        buf.write_i32::<LittleEndian>(1).unwrap();
        assert!(matches!(
            Extension::read_from(&mut Cursor::new(buf), 2),
            Err(SmfError::BadExtension { index: 2, size: 4 })
        ));
    }
}
