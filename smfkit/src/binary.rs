//! Binary helpers shared by the map and tile file formats.
//!
//! Both formats were historically written as raw in-memory structs on x86,
//! so every numeric field is little-endian; callers read and write them with
//! `byteorder`'s [`LittleEndian`](byteorder::LittleEndian) extension methods.
//! This module adds the pieces byteorder does not cover: NUL-terminated
//! strings, length-prefixed blobs from untrusted sizes and stream lengths.

use std::io::{self, Read, Seek, SeekFrom, Write};

/// Read helpers for variable-length fields.
pub trait ReadFieldExt: Read {
    /// Read exactly `len` bytes.
    ///
    /// The buffer grows as data arrives, so a corrupt length fails with
    /// `UnexpectedEof` at the end of the stream instead of allocating `len`
    /// bytes up front.
    fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.take(len as u64).read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes, stream ended after {}", len, buf.len()),
            ));
        }
        Ok(buf)
    }

    /// Read bytes up to and including a NUL, returning the text before it.
    ///
    /// Fails with `InvalidData` if no terminator appears within `max_len`.
    fn read_cstring(&mut self, max_len: usize) -> io::Result<String> {
        let mut bytes = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            self.read_exact(&mut byte)?;
            if byte[0] == 0 {
                break;
            }
            if bytes.len() == max_len {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("string exceeds {} bytes without terminator", max_len),
                ));
            }
            bytes.push(byte[0]);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl<R: Read + ?Sized> ReadFieldExt for R {}

/// Write helpers mirroring [`ReadFieldExt`].
pub trait WriteFieldExt: Write {
    /// Write the string bytes followed by a NUL.
    fn write_cstring(&mut self, s: &str) -> io::Result<()> {
        self.write_all(s.as_bytes())?;
        self.write_all(&[0])
    }
}

impl<W: Write + ?Sized> WriteFieldExt for W {}

/// Total length of a seekable stream, restoring the current position.
pub fn stream_len<S: Seek>(stream: &mut S) -> io::Result<u64> {
    let cur = stream.stream_position()?;
    let len = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(cur))?;
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
    use std::io::Cursor;

    #[test]
    fn test_fields_are_little_endian() {
        let mut buf = Vec::new();
        buf.write_i32::<LittleEndian>(1).unwrap();
        buf.write_f32::<LittleEndian>(1.0).unwrap();
        buf.write_cstring("ok").unwrap();
        assert_eq!(&buf[..4], &[1, 0, 0, 0]);
        assert_eq!(&buf[4..8], &1.0f32.to_le_bytes());

        let mut cur = Cursor::new(buf);
        assert_eq!(cur.read_i32::<LittleEndian>().unwrap(), 1);
        assert_eq!(cur.read_f32::<LittleEndian>().unwrap(), 1.0);
        assert_eq!(cur.read_cstring(8).unwrap(), "ok");
    }

    #[test]
    fn test_cstring_roundtrip() {
        let mut buf = Vec::new();
        buf.write_cstring("maps/foo.smt").unwrap();
        buf.write_cstring("").unwrap();
        assert_eq!(buf.len(), 14);

        let mut cur = Cursor::new(buf);
        assert_eq!(cur.read_cstring(256).unwrap(), "maps/foo.smt");
        assert_eq!(cur.read_cstring(256).unwrap(), "");
    }

    #[test]
    fn test_cstring_without_terminator_fails() {
        let mut cur = Cursor::new(b"abcdef".to_vec());
        assert!(cur.read_cstring(3).is_err());

        let mut cur = Cursor::new(b"abc".to_vec());
        assert_eq!(
            cur.read_cstring(64).unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn test_read_bytes_with_oversized_length_hits_eof() {
        let mut cur = Cursor::new(vec![7u8; 10]);
        assert_eq!(cur.read_bytes(4).unwrap(), vec![7u8; 4]);
        let err = cur.read_bytes(usize::MAX / 2).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_stream_len_restores_position() {
        let mut cur = Cursor::new(vec![0u8; 40]);
        cur.seek(SeekFrom::Start(12)).unwrap();
        assert_eq!(stream_len(&mut cur).unwrap(), 40);
        assert_eq!(cur.stream_position().unwrap(), 12);
    }
}
