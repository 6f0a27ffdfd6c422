//! Append-only tile archive backed by a file.

use super::error::SmtError;
use super::header::{SmtHeader, SMT_HEADER_BYTES};
use byteorder::{LittleEndian, WriteBytesExt};
use crate::binary::stream_len;
use crate::dxt::TileCodec;
use image::RgbaImage;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Byte offset of the tile count field inside the header.
const TILE_COUNT_OFFSET: u64 = 20;

/// Result of comparing the declared tile count with the file length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCheck {
    /// `file length == header + count × tile bytes`
    Consistent,
    /// Declared and actual payload lengths disagree
    Mismatch {
        /// Payload bytes implied by the header's tile count
        declared: u64,
        /// Payload bytes actually present after the header
        actual: u64,
    },
}

/// Outcome of [`SmtArchive::repair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairReport {
    pub old_count: u32,
    pub new_count: u32,
    /// Trailing bytes of a partial tile that were cut off
    pub truncated_bytes: u64,
}

/// An SMT tile archive.
///
/// Tiles are fixed-size DXT1 blocks addressed by index. The archive owns its
/// file handle; only one writer may hold an archive at a time.
pub struct SmtArchive {
    path: PathBuf,
    file: File,
    header: SmtHeader,
    codec: TileCodec,
    size_check: SizeCheck,
}

impl SmtArchive {
    /// Create a new, empty archive at `path`.
    ///
    /// # Errors
    ///
    /// [`SmtError::AlreadyExists`] when the file exists and `overwrite` is false.
    pub fn create(path: impl AsRef<Path>, overwrite: bool) -> Result<Self, SmtError> {
        let path = path.as_ref();
        if path.exists() && !overwrite {
            return Err(SmtError::AlreadyExists(path.to_path_buf()));
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let header = SmtHeader::default();
        header.write_to(&mut file)?;
        file.flush()?;

        info!(path = %path.display(), "Created tile archive");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            header,
            codec: TileCodec::default(),
            size_check: SizeCheck::Consistent,
        })
    }

    /// Open an existing archive read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SmtError> {
        let file = File::open(path.as_ref())?;
        Self::from_file(path.as_ref(), file)
    }

    /// Open an existing archive for appending and repair.
    pub fn open_rw(path: impl AsRef<Path>) -> Result<Self, SmtError> {
        let file = OpenOptions::new().read(true).write(true).open(path.as_ref())?;
        Self::from_file(path.as_ref(), file)
    }

    fn from_file(path: &Path, mut file: File) -> Result<Self, SmtError> {
        let header = SmtHeader::read_from(&mut file, path)?;
        header.validate()?;
        if header.tile_count < 0 {
            return Err(SmtError::NegativeCount(header.tile_count));
        }

        let codec = TileCodec::default();
        let len = stream_len(&mut file)?;
        let declared = header.tile_count as u64 * codec.tile_bytes() as u64;
        let actual = len.saturating_sub(SMT_HEADER_BYTES);

        let size_check = if declared == actual {
            SizeCheck::Consistent
        } else {
            warn!(
                path = %path.display(),
                declared,
                actual,
                "Tile archive size does not match its tile count"
            );
            SizeCheck::Mismatch { declared, actual }
        };

        debug!(path = %path.display(), tiles = header.tile_count, "Opened tile archive");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            header,
            codec,
            size_check,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &SmtHeader {
        &self.header
    }

    /// Number of tiles declared by the header.
    pub fn tile_count(&self) -> u32 {
        self.header.tile_count as u32
    }

    /// Compressed bytes per tile.
    pub fn tile_bytes(&self) -> usize {
        self.codec.tile_bytes()
    }

    pub fn codec(&self) -> &TileCodec {
        &self.codec
    }

    /// Consistency of the declared tile count with the file length at open.
    pub fn size_check(&self) -> SizeCheck {
        self.size_check
    }

    /// Compress `tile` and append it, returning its index.
    pub fn append_tile(&mut self, tile: &RgbaImage) -> Result<u32, SmtError> {
        let block = self.codec.encode(tile)?;
        self.append_encoded(&block)
    }

    /// Append an already-compressed tile block, returning its index.
    pub fn append_encoded(&mut self, block: &[u8]) -> Result<u32, SmtError> {
        let first = self.append_batch(std::slice::from_ref(&block))?;
        Ok(first)
    }

    /// Append several compressed blocks in order, returning the first index.
    ///
    /// Tile data is written before the header count, so an interrupted append
    /// leaves trailing bytes that the next [`open`](Self::open) reports as a
    /// size mismatch rather than a silently shortened archive.
    ///
    /// # Errors
    ///
    /// [`SmtError::SizeMismatch`] when the archive was opened with a count
    /// that disagrees with its length; run [`repair`](Self::repair) first.
    pub fn append_batch<B: AsRef<[u8]>>(&mut self, blocks: &[B]) -> Result<u32, SmtError> {
        if let SizeCheck::Mismatch { declared, actual } = self.size_check {
            return Err(SmtError::SizeMismatch { declared, actual });
        }
        let tile_bytes = self.tile_bytes();
        for block in blocks {
            if block.as_ref().len() != tile_bytes {
                return Err(crate::dxt::DxtError::BlockLength {
                    expected: tile_bytes,
                    actual: block.as_ref().len(),
                }
                .into());
            }
        }

        let first = self.tile_count();
        let new_count = first
            .checked_add(blocks.len() as u32)
            .filter(|n| *n <= i32::MAX as u32)
            .ok_or(SmtError::Full(first))?;

        self.file
            .seek(SeekFrom::Start(self.tile_offset(first)))?;
        for block in blocks {
            self.file.write_all(block.as_ref())?;
        }
        self.write_count(new_count)?;

        debug!(first, count = blocks.len(), "Appended tiles");
        Ok(first)
    }

    /// Compressed block of tile `index`.
    pub fn get_raw(&mut self, index: u32) -> Result<Vec<u8>, SmtError> {
        let count = self.tile_count();
        if index >= count {
            return Err(SmtError::TileOutOfRange { index, count });
        }
        let mut block = vec![0u8; self.tile_bytes()];
        self.file.seek(SeekFrom::Start(self.tile_offset(index)))?;
        self.file.read_exact(&mut block)?;
        Ok(block)
    }

    /// Decompressed full-resolution tile `index`.
    pub fn get_tile(&mut self, index: u32) -> Result<RgbaImage, SmtError> {
        let block = self.get_raw(index)?;
        Ok(self.codec.decode(&block)?)
    }

    /// Rewrite the tile count from the file length.
    ///
    /// Never performed implicitly: [`open`](Self::open) only reports the
    /// mismatch. A trailing partial tile is truncated.
    pub fn repair(&mut self) -> Result<RepairReport, SmtError> {
        let len = stream_len(&mut self.file)?;
        let payload = len.saturating_sub(SMT_HEADER_BYTES);
        let tile_bytes = self.tile_bytes() as u64;
        let tiles = (payload / tile_bytes).min(i32::MAX as u64) as u32;
        let keep = SMT_HEADER_BYTES + tiles as u64 * tile_bytes;

        let report = RepairReport {
            old_count: self.tile_count(),
            new_count: tiles,
            truncated_bytes: len.saturating_sub(keep),
        };

        if report.truncated_bytes > 0 {
            self.file.set_len(keep)?;
        }
        self.write_count(tiles)?;
        self.size_check = SizeCheck::Consistent;

        info!(
            path = %self.path.display(),
            old = report.old_count,
            new = report.new_count,
            truncated = report.truncated_bytes,
            "Repaired tile archive count"
        );
        Ok(report)
    }

    fn tile_offset(&self, index: u32) -> u64 {
        SMT_HEADER_BYTES + index as u64 * self.tile_bytes() as u64
    }

    fn write_count(&mut self, count: u32) -> Result<(), SmtError> {
        self.file.seek(SeekFrom::Start(TILE_COUNT_OFFSET))?;
        self.file.write_i32::<LittleEndian>(count as i32)?;
        self.file.flush()?;
        self.header.tile_count = count as i32;
        Ok(())
    }
}

impl std::fmt::Debug for SmtArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtArchive")
            .field("path", &self.path)
            .field("header", &self.header)
            .field("size_check", &self.size_check)
            .finish()
    }
}
