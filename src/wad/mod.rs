pub mod bsp;
pub mod error;
pub mod lump;
pub mod palette;

use std::borrow::Cow;
use std::io::{Cursor, Read};

use binrw::BinRead;
use flate2::read::DeflateDecoder;
use serde::{Deserialize, Serialize};

pub use error::{DecodeError, ParseError, Result};
pub use lump::{LumpEntry, LumpType, WadHeader};
pub use palette::Palette;

use lump::{DirectoryRecord, DIRECTORY_RECORD_SIZE, HEADER_SIZE, WAD2_MAGIC};

/// Upper bound on the buffer reserved before a lump is inflated.
const MAX_PREALLOCATED: usize = 1 << 20;

/// Which container the directory was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveFormat {
    Wad2,
    Bsp29,
    Bsp2,
}

impl ArchiveFormat {
    /// Container format judged by the leading four bytes alone.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        let magic: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        match magic {
            WAD2_MAGIC => Some(ArchiveFormat::Wad2),
            bsp::BSP29_VERSION => Some(ArchiveFormat::Bsp29),
            bsp::BSP2_MAGIC => Some(ArchiveFormat::Bsp2),
            _ => None,
        }
    }
}

/// A parsed texture container: header, validated directory, and the bytes
/// the directory points into.
#[derive(Debug, Clone)]
pub struct WadArchive {
    format: ArchiveFormat,
    header: WadHeader,
    entries: Vec<LumpEntry>,
    data: Vec<u8>,
}

impl WadArchive {
    /// Parse a WAD2 archive or the texture lump of a BSP map, whichever the
    /// signature says. Unknown signatures are reported by the WAD2 parser.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        match ArchiveFormat::detect(bytes) {
            Some(ArchiveFormat::Bsp29 | ArchiveFormat::Bsp2) => bsp::parse_bsp(bytes),
            _ => Self::parse(bytes),
        }
    }

    /// Parse a WAD2 archive. Structural only: no lump is decoded here.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ParseError::MalformedHeader(format!(
                "{} bytes is shorter than the {}-byte header",
                bytes.len(),
                HEADER_SIZE
            )));
        }

        let mut cursor = Cursor::new(bytes);
        let header = WadHeader::read(&mut cursor)?;
        if header.magic != WAD2_MAGIC {
            return Err(ParseError::MalformedHeader(format!(
                "expected magic WAD2, found {:?}",
                String::from_utf8_lossy(&header.magic)
            )));
        }
        if header.entry_count < 0 || header.directory_offset < 0 {
            return Err(ParseError::MalformedHeader(format!(
                "negative entry count ({}) or directory offset ({})",
                header.entry_count, header.directory_offset
            )));
        }

        let entry_count = header.entry_count as u32;
        let directory_offset = header.directory_offset as u32;
        let needed =
            directory_offset as u64 + entry_count as u64 * DIRECTORY_RECORD_SIZE as u64;
        if needed > bytes.len() as u64 {
            return Err(ParseError::TruncatedDirectory {
                entry_count,
                directory_offset,
                needed,
                archive_len: bytes.len(),
            });
        }

        cursor.set_position(directory_offset as u64);
        let mut entries = Vec::with_capacity(entry_count as usize);
        for index in 0..entry_count as usize {
            let record = DirectoryRecord::read(&mut cursor)?;
            entries.push(validate_record(index, record, bytes.len())?);
        }

        tracing::debug!(entries = entries.len(), bytes = bytes.len(), "parsed WAD2 directory");

        Ok(Self {
            format: ArchiveFormat::Wad2,
            header,
            entries,
            data: bytes.to_vec(),
        })
    }

    pub(crate) fn from_parts(
        format: ArchiveFormat,
        header: WadHeader,
        entries: Vec<LumpEntry>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            format,
            header,
            entries,
            data,
        }
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    pub fn header(&self) -> &WadHeader {
        &self.header
    }

    pub fn entries(&self) -> &[LumpEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&LumpEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total archive size in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// First entry whose name matches, ignoring ASCII case.
    pub fn find(&self, name: &str) -> Option<&LumpEntry> {
        self.entries.iter().find(|e| e.name_matches(name))
    }

    /// Bytes as stored in the archive, compressed or not.
    pub fn lump_bytes(&self, entry: &LumpEntry) -> &[u8] {
        &self.data[entry.offset..entry.end()]
    }

    /// Lump bytes ready for decoding, inflated if the entry is compressed.
    pub fn payload(&self, entry: &LumpEntry) -> std::result::Result<Cow<'_, [u8]>, DecodeError> {
        let stored = self.lump_bytes(entry);
        if !entry.compressed {
            return Ok(Cow::Borrowed(stored));
        }

        // Reading stops one byte past the declared size, enough to tell an
        // oversized stream apart without inflating all of it.
        let limit = entry.size as u64 + 1;
        let mut inflated = Vec::with_capacity(entry.size.min(MAX_PREALLOCATED));
        DeflateDecoder::new(stored)
            .take(limit)
            .read_to_end(&mut inflated)
            .map_err(|_| DecodeError::DecompressionError {
                name: entry.name.clone(),
                expected: entry.size,
                actual: inflated.len(),
            })?;
        if inflated.len() != entry.size {
            return Err(DecodeError::DecompressionError {
                name: entry.name.clone(),
                expected: entry.size,
                actual: inflated.len(),
            });
        }
        Ok(Cow::Owned(inflated))
    }

    /// The archive's own palette: the first readable palette lump.
    pub fn palette(&self) -> Option<Palette> {
        self.entries
            .iter()
            .filter(|e| e.lump_type == LumpType::Palette)
            .find_map(|e| self.payload(e).ok().and_then(|p| Palette::from_bytes(&p)))
    }
}

fn validate_record(index: usize, record: DirectoryRecord, archive_len: usize) -> Result<LumpEntry> {
    let out_of_bounds = || ParseError::OutOfBoundsLump {
        name: record.name.clone(),
        offset: record.offset as i64,
        size: record.disk_size as i64,
        archive_len,
    };

    if record.offset < 0 || record.disk_size < 0 || record.size < 0 {
        return Err(out_of_bounds());
    }
    let end = record.offset as u64 + record.disk_size as u64;
    if end > archive_len as u64 {
        return Err(out_of_bounds());
    }

    Ok(LumpEntry {
        index,
        name: record.name.clone(),
        offset: record.offset as usize,
        disk_size: record.disk_size as usize,
        size: record.size as usize,
        lump_type: LumpType::from(record.lump_type),
        compressed: record.compression != 0,
    })
}
