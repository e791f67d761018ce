//! On-disk records of the WAD2 container and the lump payloads it carries.
//!
//! Binary layout:
//! ```text
//! [12 bytes]  header: magic "WAD2" + entry_count(i32) + directory_offset(i32)
//! [entry_count × 32 bytes] directory, at directory_offset:
//!     offset(4) + disk_size(4) + size(4) + type(1) + compression(1) + pad(2) + name(16)
//!
//! Lump payloads:
//!     '@' palette   768 bytes of RGB
//!     'B' qpic      width(i32) + height(i32) + width*height indices
//!     'D' miptex    name(16) + width(u32) + height(u32) + 4 × mip offset(u32), then mips
//!     'E' conpic    same as qpic
//! ```

use binrw::binrw;
use serde::{Deserialize, Serialize};

pub const WAD2_MAGIC: [u8; 4] = *b"WAD2";
pub const HEADER_SIZE: usize = 12;
pub const DIRECTORY_RECORD_SIZE: usize = 32;
pub const LUMP_NAME_LEN: usize = 16;
pub const MIPTEX_HEADER_SIZE: usize = 40;
pub const MIP_LEVELS: usize = 4;

/// Decode a fixed-width, null-padded name.
pub fn lump_name_from_raw(raw: &[u8; LUMP_NAME_LEN]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(LUMP_NAME_LEN);
    String::from_utf8_lossy(&raw[..end]).to_string()
}

/// Encode a name into a fixed-width, null-padded field. Long names are cut.
pub fn lump_name_to_raw(name: &str) -> [u8; LUMP_NAME_LEN] {
    let mut raw = [0u8; LUMP_NAME_LEN];
    let bytes = name.as_bytes();
    let len = bytes.len().min(LUMP_NAME_LEN);
    raw[..len].copy_from_slice(&bytes[..len]);
    raw
}

#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[brw(little)]
pub struct WadHeader {
    pub magic: [u8; 4],
    pub entry_count: i32,
    pub directory_offset: i32,
}

#[binrw]
#[derive(Debug, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct DirectoryRecord {
    pub offset: i32,
    pub disk_size: i32,
    pub size: i32,
    pub lump_type: u8,
    pub compression: u8,
    pub padding: u16,

    #[br(map = |raw: [u8; LUMP_NAME_LEN]| lump_name_from_raw(&raw))]
    #[bw(map = |name: &String| lump_name_to_raw(name))]
    pub name: String,
}

#[binrw]
#[derive(Debug, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct MipTexHeader {
    #[br(map = |raw: [u8; LUMP_NAME_LEN]| lump_name_from_raw(&raw))]
    #[bw(map = |name: &String| lump_name_to_raw(name))]
    pub name: String,

    pub width: u32,
    pub height: u32,
    pub offsets: [u32; MIP_LEVELS],
}

#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[brw(little)]
pub struct QPicHeader {
    pub width: i32,
    pub height: i32,
}

/// Type tag of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LumpType {
    Palette,
    QPic,
    MipTexture,
    ConsolePic,
    Unknown(u8),
}

impl LumpType {
    pub fn tag(self) -> u8 {
        match self {
            LumpType::Palette => 0x40,
            LumpType::QPic => 0x42,
            LumpType::MipTexture => 0x44,
            LumpType::ConsolePic => 0x45,
            LumpType::Unknown(tag) => tag,
        }
    }
}

impl From<u8> for LumpType {
    fn from(tag: u8) -> Self {
        match tag {
            0x40 => LumpType::Palette,
            0x42 => LumpType::QPic,
            0x44 => LumpType::MipTexture,
            0x45 => LumpType::ConsolePic,
            other => LumpType::Unknown(other),
        }
    }
}

/// One directory entry, validated against the archive bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LumpEntry {
    /// Position in the directory.
    pub index: usize,
    pub name: String,
    pub offset: usize,
    /// Bytes stored in the archive.
    pub disk_size: usize,
    /// Bytes after decompression.
    pub size: usize,
    pub lump_type: LumpType,
    pub compressed: bool,
}

impl LumpEntry {
    /// Case-insensitive name comparison, matching how the engine looks lumps up.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn end(&self) -> usize {
        self.offset + self.disk_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::{BinRead, BinWrite};
    use std::io::Cursor;

    #[test]
    fn name_padding_round_trip() {
        let raw = lump_name_to_raw("+0lava");
        assert_eq!(&raw[..6], b"+0lava");
        assert!(raw[6..].iter().all(|&b| b == 0));
        assert_eq!(lump_name_from_raw(&raw), "+0lava");
    }

    #[test]
    fn full_width_name_has_no_terminator() {
        let raw = lump_name_to_raw("abcdefghijklmnopqrst");
        assert_eq!(lump_name_from_raw(&raw), "abcdefghijklmnop");
    }

    #[test]
    fn directory_record_is_32_bytes() {
        let record = DirectoryRecord {
            offset: 12,
            disk_size: 100,
            size: 100,
            lump_type: 0x44,
            compression: 0,
            padding: 0,
            name: "WALL1".to_string(),
        };
        let mut cursor = Cursor::new(Vec::new());
        record.write(&mut cursor).unwrap();
        let bytes = cursor.into_inner();
        assert_eq!(bytes.len(), DIRECTORY_RECORD_SIZE);

        let parsed = DirectoryRecord::read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn miptex_header_size() {
        let header = MipTexHeader {
            name: "sky1".to_string(),
            width: 256,
            height: 128,
            offsets: [40, 0, 0, 0],
        };
        let mut cursor = Cursor::new(Vec::new());
        header.write(&mut cursor).unwrap();
        assert_eq!(cursor.into_inner().len(), MIPTEX_HEADER_SIZE);
    }

    #[test]
    fn lump_type_tags() {
        assert_eq!(LumpType::from(b'D'), LumpType::MipTexture);
        assert_eq!(LumpType::from(b'@'), LumpType::Palette);
        assert_eq!(LumpType::from(0x99), LumpType::Unknown(0x99));
        assert_eq!(LumpType::QPic.tag(), b'B');
    }
}
