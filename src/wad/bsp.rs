//! Embedded texture directory of Quake BSP29 / BSP2 maps.
//!
//! Binary layout:
//! ```text
//! [4 bytes]   version: 29 (LE) or "BSP2"
//! [15 × 8]    lump table: offset(i32) + length(i32); lump 2 holds textures
//!
//! Texture lump:
//!     count(i32) + count × offset(i32, relative to the lump start, -1 = external)
//!     miptex records, same layout as WAD2 'D' lumps
//! ```

use std::io::Cursor;

use binrw::{binrw, BinRead};

use super::error::{ParseError, Result};
use super::lump::{lump_name_from_raw, LumpEntry, LumpType, WadHeader, LUMP_NAME_LEN};
use super::{ArchiveFormat, WadArchive};

pub const BSP29_VERSION: [u8; 4] = 29u32.to_le_bytes();
pub const BSP2_MAGIC: [u8; 4] = *b"BSP2";

const LUMP_COUNT: usize = 15;
const TEXTURE_LUMP: usize = 2;
const BSP_HEADER_SIZE: usize = 4 + LUMP_COUNT * 8;

#[binrw]
#[derive(Debug, Clone, Copy)]
#[brw(little)]
struct BspLump {
    offset: i32,
    length: i32,
}

#[binrw]
#[derive(Debug, Clone)]
#[brw(little)]
struct BspHeader {
    version: [u8; 4],
    lumps: [BspLump; LUMP_COUNT],
}

/// True when `bytes` starts like a BSP29 or BSP2 map.
pub fn is_bsp(bytes: &[u8]) -> bool {
    matches!(
        ArchiveFormat::detect(bytes),
        Some(ArchiveFormat::Bsp29 | ArchiveFormat::Bsp2)
    )
}

/// Read the mip-texture directory of a map into an archive whose entries are
/// all `MipTexture` lumps named after their miptex headers.
pub fn parse_bsp(bytes: &[u8]) -> Result<WadArchive> {
    if bytes.len() < BSP_HEADER_SIZE {
        return Err(ParseError::MalformedHeader(format!(
            "{} bytes is shorter than the {}-byte BSP header",
            bytes.len(),
            BSP_HEADER_SIZE
        )));
    }

    let header = BspHeader::read(&mut Cursor::new(bytes))?;
    let format = match header.version {
        v if v == BSP29_VERSION => ArchiveFormat::Bsp29,
        v if v == BSP2_MAGIC => ArchiveFormat::Bsp2,
        v => {
            return Err(ParseError::MalformedHeader(format!(
                "unsupported BSP version {:?}",
                v
            )))
        }
    };

    let textures = header.lumps[TEXTURE_LUMP];
    if textures.offset < 0 || textures.length < 0 {
        return Err(ParseError::MalformedHeader(format!(
            "negative texture lump offset ({}) or length ({})",
            textures.offset, textures.length
        )));
    }
    let lump_start = textures.offset as usize;
    let lump_end = lump_start as u64 + textures.length as u64;
    if lump_end > bytes.len() as u64 {
        return Err(ParseError::TruncatedDirectory {
            entry_count: 0,
            directory_offset: lump_start as u32,
            needed: lump_end,
            archive_len: bytes.len(),
        });
    }
    let lump_end = lump_end as usize;

    // An empty texture lump is legal: the map uses external textures only.
    if textures.length == 0 {
        return Ok(empty_archive(format, header.version, lump_start, bytes));
    }
    if textures.length < 4 {
        return Err(ParseError::MalformedHeader(
            "texture lump too short for its count".to_string(),
        ));
    }

    let count = i32::from_le_bytes(read4(bytes, lump_start));
    if count < 0 {
        return Err(ParseError::MalformedHeader(format!(
            "negative texture count {}",
            count
        )));
    }
    let table_end = lump_start as u64 + 4 + count as u64 * 4;
    if table_end > lump_end as u64 {
        return Err(ParseError::TruncatedDirectory {
            entry_count: count as u32,
            directory_offset: lump_start as u32,
            needed: table_end,
            archive_len: bytes.len(),
        });
    }

    let offsets: Vec<i32> = (0..count as usize)
        .map(|i| i32::from_le_bytes(read4(bytes, lump_start + 4 + i * 4)))
        .collect();

    let mut starts: Vec<usize> = offsets
        .iter()
        .filter(|&&o| o >= 0)
        .map(|&o| lump_start + o as usize)
        .collect();
    starts.sort_unstable();
    starts.dedup();

    let mut entries = Vec::new();
    for &relative in &offsets {
        if relative < 0 {
            continue;
        }
        let start = lump_start + relative as usize;
        if start + LUMP_NAME_LEN > lump_end {
            return Err(ParseError::OutOfBoundsLump {
                name: format!("miptex@{}", relative),
                offset: start as i64,
                size: LUMP_NAME_LEN as i64,
                archive_len: bytes.len(),
            });
        }
        let end = starts
            .iter()
            .copied()
            .find(|&s| s > start)
            .unwrap_or(lump_end)
            .min(lump_end);

        let mut raw_name = [0u8; LUMP_NAME_LEN];
        raw_name.copy_from_slice(&bytes[start..start + LUMP_NAME_LEN]);

        entries.push(LumpEntry {
            index: entries.len(),
            name: lump_name_from_raw(&raw_name),
            offset: start,
            disk_size: end - start,
            size: end - start,
            lump_type: LumpType::MipTexture,
            compressed: false,
        });
    }

    tracing::debug!(?format, textures = entries.len(), "parsed BSP texture lump");

    let wad_header = WadHeader {
        magic: header.version,
        entry_count: entries.len() as i32,
        directory_offset: lump_start as i32,
    };
    Ok(WadArchive::from_parts(format, wad_header, entries, bytes.to_vec()))
}

fn read4(bytes: &[u8], at: usize) -> [u8; 4] {
    [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]
}

fn empty_archive(format: ArchiveFormat, magic: [u8; 4], lump_start: usize, bytes: &[u8]) -> WadArchive {
    let header = WadHeader {
        magic,
        entry_count: 0,
        directory_offset: lump_start as i32,
    };
    WadArchive::from_parts(format, header, Vec::new(), bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A BSP with only a texture lump filled in.
    fn bsp_with_textures(version: [u8; 4], offsets: &[i32], payload: &[u8]) -> Vec<u8> {
        let mut lump = Vec::new();
        lump.extend_from_slice(&(offsets.len() as i32).to_le_bytes());
        for o in offsets {
            lump.extend_from_slice(&o.to_le_bytes());
        }
        lump.extend_from_slice(payload);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&version);
        for i in 0..LUMP_COUNT {
            let (offset, length) = if i == TEXTURE_LUMP {
                (BSP_HEADER_SIZE as i32, lump.len() as i32)
            } else {
                (0, 0)
            };
            bytes.extend_from_slice(&offset.to_le_bytes());
            bytes.extend_from_slice(&length.to_le_bytes());
        }
        bytes.extend_from_slice(&lump);
        bytes
    }

    fn miptex_stub(name: &str) -> Vec<u8> {
        let mut out = crate::wad::lump::lump_name_to_raw(name).to_vec();
        out.extend_from_slice(&[0u8; 24]);
        out
    }

    #[test]
    fn reads_bsp29_texture_names() {
        let mut payload = miptex_stub("+0slime");
        payload.extend(miptex_stub("sky4"));
        // table: count + 3 offsets = 16 bytes
        let bytes = bsp_with_textures(BSP29_VERSION, &[16, -1, 56], &payload);

        assert!(is_bsp(&bytes));
        let archive = parse_bsp(&bytes).unwrap();
        assert_eq!(archive.format(), ArchiveFormat::Bsp29);
        let names: Vec<_> = archive.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["+0slime", "sky4"]);
        assert_eq!(archive.entries()[0].disk_size, 40);
        assert_eq!(archive.entries()[1].disk_size, 40);
    }

    #[test]
    fn reads_bsp2_magic() {
        let bytes = bsp_with_textures(BSP2_MAGIC, &[8], &miptex_stub("wall"));
        assert_eq!(parse_bsp(&bytes).unwrap().format(), ArchiveFormat::Bsp2);
    }

    #[test]
    fn rejects_unknown_version() {
        let bytes = bsp_with_textures(30u32.to_le_bytes(), &[], &[]);
        assert!(matches!(parse_bsp(&bytes), Err(ParseError::MalformedHeader(_))));
    }

    #[test]
    fn rejects_offset_past_lump() {
        let bytes = bsp_with_textures(BSP29_VERSION, &[400], &miptex_stub("wall"));
        assert!(matches!(
            parse_bsp(&bytes),
            Err(ParseError::OutOfBoundsLump { .. })
        ));
    }
}
