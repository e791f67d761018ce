pub mod cache;
pub mod fullbright;
pub mod sky;

use std::io::Cursor;

use binrw::BinRead;
use image::RgbaImage;

use crate::material::classify::surface_traits;
use crate::wad::lump::{MipTexHeader, QPicHeader, MIPTEX_HEADER_SIZE, MIP_LEVELS};
use crate::wad::palette::TRANSPARENT_INDEX;
use crate::wad::{DecodeError, LumpEntry, LumpType, Palette, WadArchive};

/// Console font, stored headerless.
const CONCHARS: (&str, u32, u32) = ("CONCHARS", 128, 128);
/// Console background, stored headerless.
const CONBACK: (&str, u32, u32) = ("CONBACK", 320, 200);
const QPIC_HEADER_SIZE: usize = 8;

/// Knobs for [`decode`].
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Palette used when the archive carries no palette lump.
    pub default_palette: Option<Palette>,
    /// Also decode mip levels 1..3 of mip-textures.
    pub keep_mips: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            default_palette: Some(Palette::quake()),
            keep_mips: false,
        }
    }
}

/// A texture resolved to RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTexture {
    /// Lump name, or the image name chosen by the host for loose files.
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pixels: RgbaImage,
    /// Palette indices the pixels were resolved from, row-major.
    /// `None` for loose images supplied already decoded.
    pub indices: Option<Vec<u8>>,
    /// Palette used for resolution, kept so fullbright extraction can reuse it.
    pub palette: Option<Palette>,
    /// Mip levels 1.. when requested.
    pub mips: Vec<RgbaImage>,
}

impl DecodedTexture {
    /// Wrap an image the host already decoded (loose files, BSP externals).
    pub fn from_rgba(name: impl Into<String>, pixels: RgbaImage) -> Self {
        Self {
            name: name.into(),
            width: pixels.width(),
            height: pixels.height(),
            pixels,
            indices: None,
            palette: None,
            mips: Vec::new(),
        }
    }

    /// Resolve an index buffer through `palette`. Cut-out names get a
    /// transparent index 255.
    pub fn from_indexed(
        name: impl Into<String>,
        width: u32,
        height: u32,
        indices: Vec<u8>,
        palette: &Palette,
    ) -> Self {
        let name = name.into();
        let cutout = surface_traits(&name).cutout;
        let pixels = resolve(width, height, &indices, palette, cutout);
        Self {
            name,
            width,
            height,
            pixels,
            indices: Some(indices),
            palette: Some(palette.clone()),
            mips: Vec::new(),
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }
}

fn resolve(width: u32, height: u32, indices: &[u8], palette: &Palette, cutout: bool) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let index = indices[(y * width + x) as usize];
        let alpha = if cutout && index == TRANSPARENT_INDEX { 0 } else { 255 };
        palette.rgba(index, alpha)
    })
}

/// Index block plus where it came from inside the payload.
struct IndexedLayout {
    width: u32,
    height: u32,
    start: usize,
}

fn block_len(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

fn take_block<'a>(
    entry: &LumpEntry,
    payload: &'a [u8],
    layout: &IndexedLayout,
) -> Result<&'a [u8], DecodeError> {
    let needed = layout.start + block_len(layout.width, layout.height);
    if needed > payload.len() {
        return Err(DecodeError::TruncatedLump {
            name: entry.name.clone(),
            needed,
            available: payload.len(),
        });
    }
    Ok(&payload[layout.start..needed])
}

fn headered_layout(entry: &LumpEntry, payload: &[u8]) -> Result<IndexedLayout, DecodeError> {
    let truncated = |needed| DecodeError::TruncatedLump {
        name: entry.name.clone(),
        needed,
        available: payload.len(),
    };
    if payload.len() < QPIC_HEADER_SIZE {
        return Err(truncated(QPIC_HEADER_SIZE));
    }
    let header = QPicHeader::read(&mut Cursor::new(payload)).map_err(|_| truncated(QPIC_HEADER_SIZE))?;
    if header.width < 0 || header.height < 0 {
        return Err(truncated(usize::MAX));
    }
    Ok(IndexedLayout {
        width: header.width as u32,
        height: header.height as u32,
        start: QPIC_HEADER_SIZE,
    })
}

fn miptex_header(entry: &LumpEntry, payload: &[u8]) -> Result<MipTexHeader, DecodeError> {
    let truncated = DecodeError::TruncatedLump {
        name: entry.name.clone(),
        needed: MIPTEX_HEADER_SIZE,
        available: payload.len(),
    };
    if payload.len() < MIPTEX_HEADER_SIZE {
        return Err(truncated);
    }
    MipTexHeader::read(&mut Cursor::new(payload)).map_err(|_| truncated)
}

fn special_size(name: &str) -> Option<(u32, u32)> {
    [CONCHARS, CONBACK]
        .iter()
        .find(|(special, _, _)| name.eq_ignore_ascii_case(special))
        .map(|&(_, w, h)| (w, h))
}

fn resolve_palette(archive: &WadArchive, entry: &LumpEntry, options: &DecodeOptions) -> Result<Palette, DecodeError> {
    archive
        .palette()
        .or_else(|| options.default_palette.clone())
        .ok_or_else(|| DecodeError::PaletteMissing {
            name: entry.name.clone(),
        })
}

/// Decode one lump into RGBA8.
///
/// - `CONCHARS` / `CONBACK`: headerless index blocks of fixed size
/// - `B` / `E`: width + height header, then indices
/// - `D`: miptex header, mip 0 (and 1..3 with `keep_mips`)
/// - `@`: a 16×16 swatch of the palette itself
pub fn decode(
    archive: &WadArchive,
    entry: &LumpEntry,
    options: &DecodeOptions,
) -> Result<DecodedTexture, DecodeError> {
    let special = special_size(&entry.name);
    let supported = matches!(
        entry.lump_type,
        LumpType::Palette | LumpType::QPic | LumpType::MipTexture | LumpType::ConsolePic
    );
    if special.is_none() && !supported {
        return Err(DecodeError::UnsupportedLumpType {
            name: entry.name.clone(),
            tag: entry.lump_type.tag(),
        });
    }

    let stored = archive.payload(entry)?;
    let payload: &[u8] = &stored;

    if let Some((width, height)) = special {
        let layout = IndexedLayout { width, height, start: 0 };
        let block = take_block(entry, payload, &layout)?.to_vec();
        let palette = resolve_palette(archive, entry, options)?;
        return Ok(DecodedTexture::from_indexed(&entry.name, width, height, block, &palette));
    }

    let texture = match entry.lump_type {
        LumpType::Palette => {
            let palette = Palette::from_bytes(payload).ok_or_else(|| DecodeError::TruncatedLump {
                name: entry.name.clone(),
                needed: crate::wad::palette::PALETTE_BYTES,
                available: payload.len(),
            })?;
            let swatch: Vec<u8> = (0..=255u8).collect();
            DecodedTexture::from_indexed(&entry.name, 16, 16, swatch, &palette)
        }
        LumpType::QPic | LumpType::ConsolePic => {
            let layout = headered_layout(entry, payload)?;
            let block = take_block(entry, payload, &layout)?.to_vec();
            let palette = resolve_palette(archive, entry, options)?;
            DecodedTexture::from_indexed(&entry.name, layout.width, layout.height, block, &palette)
        }
        LumpType::MipTexture => decode_miptex(archive, entry, payload, options)?,
        LumpType::Unknown(tag) => {
            return Err(DecodeError::UnsupportedLumpType {
                name: entry.name.clone(),
                tag,
            })
        }
    };

    tracing::trace!(
        lump = %entry.name,
        width = texture.width,
        height = texture.height,
        "decoded lump"
    );
    Ok(texture)
}

fn decode_miptex(
    archive: &WadArchive,
    entry: &LumpEntry,
    payload: &[u8],
    options: &DecodeOptions,
) -> Result<DecodedTexture, DecodeError> {
    let header = miptex_header(entry, payload)?;
    // The miptex header carries the authoritative name; BSP entries are named from it too.
    let name = if header.name.is_empty() {
        entry.name.clone()
    } else {
        header.name.clone()
    };

    let base = IndexedLayout {
        width: header.width,
        height: header.height,
        start: header.offsets[0] as usize,
    };
    let block = take_block(entry, payload, &base)?.to_vec();
    let palette = resolve_palette(archive, entry, options)?;
    let mut texture = DecodedTexture::from_indexed(name, header.width, header.height, block, &palette);

    if options.keep_mips {
        let cutout = surface_traits(&texture.name).cutout;
        for level in 1..MIP_LEVELS {
            let layout = IndexedLayout {
                width: (header.width >> level).max(1),
                height: (header.height >> level).max(1),
                start: header.offsets[level] as usize,
            };
            if layout.start == 0 {
                break;
            }
            let Ok(block) = take_block(entry, payload, &layout) else {
                break;
            };
            texture
                .mips
                .push(resolve(layout.width, layout.height, block, &palette, cutout));
        }
    }

    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wad::lump::{DirectoryRecord, WadHeader, HEADER_SIZE, WAD2_MAGIC};
    use binrw::BinWrite;

    fn archive(lumps: Vec<(&str, u8, Vec<u8>)>) -> WadArchive {
        let mut body = Vec::new();
        let mut records = Vec::new();
        for (name, tag, data) in lumps {
            records.push(DirectoryRecord {
                offset: (HEADER_SIZE + body.len()) as i32,
                disk_size: data.len() as i32,
                size: data.len() as i32,
                lump_type: tag,
                compression: 0,
                padding: 0,
                name: name.to_string(),
            });
            body.extend(data);
        }
        let mut cursor = Cursor::new(Vec::new());
        WadHeader {
            magic: WAD2_MAGIC,
            entry_count: records.len() as i32,
            directory_offset: (HEADER_SIZE + body.len()) as i32,
        }
        .write(&mut cursor)
        .unwrap();
        cursor.get_mut().extend(body);
        cursor.set_position(cursor.get_ref().len() as u64);
        for r in &records {
            r.write(&mut cursor).unwrap();
        }
        WadArchive::parse(cursor.get_ref()).unwrap()
    }

    fn miptex(name: &str, width: u32, height: u32, with_mips: bool) -> Vec<u8> {
        let mut offsets = [MIPTEX_HEADER_SIZE as u32, 0, 0, 0];
        let mut data = Vec::new();
        let mut cursor_offset = MIPTEX_HEADER_SIZE as u32;
        let levels = if with_mips { MIP_LEVELS } else { 1 };
        for (level, slot) in offsets.iter_mut().enumerate().take(levels) {
            *slot = cursor_offset;
            let len = ((width >> level) * (height >> level)) as usize;
            data.extend((0..len).map(|i| (i % 256) as u8));
            cursor_offset += len as u32;
        }
        let mut cursor = Cursor::new(Vec::new());
        MipTexHeader {
            name: name.to_string(),
            width,
            height,
            offsets,
        }
        .write(&mut cursor)
        .unwrap();
        cursor.get_mut().extend(data);
        cursor.into_inner()
    }

    fn qpic(width: i32, height: i32, fill: u8) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend(std::iter::repeat(fill).take((width * height) as usize));
        out
    }

    #[test]
    fn decodes_miptex_through_default_palette() {
        let wad = archive(vec![("wall1", b'D', miptex("wall1", 16, 8, false))]);
        let tex = decode(&wad, &wad.entries()[0], &DecodeOptions::default()).unwrap();
        assert_eq!((tex.width, tex.height), (16, 8));
        assert_eq!(tex.indices.as_ref().unwrap()[5], 5);
        let pal = Palette::quake();
        let [r, g, b] = pal.color(5);
        assert_eq!(tex.pixels.get_pixel(5, 0).0, [r, g, b, 255]);
        assert!(tex.mips.is_empty());
    }

    #[test]
    fn keeps_mips_on_request() {
        let wad = archive(vec![("wall1", b'D', miptex("wall1", 16, 16, true))]);
        let options = DecodeOptions {
            keep_mips: true,
            ..DecodeOptions::default()
        };
        let tex = decode(&wad, &wad.entries()[0], &options).unwrap();
        let sizes: Vec<_> = tex.mips.iter().map(|m| m.dimensions()).collect();
        assert_eq!(sizes, vec![(8, 8), (4, 4), (2, 2)]);
    }

    #[test]
    fn archive_palette_wins() {
        let mut pal = vec![0u8; 768];
        pal[3 * 9..3 * 9 + 3].copy_from_slice(&[1, 2, 3]);
        let wad = archive(vec![("PALETTE", b'@', pal), ("bar", b'B', qpic(2, 2, 9))]);
        let tex = decode(&wad, &wad.entries()[1], &DecodeOptions::default()).unwrap();
        assert_eq!(tex.pixels.get_pixel(1, 1).0, [1, 2, 3, 255]);
    }

    #[test]
    fn palette_missing_without_default() {
        let wad = archive(vec![("bar", b'B', qpic(2, 2, 9))]);
        let options = DecodeOptions {
            default_palette: None,
            keep_mips: false,
        };
        assert_eq!(
            decode(&wad, &wad.entries()[0], &options).unwrap_err(),
            DecodeError::PaletteMissing {
                name: "bar".to_string()
            }
        );
    }

    #[test]
    fn unsupported_tag_is_reported() {
        let wad = archive(vec![("odd", 0x43, vec![0u8; 4])]);
        assert_eq!(
            decode(&wad, &wad.entries()[0], &DecodeOptions::default()).unwrap_err(),
            DecodeError::UnsupportedLumpType {
                name: "odd".to_string(),
                tag: 0x43
            }
        );
    }

    #[test]
    fn truncated_pixels_are_reported() {
        let mut data = qpic(4, 4, 1);
        data.truncate(12);
        let wad = archive(vec![("bar", b'B', data)]);
        assert!(matches!(
            decode(&wad, &wad.entries()[0], &DecodeOptions::default()),
            Err(DecodeError::TruncatedLump { needed: 24, available: 12, .. })
        ));
    }

    #[test]
    fn conchars_is_headerless() {
        let wad = archive(vec![("CONCHARS", b'D', vec![3u8; 128 * 128])]);
        let tex = decode(&wad, &wad.entries()[0], &DecodeOptions::default()).unwrap();
        assert_eq!((tex.width, tex.height), (128, 128));
    }

    #[test]
    fn cutout_index_is_transparent() {
        let wad = archive(vec![("{grate", b'B', qpic(2, 1, 255))]);
        let tex = decode(&wad, &wad.entries()[0], &DecodeOptions::default()).unwrap();
        assert_eq!(tex.pixels.get_pixel(0, 0).0[3], 0);

        let wad = archive(vec![("grate", b'B', qpic(2, 1, 255))]);
        let tex = decode(&wad, &wad.entries()[0], &DecodeOptions::default()).unwrap();
        assert_eq!(tex.pixels.get_pixel(0, 0).0[3], 255);
    }

    #[test]
    fn palette_lump_decodes_to_swatch() {
        let wad = archive(vec![("PALETTE", b'@', Palette::quake().to_bytes())]);
        let tex = decode(&wad, &wad.entries()[0], &DecodeOptions::default()).unwrap();
        assert_eq!((tex.width, tex.height), (16, 16));
        assert_eq!(tex.pixels.get_pixel(15, 15).0, [159, 91, 83, 255]);
    }
}
