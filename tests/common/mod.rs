// Common test utilities: in-memory WAD2 and BSP fixtures
#![allow(dead_code)]

use std::io::{Cursor, Write};

use binrw::BinWrite;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use wad_tools_lib::wad::lump::{
    DirectoryRecord, MipTexHeader, WadHeader, HEADER_SIZE, MIPTEX_HEADER_SIZE, WAD2_MAGIC,
};

/// One lump to be written.
pub struct FixtureLump {
    pub name: String,
    pub tag: u8,
    pub data: Vec<u8>,
    pub compress: bool,
}

/// Builds WAD2 archives lump by lump.
#[derive(Default)]
pub struct WadBuilder {
    lumps: Vec<FixtureLump>,
}

impl WadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(mut self, name: &str, tag: u8, data: Vec<u8>) -> Self {
        self.lumps.push(FixtureLump {
            name: name.to_string(),
            tag,
            data,
            compress: false,
        });
        self
    }

    pub fn compressed(mut self, name: &str, tag: u8, data: Vec<u8>) -> Self {
        self.lumps.push(FixtureLump {
            name: name.to_string(),
            tag,
            data,
            compress: true,
        });
        self
    }

    /// Mip texture with all four levels; pixel value from `pixel(x, y)`.
    pub fn miptex(self, name: &str, width: u32, height: u32, pixel: impl Fn(u32, u32) -> u8) -> Self {
        let data = miptex_bytes(name, width, height, pixel);
        self.raw(name, b'D', data)
    }

    pub fn qpic(self, name: &str, width: u32, height: u32, pixel: impl Fn(u32, u32) -> u8) -> Self {
        let mut data = Vec::new();
        data.extend_from_slice(&(width as i32).to_le_bytes());
        data.extend_from_slice(&(height as i32).to_le_bytes());
        data.extend(indices(width, height, &pixel));
        self.raw(name, b'B', data)
    }

    pub fn palette(self, rgb: &[u8]) -> Self {
        self.raw("PALETTE", b'@', rgb.to_vec())
    }

    pub fn build(self) -> Vec<u8> {
        let mut body = Vec::new();
        let mut records = Vec::new();
        for lump in self.lumps {
            let stored = if lump.compress {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
                encoder.write_all(&lump.data).unwrap();
                encoder.finish().unwrap()
            } else {
                lump.data.clone()
            };
            records.push(DirectoryRecord {
                offset: (HEADER_SIZE + body.len()) as i32,
                disk_size: stored.len() as i32,
                size: lump.data.len() as i32,
                lump_type: lump.tag,
                compression: lump.compress as u8,
                padding: 0,
                name: lump.name,
            });
            body.extend(stored);
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
        for record in &records {
            record.write(&mut cursor).unwrap();
        }
        cursor.into_inner()
    }
}

pub fn indices(width: u32, height: u32, pixel: &impl Fn(u32, u32) -> u8) -> Vec<u8> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| pixel(x, y))
        .collect()
}

pub fn miptex_bytes(name: &str, width: u32, height: u32, pixel: impl Fn(u32, u32) -> u8) -> Vec<u8> {
    let mut offsets = [0u32; 4];
    let mut levels = Vec::new();
    let mut next = MIPTEX_HEADER_SIZE as u32;
    for (level, offset) in offsets.iter_mut().enumerate() {
        let (w, h) = ((width >> level).max(1), (height >> level).max(1));
        *offset = next;
        let step = 1 << level;
        let data = indices(w, h, &|x, y| pixel(x * step, y * step));
        next += data.len() as u32;
        levels.extend(data);
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
    let mut out = cursor.into_inner();
    out.extend(levels);
    out
}

/// BSP29 map whose only populated lump is the texture lump. `None` entries
/// stand for externally stored textures.
pub fn bsp29_with_textures(textures: &[Option<Vec<u8>>]) -> Vec<u8> {
    const LUMPS: usize = 15;
    let header_len = 4 + LUMPS * 8;

    let table_len = 4 + textures.len() * 4;
    let mut table = Vec::new();
    let mut payload = Vec::new();
    table.extend_from_slice(&(textures.len() as i32).to_le_bytes());
    for texture in textures {
        match texture {
            Some(bytes) => {
                table.extend_from_slice(&((table_len + payload.len()) as i32).to_le_bytes());
                payload.extend_from_slice(bytes);
            }
            None => table.extend_from_slice(&(-1i32).to_le_bytes()),
        }
    }
    let lump_len = table.len() + payload.len();

    let mut out = Vec::new();
    out.extend_from_slice(&29u32.to_le_bytes());
    for i in 0..LUMPS {
        let (offset, length) = if i == 2 { (header_len as i32, lump_len as i32) } else { (0, 0) };
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&length.to_le_bytes());
    }
    out.extend(table);
    out.extend(payload);
    out
}
