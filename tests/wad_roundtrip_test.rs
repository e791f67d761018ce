use wad_tools_lib::wad::{ArchiveFormat, DecodeError, LumpType, Palette};
use wad_tools_lib::texture::cache::DecodeCache;
use wad_tools_lib::{decode, DecodeOptions, WadArchive};

#[path = "common/mod.rs"]
mod common;

use common::{bsp29_with_textures, indices, miptex_bytes, WadBuilder};

fn checker(x: u32, y: u32) -> u8 {
    ((x * 7 + y * 13) % 256) as u8
}

#[test]
fn decode_reproduces_palette_indices() {
    let bytes = WadBuilder::new()
        .miptex("wall1", 32, 16, checker)
        .qpic("num_0", 24, 24, checker)
        .compressed("CONCHARS", b'D', indices(128, 128, &checker))
        .build();

    let archive = WadArchive::parse(&bytes).expect("parse fixture");
    assert_eq!(archive.format(), ArchiveFormat::Wad2);
    assert_eq!(archive.len(), 3);

    let palette = Palette::quake();
    for entry in archive.entries() {
        let texture = decode(&archive, entry, &DecodeOptions::default()).expect("decode lump");
        let expected = indices(texture.width, texture.height, &checker);
        assert_eq!(texture.indices.as_deref(), Some(expected.as_slice()), "{}", entry.name);

        for (x, y, pixel) in texture.pixels.enumerate_pixels() {
            let index = expected[(y * texture.width + x) as usize];
            assert_eq!(pixel, &palette.rgba(index, 255), "{} at {},{}", entry.name, x, y);
        }
    }
}

#[test]
fn mip_levels_are_downsampled_copies() {
    let bytes = WadBuilder::new().miptex("wall1", 16, 16, checker).build();
    let archive = WadArchive::parse(&bytes).unwrap();
    let options = DecodeOptions {
        keep_mips: true,
        ..DecodeOptions::default()
    };
    let texture = decode(&archive, &archive.entries()[0], &options).unwrap();
    assert_eq!(texture.mips.len(), 3);

    let palette = Palette::quake();
    let mip1 = &texture.mips[0];
    assert_eq!(mip1.dimensions(), (8, 8));
    assert_eq!(mip1.get_pixel(3, 2), &palette.rgba(checker(6, 4), 255));
}

#[test]
fn broken_lump_does_not_stop_the_rest() {
    let mut short_pic = Vec::new();
    short_pic.extend_from_slice(&64i32.to_le_bytes());
    short_pic.extend_from_slice(&64i32.to_le_bytes());
    short_pic.extend_from_slice(&[0u8; 10]);

    let bytes = WadBuilder::new()
        .raw("mystery", b'C', vec![1, 2, 3])
        .raw("short", b'B', short_pic)
        .miptex("wall1", 8, 8, checker)
        .build();
    let archive = WadArchive::parse(&bytes).unwrap();

    let results: Vec<_> = archive
        .entries()
        .iter()
        .map(|e| decode(&archive, e, &DecodeOptions::default()))
        .collect();
    assert!(matches!(results[0], Err(DecodeError::UnsupportedLumpType { tag: b'C', .. })));
    assert!(matches!(results[1], Err(DecodeError::TruncatedLump { .. })));
    assert!(results[2].is_ok());
}

#[test]
fn archive_palette_overrides_default() {
    let mut rgb = vec![0u8; 768];
    rgb[3..6].copy_from_slice(&[200, 100, 50]);
    let bytes = WadBuilder::new().palette(&rgb).qpic("dot", 1, 1, |_, _| 1).build();
    let archive = WadArchive::parse(&bytes).unwrap();
    assert_eq!(archive.entries()[0].lump_type, LumpType::Palette);

    let dot = decode(&archive, archive.find("DOT").unwrap(), &DecodeOptions::default()).unwrap();
    assert_eq!(dot.pixels.get_pixel(0, 0).0, [200, 100, 50, 255]);
}

#[test]
fn corrupt_deflate_stream_is_a_decode_error() {
    let mut bytes = WadBuilder::new()
        .compressed("blob", b'B', vec![9u8; 4096])
        .build();
    // Flip bytes inside the stored stream, which starts right after the header.
    for b in &mut bytes[12..20] {
        *b ^= 0xff;
    }
    let archive = WadArchive::parse(&bytes).unwrap();
    assert!(matches!(
        archive.payload(&archive.entries()[0]),
        Err(DecodeError::DecompressionError { .. })
    ));
}

#[test]
fn cache_reloads_bsp_maps() {
    let map = |fill: u8| bsp29_with_textures(&[Some(miptex_bytes("+0btn", 8, 8, move |_, _| fill))]);
    let mut cache = DecodeCache::new(WadArchive::open(&map(1)).unwrap(), DecodeOptions::default());
    assert_eq!(cache.decode(0).unwrap().unwrap().indices.as_deref(), Some(&[1u8; 64][..]));

    cache.reload(&map(2)).expect("reload BSP");
    assert_eq!(cache.archive().format(), ArchiveFormat::Bsp29);
    assert_eq!(cache.decoded_count(), 0);
    assert_eq!(cache.decode(0).unwrap().unwrap().indices.as_deref(), Some(&[2u8; 64][..]));

    // a WAD2 replacing the map goes through the same entry point
    cache.reload(&WadBuilder::new().miptex("wall1", 8, 8, |_, _| 3).build()).unwrap();
    assert_eq!(cache.archive().format(), ArchiveFormat::Wad2);
}
