use std::collections::HashMap;

use super::{decode, DecodeOptions, DecodedTexture};
use crate::wad::{DecodeError, ParseError, WadArchive};

/// Lazily decoded textures of one archive.
///
/// Nothing is decoded until asked for; `reload` drops everything.
#[derive(Debug)]
pub struct DecodeCache {
    archive: WadArchive,
    options: DecodeOptions,
    decoded: HashMap<usize, DecodedTexture>,
}

impl DecodeCache {
    pub fn new(archive: WadArchive, options: DecodeOptions) -> Self {
        Self {
            archive,
            options,
            decoded: HashMap::new(),
        }
    }

    pub fn archive(&self) -> &WadArchive {
        &self.archive
    }

    /// Decoded texture of the lump at `index`, decoding it on first use.
    /// Returns `Ok(None)` for an index past the directory.
    pub fn decode(&mut self, index: usize) -> Result<Option<&DecodedTexture>, DecodeError> {
        let Some(entry) = self.archive.entry(index) else {
            return Ok(None);
        };
        if !self.decoded.contains_key(&index) {
            let texture = decode(&self.archive, entry, &self.options)?;
            self.decoded.insert(index, texture);
        }
        Ok(self.decoded.get(&index))
    }

    pub fn is_decoded(&self, index: usize) -> bool {
        self.decoded.contains_key(&index)
    }

    pub fn decoded_count(&self) -> usize {
        self.decoded.len()
    }

    /// Replace the archive with freshly parsed bytes, WAD2 or BSP. The old
    /// archive and its cache stay in place if parsing fails.
    pub fn reload(&mut self, bytes: &[u8]) -> Result<(), ParseError> {
        self.archive = WadArchive::open(bytes)?;
        self.clear();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.decoded.clear();
    }
}
