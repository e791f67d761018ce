//! Texture import for id-engine WAD2 archives and BSP maps: container
//! parsing, palette decoding, name-driven material descriptions, and
//! texel density normalization.

pub mod density;
pub mod import;
pub mod material;
pub mod math;
pub mod preferences;
pub mod texture;
pub mod wad;

pub use import::{ImportReport, ImportSession};
pub use preferences::ImportSettings;
pub use texture::{decode, DecodeOptions, DecodedTexture};
pub use wad::{DecodeError, ParseError, WadArchive};
