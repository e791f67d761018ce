use thiserror::Error;

/// Archive-level failures. Any of these aborts the whole archive.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Buffer too short, wrong magic, or nonsensical header fields
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// Directory runs past the end of the archive
    #[error(
        "truncated directory: {entry_count} entries at offset {directory_offset} \
         need {needed} bytes, archive has {archive_len}"
    )]
    TruncatedDirectory {
        entry_count: u32,
        directory_offset: u32,
        needed: u64,
        archive_len: usize,
    },

    /// A directory record points outside the archive
    #[error("lump '{name}' at offset {offset} (+{size} bytes) lies outside the {archive_len}-byte archive")]
    OutOfBoundsLump {
        name: String,
        offset: i64,
        size: i64,
        archive_len: usize,
    },
}

impl From<binrw::Error> for ParseError {
    fn from(err: binrw::Error) -> Self {
        ParseError::MalformedHeader(err.to_string())
    }
}

/// Lump-level failures. The lump is skipped, the archive keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("lump '{name}' has unsupported type tag {tag:#04x}")]
    UnsupportedLumpType { name: String, tag: u8 },

    #[error("lump '{name}' is indexed but no palette is available")]
    PaletteMissing { name: String },

    #[error("lump '{name}' inflated to {actual} bytes, expected {expected}")]
    DecompressionError {
        name: String,
        expected: usize,
        /// Bytes inflated; never more than `expected + 1`.
        actual: usize,
    },

    #[error("lump '{name}' needs {needed} bytes but only {available} are stored")]
    TruncatedLump {
        name: String,
        needed: usize,
        available: usize,
    },
}

impl DecodeError {
    /// Name of the lump that failed.
    pub fn lump_name(&self) -> &str {
        match self {
            DecodeError::UnsupportedLumpType { name, .. }
            | DecodeError::PaletteMissing { name }
            | DecodeError::DecompressionError { name, .. }
            | DecodeError::TruncatedLump { name, .. } => name,
        }
    }

    /// Stable code for hosts that match on warnings.
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::UnsupportedLumpType { .. } => "LUMP_UNSUPPORTED",
            DecodeError::PaletteMissing { .. } => "LUMP_PALETTE_MISSING",
            DecodeError::DecompressionError { .. } => "LUMP_DECOMPRESSION",
            DecodeError::TruncatedLump { .. } => "LUMP_TRUNCATED",
        }
    }
}

/// Result type for archive parsing
pub type Result<T> = std::result::Result<T, ParseError>;
