use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::material::NamingMode;
use crate::texture::sky::DEFAULT_SPLIT_RATIO;

pub const DEFAULT_GLOW_SUFFIX: &str = "_luma";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Import options chosen by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub naming_mode: NamingMode,
    /// Root that relative material names are taken against.
    pub base_path: String,
    pub glow_suffix: String,
    /// Share of a sky image's width used by the near layer.
    pub sky_split_ratio: f64,
    pub mark_assets: bool,
    /// Black out fullbright pixels in the base image.
    pub cut_out_luma: bool,
    pub water_nodes: bool,
    pub sky_nodes: bool,
    /// Off: animated frames become independent plain materials.
    pub sequence_nodes: bool,
    pub interpolate_frames: bool,
    pub frames_per_second: f64,
    pub keep_mips: bool,
    /// Fall back to the stock palette when an archive has none.
    pub use_default_palette: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            naming_mode: NamingMode::ShortName,
            base_path: String::new(),
            glow_suffix: DEFAULT_GLOW_SUFFIX.to_string(),
            sky_split_ratio: DEFAULT_SPLIT_RATIO,
            mark_assets: true,
            cut_out_luma: false,
            water_nodes: true,
            sky_nodes: true,
            sequence_nodes: true,
            interpolate_frames: false,
            frames_per_second: 5.0,
            keep_mips: false,
            use_default_palette: true,
        }
    }
}

impl ImportSettings {
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.sky_split_ratio > 0.0 && self.sky_split_ratio < 1.0) {
            return Err(SettingsError::Invalid {
                field: "sky_split_ratio",
                reason: format!("{} is not between 0 and 1", self.sky_split_ratio),
            });
        }
        if !(self.frames_per_second.is_finite() && self.frames_per_second > 0.0) {
            return Err(SettingsError::Invalid {
                field: "frames_per_second",
                reason: format!("{} is not a positive rate", self.frames_per_second),
            });
        }
        Ok(())
    }

    /// Glow suffix in use; an empty setting means the default.
    pub fn effective_glow_suffix(&self) -> &str {
        if self.glow_suffix.is_empty() {
            DEFAULT_GLOW_SUFFIX
        } else {
            &self.glow_suffix
        }
    }
}
