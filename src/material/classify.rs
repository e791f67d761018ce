//! Texture name conventions of the Quake engine.
//!
//! | prefix      | meaning                                  |
//! |-------------|------------------------------------------|
//! | `sky`       | two-layer scrolling sky                  |
//! | `*` / `#`   | warped liquid (`#` is the on-disk form)  |
//! | `+0`..`+9`  | frame of the primary animation loop      |
//! | `+a`..`+j`  | frame of the alternate loop              |
//! | `{`         | alpha-tested, index 255 is transparent   |

use serde::{Deserialize, Serialize};

pub const ANIMATION_MARKER: char = '+';
pub const WATER_MARKERS: [char; 2] = ['*', '#'];
pub const SKY_PREFIX: &str = "sky";
pub const CUTOUT_MARKER: char = '{';
/// Alpha of translucent liquids.
pub const WATER_ALPHA: f32 = 0.75;

const ALTERNATE_FRAMES: std::ops::RangeInclusive<u8> = b'a'..=b'j';

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    Plain,
    Water,
    Sky,
    AnimatedFrame {
        sequence_key: String,
        frame_index: u8,
        is_alternate: bool,
    },
}

impl Classification {
    pub fn is_frame(&self) -> bool {
        matches!(self, Classification::AnimatedFrame { .. })
    }
}

fn starts_with_ignore_case(name: &str, prefix: &str) -> bool {
    name.len() >= prefix.len()
        && name.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Classify a texture by name alone.
pub fn classify(name: &str) -> Classification {
    if starts_with_ignore_case(name, SKY_PREFIX) {
        return Classification::Sky;
    }
    if name.starts_with(WATER_MARKERS) {
        return Classification::Water;
    }

    let bytes = name.as_bytes();
    if bytes.len() > 2 && bytes[0] == ANIMATION_MARKER as u8 {
        let marker = bytes[1].to_ascii_lowercase();
        let frame = if marker.is_ascii_digit() {
            Some((marker - b'0', false))
        } else if ALTERNATE_FRAMES.contains(&marker) {
            Some((marker - b'a', true))
        } else {
            None
        };
        if let Some((frame_index, is_alternate)) = frame {
            return Classification::AnimatedFrame {
                sequence_key: name[2..].to_lowercase(),
                frame_index,
                is_alternate,
            };
        }
    }

    Classification::Plain
}

/// Rendering traits implied by a texture name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceTraits {
    /// Index 255 is transparent, alpha-clip blending.
    pub cutout: bool,
    /// Colour drives emission; base colour stays black.
    pub self_lit: bool,
    /// Blended at [`WATER_ALPHA`].
    pub translucent: bool,
    /// Never gets a glow image.
    pub fullbright_exempt: bool,
}

/// Liquid name with its marker stripped, lowercased.
fn liquid_body(name: &str) -> Option<String> {
    name.strip_prefix(WATER_MARKERS).map(str::to_lowercase)
}

pub fn surface_traits(name: &str) -> SurfaceTraits {
    let sky = starts_with_ignore_case(name, SKY_PREFIX);
    let liquid = liquid_body(name);
    let hot_liquid = liquid
        .as_deref()
        .map(|body| body.starts_with("lava") || body.starts_with("tele"))
        .unwrap_or(false);

    SurfaceTraits {
        cutout: name.starts_with(CUTOUT_MARKER),
        self_lit: sky || hot_liquid,
        translucent: liquid.is_some() && !hot_liquid,
        fullbright_exempt: sky || liquid.is_some(),
    }
}
