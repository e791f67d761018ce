//! Fullbright ("luma") pixels: palette indices the engine draws unlit.

use image::{Rgba, RgbaImage};

use super::DecodedTexture;
use crate::material::classify::surface_traits;
use crate::wad::palette::{is_fullbright, TRANSPARENT_INDEX};

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Name of the glow image derived from `base`.
pub fn glow_name(base: &str, glow_suffix: &str) -> String {
    format!("{}{}", base, glow_suffix)
}

/// Fullbright and not the transparent index of a cut-out texture.
fn glows(index: u8, cutout: bool) -> bool {
    is_fullbright(index) && !(cutout && index == TRANSPARENT_INDEX)
}

/// Result of splitting a texture into its lit base and its glow.
#[derive(Debug, Clone)]
pub struct FullbrightSplit {
    /// Base texture, fullbrights blacked out when requested.
    pub base: DecodedTexture,
    /// Glow texture, present only if some pixel glows.
    pub glow: Option<DecodedTexture>,
}

/// Extract the glow image of an indexed texture.
///
/// Loose images, sky and water pass through untouched.
pub fn split_fullbrights(texture: &DecodedTexture, glow_suffix: &str, cut_out_luma: bool) -> FullbrightSplit {
    let traits = surface_traits(&texture.name);
    let (Some(indices), Some(palette)) = (&texture.indices, &texture.palette) else {
        return FullbrightSplit {
            base: texture.clone(),
            glow: None,
        };
    };
    if traits.fullbright_exempt || !indices.iter().any(|&i| glows(i, traits.cutout)) {
        return FullbrightSplit {
            base: texture.clone(),
            glow: None,
        };
    }

    let width = texture.width;
    let at = |x: u32, y: u32| indices[(y * width + x) as usize];

    let glow_pixels = RgbaImage::from_fn(texture.width, texture.height, |x, y| {
        let index = at(x, y);
        if glows(index, traits.cutout) {
            palette.rgba(index, 255)
        } else {
            BLACK
        }
    });

    let mut base = texture.clone();
    if cut_out_luma {
        for (x, y, pixel) in base.pixels.enumerate_pixels_mut() {
            if glows(at(x, y), traits.cutout) {
                *pixel = BLACK;
            }
        }
    }

    tracing::trace!(texture = %texture.name, "extracted fullbright glow");

    let glow = DecodedTexture {
        name: glow_name(&texture.name, glow_suffix),
        width: texture.width,
        height: texture.height,
        pixels: glow_pixels,
        indices: None,
        palette: None,
        mips: Vec::new(),
    };
    FullbrightSplit {
        base,
        glow: Some(glow),
    }
}
