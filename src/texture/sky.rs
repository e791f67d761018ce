//! Two-layer sky textures: the left part scrolls near, the right part far.

use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};

use super::DecodedTexture;

pub const DEFAULT_SPLIT_RATIO: f64 = 0.5;

/// Pixel rectangle inside a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Near (left) and far (right) regions of a sky image, or `None` when the
/// image is not at least twice as wide as tall or one side would be empty.
pub fn sky_regions(width: u32, height: u32, ratio: f64) -> Option<(ImageRegion, ImageRegion)> {
    if height == 0 || (width as u64) < 2 * height as u64 || !(ratio > 0.0 && ratio < 1.0) {
        return None;
    }
    let near_width = (width as f64 * ratio).round() as u32;
    if near_width == 0 || near_width >= width {
        return None;
    }
    let near = ImageRegion {
        x: 0,
        y: 0,
        width: near_width,
        height,
    };
    let far = ImageRegion {
        x: near_width,
        y: 0,
        width: width - near_width,
        height,
    };
    Some((near, far))
}

#[derive(Debug, Clone)]
pub struct SkySplit {
    pub near: RgbaImage,
    pub far: RgbaImage,
}

/// Crop the two layers of a sky texture.
pub fn split_sky(texture: &DecodedTexture, ratio: f64) -> Option<SkySplit> {
    let (near, far) = sky_regions(texture.width, texture.height, ratio)?;
    let crop = |r: ImageRegion| imageops::crop_imm(&texture.pixels, r.x, r.y, r.width, r.height).to_image();
    Some(SkySplit {
        near: crop(near),
        far: crop(far),
    })
}
