use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::classify::{classify, surface_traits, Classification, SurfaceTraits, WATER_ALPHA};
use super::nodes::{FrameSelector, NodeLayout, SequenceBank, SkyLayers, SkyScroll, WaterWarp};
use super::sequence::{AnimationSequence, SequenceFrame};
use crate::preferences::ImportSettings;
use crate::texture::fullbright::glow_name;
use crate::texture::sky::sky_regions;

/// An image the host has to create. Pixels travel separately.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// Resolves image names to images the host will have.
pub trait TextureLibrary {
    fn image(&self, name: &str) -> Option<ImageRef>;
}

/// In-memory [`TextureLibrary`] with ASCII case-insensitive lookups.
#[derive(Debug, Clone, Default)]
pub struct ImageLibrary {
    images: HashMap<String, ImageRef>,
}

impl ImageLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an image; an existing image of the same name is kept.
    pub fn insert(&mut self, image: ImageRef) -> bool {
        let key = image.name.to_ascii_lowercase();
        if self.images.contains_key(&key) {
            return false;
        }
        self.images.insert(key, image);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.images.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl TextureLibrary for ImageLibrary {
    fn image(&self, name: &str) -> Option<ImageRef> {
        self.images.get(&name.to_ascii_lowercase()).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialKind {
    Plain,
    Water,
    Sky,
    Sequence { key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    Opaque,
    AlphaClip,
    Blend,
}

/// How the surface casts shadows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowMode {
    Opaque,
    Clip,
    Hashed,
    /// Scrolling skies cast no shadow.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSettings {
    pub blend: BlendMode,
    pub shadow: ShadowMode,
    pub backface_culling: bool,
    pub alpha: f32,
    /// Colour is wired to emission and base colour is black.
    pub self_lit: bool,
}

impl From<SurfaceTraits> for SurfaceSettings {
    fn from(traits: SurfaceTraits) -> Self {
        let (blend, shadow) = if traits.translucent {
            (BlendMode::Blend, ShadowMode::Hashed)
        } else if traits.cutout {
            (BlendMode::AlphaClip, ShadowMode::Clip)
        } else {
            (BlendMode::Opaque, ShadowMode::Opaque)
        };
        Self {
            blend,
            shadow,
            // cut-outs are seen from both sides
            backface_culling: !traits.cutout,
            alpha: if traits.translucent { WATER_ALPHA } else { 1.0 },
            self_lit: traits.self_lit,
        }
    }
}

/// Everything the host needs to build one material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDescription {
    pub name: String,
    pub kind: MaterialKind,
    pub layout: NodeLayout,
    /// Base images: one for single textures, every frame for sequences.
    pub images: Vec<ImageRef>,
    pub glow: Vec<ImageRef>,
    pub surface: SurfaceSettings,
    pub source_tag: String,
    /// Tags of later sources that held the same texture.
    pub additional_tags: Vec<String>,
    pub mark_as_asset: bool,
}

impl MaterialDescription {
    pub fn add_tag(&mut self, tag: &str) {
        if tag != self.source_tag && !self.additional_tags.iter().any(|t| t == tag) {
            self.additional_tags.push(tag.to_string());
        }
    }
}

/// What a material is built from.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    /// A single texture, classified by its name.
    Texture(&'a str),
    Sequence(&'a AnimationSequence),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthError {
    #[error("image '{0}' is not in the library")]
    MissingImage(String),

    #[error("sequence '{0}' has no frames")]
    EmptySequence(String),
}

fn require(library: &impl TextureLibrary, name: &str) -> Result<ImageRef, SynthError> {
    library
        .image(name)
        .ok_or_else(|| SynthError::MissingImage(name.to_string()))
}

fn frame_images(
    library: &impl TextureLibrary,
    frames: &[SequenceFrame],
    glow_suffix: &str,
) -> Result<(Vec<ImageRef>, Vec<Option<ImageRef>>), SynthError> {
    let mut images = Vec::with_capacity(frames.len());
    let mut glow = Vec::with_capacity(frames.len());
    for frame in frames {
        images.push(require(library, &frame.name)?);
        glow.push(library.image(&glow_name(&frame.name, glow_suffix)));
    }
    Ok((images, glow))
}

/// Build the description of one material.
///
/// `name` is the already resolved material name (see [`super::naming`]).
pub fn synthesize(
    subject: Subject<'_>,
    library: &impl TextureLibrary,
    name: &str,
    source_tag: &str,
    settings: &ImportSettings,
) -> Result<MaterialDescription, SynthError> {
    let glow_suffix = settings.effective_glow_suffix();

    let (kind, layout, images, glow, traits) = match subject {
        Subject::Texture(texture) => {
            let image = require(library, texture)?;
            let traits = surface_traits(texture);
            match classify(texture) {
                Classification::Water => {
                    let warp = settings.water_nodes.then(WaterWarp::default);
                    (MaterialKind::Water, NodeLayout::Water { warp }, vec![image], Vec::new(), traits)
                }
                Classification::Sky => {
                    let layers = match sky_regions(image.width, image.height, settings.sky_split_ratio) {
                        Some((near, far)) if settings.sky_nodes => SkyLayers::TwoLayer {
                            near,
                            far,
                            scroll: SkyScroll::default(),
                        },
                        _ => SkyLayers::SingleLayer,
                    };
                    (MaterialKind::Sky, NodeLayout::Sky(layers), vec![image], Vec::new(), traits)
                }
                // Frames reach here only when sequence nodes are disabled.
                Classification::Plain | Classification::AnimatedFrame { .. } => {
                    let emission = library.image(&glow_name(texture, glow_suffix));
                    let glow: Vec<ImageRef> = emission.iter().cloned().collect();
                    (MaterialKind::Plain, NodeLayout::Diffuse { emission }, vec![image], glow, traits)
                }
            }
        }
        Subject::Sequence(sequence) => {
            let lead = sequence
                .lead_frame()
                .ok_or_else(|| SynthError::EmptySequence(sequence.key.clone()))?;
            let (frames, frame_glow) = frame_images(library, &sequence.frames, glow_suffix)?;
            let (alternate_frames, alternate_glow) =
                frame_images(library, &sequence.alternate_frames, glow_suffix)?;

            let images: Vec<ImageRef> = frames.iter().chain(alternate_frames.iter()).cloned().collect();
            let glow: Vec<ImageRef> = frame_glow
                .iter()
                .chain(alternate_glow.iter())
                .flatten()
                .cloned()
                .collect();
            let bank = SequenceBank {
                frames,
                glow: frame_glow,
                alternate_frames,
                alternate_glow,
                selector: FrameSelector {
                    frames_per_second: settings.frames_per_second,
                    interpolate: settings.interpolate_frames,
                },
            };
            (
                MaterialKind::Sequence {
                    key: sequence.key.clone(),
                },
                NodeLayout::Sequence(bank),
                images,
                glow,
                surface_traits(&lead.name),
            )
        }
    };

    let mut surface = SurfaceSettings::from(traits);
    if matches!(layout, NodeLayout::Sky(SkyLayers::TwoLayer { .. })) {
        surface.shadow = ShadowMode::None;
    }

    Ok(MaterialDescription {
        name: name.to_string(),
        kind,
        layout,
        images,
        glow,
        surface,
        source_tag: source_tag.to_string(),
        additional_tags: Vec::new(),
        mark_as_asset: settings.mark_assets,
    })
}
