//! Batch import: archives and loose images in, material descriptions and
//! the images they reference out.

pub mod report;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use image::RgbaImage;
use serde::Serialize;

use crate::material::naming::{archive_material_name, loose_material_name, loose_texture_name, source_tag, MaterialName};
use crate::material::sequence::aggregate;
use crate::material::{classify, synthesize, ImageLibrary, ImageRef, MaterialDescription, Subject, TextureLibrary};
use crate::preferences::ImportSettings;
use crate::texture::fullbright::{glow_name, split_fullbrights};
use crate::texture::{decode, DecodeOptions, DecodedTexture};
use crate::wad::{ArchiveFormat, Palette, ParseError, WadArchive};

pub use report::{ImportWarning, WarningRecord, WarningSeverity};

/// Container format of `bytes`, judged by its signature. Structural
/// problems surface later, from `open_archive`.
pub fn detect_format(bytes: &[u8]) -> Option<ArchiveFormat> {
    ArchiveFormat::detect(bytes)
}

/// Parse a WAD2 archive or a BSP's texture lump.
pub fn open_archive(bytes: &[u8]) -> Result<WadArchive, ParseError> {
    WadArchive::open(bytes)
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSummary {
    pub format: ArchiveFormat,
    pub lumps: usize,
    /// Textures newly added to the session.
    pub added: usize,
    /// Textures already present under the same name.
    pub duplicates: usize,
    /// Lumps that failed to decode.
    pub skipped: usize,
}

/// A texture waiting to become a material.
#[derive(Debug, Clone)]
struct Pending {
    /// Path prefix of the material name, empty for short names.
    scope: String,
    texture: String,
    source_tag: String,
    extra_tags: Vec<String>,
}

impl Pending {
    fn material_name(&self) -> String {
        format!("{}{}", self.scope, self.texture)
    }
}

/// Library lookups confined to one naming scope.
struct ScopedLibrary<'a> {
    library: &'a ImageLibrary,
    scope: &'a str,
}

impl TextureLibrary for ScopedLibrary<'_> {
    fn image(&self, name: &str) -> Option<ImageRef> {
        self.library.image(&format!("{}{}", self.scope, name))
    }
}

/// Everything an import produced.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub materials: Vec<MaterialDescription>,
    /// Pixels of every image the materials reference, named as referenced.
    pub images: Vec<DecodedTexture>,
    pub warnings: Vec<ImportWarning>,
}

impl ImportReport {
    pub fn warning_records(&self) -> Vec<WarningRecord> {
        self.warnings.iter().map(ImportWarning::to_record).collect()
    }

    pub fn material(&self, name: &str) -> Option<&MaterialDescription> {
        self.materials.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn image(&self, name: &str) -> Option<&DecodedTexture> {
        self.images.iter().find(|i| i.name.eq_ignore_ascii_case(name))
    }
}

/// Collects textures from any number of sources, then describes them all at once.
#[derive(Debug)]
pub struct ImportSession {
    settings: ImportSettings,
    library: ImageLibrary,
    images: Vec<DecodedTexture>,
    pending: Vec<Pending>,
    /// Lowercased material name → index into `pending`.
    seen: HashMap<String, usize>,
    warnings: Vec<ImportWarning>,
}

impl ImportSession {
    pub fn new(settings: ImportSettings) -> Self {
        Self {
            settings,
            library: ImageLibrary::new(),
            images: Vec::new(),
            pending: Vec::new(),
            seen: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            default_palette: self.settings.use_default_palette.then(Palette::quake),
            keep_mips: self.settings.keep_mips,
        }
    }

    fn is_glow(&self, texture: &str) -> bool {
        let suffix = self.settings.effective_glow_suffix();
        texture.len() > suffix.len()
            && texture
                .get(texture.len() - suffix.len()..)
                .map(|tail| tail.eq_ignore_ascii_case(suffix))
                .unwrap_or(false)
    }

    /// Store an image under its (scoped) name, first one wins.
    fn store_image(&mut self, mut texture: DecodedTexture, name: String) {
        texture.name = name;
        let added = self.library.insert(ImageRef {
            name: texture.name.clone(),
            width: texture.width,
            height: texture.height,
        });
        if added {
            self.images.push(texture);
        }
    }

    /// Register a texture; `false` if a texture of that name was already seen.
    fn add_texture(&mut self, name: MaterialName, texture: DecodedTexture, source: &Path, tag: String) -> bool {
        let texture_name = texture.name.clone();
        if name.fell_back {
            self.warnings.push(ImportWarning::RelativeNameFallback {
                source: source.display().to_string(),
                texture: texture_name.clone(),
            });
        }
        let key = name.name.to_lowercase();
        if let Some(&existing) = self.seen.get(&key) {
            let pending = &mut self.pending[existing];
            if pending.source_tag != tag && !pending.extra_tags.contains(&tag) {
                pending.extra_tags.push(tag);
            }
            return false;
        }

        let scope = name.name.strip_suffix(texture_name.as_str()).unwrap_or_default().to_string();
        let glow_suffix = self.settings.effective_glow_suffix().to_string();
        let split = split_fullbrights(&texture, &glow_suffix, self.settings.cut_out_luma);
        self.store_image(split.base, name.name.clone());
        if let Some(glow) = split.glow {
            self.store_image(glow, glow_name(&name.name, &glow_suffix));
        }

        if self.is_glow(&texture_name) {
            return true;
        }
        self.seen.insert(key, self.pending.len());
        self.pending.push(Pending {
            scope,
            texture: texture_name,
            source_tag: tag,
            extra_tags: Vec::new(),
        });
        true
    }

    /// Add every texture of a WAD2 archive or BSP map. Lumps that fail to
    /// decode become warnings; a broken directory fails the whole archive.
    pub fn add_archive(&mut self, bytes: &[u8], source: impl AsRef<Path>) -> Result<ArchiveSummary, ParseError> {
        let source = source.as_ref();
        let archive = open_archive(bytes)?;
        let options = self.decode_options();
        let tag = source_tag(source, false);
        let base_path = Path::new(&self.settings.base_path).to_path_buf();

        let mut summary = ArchiveSummary {
            format: archive.format(),
            lumps: archive.len(),
            added: 0,
            duplicates: 0,
            skipped: 0,
        };

        for entry in archive.entries() {
            let texture = match decode(&archive, entry, &options) {
                Ok(texture) => texture,
                Err(error) => {
                    tracing::debug!(lump = %entry.name, code = error.code(), "skipping lump");
                    self.warnings.push(ImportWarning::Lump {
                        source: source.display().to_string(),
                        index: entry.index,
                        error,
                    });
                    summary.skipped += 1;
                    continue;
                }
            };
            let name = archive_material_name(&texture.name, source, &base_path, self.settings.naming_mode);
            if self.add_texture(name, texture, source, tag.clone()) {
                summary.added += 1;
            } else {
                summary.duplicates += 1;
            }
        }

        tracing::debug!(source = %source.display(), ?summary, "archive imported");
        Ok(summary)
    }

    /// Add an image file the host already decoded. A file named
    /// `<texture><glow suffix>` only supplies the glow of `<texture>`.
    pub fn add_loose_image(&mut self, pixels: RgbaImage, source: impl AsRef<Path>) -> bool {
        let source = source.as_ref();
        let base_path = Path::new(&self.settings.base_path).to_path_buf();
        let texture = DecodedTexture::from_rgba(loose_texture_name(source), pixels);
        let name = loose_material_name(source, &base_path, self.settings.naming_mode);
        self.add_texture(name, texture, source, source_tag(source, true))
    }

    /// Describe every collected texture and sequence.
    pub fn finish(self) -> ImportReport {
        let ImportSession {
            settings,
            library,
            images,
            pending,
            seen: _,
            mut warnings,
        } = self;

        let mut materials = Vec::new();
        let mut frames_by_scope: BTreeMap<String, Vec<&Pending>> = BTreeMap::new();

        for item in &pending {
            if settings.sequence_nodes && classify(&item.texture).is_frame() {
                frames_by_scope.entry(item.scope.clone()).or_default().push(item);
                continue;
            }
            let scoped = ScopedLibrary {
                library: &library,
                scope: &item.scope,
            };
            let name = item.material_name();
            match synthesize(Subject::Texture(&item.texture), &scoped, &name, &item.source_tag, &settings) {
                Ok(mut material) => {
                    item.extra_tags.iter().for_each(|t| material.add_tag(t));
                    materials.push(material);
                }
                Err(error) => warnings.push(ImportWarning::Material { name, error }),
            }
        }

        // Unclassified `+` names are reported however sequences are built.
        let mut plus_by_scope: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for item in &pending {
            plus_by_scope.entry(&item.scope).or_default().push(&item.texture);
        }
        for (scope, names) in &plus_by_scope {
            for unclassified in aggregate(names.iter().copied()).unclassified {
                warnings.push(ImportWarning::UnclassifiedFrame {
                    scope: scope.to_string(),
                    name: unclassified.name,
                });
            }
        }

        for (scope, frames) in &frames_by_scope {
            let aggregation = aggregate(frames.iter().map(|p| p.texture.as_str()));
            let scoped = ScopedLibrary {
                library: &library,
                scope,
            };
            for sequence in aggregation.sequences.values() {
                warnings.extend(sequence.warnings.iter().map(|w| ImportWarning::Sequence {
                    scope: scope.clone(),
                    warning: w.clone(),
                }));

                let Some(lead) = sequence.lead_frame() else {
                    continue;
                };
                let Some(origin) = frames.iter().find(|p| p.texture == lead.name) else {
                    continue;
                };
                let name = origin.material_name();
                match synthesize(Subject::Sequence(sequence), &scoped, &name, &origin.source_tag, &settings) {
                    Ok(mut material) => {
                        for frame_name in sequence.frame_names() {
                            if let Some(frame) = frames.iter().find(|p| p.texture == frame_name) {
                                material.add_tag(&frame.source_tag);
                                frame.extra_tags.iter().for_each(|t| material.add_tag(t));
                            }
                        }
                        materials.push(material);
                    }
                    Err(error) => warnings.push(ImportWarning::Material { name, error }),
                }
            }
        }

        tracing::debug!(
            materials = materials.len(),
            images = images.len(),
            warnings = warnings.len(),
            "import finished"
        );

        ImportReport {
            materials,
            images,
            warnings,
        }
    }
}
