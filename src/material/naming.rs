use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use super::classify::WATER_MARKERS;

/// How material names are formed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingMode {
    /// The texture name alone.
    #[default]
    ShortName,
    /// Source path below the base path, then the texture name.
    RelativePath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialName {
    pub name: String,
    /// Relative naming was asked for but the source lies outside the base
    /// path, so the short name was used.
    pub fell_back: bool,
}

impl MaterialName {
    fn short(name: String) -> Self {
        Self { name, fell_back: false }
    }
}

/// `/`-joined path components with the extension dropped.
fn slash_path(path: &Path) -> String {
    path.with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Source path below `base_path`, or `None` when it lies elsewhere.
/// An empty base keeps the path as given.
fn relative_source(source: &Path, base_path: &Path) -> Option<String> {
    if base_path.as_os_str().is_empty() {
        return Some(slash_path(source));
    }
    source.strip_prefix(base_path).ok().map(slash_path)
}

/// Loose files spell the liquid marker `#` since `*` is not allowed on disk.
fn restore_liquid_marker(name: &str) -> String {
    match name.strip_prefix(WATER_MARKERS[1]) {
        Some(rest) => format!("{}{}", WATER_MARKERS[0], rest),
        None => name.to_string(),
    }
}

/// Name of a material built from texture `texture` of archive `source`.
pub fn archive_material_name(texture: &str, source: &Path, base_path: &Path, mode: NamingMode) -> MaterialName {
    match mode {
        NamingMode::ShortName => MaterialName::short(texture.to_string()),
        NamingMode::RelativePath => match relative_source(source, base_path) {
            Some(prefix) if !prefix.is_empty() => MaterialName::short(format!("{}/{}", prefix, texture)),
            Some(_) => MaterialName::short(texture.to_string()),
            None => MaterialName {
                name: texture.to_string(),
                fell_back: true,
            },
        },
    }
}

/// Texture name of a loose image file: its stem, liquid marker restored.
pub fn loose_texture_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    restore_liquid_marker(&stem)
}

/// Name of a material built from a loose image file, which is its own texture.
pub fn loose_material_name(source: &Path, base_path: &Path, mode: NamingMode) -> MaterialName {
    let short = loose_texture_name(source);
    match mode {
        NamingMode::ShortName => MaterialName::short(short),
        NamingMode::RelativePath => match relative_source(source, base_path) {
            Some(relative) => {
                let name = match relative.rsplit_once('/') {
                    Some((dir, file)) => format!("{}/{}", dir, restore_liquid_marker(file)),
                    None => restore_liquid_marker(&relative),
                };
                MaterialName::short(name)
            }
            None => MaterialName {
                name: short,
                fell_back: true,
            },
        },
    }
}

/// Tag naming where a texture came from: the archive's file name, or the
/// folder holding a loose image.
pub fn source_tag(source: &Path, loose: bool) -> String {
    let part = if loose {
        source.parent().and_then(Path::file_name)
    } else {
        source.file_name()
    };
    part.map(|p| p.to_string_lossy().into_owned()).unwrap_or_default()
}
