//! Texel density: texture pixels per world unit, measured over a set of faces
//! and normalized by one uniform UV scale.

pub mod projection;

use cgmath::{Vector2, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{polygon_area_2d, polygon_area_3d};
use projection::cube_project;

/// Areas at or below this count as zero.
const AREA_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// A polygon handed over by the host. Only `uvs` is ever written.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub positions: Vec<Vector3<f64>>,
    pub uvs: Vec<Vector2<f64>>,
    pub image: Option<ImageSize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensitySample {
    /// Index into the face slice.
    pub face: usize,
    pub face_area: f64,
    pub uv_area: f64,
    pub width: u32,
    pub height: u32,
}

impl DensitySample {
    pub fn density(&self) -> f64 {
        (self.uv_area * self.width as f64 * self.height as f64 / self.face_area).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer than three vertices or no area. Left untouched.
    ZeroArea,
    /// No image bound. Scaled with the rest.
    NoBoundImage,
    /// UVs enclose no area. Scaled with the rest.
    DegenerateUv,
    /// UV count differs from vertex count. Left untouched.
    MismatchedUvCount,
}

impl SkipReason {
    pub fn code(self) -> &'static str {
        match self {
            SkipReason::ZeroArea => "DENSITY_ZERO_AREA",
            SkipReason::NoBoundImage => "DENSITY_NO_IMAGE",
            SkipReason::DegenerateUv => "DENSITY_DEGENERATE_UV",
            SkipReason::MismatchedUvCount => "DENSITY_UV_COUNT",
        }
    }

    /// Whether the face still receives the uniform scale.
    pub fn is_scaled(self) -> bool {
        matches!(self, SkipReason::NoBoundImage | SkipReason::DegenerateUv)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceSkip {
    pub face: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityReport {
    pub scale: f64,
    /// Area-weighted density before scaling.
    pub density_before: f64,
    pub density_after: f64,
    pub samples: Vec<DensitySample>,
    pub skipped: Vec<FaceSkip>,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DensityError {
    #[error("target density {0} must be a positive finite number")]
    InvalidTarget(f64),

    #[error("none of the {0} faces could be measured")]
    NoMeasurableFaces(usize),
}

enum Assessment {
    Measured(DensitySample),
    Skipped(SkipReason),
}

fn assess(face: usize, positions: &[Vector3<f64>], uvs: &[Vector2<f64>], image: Option<ImageSize>) -> Assessment {
    let face_area = polygon_area_3d(positions);
    if positions.len() < 3 || face_area <= AREA_EPSILON {
        return Assessment::Skipped(SkipReason::ZeroArea);
    }
    if uvs.len() != positions.len() {
        return Assessment::Skipped(SkipReason::MismatchedUvCount);
    }
    let Some(image) = image.filter(|i| i.width > 0 && i.height > 0) else {
        return Assessment::Skipped(SkipReason::NoBoundImage);
    };
    let uv_area = polygon_area_2d(uvs);
    if uv_area <= AREA_EPSILON {
        return Assessment::Skipped(SkipReason::DegenerateUv);
    }
    Assessment::Measured(DensitySample {
        face,
        face_area,
        uv_area,
        width: image.width,
        height: image.height,
    })
}

/// Area-weighted mean density of `samples`.
pub fn weighted_density(samples: &[DensitySample]) -> Option<f64> {
    let total_area: f64 = samples.iter().map(|s| s.face_area).sum();
    if total_area <= AREA_EPSILON {
        return None;
    }
    Some(samples.iter().map(|s| s.face_area * s.density()).sum::<f64>() / total_area)
}

/// Scale the UVs of `faces` so their weighted density becomes `target`,
/// optionally replacing them with a cube projection first.
///
/// Nothing is written unless the whole operation succeeds.
pub fn compute_and_apply(
    faces: &mut [Face],
    target: f64,
    cube_project_first: bool,
) -> Result<DensityReport, DensityError> {
    if !(target.is_finite() && target > 0.0) {
        return Err(DensityError::InvalidTarget(target));
    }

    let projected: Vec<Option<Vec<Vector2<f64>>>> = faces
        .iter()
        .map(|f| {
            let well_formed = f.positions.len() >= 3 && polygon_area_3d(&f.positions) > AREA_EPSILON;
            (cube_project_first && well_formed).then(|| cube_project(&f.positions).1)
        })
        .collect();

    let mut samples = Vec::new();
    let mut skipped = Vec::new();
    for (index, face) in faces.iter().enumerate() {
        let uvs = projected[index].as_deref().unwrap_or(&face.uvs);
        match assess(index, &face.positions, uvs, face.image) {
            Assessment::Measured(sample) => samples.push(sample),
            Assessment::Skipped(reason) => skipped.push(FaceSkip { face: index, reason }),
        }
    }

    let density_before = weighted_density(&samples).ok_or(DensityError::NoMeasurableFaces(faces.len()))?;
    let scale = target / density_before;

    let mut untouched = vec![false; faces.len()];
    for skip in skipped.iter().filter(|s| !s.reason.is_scaled()) {
        untouched[skip.face] = true;
    }
    for ((face, projection), untouched) in faces.iter_mut().zip(projected).zip(untouched) {
        if untouched {
            continue;
        }
        if let Some(uvs) = projection {
            face.uvs = uvs;
        }
        for uv in face.uvs.iter_mut() {
            *uv *= scale;
        }
    }

    tracing::debug!(
        faces = faces.len(),
        measured = samples.len(),
        skipped = skipped.len(),
        density_before,
        scale,
        "normalized texel density"
    );

    Ok(DensityReport {
        scale,
        density_before,
        density_after: density_before * scale,
        samples,
        skipped,
    })
}
