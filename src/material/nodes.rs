//! Shading-network shapes the host builds for each material kind.
//!
//! Only the parameters are described here; wiring them into actual nodes
//! is the host's job.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::texture::sky::ImageRegion;

use super::synth::ImageRef;

/// Turbulent UV warp used by liquid surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterWarp {
    pub wave_scale: f64,
    /// Seconds per full cycle.
    pub period: f64,
    pub offset: [f64; 2],
    pub amplitude: f64,
}

impl Default for WaterWarp {
    fn default() -> Self {
        Self {
            wave_scale: PI / 30.0,
            period: 20.0 / 3.0,
            offset: [-0.11, -0.27],
            amplitude: 0.25,
        }
    }
}

/// Time-driven scroll of the two sky layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyScroll {
    /// Seconds per full cycle of the far layer.
    pub period: f64,
    pub far_speed: f64,
    pub near_speed: f64,
    pub vertical_scale: f64,
}

impl Default for SkyScroll {
    fn default() -> Self {
        Self {
            period: 20.0,
            far_speed: 1.0,
            near_speed: 2.0,
            vertical_scale: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layers", rename_all = "snake_case")]
pub enum SkyLayers {
    TwoLayer {
        near: ImageRegion,
        far: ImageRegion,
        scroll: SkyScroll,
    },
    SingleLayer,
}

/// Picks the image of the current frame from the host's time signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSelector {
    pub frames_per_second: f64,
    /// Blend between neighbouring frames instead of stepping.
    pub interpolate: bool,
}

impl Default for FrameSelector {
    fn default() -> Self {
        Self {
            frames_per_second: 5.0,
            interpolate: false,
        }
    }
}

impl FrameSelector {
    /// Frame shown at `time` seconds for a loop of `frame_count` frames.
    pub fn frame_at(&self, time: f64, frame_count: usize) -> usize {
        if frame_count == 0 || !time.is_finite() || time < 0.0 {
            return 0;
        }
        (time * self.frames_per_second).floor() as usize % frame_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceBank {
    pub frames: Vec<ImageRef>,
    /// Glow image per primary frame, `None` where a frame has none.
    pub glow: Vec<Option<ImageRef>>,
    pub alternate_frames: Vec<ImageRef>,
    pub alternate_glow: Vec<Option<ImageRef>>,
    pub selector: FrameSelector,
}

impl SequenceBank {
    pub fn has_glow(&self) -> bool {
        self.glow.iter().chain(self.alternate_glow.iter()).any(Option::is_some)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum NodeLayout {
    Diffuse { emission: Option<ImageRef> },
    Water { warp: Option<WaterWarp> },
    Sky(SkyLayers),
    Sequence(SequenceBank),
}
