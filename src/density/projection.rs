//! Box-style UV projection at one UV unit per world unit.

use cgmath::{InnerSpace, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::math::newell_normal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CubeAxis {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl CubeAxis {
    /// Tie-break order: earlier axes win equal dot products.
    pub const ORDER: [CubeAxis; 6] = [
        CubeAxis::PosX,
        CubeAxis::NegX,
        CubeAxis::PosY,
        CubeAxis::NegY,
        CubeAxis::PosZ,
        CubeAxis::NegZ,
    ];

    pub fn direction(self) -> Vector3<f64> {
        match self {
            CubeAxis::PosX => Vector3::unit_x(),
            CubeAxis::NegX => -Vector3::unit_x(),
            CubeAxis::PosY => Vector3::unit_y(),
            CubeAxis::NegY => -Vector3::unit_y(),
            CubeAxis::PosZ => Vector3::unit_z(),
            CubeAxis::NegZ => -Vector3::unit_z(),
        }
    }

    /// UV of `p` on this side of the cube. `u` flips on -X, +Y and -Z so the
    /// image reads the right way round from outside.
    pub fn project(self, p: Vector3<f64>) -> Vector2<f64> {
        match self {
            CubeAxis::PosX => Vector2::new(p.y, p.z),
            CubeAxis::NegX => Vector2::new(-p.y, p.z),
            CubeAxis::PosY => Vector2::new(-p.x, p.z),
            CubeAxis::NegY => Vector2::new(p.x, p.z),
            CubeAxis::PosZ => Vector2::new(p.x, p.y),
            CubeAxis::NegZ => Vector2::new(-p.x, p.y),
        }
    }
}

/// Axis whose direction best matches `normal`.
pub fn dominant_axis(normal: Vector3<f64>) -> CubeAxis {
    let mut best = CubeAxis::ORDER[0];
    let mut best_dot = normal.dot(best.direction());
    for axis in &CubeAxis::ORDER[1..] {
        let dot = normal.dot(axis.direction());
        if dot > best_dot {
            best = *axis;
            best_dot = dot;
        }
    }
    best
}

/// Project a polygon onto the cube side facing its normal.
pub fn cube_project(positions: &[Vector3<f64>]) -> (CubeAxis, Vec<Vector2<f64>>) {
    let axis = dominant_axis(newell_normal(positions));
    (axis, positions.iter().map(|&p| axis.project(p)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_largest_dot() {
        assert_eq!(dominant_axis(Vector3::new(0.1, -0.9, 0.2)), CubeAxis::NegY);
        assert_eq!(dominant_axis(Vector3::new(0.0, 0.0, -3.0)), CubeAxis::NegZ);
    }

    #[test]
    fn ties_follow_axis_order() {
        assert_eq!(dominant_axis(Vector3::new(1.0, 1.0, 1.0)), CubeAxis::PosX);
        assert_eq!(dominant_axis(Vector3::new(-1.0, -1.0, 0.0)), CubeAxis::NegX);
        assert_eq!(dominant_axis(Vector3::new(0.0, 1.0, 1.0)), CubeAxis::PosY);
        assert_eq!(dominant_axis(Vector3::new(0.0, 0.0, 0.0)), CubeAxis::PosX);
    }

    #[test]
    fn floor_projects_to_xy() {
        let floor = [
            Vector3::new(0.0, 0.0, 5.0),
            Vector3::new(2.0, 0.0, 5.0),
            Vector3::new(2.0, 3.0, 5.0),
        ];
        let (axis, uvs) = cube_project(&floor);
        assert_eq!(axis, CubeAxis::PosZ);
        assert_eq!(uvs[2], Vector2::new(2.0, 3.0));
    }

    #[test]
    fn mirrored_sides_flip_u() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(CubeAxis::PosX.project(p), Vector2::new(2.0, 3.0));
        assert_eq!(CubeAxis::NegX.project(p), Vector2::new(-2.0, 3.0));
        assert_eq!(CubeAxis::PosY.project(p), Vector2::new(-1.0, 3.0));
        assert_eq!(CubeAxis::NegY.project(p), Vector2::new(1.0, 3.0));
        assert_eq!(CubeAxis::NegZ.project(p), Vector2::new(-1.0, 2.0));
    }
}
