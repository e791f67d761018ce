use cgmath::{InnerSpace, Vector2, Vector3, Zero};

/// Unnormalized polygon normal by Newell's method; its length is twice the
/// polygon's area. Works for non-planar and concave polygons.
pub fn newell_normal(positions: &[Vector3<f64>]) -> Vector3<f64> {
    let n = positions.len();
    let mut normal = Vector3::zero();
    for i in 0..n {
        let current = positions[i];
        let next = positions[(i + 1) % n];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}

/// World-space area of a polygon. Zero below three vertices.
pub fn polygon_area_3d(positions: &[Vector3<f64>]) -> f64 {
    if positions.len() < 3 {
        return 0.0;
    }
    newell_normal(positions).magnitude() * 0.5
}

/// Unsigned area of a polygon in UV space (shoelace formula).
pub fn polygon_area_2d(points: &[Vector2<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice.abs() * 0.5
}
