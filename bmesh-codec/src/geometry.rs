//! Small polygon geometry helpers

use glam::Vec3;

/// Two points closer than this (squared length) are treated as coincident
pub const COINCIDENT_EPSILON_SQ: f32 = 1e-8;

/// Triangles with a smaller area are degenerate
pub const MIN_TRIANGLE_AREA: f32 = 1e-8;

/// Unit polygon normal by Newell's method (zero for degenerate polygons)
pub fn polygon_normal(points: &[Vec3]) -> Vec3 {
    let mut normal = Vec3::ZERO;
    for (i, current) in points.iter().enumerate() {
        let next = points[(i + 1) % points.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal.normalize_or_zero()
}

pub fn triangle_area(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    0.5 * (b - a).cross(c - a).length()
}

#[inline]
pub fn coincident(a: Vec3, b: Vec3) -> bool {
    a.distance_squared(b) <= COINCIDENT_EPSILON_SQ
}

/// No coincident corners and area at or above [`MIN_TRIANGLE_AREA`]
pub fn is_valid_triangle(a: Vec3, b: Vec3, c: Vec3) -> bool {
    !coincident(a, b)
        && !coincident(b, c)
        && !coincident(a, c)
        && triangle_area(a, b, c) >= MIN_TRIANGLE_AREA
}

pub fn centroid(points: &[Vec3]) -> Vec3 {
    if points.is_empty() {
        return Vec3::ZERO;
    }
    points.iter().copied().sum::<Vec3>() / points.len() as f32
}
