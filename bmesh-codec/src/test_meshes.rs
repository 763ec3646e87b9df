//! Shared mesh fixtures for unit tests

use crate::mesh::{CornerUvLayer, PolygonMesh};
use glam::{Vec2, Vec3};

/// Unit cube: 8 vertices, 6 outward-wound quads
pub fn cube() -> PolygonMesh {
    let mut mesh = PolygonMesh::new();
    for p in [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ] {
        mesh.add_vertex(Vec3::from_array(p));
    }
    for face in [
        [0, 3, 2, 1], // -Z
        [4, 5, 6, 7], // +Z
        [0, 1, 5, 4], // -Y
        [2, 3, 7, 6], // +Y
        [0, 4, 7, 3], // -X
        [1, 2, 6, 5], // +X
    ] {
        mesh.add_face(&face, 0);
    }
    mesh
}

/// Single triangle
pub fn triangle() -> PolygonMesh {
    let mut mesh = PolygonMesh::new();
    mesh.add_vertex(Vec3::ZERO);
    mesh.add_vertex(Vec3::X);
    mesh.add_vertex(Vec3::Y);
    mesh.add_face(&[0, 1, 2], 0);
    mesh
}

/// Regular hexagon (one n-gon) beside a triangle, with a UV layer
pub fn hexagon_with_uvs() -> PolygonMesh {
    let mut mesh = PolygonMesh::new();
    for i in 0..6 {
        let angle = i as f32 * std::f32::consts::TAU / 6.0;
        mesh.add_vertex(Vec3::new(angle.cos(), angle.sin(), 0.0));
    }
    mesh.add_vertex(Vec3::new(3.0, 0.0, 0.0));
    mesh.uv_layers.push(CornerUvLayer {
        name: "TEXCOORD_0".to_string(),
        uvs: Vec::new(),
    });
    mesh.add_face(&[0, 1, 2, 3, 4, 5], 1);
    mesh.add_face(&[0, 6, 1], 2);

    let uvs = &mut mesh.uv_layers[0].uvs;
    for (corner, uv) in uvs.iter_mut().enumerate() {
        *uv = Vec2::new(corner as f32 * 0.1, 1.0 - corner as f32 * 0.1);
    }
    mesh
}
