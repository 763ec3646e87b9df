//! Mesh source / sink interfaces and the owned polygon mesh

use crate::geometry::polygon_normal;
use bmesh_common::Csr;
use glam::{Vec2, Vec3};
use smallvec::SmallVec;
use std::convert::Infallible;

/// Read access to a polygon mesh for encoding
///
/// Vertex and face order are stable: ids assigned by the encoder follow them.
pub trait MeshSource {
    fn vertex_count(&self) -> usize;

    fn position(&self, vertex: usize) -> Vec3;

    fn face_count(&self) -> usize;

    /// Vertex indices of a face in winding order
    fn face_vertices(&self, face: usize) -> &[u32];

    fn face_material(&self, _face: usize) -> u32 {
        0
    }

    fn uv_layer_count(&self) -> usize {
        0
    }

    /// UV of one face corner in a UV layer
    fn corner_uv(&self, _layer: usize, _face: usize, _corner: usize) -> Option<Vec2> {
        None
    }

    /// Edges that belong to no face
    fn loose_edges(&self) -> &[[u32; 2]] {
        &[]
    }
}

/// Write access to a host mesh for decoding
pub trait MeshSink {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Replace vertex, face, UV and loose-edge state in one step
    ///
    /// On error the sink must keep its previous state.
    fn replace(&mut self, mesh: PolygonMesh) -> Result<(), Self::Error>;

    /// Refresh derived state such as normals
    fn recompute_derived(&mut self) -> Result<(), Self::Error>;
}

/// Named UV layer with one entry per face corner (in `PolygonMesh::faces` value order)
#[derive(Debug, Clone, PartialEq)]
pub struct CornerUvLayer {
    pub name: String,
    pub uvs: Vec<Vec2>,
}

/// Owned polygon mesh: positions plus CSR faces
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolygonMesh {
    pub positions: Vec<Vec3>,
    pub faces: Csr<u32>,
    /// Per-face material index
    pub materials: Vec<u32>,
    pub uv_layers: Vec<CornerUvLayer>,
    pub loose_edges: Vec<[u32; 2]>,
    /// Per-face normals, filled by `recompute_derived`
    pub normals: Vec<Vec3>,
}

impl PolygonMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, position: Vec3) -> u32 {
        self.positions.push(position);
        (self.positions.len() - 1) as u32
    }

    /// Append a face; every UV layer gets `(0, 0)` for the new corners
    pub fn add_face(&mut self, vertices: &[u32], material: u32) -> usize {
        self.faces.push_row(vertices.iter().copied());
        self.materials.push(material);
        let corners = self.corner_count();
        for layer in &mut self.uv_layers {
            layer.uvs.resize(corners, Vec2::ZERO);
        }
        self.faces.rows() - 1
    }

    pub fn corner_count(&self) -> usize {
        self.faces.values().len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.faces.is_empty()
    }

    /// Per-face Newell normals
    pub fn compute_face_normals(&self) -> Vec<Vec3> {
        let mut points: SmallVec<[Vec3; 8]> = SmallVec::new();
        self.faces
            .iter()
            .map(|face| {
                points.clear();
                points.extend(face.iter().map(|&v| {
                    self.positions
                        .get(v as usize)
                        .copied()
                        .unwrap_or(Vec3::ZERO)
                }));
                polygon_normal(&points)
            })
            .collect()
    }
}

impl MeshSource for PolygonMesh {
    fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn position(&self, vertex: usize) -> Vec3 {
        self.positions.get(vertex).copied().unwrap_or(Vec3::ZERO)
    }

    fn face_count(&self) -> usize {
        self.faces.rows()
    }

    fn face_vertices(&self, face: usize) -> &[u32] {
        self.faces.row(face).unwrap_or(&[])
    }

    fn face_material(&self, face: usize) -> u32 {
        self.materials.get(face).copied().unwrap_or(0)
    }

    fn uv_layer_count(&self) -> usize {
        self.uv_layers.len()
    }

    fn corner_uv(&self, layer: usize, face: usize, corner: usize) -> Option<Vec2> {
        let start = self.faces.row_start(face)? as usize;
        self.uv_layers.get(layer)?.uvs.get(start + corner).copied()
    }

    fn loose_edges(&self) -> &[[u32; 2]] {
        &self.loose_edges
    }
}

impl MeshSink for PolygonMesh {
    type Error = Infallible;

    fn replace(&mut self, mesh: PolygonMesh) -> Result<(), Self::Error> {
        *self = mesh;
        Ok(())
    }

    fn recompute_derived(&mut self) -> Result<(), Self::Error> {
        self.normals = self.compute_face_normals();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> PolygonMesh {
        let mut mesh = PolygonMesh::new();
        for p in [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y] {
            mesh.add_vertex(p);
        }
        mesh.add_face(&[0, 1, 2, 3], 2);
        mesh
    }

    #[test]
    fn test_polygon_mesh_as_source() {
        let mut mesh = quad();
        mesh.uv_layers.push(CornerUvLayer {
            name: "TEXCOORD_0".to_string(),
            uvs: vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y],
        });

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(MeshSource::face_count(&mesh), 1);
        assert_eq!(mesh.face_vertices(0), &[0, 1, 2, 3]);
        assert_eq!(mesh.face_vertices(1), &[] as &[u32]);
        assert_eq!(mesh.face_material(0), 2);
        assert_eq!(mesh.corner_uv(0, 0, 2), Some(Vec2::ONE));
        assert_eq!(mesh.corner_uv(0, 1, 0), None);
        assert_eq!(mesh.corner_uv(1, 0, 0), None);
    }

    #[test]
    fn test_add_face_pads_uv_layers() {
        let mut mesh = quad();
        mesh.uv_layers.push(CornerUvLayer {
            name: "TEXCOORD_0".to_string(),
            uvs: vec![Vec2::ONE; 4],
        });
        mesh.add_vertex(Vec3::Z);
        mesh.add_face(&[0, 1, 4], 0);
        assert_eq!(mesh.uv_layers[0].uvs.len(), 7);
        assert_eq!(mesh.corner_uv(0, 1, 0), Some(Vec2::ZERO));
    }

    #[test]
    fn test_sink_recompute_normals() {
        let mut mesh = PolygonMesh::new();
        mesh.replace(quad()).unwrap();
        assert!(mesh.normals.is_empty());
        mesh.recompute_derived().unwrap();
        assert_eq!(mesh.normals.len(), 1);
        assert!((mesh.normals[0] - Vec3::Z).length() < 1e-6);
    }
}
