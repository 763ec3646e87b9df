//! Incremental construction of a [`TopologySnapshot`]

use super::{
    Edge, EdgeId, Face, FaceId, Loop, LoopId, ManifoldStatus, TopologySnapshot, UvLayer, Vertex,
    VertexId,
};
use crate::geometry::polygon_normal;
use bmesh_common::Csr;
use glam::{Vec2, Vec3};
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;
use thiserror::Error;

/// Topology construction or validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("vertex {0} does not exist")]
    UnknownVertex(u32),

    #[error("edge connects vertex {0} to itself")]
    DegenerateEdge(u32),

    #[error("face has {0} vertices, at least 3 are required")]
    TooFewVertices(usize),

    #[error("face uses vertex {0} more than once")]
    RepeatedVertex(u32),

    #[error("a face with the same vertices already exists")]
    DuplicateFace,

    #[error("invalid {kind} reference {index}")]
    InvalidReference { kind: &'static str, index: u32 },

    #[error("loop cycle of face {face} is broken")]
    BrokenLoopCycle { face: u32 },

    #[error("radial ring of edge {edge} is broken")]
    BrokenRadialRing { edge: u32 },

    #[error("loop {loop_id} edge does not connect its vertex to the next loop's vertex")]
    LoopEdgeMismatch { loop_id: u32 },
}

type FaceKey = SmallVec<[u32; 4]>;

/// Builds a snapshot element by element
///
/// Edges are found or created by unordered vertex pair, so faces sharing a
/// boundary share the edge. Radial rings, manifold status, face normals and
/// adjacency tables are computed once in [`TopologyBuilder::build`].
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    edge_lookup: HashMap<(u32, u32), EdgeId>,
    loops: Vec<Loop>,
    faces: Vec<Face>,
    face_lookup: HashSet<FaceKey>,
    uv_layers: Vec<UvLayer>,
    manifold_hints: Vec<Option<ManifoldStatus>>,
    stored_normals: Vec<Option<Vec3>>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, edges: usize, faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            edges: Vec::with_capacity(edges),
            edge_lookup: HashMap::with_capacity(edges),
            faces: Vec::with_capacity(faces),
            face_lookup: HashSet::with_capacity(faces),
            ..Self::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn add_vertex(&mut self, position: Vec3) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Vertex { id, position });
        id
    }

    fn check_vertex(&self, vertex: VertexId) -> Result<(), TopologyError> {
        if vertex.index() < self.vertices.len() {
            Ok(())
        } else {
            Err(TopologyError::UnknownVertex(vertex.0))
        }
    }

    /// Find the edge between `a` and `b`, creating it if needed
    pub fn add_edge(&mut self, a: VertexId, b: VertexId) -> Result<EdgeId, TopologyError> {
        self.check_vertex(a)?;
        self.check_vertex(b)?;
        if a == b {
            return Err(TopologyError::DegenerateEdge(a.0));
        }

        let key = (a.0.min(b.0), a.0.max(b.0));
        if let Some(&id) = self.edge_lookup.get(&key) {
            return Ok(id);
        }

        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge {
            id,
            vertices: [a, b],
            manifold: ManifoldStatus::Unknown,
        });
        self.manifold_hints.push(None);
        self.edge_lookup.insert(key, id);
        Ok(id)
    }

    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.edge_lookup.get(&(a.0.min(b.0), a.0.max(b.0))).copied()
    }

    /// Create a face with one loop per corner
    ///
    /// Nothing is modified when the face is rejected.
    pub fn add_face(
        &mut self,
        vertices: &[VertexId],
        material_index: u32,
    ) -> Result<FaceId, TopologyError> {
        let n = vertices.len();
        if n < 3 {
            return Err(TopologyError::TooFewVertices(n));
        }
        for &vertex in vertices {
            self.check_vertex(vertex)?;
        }

        let mut key: FaceKey = vertices.iter().map(|v| v.0).collect();
        key.sort_unstable();
        if let Some(pair) = key.windows(2).find(|w| w[0] == w[1]) {
            return Err(TopologyError::RepeatedVertex(pair[0]));
        }
        if self.face_lookup.contains(&key) {
            return Err(TopologyError::DuplicateFace);
        }

        let face_id = FaceId(self.faces.len() as u32);
        let base = self.loops.len() as u32;

        let mut edges = SmallVec::with_capacity(n);
        for i in 0..n {
            edges.push(self.add_edge(vertices[i], vertices[(i + 1) % n])?);
        }

        let mut loops = SmallVec::with_capacity(n);
        for i in 0..n {
            let id = LoopId(base + i as u32);
            self.loops.push(Loop {
                id,
                vertex: vertices[i],
                edge: edges[i],
                face: face_id,
                next: LoopId(base + ((i + 1) % n) as u32),
                prev: LoopId(base + ((i + n - 1) % n) as u32),
                radial_next: id,
                radial_prev: id,
            });
            loops.push(id);
        }
        for layer in &mut self.uv_layers {
            layer.uvs.resize(self.loops.len(), Vec2::ZERO);
        }

        self.faces.push(Face {
            id: face_id,
            vertices: vertices.iter().copied().collect(),
            edges,
            loops,
            normal: Vec3::ZERO,
            material_index,
        });
        self.stored_normals.push(None);
        self.face_lookup.insert(key);
        Ok(face_id)
    }

    /// Loop at `corner` of `face` (corner 0 is the face's first vertex)
    pub fn face_loop(&self, face: FaceId, corner: usize) -> Option<LoopId> {
        self.faces.get(face.index())?.loops.get(corner).copied()
    }

    /// Add a UV channel; existing loops get `(0, 0)`
    pub fn add_uv_layer(&mut self, name: impl Into<String>) -> usize {
        self.uv_layers.push(UvLayer {
            name: name.into(),
            uvs: vec![Vec2::ZERO; self.loops.len()],
        });
        self.uv_layers.len() - 1
    }

    pub fn set_loop_uv(&mut self, layer: usize, id: LoopId, uv: Vec2) -> Result<(), TopologyError> {
        let slot = self
            .uv_layers
            .get_mut(layer)
            .ok_or(TopologyError::InvalidReference {
                kind: "uv layer",
                index: layer as u32,
            })?
            .uvs
            .get_mut(id.index())
            .ok_or(TopologyError::InvalidReference {
                kind: "loop",
                index: id.0,
            })?;
        *slot = uv;
        Ok(())
    }

    /// Use `normal` instead of the computed Newell normal
    pub fn set_face_normal(&mut self, face: FaceId, normal: Vec3) -> Result<(), TopologyError> {
        let slot = self
            .stored_normals
            .get_mut(face.index())
            .ok_or(TopologyError::InvalidReference {
                kind: "face",
                index: face.0,
            })?;
        *slot = Some(normal);
        Ok(())
    }

    /// A hint of [`ManifoldStatus::Unknown`] survives `build`; other hints are
    /// recomputed from face counts
    pub fn set_manifold_hint(
        &mut self,
        edge: EdgeId,
        status: ManifoldStatus,
    ) -> Result<(), TopologyError> {
        let slot = self
            .manifold_hints
            .get_mut(edge.index())
            .ok_or(TopologyError::InvalidReference {
                kind: "edge",
                index: edge.0,
            })?;
        *slot = Some(status);
        Ok(())
    }

    /// Finish the snapshot
    ///
    /// With `compute_manifold == false` every edge is `Unknown`.
    pub fn build(mut self, compute_manifold: bool) -> TopologySnapshot {
        // Radial rings: all loops of an edge, in loop id order
        let mut rings: Vec<SmallVec<[LoopId; 2]>> = vec![SmallVec::new(); self.edges.len()];
        for l in &self.loops {
            rings[l.edge.index()].push(l.id);
        }
        for ring in &rings {
            let n = ring.len();
            for (k, id) in ring.iter().enumerate() {
                let l = &mut self.loops[id.index()];
                l.radial_next = ring[(k + 1) % n];
                l.radial_prev = ring[(k + n - 1) % n];
            }
        }

        for (edge, ring) in self.edges.iter_mut().zip(&rings) {
            edge.manifold = match (compute_manifold, self.manifold_hints[edge.id.index()]) {
                (false, _) | (true, Some(ManifoldStatus::Unknown)) => ManifoldStatus::Unknown,
                (true, _) => ManifoldStatus::from_face_count(ring.len()),
            };
        }

        let mut corner_positions: SmallVec<[Vec3; 8]> = SmallVec::new();
        for face in &mut self.faces {
            face.normal = match self.stored_normals[face.id.index()] {
                Some(normal) => normal,
                None => {
                    corner_positions.clear();
                    corner_positions.extend(
                        face.vertices
                            .iter()
                            .map(|v| self.vertices[v.index()].position),
                    );
                    polygon_normal(&corner_positions)
                }
            };
        }

        let mut incident: Vec<SmallVec<[EdgeId; 6]>> =
            vec![SmallVec::new(); self.vertices.len()];
        for edge in &self.edges {
            incident[edge.vertices[0].index()].push(edge.id);
            incident[edge.vertices[1].index()].push(edge.id);
        }
        let loops = &self.loops;
        let edge_faces = Csr::from_rows(
            rings
                .iter()
                .map(|ring| ring.iter().map(|id| loops[id.index()].face)),
        );

        TopologySnapshot {
            vertex_edges: Csr::from_rows(incident),
            edge_faces,
            vertices: self.vertices,
            edges: self.edges,
            loops: self.loops,
            faces: self.faces,
            uv_layers: self.uv_layers,
        }
    }
}
