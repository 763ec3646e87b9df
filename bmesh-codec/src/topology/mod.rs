//! Half-edge topology model
//!
//! Arena-of-structs: every element lives in a per-kind `Vec` and all cross
//! references are typed ids into those arrays.
//!
//! ```text
//! Face ──loops──▶ Loop ─next/prev─▶ Loop (closed cycle per face)
//!                  │  └─radial_next/prev─▶ Loop (ring per edge)
//!                  ├─vertex─▶ Vertex
//!                  └─edge───▶ Edge ─vertices─▶ [Vertex; 2]
//! ```
//!
//! Snapshots are built in full by [`TopologyBuilder`] and are immutable
//! afterwards.

mod builder;


pub use builder::{TopologyBuilder, TopologyError};

use crate::mesh::{CornerUvLayer, PolygonMesh};
use bmesh_common::Csr;
use glam::{Vec2, Vec3};
use smallvec::SmallVec;
use std::fmt;

// ============================================================================
// Ids
// ============================================================================

macro_rules! element_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

element_id!(
    /// Index into [`TopologySnapshot::vertices`]
    VertexId
);
element_id!(
    /// Index into [`TopologySnapshot::edges`]
    EdgeId
);
element_id!(
    /// Index into [`TopologySnapshot::loops`]
    LoopId
);
element_id!(
    /// Index into [`TopologySnapshot::faces`]
    FaceId
);

// ============================================================================
// Manifold Status
// ============================================================================

/// Edge manifold classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ManifoldStatus {
    /// Shared by exactly two faces
    Manifold,
    /// Shared by zero, one, or more than two faces
    NonManifold,
    /// Classification disabled
    #[default]
    Unknown,
}

impl ManifoldStatus {
    pub const MANIFOLD_FLAG: u8 = 1;
    pub const NON_MANIFOLD_FLAG: u8 = 0;
    pub const UNKNOWN_FLAG: u8 = 255;

    pub const fn from_face_count(faces: usize) -> Self {
        if faces == 2 {
            ManifoldStatus::Manifold
        } else {
            ManifoldStatus::NonManifold
        }
    }

    /// Wire flag (`edges.manifold`)
    pub const fn to_flag(self) -> u8 {
        match self {
            ManifoldStatus::Manifold => Self::MANIFOLD_FLAG,
            ManifoldStatus::NonManifold => Self::NON_MANIFOLD_FLAG,
            ManifoldStatus::Unknown => Self::UNKNOWN_FLAG,
        }
    }

    /// Any flag other than 0 or 1 reads as `Unknown`
    pub const fn from_flag(flag: u8) -> Self {
        match flag {
            Self::MANIFOLD_FLAG => ManifoldStatus::Manifold,
            Self::NON_MANIFOLD_FLAG => ManifoldStatus::NonManifold,
            _ => ManifoldStatus::Unknown,
        }
    }
}

// ============================================================================
// Elements
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub id: VertexId,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub id: EdgeId,
    /// Unordered endpoint pair, always distinct
    pub vertices: [VertexId; 2],
    pub manifold: ManifoldStatus,
}

impl Edge {
    pub fn connects(&self, a: VertexId, b: VertexId) -> bool {
        (self.vertices[0] == a && self.vertices[1] == b)
            || (self.vertices[0] == b && self.vertices[1] == a)
    }

    pub fn other(&self, vertex: VertexId) -> Option<VertexId> {
        if self.vertices[0] == vertex {
            Some(self.vertices[1])
        } else if self.vertices[1] == vertex {
            Some(self.vertices[0])
        } else {
            None
        }
    }
}

/// Directed face corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loop {
    pub id: LoopId,
    pub vertex: VertexId,
    /// Edge from `vertex` to the vertex of `next`
    pub edge: EdgeId,
    pub face: FaceId,
    pub next: LoopId,
    pub prev: LoopId,
    pub radial_next: LoopId,
    pub radial_prev: LoopId,
}

impl Loop {
    /// Serialized order: vertex, edge, face, next, prev, radial_next, radial_prev
    pub fn to_topology_record(&self) -> [u32; 7] {
        [
            self.vertex.0,
            self.edge.0,
            self.face.0,
            self.next.0,
            self.prev.0,
            self.radial_next.0,
            self.radial_prev.0,
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub id: FaceId,
    /// Winding order as authored
    pub vertices: SmallVec<[VertexId; 4]>,
    /// `edges[i]` connects `vertices[i]` and `vertices[i + 1]`
    pub edges: SmallVec<[EdgeId; 4]>,
    pub loops: SmallVec<[LoopId; 4]>,
    pub normal: Vec3,
    pub material_index: u32,
}

impl Face {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Per-loop UV channel, indexed by [`LoopId`]
#[derive(Debug, Clone, PartialEq)]
pub struct UvLayer {
    pub name: String,
    pub uvs: Vec<Vec2>,
}

// ============================================================================
// Snapshot
// ============================================================================

/// Complete, immutable topology of one mesh
#[derive(Debug, Clone, PartialEq)]
pub struct TopologySnapshot {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) loops: Vec<Loop>,
    pub(crate) faces: Vec<Face>,
    pub(crate) uv_layers: Vec<UvLayer>,
    pub(crate) vertex_edges: Csr<EdgeId>,
    pub(crate) edge_faces: Csr<FaceId>,
}

/// Edge classification counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifoldStats {
    pub manifold: usize,
    pub non_manifold: usize,
    pub unknown: usize,
}

impl TopologySnapshot {
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn uv_layers(&self) -> &[UvLayer] {
        &self.uv_layers
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index())
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    pub fn loop_at(&self, id: LoopId) -> Option<&Loop> {
        self.loops.get(id.index())
    }

    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id.index())
    }

    /// Edges incident to a vertex, in edge id order
    pub fn vertex_edges(&self, id: VertexId) -> &[EdgeId] {
        self.vertex_edges.row(id.index()).unwrap_or(&[])
    }

    /// Faces using an edge, in radial ring order
    pub fn edge_faces(&self, id: EdgeId) -> &[FaceId] {
        self.edge_faces.row(id.index()).unwrap_or(&[])
    }

    pub(crate) fn vertex_edge_table(&self) -> &Csr<EdgeId> {
        &self.vertex_edges
    }

    pub(crate) fn edge_face_table(&self) -> &Csr<FaceId> {
        &self.edge_faces
    }

    /// Edges that belong to no face
    pub fn loose_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges
            .iter()
            .filter(|edge| self.edge_faces(edge.id).is_empty())
    }

    /// Walk the radial ring starting at `start` (inclusive)
    pub fn radial_ring(&self, start: LoopId) -> impl Iterator<Item = LoopId> + '_ {
        let limit = self.loops.len();
        let mut current = Some(start);
        let mut steps = 0;
        std::iter::from_fn(move || {
            let id = current?;
            steps += 1;
            let next = self.loop_at(id).map(|l| l.radial_next);
            current = next.filter(|&n| n != start && steps < limit);
            Some(id)
        })
    }

    pub fn manifold_stats(&self) -> ManifoldStats {
        let mut stats = ManifoldStats::default();
        for edge in &self.edges {
            match edge.manifold {
                ManifoldStatus::Manifold => stats.manifold += 1,
                ManifoldStatus::NonManifold => stats.non_manifold += 1,
                ManifoldStatus::Unknown => stats.unknown += 1,
            }
        }
        stats
    }

    /// Check every structural invariant of the snapshot
    pub fn validate(&self) -> Result<(), TopologyError> {
        let vertex_count = self.vertices.len();
        let edge_count = self.edges.len();
        let loop_count = self.loops.len();
        let face_count = self.faces.len();

        for edge in &self.edges {
            for vertex in edge.vertices {
                if vertex.index() >= vertex_count {
                    return Err(TopologyError::UnknownVertex(vertex.0));
                }
            }
            if edge.vertices[0] == edge.vertices[1] {
                return Err(TopologyError::DegenerateEdge(edge.vertices[0].0));
            }
        }

        for l in &self.loops {
            let in_range = l.vertex.index() < vertex_count
                && l.edge.index() < edge_count
                && l.face.index() < face_count
                && [l.next, l.prev, l.radial_next, l.radial_prev]
                    .iter()
                    .all(|id| id.index() < loop_count);
            if !in_range {
                return Err(TopologyError::InvalidReference {
                    kind: "loop",
                    index: l.id.0,
                });
            }
        }

        for face in &self.faces {
            let n = face.len();
            if n < 3 {
                return Err(TopologyError::TooFewVertices(n));
            }
            if face.edges.len() != n || face.loops.len() != n {
                return Err(TopologyError::BrokenLoopCycle { face: face.id.0 });
            }
            for i in 0..n {
                let l = &self.loops[face.loops[i].index()];
                let next = face.loops[(i + 1) % n];
                let prev = face.loops[(i + n - 1) % n];
                if l.face != face.id
                    || l.vertex != face.vertices[i]
                    || l.next != next
                    || l.prev != prev
                {
                    return Err(TopologyError::BrokenLoopCycle { face: face.id.0 });
                }

                let next_vertex = self.loops[next.index()].vertex;
                let edge = &self.edges[l.edge.index()];
                if l.edge != face.edges[i] || !edge.connects(l.vertex, next_vertex) {
                    return Err(TopologyError::LoopEdgeMismatch { loop_id: l.id.0 });
                }
            }
        }

        for l in &self.loops {
            let radial = &self.loops[l.radial_next.index()];
            if radial.radial_prev != l.id || radial.edge != l.edge {
                return Err(TopologyError::BrokenRadialRing { edge: l.edge.0 });
            }
        }

        for layer in &self.uv_layers {
            if layer.uvs.len() != loop_count {
                return Err(TopologyError::InvalidReference {
                    kind: "uv layer",
                    index: layer.uvs.len() as u32,
                });
            }
        }

        Ok(())
    }

    /// Project the snapshot into an owned polygon mesh (faces by vertex index)
    pub fn to_polygon_mesh(&self) -> PolygonMesh {
        let positions = self.vertices.iter().map(|v| v.position).collect();
        let faces = Csr::from_rows(
            self.faces
                .iter()
                .map(|face| face.vertices.iter().map(|v| v.0)),
        );
        let materials = self.faces.iter().map(|f| f.material_index).collect();

        // Corners in face order; loops of a face may not be contiguous
        let uv_layers = self
            .uv_layers
            .iter()
            .map(|layer| CornerUvLayer {
                name: layer.name.clone(),
                uvs: self
                    .faces
                    .iter()
                    .flat_map(|face| face.loops.iter())
                    .map(|l| layer.uvs.get(l.index()).copied().unwrap_or(Vec2::ZERO))
                    .collect(),
            })
            .collect();

        let loose_edges = self
            .loose_edges()
            .map(|edge| [edge.vertices[0].0, edge.vertices[1].0])
            .collect();

        PolygonMesh {
            positions,
            faces,
            materials,
            uv_layers,
            loose_edges,
            normals: self.faces.iter().map(|f| f.normal).collect(),
        }
    }
}
