//! Component set sections
//!
//! # Wire shape
//! ```text
//! vertices: { count, positions: VEC3 f32, edges?: u32, edgeOffsets?: u32 (count+1) }
//! edges:    { count, vertices: VEC2 u32, faces?: u32, faceOffsets?: u32 (count+1),
//!             manifold?: u8 (1 = manifold, 0 = non-manifold, 255 = unknown) }
//! loops:    { count, topology?: u32 (count*7), attributes?: { "TEXCOORD_0": VEC2 f32, ... } }
//! faces:    { count, vertices: u32 (variable), offsets: u32 (count+1),
//!             edges?: u32, loops?: u32, normals?: VEC3 f32, materials?: u32 }
//! ```
//!
//! `faces.vertices`, `faces.edges` and `faces.loops` share `faces.offsets`:
//! a face has as many edges and loops as it has corners.

use super::attribute::{Attribute, AttributeRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const VERTICES: &str = "vertices";
pub const EDGES: &str = "edges";
pub const LOOPS: &str = "loops";
pub const FACES: &str = "faces";

/// u32 values per loop in `loops.topology`:
/// vertex, edge, face, next, prev, radial_next, radial_prev
pub const LOOP_TOPOLOGY_STRIDE: usize = 7;

/// The four topology sections, generic over the attribute representation
///
/// - `ComponentSet<Attribute>`: in-memory buffers (encoder output)
/// - `ComponentSet<AttributeRef>`: serialized record ([`ComponentRecord`])
///
/// Sections are optional so that a record missing one can still be parsed
/// and rejected with a precise error by the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSet<A = Attribute> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertices: Option<VertexSection<A>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges: Option<EdgeSection<A>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loops: Option<LoopSection<A>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faces: Option<FaceSection<A>>,
}

impl<A> Default for ComponentSet<A> {
    fn default() -> Self {
        Self {
            vertices: None,
            edges: None,
            loops: None,
            faces: None,
        }
    }
}

/// Component set after buffer-store handle assignment
pub type ComponentRecord = ComponentSet<AttributeRef>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexSection<A> {
    pub count: u32,
    pub positions: A,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges: Option<A>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_offsets: Option<A>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSection<A> {
    pub count: u32,
    pub vertices: A,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faces: Option<A>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_offsets: Option<A>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifold: Option<A>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopSection<A> {
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topology: Option<A>,
    /// Per-loop attributes keyed by glTF semantic (`TEXCOORD_n`)
    #[serde(default = "BTreeMap::new", skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, A>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceSection<A> {
    pub count: u32,
    pub vertices: A,
    pub offsets: A,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges: Option<A>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loops: Option<A>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normals: Option<A>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials: Option<A>,
}

impl ComponentSet<Attribute> {
    /// Component set of a mesh with no topology: all four sections with count 0
    pub fn empty() -> Self {
        let empty_u32 = || Attribute::from_elements::<u32>(&[], Default::default());
        Self {
            vertices: Some(VertexSection {
                count: 0,
                positions: Attribute::from_elements::<[f32; 3]>(&[], Default::default()),
                edges: None,
                edge_offsets: None,
            }),
            edges: Some(EdgeSection {
                count: 0,
                vertices: Attribute::from_elements::<[u32; 2]>(&[], Default::default()),
                faces: None,
                face_offsets: None,
                manifold: None,
            }),
            loops: Some(LoopSection {
                count: 0,
                topology: None,
                attributes: BTreeMap::new(),
            }),
            faces: Some(FaceSection {
                count: 0,
                vertices: empty_u32(),
                offsets: Attribute::from_elements::<u32>(&[0], Default::default()),
                edges: None,
                loops: None,
                normals: None,
                materials: None,
            }),
        }
    }

    /// Total bytes across every attribute buffer
    pub fn byte_size(&self) -> usize {
        let mut total = 0;
        let _ = self.try_map(|_, _, attribute| {
            total += attribute.data.len();
            Ok::<(), std::convert::Infallible>(())
        });
        total
    }
}

impl<A> ComponentSet<A> {
    /// Declared element counts `(vertices, edges, loops, faces)`; absent sections count 0
    pub fn counts(&self) -> (u32, u32, u32, u32) {
        (
            self.vertices.as_ref().map_or(0, |s| s.count),
            self.edges.as_ref().map_or(0, |s| s.count),
            self.loops.as_ref().map_or(0, |s| s.count),
            self.faces.as_ref().map_or(0, |s| s.count),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.counts() == (0, 0, 0, 0)
    }

    /// Convert every attribute, keeping the section structure
    ///
    /// `f` receives the section name, the attribute name and the attribute.
    /// The first error aborts the conversion.
    pub fn try_map<B, E, F>(&self, mut f: F) -> Result<ComponentSet<B>, E>
    where
        F: FnMut(&'static str, &str, &A) -> Result<B, E>,
    {
        Ok(ComponentSet {
            vertices: self
                .vertices
                .as_ref()
                .map(|s| s.try_map(&mut f))
                .transpose()?,
            edges: self.edges.as_ref().map(|s| s.try_map(&mut f)).transpose()?,
            loops: self.loops.as_ref().map(|s| s.try_map(&mut f)).transpose()?,
            faces: self.faces.as_ref().map(|s| s.try_map(&mut f)).transpose()?,
        })
    }
}

/// Apply `f` to an optional attribute
fn map_optional<A, B, E, F>(
    section: &'static str,
    name: &str,
    attribute: &Option<A>,
    f: &mut F,
) -> Result<Option<B>, E>
where
    F: FnMut(&'static str, &str, &A) -> Result<B, E>,
{
    attribute.as_ref().map(|a| f(section, name, a)).transpose()
}

impl<A> VertexSection<A> {
    fn try_map<B, E, F>(&self, f: &mut F) -> Result<VertexSection<B>, E>
    where
        F: FnMut(&'static str, &str, &A) -> Result<B, E>,
    {
        Ok(VertexSection {
            count: self.count,
            positions: f(VERTICES, "positions", &self.positions)?,
            edges: map_optional(VERTICES, "edges", &self.edges, f)?,
            edge_offsets: map_optional(VERTICES, "edgeOffsets", &self.edge_offsets, f)?,
        })
    }
}

impl<A> EdgeSection<A> {
    fn try_map<B, E, F>(&self, f: &mut F) -> Result<EdgeSection<B>, E>
    where
        F: FnMut(&'static str, &str, &A) -> Result<B, E>,
    {
        Ok(EdgeSection {
            count: self.count,
            vertices: f(EDGES, "vertices", &self.vertices)?,
            faces: map_optional(EDGES, "faces", &self.faces, f)?,
            face_offsets: map_optional(EDGES, "faceOffsets", &self.face_offsets, f)?,
            manifold: map_optional(EDGES, "manifold", &self.manifold, f)?,
        })
    }
}

impl<A> LoopSection<A> {
    fn try_map<B, E, F>(&self, f: &mut F) -> Result<LoopSection<B>, E>
    where
        F: FnMut(&'static str, &str, &A) -> Result<B, E>,
    {
        let mut attributes = BTreeMap::new();
        for (name, attribute) in &self.attributes {
            attributes.insert(name.clone(), f(LOOPS, name, attribute)?);
        }
        Ok(LoopSection {
            count: self.count,
            topology: map_optional(LOOPS, "topology", &self.topology, f)?,
            attributes,
        })
    }
}

impl<A> FaceSection<A> {
    fn try_map<B, E, F>(&self, f: &mut F) -> Result<FaceSection<B>, E>
    where
        F: FnMut(&'static str, &str, &A) -> Result<B, E>,
    {
        Ok(FaceSection {
            count: self.count,
            vertices: f(FACES, "vertices", &self.vertices)?,
            offsets: f(FACES, "offsets", &self.offsets)?,
            edges: map_optional(FACES, "edges", &self.edges, f)?,
            loops: map_optional(FACES, "loops", &self.loops, f)?,
            normals: map_optional(FACES, "normals", &self.normals, f)?,
            materials: map_optional(FACES, "materials", &self.materials, f)?,
        })
    }
}
