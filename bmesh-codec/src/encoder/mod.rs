//! Mesh source → component set
//!
//! Encoding happens in two passes: the source is walked into a
//! [`TopologySnapshot`] (ids follow source order, derived data is computed by
//! the builder), then the snapshot is packed into attribute buffers.


use crate::mesh::MeshSource;
use crate::topology::{TopologyBuilder, TopologySnapshot, VertexId};
use bmesh_common::{
    Attribute, BufferTarget, ComponentSet, EdgeSection, FaceSection, LOOP_TOPOLOGY_STRIDE,
    LoopSection, VertexSection,
};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Which optional attributes to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Classify edges; when false every edge is written as unknown (255)
    pub preserve_manifold_info: bool,
    /// Vertex→edge and edge→face CSR tables, per-face edge and loop ids
    pub adjacency: bool,
    /// Seven u32 per loop
    pub loop_topology: bool,
    pub face_normals: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            preserve_manifold_info: true,
            adjacency: true,
            loop_topology: true,
            face_normals: true,
        }
    }
}

/// UV layer name for channel `index`
pub fn texcoord_name(index: usize) -> String {
    format!("TEXCOORD_{index}")
}

/// Encode a mesh source
///
/// A source without faces has no topology and yields [`ComponentSet::empty`].
pub fn encode<S: MeshSource + ?Sized>(source: &S, options: &EncodeOptions) -> ComponentSet {
    if source.face_count() == 0 {
        tracing::debug!("Mesh has no faces, emitting empty component set");
        return ComponentSet::empty();
    }
    let snapshot = snapshot_from_source(source, options.preserve_manifold_info);
    encode_snapshot(&snapshot, options)
}

/// Walk a mesh source into a topology snapshot
///
/// Faces the builder rejects (fewer than 3 corners, repeated or unknown
/// vertices, duplicates) are skipped with a warning.
pub fn snapshot_from_source<S: MeshSource + ?Sized>(
    source: &S,
    compute_manifold: bool,
) -> TopologySnapshot {
    let vertex_count = source.vertex_count();
    let face_count = source.face_count();
    let mut builder =
        TopologyBuilder::with_capacity(vertex_count, vertex_count + face_count, face_count);

    for vertex in 0..vertex_count {
        builder.add_vertex(source.position(vertex));
    }

    let layers: Vec<usize> = (0..source.uv_layer_count())
        .map(|layer| builder.add_uv_layer(texcoord_name(layer)))
        .collect();

    let mut corners: SmallVec<[VertexId; 8]> = SmallVec::new();
    for face in 0..face_count {
        corners.clear();
        corners.extend(source.face_vertices(face).iter().map(|&v| VertexId(v)));

        let face_id = match builder.add_face(&corners, source.face_material(face)) {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!("Skipping face {}: {}", face, err);
                continue;
            }
        };

        for (layer, &layer_index) in layers.iter().enumerate() {
            for corner in 0..corners.len() {
                let (Some(uv), Some(loop_id)) = (
                    source.corner_uv(layer, face, corner),
                    builder.face_loop(face_id, corner),
                ) else {
                    continue;
                };
                if let Err(err) = builder.set_loop_uv(layer_index, loop_id, uv) {
                    tracing::warn!("Dropping UV of face {} corner {}: {}", face, corner, err);
                }
            }
        }
    }

    for &[a, b] in source.loose_edges() {
        if let Err(err) = builder.add_edge(VertexId(a), VertexId(b)) {
            tracing::warn!("Skipping loose edge ({}, {}): {}", a, b, err);
        }
    }

    builder.build(compute_manifold)
}

/// Pack a snapshot into attribute buffers
pub fn encode_snapshot(snapshot: &TopologySnapshot, options: &EncodeOptions) -> ComponentSet {
    let vertices = encode_vertices(snapshot, options);
    let edges = encode_edges(snapshot, options);
    let loops = encode_loops(snapshot, options);
    let faces = encode_faces(snapshot, options);

    tracing::debug!(
        "Encoded {} vertices, {} edges, {} loops, {} faces",
        vertices.count,
        edges.count,
        loops.count,
        faces.count
    );

    ComponentSet {
        vertices: Some(vertices),
        edges: Some(edges),
        loops: Some(loops),
        faces: Some(faces),
    }
}

fn u32_attribute(values: &[u32]) -> Attribute {
    Attribute::from_elements(values, BufferTarget::ArrayBuffer)
}

fn encode_vertices(
    snapshot: &TopologySnapshot,
    options: &EncodeOptions,
) -> VertexSection<Attribute> {
    let positions: Vec<[f32; 3]> = snapshot
        .vertices()
        .iter()
        .map(|v| v.position.to_array())
        .collect();

    let (edges, edge_offsets) = if options.adjacency {
        let table = snapshot.vertex_edge_table();
        let values: Vec<u32> = table.values().iter().map(|e| e.0).collect();
        (
            Some(u32_attribute(&values)),
            Some(u32_attribute(table.offsets())),
        )
    } else {
        (None, None)
    };

    VertexSection {
        count: positions.len() as u32,
        positions: Attribute::from_elements(&positions, BufferTarget::ArrayBuffer),
        edges,
        edge_offsets,
    }
}

fn encode_edges(snapshot: &TopologySnapshot, options: &EncodeOptions) -> EdgeSection<Attribute> {
    let edges = snapshot.edges();
    let pairs: Vec<[u32; 2]> = edges
        .iter()
        .map(|e| [e.vertices[0].0, e.vertices[1].0])
        .collect();
    let manifold: Vec<u8> = edges.iter().map(|e| e.manifold.to_flag()).collect();

    let (faces, face_offsets) = if options.adjacency {
        let table = snapshot.edge_face_table();
        let values: Vec<u32> = table.values().iter().map(|f| f.0).collect();
        (
            Some(u32_attribute(&values)),
            Some(u32_attribute(table.offsets())),
        )
    } else {
        (None, None)
    };

    EdgeSection {
        count: pairs.len() as u32,
        vertices: Attribute::from_elements(&pairs, BufferTarget::ElementArrayBuffer),
        faces,
        face_offsets,
        manifold: Some(Attribute::from_elements(&manifold, BufferTarget::ArrayBuffer)),
    }
}

fn encode_loops(snapshot: &TopologySnapshot, options: &EncodeOptions) -> LoopSection<Attribute> {
    let loops = snapshot.loops();

    let topology = options.loop_topology.then(|| {
        let mut values = Vec::with_capacity(loops.len() * LOOP_TOPOLOGY_STRIDE);
        for l in loops {
            values.extend_from_slice(&l.to_topology_record());
        }
        u32_attribute(&values)
    });

    let attributes: BTreeMap<String, Attribute> = snapshot
        .uv_layers()
        .iter()
        .map(|layer| {
            let uvs: Vec<[f32; 2]> = layer.uvs.iter().map(|uv| uv.to_array()).collect();
            (
                layer.name.clone(),
                Attribute::from_elements(&uvs, BufferTarget::ArrayBuffer),
            )
        })
        .collect();

    LoopSection {
        count: loops.len() as u32,
        topology,
        attributes,
    }
}

fn encode_faces(snapshot: &TopologySnapshot, options: &EncodeOptions) -> FaceSection<Attribute> {
    let faces = snapshot.faces();
    let corner_total: usize = faces.iter().map(|f| f.len()).sum();

    let mut offsets = Vec::with_capacity(faces.len() + 1);
    let mut vertices = Vec::with_capacity(corner_total);
    let mut edges = Vec::with_capacity(corner_total);
    let mut loops = Vec::with_capacity(corner_total);
    offsets.push(0u32);
    for face in faces {
        vertices.extend(face.vertices.iter().map(|v| v.0));
        edges.extend(face.edges.iter().map(|e| e.0));
        loops.extend(face.loops.iter().map(|l| l.0));
        offsets.push(vertices.len() as u32);
    }

    let normals = options.face_normals.then(|| {
        let normals: Vec<[f32; 3]> = faces.iter().map(|f| f.normal.to_array()).collect();
        Attribute::from_elements(&normals, BufferTarget::ArrayBuffer)
    });
    let materials: Vec<u32> = faces.iter().map(|f| f.material_index).collect();

    FaceSection {
        count: faces.len() as u32,
        vertices: Attribute::from_elements(&vertices, BufferTarget::ElementArrayBuffer),
        offsets: u32_attribute(&offsets),
        edges: options.adjacency.then(|| u32_attribute(&edges)),
        loops: options.adjacency.then(|| u32_attribute(&loops)),
        normals,
        materials: Some(u32_attribute(&materials)),
    }
}
