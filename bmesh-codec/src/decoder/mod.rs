//! Component set → topology snapshot → mesh sink
//!
//! Decoding is split into two phases:
//! 1. Every attribute is unpacked and checked against its declared layout
//!    and its section's count. Any mismatch aborts with a [`CodecError`]
//!    before a single element is created.
//! 2. The snapshot is rebuilt from positions, edge pairs and face corners.
//!    Bad edges and faces are skipped and reported as [`DecodeWarning`]s.

#[cfg(test)]
mod tests;

use crate::error::{ApplyError, CodecError, DecodeWarning};
use crate::mesh::MeshSink;
use crate::store::{BufferResolver, resolve_components};
use crate::topology::{ManifoldStatus, TopologyBuilder, TopologyError, TopologySnapshot, VertexId};
use bmesh_common::{
    Attribute, ComponentRecord, ComponentSet, Csr, EDGES, Element, FACES, LOOP_TOPOLOGY_STRIDE,
    LOOPS, VERTICES,
};
use glam::{Vec2, Vec3};
use smallvec::SmallVec;

/// Rebuilt topology plus the elements that had to be skipped
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutput {
    pub snapshot: TopologySnapshot,
    pub warnings: Vec<DecodeWarning>,
}

/// Fail with `MissingSection` unless all four sections are present
fn require_sections<A>(set: &ComponentSet<A>) -> Result<(), CodecError> {
    if set.vertices.is_none() {
        return Err(CodecError::MissingSection(VERTICES));
    }
    if set.edges.is_none() {
        return Err(CodecError::MissingSection(EDGES));
    }
    if set.loops.is_none() {
        return Err(CodecError::MissingSection(LOOPS));
    }
    if set.faces.is_none() {
        return Err(CodecError::MissingSection(FACES));
    }
    Ok(())
}

/// Resolve a serialized record through `resolver` and decode it
pub fn decode_record<R>(
    record: &ComponentRecord,
    resolver: &R,
) -> Result<Option<DecodeOutput>, CodecError>
where
    R: BufferResolver + ?Sized,
{
    require_sections(record)?;
    let set = resolve_components(record, resolver)?;
    decode(&set)
}

// ============================================================================
// Unpacking
// ============================================================================

fn read<E: Element>(
    section: &'static str,
    name: &str,
    attribute: &Attribute,
) -> Result<Vec<E>, CodecError> {
    attribute
        .read::<E>()
        .map_err(|err| CodecError::packing(section, name, err))
}

/// Read an attribute that must hold exactly `expected` elements
///
/// A byte length that disagrees with `expected` is a `MalformedBuffer`, the
/// same as one that disagrees with the attribute's own count.
fn read_exact<E: Element>(
    section: &'static str,
    name: &str,
    attribute: &Attribute,
    expected: usize,
) -> Result<Vec<E>, CodecError> {
    let values = read::<E>(section, name, attribute)?;
    if values.len() != expected {
        return Err(CodecError::section_length::<E>(
            section,
            name,
            expected,
            attribute.data.len(),
        ));
    }
    Ok(values)
}

fn read_optional<E: Element>(
    section: &'static str,
    name: &str,
    attribute: Option<&Attribute>,
    expected: usize,
) -> Result<Option<Vec<E>>, CodecError> {
    attribute
        .map(|a| read_exact::<E>(section, name, a, expected))
        .transpose()
}

/// Read and validate an optional offsets/values CSR pair with `rows` rows
fn read_csr(
    section: &'static str,
    values_name: &str,
    values: Option<&Attribute>,
    offsets_name: &str,
    offsets: Option<&Attribute>,
    rows: usize,
) -> Result<Option<Csr<u32>>, CodecError> {
    let (Some(values), Some(offsets)) = (values, offsets) else {
        return Ok(None);
    };
    let offsets = read_exact::<u32>(section, offsets_name, offsets, rows + 1)?;
    let values = read::<u32>(section, values_name, values)?;
    Csr::from_parts(offsets, values)
        .map(Some)
        .map_err(|source| CodecError::MalformedOffsets {
            section,
            attribute: offsets_name.to_string(),
            source,
        })
}

/// Everything the rebuild phase needs, fully validated
struct Unpacked {
    positions: Vec<[f32; 3]>,
    edge_pairs: Vec<[u32; 2]>,
    manifold: Option<Vec<u8>>,
    loop_count: usize,
    topology: Option<Vec<u32>>,
    uv_layers: Vec<(String, Vec<[f32; 2]>)>,
    faces: Csr<u32>,
    normals: Option<Vec<[f32; 3]>>,
    materials: Option<Vec<u32>>,
}

fn unpack(set: &ComponentSet) -> Result<Unpacked, CodecError> {
    let vertices = set.vertices.as_ref().ok_or(CodecError::MissingSection(VERTICES))?;
    let edges = set.edges.as_ref().ok_or(CodecError::MissingSection(EDGES))?;
    let loops = set.loops.as_ref().ok_or(CodecError::MissingSection(LOOPS))?;
    let faces = set.faces.as_ref().ok_or(CodecError::MissingSection(FACES))?;

    let vertex_count = vertices.count as usize;
    let edge_count = edges.count as usize;
    let loop_count = loops.count as usize;
    let face_count = faces.count as usize;

    let positions =
        read_exact::<[f32; 3]>(VERTICES, "positions", &vertices.positions, vertex_count)?;
    read_csr(
        VERTICES,
        "edges",
        vertices.edges.as_ref(),
        "edgeOffsets",
        vertices.edge_offsets.as_ref(),
        vertex_count,
    )?;

    let edge_pairs = read_exact::<[u32; 2]>(EDGES, "vertices", &edges.vertices, edge_count)?;
    let manifold = read_optional::<u8>(EDGES, "manifold", edges.manifold.as_ref(), edge_count)?;
    read_csr(
        EDGES,
        "faces",
        edges.faces.as_ref(),
        "faceOffsets",
        edges.face_offsets.as_ref(),
        edge_count,
    )?;

    let topology = read_optional::<u32>(
        LOOPS,
        "topology",
        loops.topology.as_ref(),
        loop_count * LOOP_TOPOLOGY_STRIDE,
    )?;
    let mut uv_layers = Vec::with_capacity(loops.attributes.len());
    for (name, attribute) in &loops.attributes {
        uv_layers.push((
            name.clone(),
            read_exact::<[f32; 2]>(LOOPS, name, attribute, loop_count)?,
        ));
    }

    let offsets = read_exact::<u32>(FACES, "offsets", &faces.offsets, face_count + 1)?;
    let corners = read::<u32>(FACES, "vertices", &faces.vertices)?;
    let corner_count = corners.len();
    let face_csr =
        Csr::from_parts(offsets, corners).map_err(|source| CodecError::MalformedOffsets {
            section: FACES,
            attribute: "offsets".to_string(),
            source,
        })?;
    read_optional::<u32>(FACES, "edges", faces.edges.as_ref(), corner_count)?;
    read_optional::<u32>(FACES, "loops", faces.loops.as_ref(), corner_count)?;
    let normals = read_optional::<[f32; 3]>(FACES, "normals", faces.normals.as_ref(), face_count)?;
    let materials = read_optional::<u32>(FACES, "materials", faces.materials.as_ref(), face_count)?;

    Ok(Unpacked {
        positions,
        edge_pairs,
        manifold,
        loop_count,
        topology,
        uv_layers,
        faces: face_csr,
        normals,
        materials,
    })
}

// ============================================================================
// Rebuild
// ============================================================================

/// Decode a component set into a topology snapshot
///
/// Returns `Ok(None)` when the set holds no vertices (nothing to apply).
pub fn decode(set: &ComponentSet) -> Result<Option<DecodeOutput>, CodecError> {
    let data = unpack(set)?;
    if data.positions.is_empty() {
        tracing::debug!("Component set has no vertices, nothing to decode");
        return Ok(None);
    }

    let vertex_count = data.positions.len();
    let mut warnings = Vec::new();
    let mut builder =
        TopologyBuilder::with_capacity(vertex_count, data.edge_pairs.len(), data.faces.rows());

    for position in &data.positions {
        builder.add_vertex(Vec3::from_array(*position));
    }

    for (index, &[a, b]) in data.edge_pairs.iter().enumerate() {
        let edge = match builder.add_edge(VertexId(a), VertexId(b)) {
            Ok(edge) => edge,
            Err(_) => {
                warnings.push(DecodeWarning::EdgeSkipped {
                    edge: index as u32,
                    vertices: [a, b],
                });
                continue;
            }
        };
        let unknown = data
            .manifold
            .as_ref()
            .and_then(|flags| flags.get(index))
            .is_some_and(|&flag| ManifoldStatus::from_flag(flag) == ManifoldStatus::Unknown);
        if unknown {
            // Edge was just created or found, so the id is valid
            let _ = builder.set_manifold_hint(edge, ManifoldStatus::Unknown);
        }
    }

    let layers: Vec<usize> = data
        .uv_layers
        .iter()
        .map(|(name, _)| builder.add_uv_layer(name.clone()))
        .collect();

    // (corner index in the encoded face, resolved vertex)
    let mut resolved: SmallVec<[(usize, VertexId); 8]> = SmallVec::new();
    let mut corners: SmallVec<[VertexId; 8]> = SmallVec::new();
    for (face_index, row) in data.faces.iter().enumerate() {
        let face = face_index as u32;
        resolved.clear();
        for (corner, &vertex) in row.iter().enumerate() {
            if (vertex as usize) < vertex_count {
                resolved.push((corner, VertexId(vertex)));
            } else {
                warnings.push(DecodeWarning::FaceVertexUnresolved {
                    face,
                    corner: corner as u32,
                    vertex,
                });
            }
        }
        if resolved.len() < 3 {
            warnings.push(DecodeWarning::FaceSkipped {
                face,
                reason: TopologyError::TooFewVertices(resolved.len()),
            });
            continue;
        }

        corners.clear();
        corners.extend(resolved.iter().map(|&(_, v)| v));
        let material = data
            .materials
            .as_ref()
            .and_then(|m| m.get(face_index).copied())
            .unwrap_or(0);
        let face_id = match builder.add_face(&corners, material) {
            Ok(id) => id,
            Err(reason) => {
                warnings.push(DecodeWarning::FaceSkipped { face, reason });
                continue;
            }
        };

        // UV of encoded corner `c` sits at offsets[face] + c
        let start = data.faces.row_start(face_index).unwrap_or(0) as usize;
        for ((_, uvs), &layer) in data.uv_layers.iter().zip(&layers) {
            for (local, &(corner, _)) in resolved.iter().enumerate() {
                let (Some(uv), Some(loop_id)) =
                    (uvs.get(start + corner), builder.face_loop(face_id, local))
                else {
                    continue;
                };
                let _ = builder.set_loop_uv(layer, loop_id, Vec2::from_array(*uv));
            }
        }

        if let Some(normal) = data
            .normals
            .as_ref()
            .and_then(|n| n.get(face_index))
            .map(|n| Vec3::from_array(*n).normalize_or_zero())
            .filter(|n| *n != Vec3::ZERO)
        {
            let _ = builder.set_face_normal(face_id, normal);
        }
    }

    let snapshot = builder.build(true);
    if let Some(warning) = check_loop_topology(&data, &snapshot) {
        warnings.push(warning);
    }

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }
    tracing::debug!(
        "Decoded {} vertices, {} edges, {} loops, {} faces ({} warnings)",
        snapshot.vertices().len(),
        snapshot.edges().len(),
        snapshot.loops().len(),
        snapshot.faces().len(),
        warnings.len()
    );

    Ok(Some(DecodeOutput { snapshot, warnings }))
}

/// Compare stored loop topology with the rebuilt loops (count and vertices)
fn check_loop_topology(data: &Unpacked, snapshot: &TopologySnapshot) -> Option<DecodeWarning> {
    let stored = data.topology.as_ref()?;
    let rebuilt = snapshot.loops();
    let mismatch = data.loop_count != rebuilt.len()
        || stored
            .chunks_exact(LOOP_TOPOLOGY_STRIDE)
            .zip(rebuilt)
            .any(|(record, l)| record[0] != l.vertex.0);
    mismatch.then_some(DecodeWarning::LoopTopologyMismatch {
        stored: data.loop_count as u32,
        rebuilt: rebuilt.len() as u32,
    })
}

// ============================================================================
// Apply
// ============================================================================

/// Push a snapshot into a mesh sink
///
/// The snapshot is validated and fully converted before the sink is touched;
/// the sink then receives a single `replace` followed by `recompute_derived`.
pub fn apply<S: MeshSink + ?Sized>(
    snapshot: &TopologySnapshot,
    sink: &mut S,
) -> Result<(), ApplyError> {
    snapshot.validate()?;
    let mesh = snapshot.to_polygon_mesh();
    sink.replace(mesh).map_err(|err| ApplyError::Sink(Box::new(err)))?;
    sink.recompute_derived().map_err(|err| ApplyError::Sink(Box::new(err)))?;
    Ok(())
}
