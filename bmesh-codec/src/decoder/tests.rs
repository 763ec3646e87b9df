//! Tests for the decoder and `apply`

use super::*;
use crate::encoder::{EncodeOptions, encode};
use crate::mesh::{MeshSource, PolygonMesh};
use crate::store::{BufferArena, store_components};
use crate::test_meshes::{cube, hexagon_with_uvs, triangle};
use crate::topology::FaceId;
use bmesh_common::BufferTarget;
use std::collections::BTreeSet;

fn decode_ok(set: &ComponentSet) -> DecodeOutput {
    decode(set).unwrap().unwrap()
}

fn face_vertex_sets(mesh: &PolygonMesh) -> Vec<BTreeSet<u32>> {
    mesh.faces
        .iter()
        .map(|face| face.iter().copied().collect())
        .collect()
}

/// Triangle plus a closed loop of 7 wire edges: 10 vertices, 10 edges
fn triangle_with_wire_ring() -> PolygonMesh {
    let mut mesh = triangle();
    for i in 0..7 {
        mesh.add_vertex(glam::Vec3::new(i as f32, 5.0, 0.0));
    }
    for i in 0..7u32 {
        mesh.loose_edges.push([3 + i, 3 + (i + 1) % 7]);
    }
    mesh
}

// ============================================================================
// Round Trip
// ============================================================================

#[test]
fn test_cube_round_trip() {
    let mesh = cube();
    let output = decode_ok(&encode(&mesh, &EncodeOptions::default()));
    assert!(output.warnings.is_empty());

    let snapshot = &output.snapshot;
    assert_eq!(snapshot.vertices().len(), 8);
    assert_eq!(snapshot.faces().len(), 6);
    assert_eq!(snapshot.edges().len(), 12);
    assert_eq!(snapshot.manifold_stats().manifold, 12);

    for (vertex, original) in snapshot.vertices().iter().zip(&mesh.positions) {
        assert!((vertex.position - *original).length() < 1e-6);
    }
    let decoded = snapshot.to_polygon_mesh();
    assert_eq!(face_vertex_sets(&decoded), face_vertex_sets(&mesh));
    for face in snapshot.faces() {
        assert_eq!(face.len(), 4);
    }
    assert!(snapshot.validate().is_ok());
}

#[test]
fn test_ngon_round_trip_keeps_uvs_and_materials() {
    let mesh = hexagon_with_uvs();
    let output = decode_ok(&encode(&mesh, &EncodeOptions::default()));
    let decoded = output.snapshot.to_polygon_mesh();

    assert_eq!(decoded.faces, mesh.faces);
    assert_eq!(decoded.materials, vec![1, 2]);
    assert_eq!(decoded.uv_layers.len(), 1);
    assert_eq!(decoded.uv_layers[0].name, "TEXCOORD_0");
    assert_eq!(decoded.uv_layers[0].uvs, mesh.uv_layers[0].uvs);
}

#[test]
fn test_round_trip_through_buffer_store() {
    let set = encode(&cube(), &EncodeOptions::default());
    let mut arena = BufferArena::new();
    let record = store_components(&set, &mut arena).unwrap();

    let output = decode_record(&record, &arena).unwrap().unwrap();
    assert_eq!(output.snapshot.faces().len(), 6);
    assert_eq!(output.snapshot, decode_ok(&set).snapshot);
}

#[test]
fn test_round_trip_without_optional_attributes() {
    let options = EncodeOptions {
        preserve_manifold_info: true,
        adjacency: false,
        loop_topology: false,
        face_normals: false,
    };
    let output = decode_ok(&encode(&cube(), &options));
    assert_eq!(output.snapshot.faces().len(), 6);
    assert!(output.warnings.is_empty());
}

// ============================================================================
// Error Scenarios
// ============================================================================

#[test]
fn test_truncated_positions_is_malformed_buffer() {
    let mut set = encode(&triangle(), &EncodeOptions::default());
    set.vertices.as_mut().unwrap().positions.count = 4;

    assert_eq!(
        decode(&set).unwrap_err(),
        CodecError::MalformedBuffer {
            section: "vertices",
            attribute: "positions".to_string(),
            expected: 48,
            actual: 36,
        }
    );
}

#[test]
fn test_missing_section() {
    let mut set = encode(&triangle(), &EncodeOptions::default());
    set.loops = None;
    assert_eq!(
        decode(&set).unwrap_err(),
        CodecError::MissingSection("loops")
    );

    let mut arena = BufferArena::new();
    let mut record = store_components(&encode(&cube(), &EncodeOptions::default()), &mut arena)
        .unwrap();
    record.faces = None;
    assert_eq!(
        decode_record(&record, &arena).unwrap_err(),
        CodecError::MissingSection("faces")
    );
}

#[test]
fn test_section_count_mismatch_is_malformed_buffer() {
    let mut set = encode(&triangle(), &EncodeOptions::default());
    set.edges.as_mut().unwrap().count = 5;
    // 5 pairs of u32 expected, 3 stored
    assert_eq!(
        decode(&set).unwrap_err(),
        CodecError::MalformedBuffer {
            section: "edges",
            attribute: "vertices".to_string(),
            expected: 40,
            actual: 24,
        }
    );
}

#[test]
fn test_vertex_count_larger_than_positions() {
    let mut set = encode(&triangle(), &EncodeOptions::default());
    set.vertices.as_mut().unwrap().count = 4;
    assert_eq!(
        decode(&set).unwrap_err(),
        CodecError::MalformedBuffer {
            section: "vertices",
            attribute: "positions".to_string(),
            expected: 48,
            actual: 36,
        }
    );
}

#[test]
fn test_wrong_component_type_is_type_mismatch() {
    let mut set = encode(&triangle(), &EncodeOptions::default());
    set.faces.as_mut().unwrap().normals = Some(Attribute::from_elements(
        &[[0u32; 3]],
        BufferTarget::ArrayBuffer,
    ));
    assert!(matches!(
        decode(&set).unwrap_err(),
        CodecError::TypeMismatch { section: "faces", .. }
    ));
}

#[test]
fn test_decreasing_offsets_are_rejected() {
    let mut set = encode(&cube(), &EncodeOptions::default());
    set.faces.as_mut().unwrap().offsets = Attribute::from_elements(
        &[0u32, 4, 8, 6, 16, 20, 24],
        BufferTarget::ArrayBuffer,
    );
    assert!(matches!(
        decode(&set).unwrap_err(),
        CodecError::MalformedOffsets { section: "faces", .. }
    ));
}

// ============================================================================
// Recoverable Anomalies
// ============================================================================

#[test]
fn test_corrupt_single_edge_is_skipped() {
    let mesh = triangle_with_wire_ring();
    let mut set = encode(&mesh, &EncodeOptions::default());
    assert_eq!(set.counts().0, 10);
    assert_eq!(set.counts().1, 10);

    let edges = set.edges.as_mut().unwrap();
    let mut pairs = edges.vertices.read::<[u32; 2]>().unwrap();
    pairs[5] = [5, 999];
    edges.vertices = Attribute::from_elements(&pairs, BufferTarget::ElementArrayBuffer);

    let output = decode_ok(&set);
    assert_eq!(output.snapshot.edges().len(), 9);
    assert_eq!(
        output.warnings,
        vec![DecodeWarning::EdgeSkipped {
            edge: 5,
            vertices: [5, 999]
        }]
    );
    assert_eq!(output.snapshot.loose_edges().count(), 6);
}

#[test]
fn test_unresolved_face_vertex_drops_corner() {
    let mut set = encode(&cube(), &EncodeOptions::default());
    let faces = set.faces.as_mut().unwrap();
    let mut corners = faces.vertices.read::<u32>().unwrap();
    corners[0] = 77;
    faces.vertices = Attribute::from_elements(&corners, BufferTarget::ElementArrayBuffer);

    let output = decode_ok(&set);
    let first = &output.snapshot.faces()[0];
    assert_eq!(first.len(), 3);
    assert!(output.warnings.contains(&DecodeWarning::FaceVertexUnresolved {
        face: 0,
        corner: 0,
        vertex: 77
    }));
    // Rebuilt loops no longer match the stored loop records
    assert!(output
        .warnings
        .iter()
        .any(|w| matches!(w, DecodeWarning::LoopTopologyMismatch { .. })));
}

#[test]
fn test_face_with_too_few_vertices_is_skipped() {
    let mut set = encode(&triangle(), &EncodeOptions::default());
    let faces = set.faces.as_mut().unwrap();
    faces.vertices = Attribute::from_elements(&[0u32, 1, 900], BufferTarget::ElementArrayBuffer);

    let output = decode_ok(&set);
    assert!(output.snapshot.faces().is_empty());
    assert!(output.warnings.contains(&DecodeWarning::FaceSkipped {
        face: 0,
        reason: TopologyError::TooFewVertices(2)
    }));
    // Edges survive as loose edges
    assert_eq!(output.snapshot.edges().len(), 3);
}

#[test]
fn test_duplicate_face_is_skipped() {
    let mut mesh = triangle();
    mesh.add_face(&[1, 2, 0], 0);
    let mut snapshot_set = encode(&triangle(), &EncodeOptions::default());
    let faces = snapshot_set.faces.as_mut().unwrap();
    faces.count = 2;
    faces.vertices =
        Attribute::from_elements(mesh.faces.values(), BufferTarget::ElementArrayBuffer);
    faces.offsets = Attribute::from_elements(mesh.faces.offsets(), BufferTarget::ArrayBuffer);
    faces.normals = None;
    faces.materials = None;
    faces.edges = None;
    faces.loops = None;

    let output = decode_ok(&snapshot_set);
    assert_eq!(output.snapshot.faces().len(), 1);
    assert!(output.warnings.contains(&DecodeWarning::FaceSkipped {
        face: 1,
        reason: TopologyError::DuplicateFace
    }));
}

#[test]
fn test_unknown_manifold_flags_survive_decode() {
    let options = EncodeOptions {
        preserve_manifold_info: false,
        ..Default::default()
    };
    let output = decode_ok(&encode(&cube(), &options));
    assert_eq!(output.snapshot.manifold_stats().unknown, 12);
}

#[test]
fn test_stored_normals_are_used() {
    let mut set = encode(&triangle(), &EncodeOptions::default());
    set.faces.as_mut().unwrap().normals = Some(Attribute::from_elements(
        &[[0.0f32, 0.0, -1.0]],
        BufferTarget::ArrayBuffer,
    ));
    let output = decode_ok(&set);
    assert_eq!(output.snapshot.faces()[0].normal, glam::Vec3::NEG_Z);
}

#[test]
fn test_stored_normals_are_normalized() {
    let mut set = encode(&triangle(), &EncodeOptions::default());
    set.faces.as_mut().unwrap().normals = Some(Attribute::from_elements(
        &[[0.0f32, 0.0, 5.0]],
        BufferTarget::ArrayBuffer,
    ));
    let output = decode_ok(&set);
    assert_eq!(output.snapshot.faces()[0].normal, glam::Vec3::Z);

    // Zero falls back to the computed normal
    set.faces.as_mut().unwrap().normals = Some(Attribute::from_elements(
        &[[0.0f32; 3]],
        BufferTarget::ArrayBuffer,
    ));
    let output = decode_ok(&set);
    let normal = output.snapshot.faces()[0].normal;
    assert!((normal.length() - 1.0).abs() < 1e-6);
}

#[test]
fn test_empty_set_decodes_to_none() {
    let set = encode(&PolygonMesh::new(), &EncodeOptions::default());
    assert!(decode(&set).unwrap().is_none());
    assert!(decode(&ComponentSet::empty()).unwrap().is_none());
}

// ============================================================================
// Apply
// ============================================================================

#[test]
fn test_apply_replaces_sink_and_recomputes() {
    let output = decode_ok(&encode(&cube(), &EncodeOptions::default()));
    let mut sink = triangle();
    apply(&output.snapshot, &mut sink).unwrap();

    assert_eq!(sink.vertex_count(), 8);
    assert_eq!(MeshSource::face_count(&sink), 6);
    assert_eq!(sink.normals.len(), 6);
}

#[test]
fn test_apply_invalid_snapshot_leaves_sink_untouched() {
    let output = decode_ok(&encode(&cube(), &EncodeOptions::default()));
    let mut snapshot = output.snapshot;
    snapshot.loops[0].radial_next = snapshot.loops[0].id;

    let mut sink = triangle();
    let before = sink.clone();
    assert!(matches!(
        apply(&snapshot, &mut sink),
        Err(ApplyError::InvalidSnapshot(_))
    ));
    assert_eq!(sink, before);
}

#[derive(Debug, Default)]
struct RejectingSink {
    replaced: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("host mesh is locked")]
struct Locked;

impl MeshSink for RejectingSink {
    type Error = Locked;

    fn replace(&mut self, _mesh: PolygonMesh) -> Result<(), Self::Error> {
        Err(Locked)
    }

    fn recompute_derived(&mut self) -> Result<(), Self::Error> {
        self.replaced = true;
        Ok(())
    }
}

#[test]
fn test_apply_surfaces_sink_error() {
    let output = decode_ok(&encode(&triangle(), &EncodeOptions::default()));
    let mut sink = RejectingSink::default();
    let err = apply(&output.snapshot, &mut sink).unwrap_err();
    assert_eq!(err.to_string(), "mesh sink failed: host mesh is locked");
    assert!(!sink.replaced);
}

#[test]
fn test_face_ids_follow_encoded_order() {
    let output = decode_ok(&encode(&hexagon_with_uvs(), &EncodeOptions::default()));
    let faces = output.snapshot.faces();
    assert_eq!(faces[0].id, FaceId(0));
    assert_eq!(faces[0].len(), 6);
    assert_eq!(faces[1].len(), 3);
}
