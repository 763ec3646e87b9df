//! Tests for component set wire types

use super::*;
use crate::packing::{BufferTarget, ComponentType, ElementShape, PackingError};

fn positions_attribute() -> Attribute {
    Attribute::from_elements(
        &[[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        BufferTarget::ArrayBuffer,
    )
}

// ============================================================================
// Attribute Tests
// ============================================================================

#[test]
fn test_attribute_from_elements_layout() {
    let attribute = positions_attribute();
    assert_eq!(attribute.count, 3);
    assert_eq!(attribute.component_type, ComponentType::F32);
    assert_eq!(attribute.shape, ElementShape::Vec3);
    assert_eq!(attribute.data.len(), 36);
    assert!(attribute.validate().is_ok());
}

#[test]
fn test_attribute_validate_rejects_truncated_data() {
    let mut attribute = positions_attribute();
    attribute.count = 4;
    assert_eq!(
        attribute.validate(),
        Err(PackingError::LengthMismatch {
            expected: 48,
            actual: 36
        })
    );
}

#[test]
fn test_attribute_read_checks_layout() {
    let attribute = positions_attribute();
    let err = attribute.read::<[u32; 3]>().unwrap_err();
    assert!(matches!(err, PackingError::LayoutMismatch { .. }));

    let positions = attribute.read::<[f32; 3]>().unwrap();
    assert_eq!(positions[1], [1.0, 0.0, 0.0]);
}

#[test]
fn test_attribute_ref_to_attribute() {
    let attribute = Attribute::from_elements(&[1u32, 2, 3], BufferTarget::ElementArrayBuffer);
    let reference = AttributeRef::new(5, &attribute);
    assert_eq!(reference.buffer_view, 5);
    assert_eq!(reference.expected_byte_length(), 12);

    let rebuilt = reference.to_attribute(&attribute.data).unwrap();
    assert_eq!(rebuilt.read::<u32>().unwrap(), vec![1, 2, 3]);

    assert!(reference.to_attribute(&attribute.data[..8]).is_err());
}

// ============================================================================
// Wire Shape Tests
// ============================================================================

#[test]
fn test_attribute_ref_json_shape() {
    let reference = AttributeRef::new(2, &positions_attribute());
    let json = serde_json::to_value(reference).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "bufferView": 2,
            "componentType": 5126,
            "type": "VEC3",
            "count": 3
        })
    );
}

#[test]
fn test_record_json_omits_absent_attributes() {
    let positions = AttributeRef::new(0, &positions_attribute());
    let record = ComponentRecord {
        vertices: Some(VertexSection {
            count: 3,
            positions,
            edges: None,
            edge_offsets: None,
        }),
        ..Default::default()
    };

    let json = serde_json::to_value(&record).unwrap();
    let vertices = json.get("vertices").unwrap();
    assert_eq!(vertices.get("count").unwrap(), 3);
    assert!(vertices.get("edgeOffsets").is_none());
    assert!(json.get("edges").is_none());
    assert!(json.get("faces").is_none());
}

#[test]
fn test_record_json_parses_optional_sections() {
    let json = serde_json::json!({
        "vertices": {
            "count": 1,
            "positions": { "bufferView": 0, "componentType": 5126, "type": "VEC3", "count": 1 }
        },
        "edges": {
            "count": 0,
            "vertices": { "bufferView": 1, "componentType": 5125, "type": "VEC2", "count": 0 },
            "manifold": { "bufferView": 2, "componentType": 5121, "type": "SCALAR", "count": 0 }
        },
        "loops": {
            "count": 0,
            "attributes": {
                "TEXCOORD_0": { "bufferView": 3, "componentType": 5126, "type": "VEC2", "count": 0 }
            }
        }
    });

    let record: ComponentRecord = serde_json::from_value(json).unwrap();
    assert_eq!(record.counts(), (1, 0, 0, 0));
    assert!(record.faces.is_none());

    let edges = record.edges.as_ref().unwrap();
    assert_eq!(edges.manifold.unwrap().component_type, ComponentType::U8);

    let loops = record.loops.as_ref().unwrap();
    assert_eq!(loops.attributes["TEXCOORD_0"].shape, ElementShape::Vec2);
}

#[test]
fn test_record_json_rejects_unknown_component_type() {
    let json = serde_json::json!({
        "vertices": {
            "count": 1,
            "positions": { "bufferView": 0, "componentType": 5123, "type": "VEC3", "count": 1 }
        }
    });
    assert!(serde_json::from_value::<ComponentRecord>(json).is_err());
}

// ============================================================================
// Component Set Tests
// ============================================================================

#[test]
fn test_empty_component_set() {
    let set = ComponentSet::empty();
    assert!(set.is_empty());
    assert_eq!(set.counts(), (0, 0, 0, 0));

    let faces = set.faces.as_ref().unwrap();
    assert_eq!(faces.offsets.read::<u32>().unwrap(), vec![0]);
    assert_eq!(set.byte_size(), 4);
}

#[test]
fn test_try_map_visits_every_attribute() {
    let mut set = ComponentSet::empty();
    if let Some(loops) = set.loops.as_mut() {
        loops.attributes.insert(
            "TEXCOORD_0".to_string(),
            Attribute::from_elements::<[f32; 2]>(&[], BufferTarget::ArrayBuffer),
        );
    }

    let mut visited = Vec::new();
    let mapped = set
        .try_map(|section, name, _| {
            visited.push(format!("{section}.{name}"));
            Ok::<_, ()>(visited.len() as u32)
        })
        .unwrap();

    assert_eq!(
        visited,
        vec![
            "vertices.positions",
            "edges.vertices",
            "loops.TEXCOORD_0",
            "faces.vertices",
            "faces.offsets"
        ]
    );
    assert_eq!(mapped.faces.unwrap().offsets, 5);
}

#[test]
fn test_try_map_stops_at_first_error() {
    let set = ComponentSet::empty();
    let mut calls = 0;
    let result = set.try_map(|section, _, _| {
        calls += 1;
        if section == EDGES { Err(section) } else { Ok(()) }
    });
    assert_eq!(result.unwrap_err(), EDGES);
    assert_eq!(calls, 2);
}

// ============================================================================
// CSR Tests
// ============================================================================

#[test]
fn test_csr_from_rows() {
    let csr = Csr::from_rows([vec![0u32, 1, 2], vec![], vec![3, 4, 5, 6]]);
    assert_eq!(csr.rows(), 3);
    assert_eq!(csr.offsets(), &[0, 3, 3, 7]);
    assert_eq!(csr.row(0), Some(&[0, 1, 2][..]));
    assert_eq!(csr.row(1), Some(&[][..]));
    assert_eq!(csr.row(3), None);
    assert_eq!(csr.row_start(2), Some(3));
    assert_eq!(csr.iter().map(<[u32]>::len).collect::<Vec<_>>(), vec![3, 0, 4]);
}

#[test]
fn test_csr_new_is_empty() {
    let csr: Csr<u32> = Csr::new();
    assert!(csr.is_empty());
    assert_eq!(csr.offsets(), &[0]);
}

#[test]
fn test_csr_from_parts_validation() {
    assert_eq!(
        Csr::<u32>::from_parts(vec![], vec![]),
        Err(CsrError::EmptyOffsets)
    );
    assert_eq!(
        Csr::from_parts(vec![1, 2], vec![7u32, 8]),
        Err(CsrError::NonZeroStart(1))
    );
    assert_eq!(
        Csr::from_parts(vec![0, 3, 2], vec![1u32, 2, 3]),
        Err(CsrError::Decreasing { index: 2 })
    );
    assert_eq!(
        Csr::from_parts(vec![0, 2], vec![1u32, 2, 3]),
        Err(CsrError::LengthMismatch { last: 2, values: 3 })
    );

    let csr = Csr::from_parts(vec![0, 1, 3], vec![9u32, 8, 7]).unwrap();
    assert_eq!(csr.row(1), Some(&[8, 7][..]));
    assert_eq!(csr.into_parts(), (vec![0, 1, 3], vec![9, 8, 7]));
}
