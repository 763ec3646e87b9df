//! GLB container carrying `EXT_bmesh_encoding`
//!
//! The written file has one mesh with one triangle primitive:
//! - POSITION / TEXCOORD_0 / u32 indices: the triangle-fan fallback,
//!   unwelded (one vertex per triangle corner) so per-corner UVs survive
//! - `extensions.EXT_bmesh_encoding`: the component record, whose buffer
//!   views live in the same binary chunk
//!
//! Readers without the extension see a plain triangle mesh.

use anyhow::{bail, Context, Result};
use bmesh_codec::{
    decode_record, Attribute, BufferArena, BufferSlices, BufferStore, BufferView, CodecError,
    ComponentRecord, DecodeOutput, FanTriangle, PolygonMesh,
};
use bmesh_common::BufferTarget;
use serde::Deserialize;
use serde_json::json;

pub const EXTENSION_NAME: &str = "EXT_bmesh_encoding";

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F534A;
const CHUNK_BIN: u32 = 0x004E4942;
const GLB_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

// ============================================================================
// Writing
// ============================================================================

/// Bytes a chunk occupies once padded to a 4-byte boundary
fn padded_len(len: usize) -> usize {
    len.next_multiple_of(4)
}

/// Append one chunk: length, type, payload, then `fill` up to alignment
fn push_chunk(glb: &mut Vec<u8>, chunk_type: u32, payload: &[u8], fill: u8) {
    let padded = padded_len(payload.len());
    glb.extend_from_slice(&(padded as u32).to_le_bytes());
    glb.extend_from_slice(&chunk_type.to_le_bytes());
    glb.extend_from_slice(payload);
    glb.resize(glb.len() + padded - payload.len(), fill);
}

/// Assemble a GLB binary from a JSON document and its binary chunk
///
/// JSON is padded with spaces, binary data with zeros.
pub fn assemble_glb(document: &serde_json::Value, bin: &[u8]) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(document).context("Failed to serialize glTF JSON")?;

    let total =
        GLB_HEADER_LEN + 2 * CHUNK_HEADER_LEN + padded_len(json.len()) + padded_len(bin.len());
    let total_u32 = u32::try_from(total).context("GLB exceeds the 4 GiB container limit")?;

    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(GLB_MAGIC);
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&total_u32.to_le_bytes());
    push_chunk(&mut glb, CHUNK_JSON, &json, b' ');
    push_chunk(&mut glb, CHUNK_BIN, bin, 0);

    Ok(glb)
}

/// Unwelded triangle list built from fan triangles
struct FanPrimitive {
    positions: Vec<[f32; 3]>,
    uvs: Option<Vec<[f32; 2]>>,
    indices: Vec<u32>,
}

impl FanPrimitive {
    fn new(mesh: &PolygonMesh, triangles: &[FanTriangle]) -> Self {
        let mut positions = Vec::with_capacity(triangles.len() * 3);
        for triangle in triangles {
            for vertex in triangle.vertices {
                let p = mesh.positions.get(vertex as usize).copied().unwrap_or_default();
                positions.push(p.to_array());
            }
        }

        let uvs = mesh.uv_layers.first().map(|layer| {
            triangles
                .iter()
                .flat_map(|t| t.corners)
                .map(|corner| {
                    layer
                        .uvs
                        .get(corner as usize)
                        .copied()
                        .unwrap_or_default()
                        .to_array()
                })
                .collect()
        });

        let indices = (0..positions.len() as u32).collect();
        Self {
            positions,
            uvs,
            indices,
        }
    }

    fn bounds(&self) -> ([f32; 3], [f32; 3]) {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for p in &self.positions {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        (min, max)
    }
}

/// Build the GLB document for an encoded mesh
///
/// `arena` already holds the component buffers referenced by `record`; the
/// fan primitive's buffers are appended after them.
pub fn build_glb(
    mesh: &PolygonMesh,
    record: &ComponentRecord,
    triangles: &[FanTriangle],
    mut arena: BufferArena,
) -> Result<Vec<u8>> {
    if triangles.is_empty() {
        bail!("Mesh has no faces to write");
    }

    let primitive = FanPrimitive::new(mesh, triangles);
    let (min, max) = primitive.bounds();
    let vertex_count = primitive.positions.len();

    let position_view = arena.store(&Attribute::from_elements(
        &primitive.positions,
        BufferTarget::ArrayBuffer,
    ))?;
    let uv_view = primitive
        .uvs
        .as_ref()
        .map(|uvs| arena.store(&Attribute::from_elements(uvs, BufferTarget::ArrayBuffer)))
        .transpose()?;
    let index_view = arena.store(&Attribute::from_elements(
        &primitive.indices,
        BufferTarget::ElementArrayBuffer,
    ))?;

    let mut accessors = vec![
        json!({
            "bufferView": position_view,
            "componentType": 5126,
            "count": vertex_count,
            "type": "VEC3",
            "min": min,
            "max": max,
        }),
        json!({
            "bufferView": index_view,
            "componentType": 5125,
            "count": vertex_count,
            "type": "SCALAR",
        }),
    ];
    let mut attributes = json!({ "POSITION": 0 });
    if let Some(view) = uv_view {
        accessors.push(json!({
            "bufferView": view,
            "componentType": 5126,
            "count": vertex_count,
            "type": "VEC2",
        }));
        attributes["TEXCOORD_0"] = json!(accessors.len() - 1);
    }

    let (data, views) = arena.into_parts();
    let document = json!({
        "asset": { "version": "2.0", "generator": "bmesh-export" },
        "extensionsUsed": [EXTENSION_NAME],
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{
            "primitives": [{
                "attributes": attributes,
                "indices": 1,
                "mode": 4,
                "extensions": { EXTENSION_NAME: record },
            }],
        }],
        "accessors": accessors,
        "bufferViews": views,
        "buffers": [{ "byteLength": data.len() }],
    });

    assemble_glb(&document, &data)
}

// ============================================================================
// Reading
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentJson {
    #[serde(default)]
    buffer_views: Vec<BufferView>,
    #[serde(default)]
    meshes: Vec<MeshJson>,
}

#[derive(Debug, Deserialize)]
struct MeshJson {
    #[serde(default)]
    primitives: Vec<PrimitiveJson>,
}

#[derive(Debug, Deserialize)]
struct PrimitiveJson {
    #[serde(default)]
    extensions: Option<PrimitiveExtensionsJson>,
}

#[derive(Debug, Deserialize)]
struct PrimitiveExtensionsJson {
    #[serde(rename = "EXT_bmesh_encoding")]
    bmesh: Option<ComponentRecord>,
}

/// Everything needed to decode one import, owned by the caller
#[derive(Debug, Clone)]
pub struct ImportContext {
    pub record: ComponentRecord,
    views: Vec<BufferView>,
    bin: Vec<u8>,
}

impl ImportContext {
    /// Extract the first `EXT_bmesh_encoding` record from a GLB
    pub fn from_glb(bytes: &[u8]) -> Result<Self> {
        let glb = gltf::Glb::from_slice(bytes).context("Failed to read GLB container")?;
        let document: DocumentJson =
            serde_json::from_slice(&glb.json).context("Failed to parse glTF JSON")?;

        let record = document
            .meshes
            .into_iter()
            .flat_map(|mesh| mesh.primitives)
            .find_map(|primitive| primitive.extensions.and_then(|ext| ext.bmesh))
            .with_context(|| format!("No primitive carries {}", EXTENSION_NAME))?;

        Ok(Self {
            record,
            views: document.buffer_views,
            bin: glb.bin.map(|bin| bin.into_owned()).unwrap_or_default(),
        })
    }

    pub fn resolver(&self) -> BufferSlices<'_> {
        BufferSlices::new(&self.bin, &self.views)
    }

    pub fn decode(&self) -> Result<Option<DecodeOutput>, CodecError> {
        decode_record(&self.record, &self.resolver())
    }
}
