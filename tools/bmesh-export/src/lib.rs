//! bmesh-export library
//!
//! OBJ → GLB export with `EXT_bmesh_encoding` topology plus a triangle-fan
//! primitive, GLB → OBJ import of the encoded topology, and inspection.

pub mod config;
pub mod glb;
pub mod obj;

use anyhow::{Context, Result};
use bmesh_codec::{
    apply, encode, encode_fan, store_components, BufferArena, DecodeWarning, ManifoldStats,
    PolygonMesh,
};
use std::fmt;
use std::path::Path;

pub use config::{load_config, resolve_config, ExportConfig};
pub use glb::{build_glb, ImportContext, EXTENSION_NAME};

/// What an export wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub vertices: u32,
    pub edges: u32,
    pub loops: u32,
    pub faces: u32,
    pub fan_triangles: usize,
    pub bytes: usize,
}

/// Encode a polygon mesh into GLB bytes
pub fn export_mesh(mesh: &PolygonMesh, config: &ExportConfig) -> Result<(Vec<u8>, ExportSummary)> {
    let set = encode(mesh, &config.encode);
    let (vertices, edges, loops, faces) = set.counts();

    let mut arena = BufferArena::new();
    let record = store_components(&set, &mut arena).context("Failed to store components")?;
    let triangles = encode_fan(mesh, &config.fan);
    let glb = build_glb(mesh, &record, &triangles, arena)?;

    let summary = ExportSummary {
        vertices,
        edges,
        loops,
        faces,
        fan_triangles: triangles.len(),
        bytes: glb.len(),
    };
    Ok((glb, summary))
}

/// Convert an OBJ file to a GLB file
pub fn export_obj(input: &Path, output: &Path, config: &ExportConfig) -> Result<ExportSummary> {
    let mesh = obj::read_obj(input)?;
    let (glb, summary) = export_mesh(&mesh, config)?;
    std::fs::write(output, &glb).with_context(|| format!("Failed to write {:?}", output))?;

    tracing::info!(
        "Exported {:?}: {} vertices, {} edges, {} loops, {} faces, {} fan triangles ({} bytes)",
        output,
        summary.vertices,
        summary.edges,
        summary.loops,
        summary.faces,
        summary.fan_triangles,
        summary.bytes
    );
    Ok(summary)
}

/// Decode GLB bytes into a polygon mesh
///
/// Returns `None` when the encoded record holds no geometry.
pub fn import_mesh(bytes: &[u8]) -> Result<Option<(PolygonMesh, Vec<DecodeWarning>)>> {
    let context = ImportContext::from_glb(bytes)?;
    let Some(output) = context.decode().context("Failed to decode topology")? else {
        return Ok(None);
    };

    let mut mesh = PolygonMesh::new();
    apply(&output.snapshot, &mut mesh).context("Failed to rebuild mesh")?;
    Ok(Some((mesh, output.warnings)))
}

/// Convert a GLB file back to OBJ
///
/// Returns `false` (and writes nothing) when the file holds no geometry.
pub fn import_glb(input: &Path, output: &Path) -> Result<bool> {
    let bytes = std::fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;
    let Some((mesh, warnings)) =
        import_mesh(&bytes).with_context(|| format!("Failed to import {:?}", input))?
    else {
        tracing::info!("{:?} has no geometry, nothing written", input);
        return Ok(false);
    };

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }
    obj::write_obj_file(output, &mesh)?;
    tracing::info!(
        "Imported {:?}: {} vertices, {} faces",
        output,
        mesh.positions.len(),
        mesh.face_count()
    );
    Ok(true)
}

// ============================================================================
// Inspection
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct InspectReport {
    /// Counts declared by the record
    pub declared: (u32, u32, u32, u32),
    /// Element counts after decoding (zero when empty)
    pub vertices: usize,
    pub edges: usize,
    pub loops: usize,
    pub faces: usize,
    pub uv_layers: Vec<String>,
    pub manifold: ManifoldStats,
    pub warnings: Vec<DecodeWarning>,
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (v, e, l, fa) = self.declared;
        writeln!(
            f,
            "declared:  {} vertices, {} edges, {} loops, {} faces",
            v, e, l, fa
        )?;
        writeln!(
            f,
            "decoded:   {} vertices, {} edges, {} loops, {} faces",
            self.vertices, self.edges, self.loops, self.faces
        )?;
        if self.uv_layers.is_empty() {
            writeln!(f, "uv layers: none")?;
        } else {
            writeln!(f, "uv layers: {}", self.uv_layers.join(", "))?;
        }
        writeln!(
            f,
            "edges:     {} manifold, {} non-manifold, {} unknown",
            self.manifold.manifold, self.manifold.non_manifold, self.manifold.unknown
        )?;
        write!(f, "warnings:  {}", self.warnings.len())?;
        for warning in &self.warnings {
            write!(f, "\n  - {}", warning)?;
        }
        Ok(())
    }
}

/// Decode a GLB's topology and summarize it
pub fn inspect_glb(input: &Path) -> Result<InspectReport> {
    let bytes = std::fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;
    let context = ImportContext::from_glb(&bytes)?;
    let declared = context.record.counts();
    let output = context.decode().context("Failed to decode topology")?;

    let report = match output {
        Some(output) => {
            let snapshot = &output.snapshot;
            InspectReport {
                declared,
                vertices: snapshot.vertices().len(),
                edges: snapshot.edges().len(),
                loops: snapshot.loops().len(),
                faces: snapshot.faces().len(),
                uv_layers: snapshot
                    .uv_layers()
                    .iter()
                    .map(|layer| layer.name.clone())
                    .collect(),
                manifold: snapshot.manifold_stats(),
                warnings: output.warnings,
            }
        }
        None => InspectReport {
            declared,
            vertices: 0,
            edges: 0,
            loops: 0,
            faces: 0,
            uv_layers: Vec::new(),
            manifold: ManifoldStats::default(),
            warnings: Vec::new(),
        },
    };
    Ok(report)
}
