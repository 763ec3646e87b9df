//! Wavefront OBJ ⇄ PolygonMesh
//!
//! Faces are kept as authored (n-gons are not triangulated). Supported
//! statements: `v`, `vt`, `f`, `l` (polylines become loose edges) and
//! `usemtl`. Everything else is ignored.

use anyhow::{bail, Context, Result};
use bmesh_codec::{CornerUvLayer, PolygonMesh};
use glam::{Vec2, Vec3};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Name of the UV layer built from `vt` references
pub const OBJ_UV_LAYER: &str = "TEXCOORD_0";

/// Read an OBJ file
pub fn read_obj(input: &Path) -> Result<PolygonMesh> {
    let file = File::open(input).with_context(|| format!("Failed to open OBJ: {:?}", input))?;
    parse_obj(BufReader::new(file)).with_context(|| format!("Failed to parse OBJ: {:?}", input))
}

/// Parse OBJ text
pub fn parse_obj<R: BufRead>(reader: R) -> Result<PolygonMesh> {
    let mut mesh = PolygonMesh::new();
    let mut tex_coords: Vec<Vec2> = Vec::new();
    let mut corner_uvs: Vec<Option<Vec2>> = Vec::new();
    let mut material_names: Vec<String> = Vec::new();
    let mut material = 0u32;
    let mut corners: Vec<u32> = Vec::new();

    for (line_index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = line_index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&parts[1..])
                    .with_context(|| format!("line {}: invalid vertex", line_number))?;
                mesh.add_vertex(Vec3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(&parts[1..])
                    .with_context(|| format!("line {}: invalid texture coordinate", line_number))?;
                tex_coords.push(Vec2::new(u, v));
            }
            "usemtl" => {
                let name = parts.get(1).copied().unwrap_or_default();
                material = material_index(name, &mut material_names);
            }
            "f" => {
                corners.clear();
                for reference in &parts[1..] {
                    let (vi, vti) = parse_obj_vertex(reference).with_context(|| {
                        format!("line {}: invalid face vertex '{}'", line_number, reference)
                    })?;
                    corners.push(vi as u32);
                    corner_uvs.push(vti.and_then(|ti| tex_coords.get(ti).copied()));
                }
                mesh.add_face(&corners, material);
            }
            "l" => {
                let mut previous: Option<u32> = None;
                for reference in &parts[1..] {
                    let (vi, _) = parse_obj_vertex(reference).with_context(|| {
                        format!("line {}: invalid line vertex '{}'", line_number, reference)
                    })?;
                    let vi = vi as u32;
                    if let Some(prev) = previous {
                        mesh.loose_edges.push([prev, vi]);
                    }
                    previous = Some(vi);
                }
            }
            _ => {}
        }
    }

    if mesh.positions.is_empty() {
        bail!("No vertices found in OBJ file");
    }

    if corner_uvs.iter().any(Option::is_some) {
        mesh.uv_layers.push(CornerUvLayer {
            name: OBJ_UV_LAYER.to_string(),
            uvs: corner_uvs
                .into_iter()
                .map(|uv| uv.unwrap_or(Vec2::ZERO))
                .collect(),
        });
    }

    Ok(mesh)
}

fn parse_floats<const N: usize>(parts: &[&str]) -> Result<[f32; N]> {
    if parts.len() < N {
        bail!("expected {} values, found {}", N, parts.len());
    }
    let mut values = [0.0f32; N];
    for (value, part) in values.iter_mut().zip(parts) {
        *value = part
            .parse()
            .with_context(|| format!("'{}' is not a number", part))?;
    }
    Ok(values)
}

/// `material_<n>` maps to `n` (the names [`write_obj`] emits); other names are
/// numbered by first appearance
fn material_index(name: &str, names: &mut Vec<String>) -> u32 {
    if let Some(index) = name
        .strip_prefix("material_")
        .and_then(|n| n.parse::<u32>().ok())
    {
        return index;
    }
    match names.iter().position(|n| n == name) {
        Some(index) => index as u32,
        None => {
            names.push(name.to_string());
            (names.len() - 1) as u32
        }
    }
}

/// Parse OBJ vertex reference: "v", "v/vt", "v/vt/vn", or "v//vn"
///
/// Returns 0-based (vertex, texcoord) indices.
fn parse_obj_vertex(s: &str) -> Option<(usize, Option<usize>)> {
    let mut parts = s.split('/');

    let vi = parts.next()?.parse::<usize>().ok()?.checked_sub(1)?; // OBJ indices are 1-based

    let vti = parts
        .next()
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<usize>().ok())
        .and_then(|i| i.checked_sub(1));

    Some((vi, vti))
}

// ============================================================================
// Writing
// ============================================================================

/// Write an OBJ file
pub fn write_obj_file(output: &Path, mesh: &PolygonMesh) -> Result<()> {
    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);
    write_obj(&mut writer, mesh)?;
    writer.flush()?;
    Ok(())
}

/// Serialize a mesh as OBJ text (first UV layer only)
pub fn write_obj<W: Write>(writer: &mut W, mesh: &PolygonMesh) -> Result<()> {
    writeln!(writer, "# bmesh-export")?;
    for p in &mesh.positions {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }

    let uvs = mesh.uv_layers.first().map(|layer| &layer.uvs);
    if let Some(uvs) = uvs {
        for uv in uvs {
            writeln!(writer, "vt {} {}", uv.x, uv.y)?;
        }
    }

    let mut current_material = None;
    for (face, corners) in mesh.faces.iter().enumerate() {
        let material = mesh.materials.get(face).copied().unwrap_or(0);
        if current_material != Some(material) {
            writeln!(writer, "usemtl material_{}", material)?;
            current_material = Some(material);
        }

        let start = mesh.faces.row_start(face).unwrap_or(0) as usize;
        write!(writer, "f")?;
        for (corner, vertex) in corners.iter().enumerate() {
            match uvs {
                Some(_) => write!(writer, " {}/{}", vertex + 1, start + corner + 1)?,
                None => write!(writer, " {}", vertex + 1)?,
            }
        }
        writeln!(writer)?;
    }

    for [a, b] in &mesh.loose_edges {
        writeln!(writer, "l {} {}", a + 1, b + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmesh_codec::MeshSource;

    const QUAD_WITH_UVS: &str = "\
# quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl stone
f 1/1 2/2 3/3 4/4
usemtl wood
f 1/1 3/3 2/2
l 1 3 4
";

    #[test]
    fn test_parse_keeps_ngons_and_uvs() {
        let mesh = parse_obj(QUAD_WITH_UVS.as_bytes()).unwrap();
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.faces.offsets(), &[0, 4, 7]);
        assert_eq!(mesh.faces.values(), &[0, 1, 2, 3, 0, 2, 1]);
        assert_eq!(mesh.materials, vec![0, 1]);
        assert_eq!(mesh.loose_edges, vec![[0, 2], [2, 3]]);

        assert_eq!(mesh.uv_layers.len(), 1);
        assert_eq!(mesh.corner_uv(0, 0, 2), Some(Vec2::ONE));
        assert_eq!(mesh.corner_uv(0, 1, 2), Some(Vec2::X));
    }

    #[test]
    fn test_parse_without_uvs() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1//1 2//1 3//1\n".as_bytes()).unwrap();
        assert!(mesh.uv_layers.is_empty());
        assert_eq!(mesh.face_vertices(0), &[0, 1, 2]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_obj("# nothing\n".as_bytes()).is_err());
        assert!(parse_obj("v 0 zero 0\n".as_bytes()).is_err());
        assert!(parse_obj("v 0 0 0\nf 0 1 2\n".as_bytes()).is_err());
    }

    #[test]
    fn test_parse_obj_vertex() {
        assert_eq!(parse_obj_vertex("3"), Some((2, None)));
        assert_eq!(parse_obj_vertex("3/7"), Some((2, Some(6))));
        assert_eq!(parse_obj_vertex("3//4"), Some((2, None)));
        assert_eq!(parse_obj_vertex("3/1/4"), Some((2, Some(0))));
        assert_eq!(parse_obj_vertex("x"), None);
    }

    #[test]
    fn test_write_then_parse_preserves_mesh() {
        let mesh = parse_obj(QUAD_WITH_UVS.as_bytes()).unwrap();
        let mut text = Vec::new();
        write_obj(&mut text, &mesh).unwrap();

        let reparsed = parse_obj(text.as_slice()).unwrap();
        assert_eq!(reparsed.positions, mesh.positions);
        assert_eq!(reparsed.faces, mesh.faces);
        assert_eq!(reparsed.materials, mesh.materials);
        assert_eq!(reparsed.uv_layers, mesh.uv_layers);
        assert_eq!(reparsed.loose_edges, mesh.loose_edges);
    }

    #[test]
    fn test_material_names() {
        let mut names = Vec::new();
        assert_eq!(material_index("material_4", &mut names), 4);
        assert_eq!(material_index("brick", &mut names), 0);
        assert_eq!(material_index("glass", &mut names), 1);
        assert_eq!(material_index("brick", &mut names), 0);
    }
}
