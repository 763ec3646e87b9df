//! Triangle-fan fallback encoding
//!
//! Lossy, encode-only: every face becomes a fan of triangles around one
//! anchor corner, for consumers that only understand triangle lists.
//!
//! Fan triangles are validated: no two corners may coincide
//! ([`COINCIDENT_EPSILON_SQ`](crate::geometry::COINCIDENT_EPSILON_SQ)) and the
//! area must reach [`MIN_TRIANGLE_AREA`](crate::geometry::MIN_TRIANGLE_AREA).
//! Invalid triangles are dropped, including degenerate 3-corner faces. When
//! robust anchor selection finds no valid triangle for an n-gon, the plain
//! first-corner fan is emitted unvalidated so the face does not disappear.
//! With the first-corner strategy such a face is skipped.

use crate::geometry::{centroid, is_valid_triangle};
use crate::mesh::MeshSource;
use glam::Vec3;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// How the fan anchor corner is chosen for n-gons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorStrategy {
    /// Always corner 0
    First,
    /// Best-scoring corner (valid triangles, centroid distance, valence)
    #[default]
    Robust,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FanOptions {
    pub anchor: AnchorStrategy,
}

/// One emitted triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanTriangle {
    pub face: u32,
    pub material_index: u32,
    /// Global face-corner indices (face start + local corner)
    pub corners: [u32; 3],
    pub vertices: [u32; 3],
}

/// Local corner triples
type Fan = SmallVec<[[usize; 3]; 8]>;

/// Fan-triangulate every face of a mesh source
pub fn encode_fan<S: MeshSource + ?Sized>(source: &S, options: &FanOptions) -> Vec<FanTriangle> {
    let vertex_count = source.vertex_count();
    let valence = match options.anchor {
        AnchorStrategy::Robust => vertex_valence(source),
        AnchorStrategy::First => Vec::new(),
    };

    let mut triangles = Vec::new();
    let mut positions: SmallVec<[Vec3; 8]> = SmallVec::new();
    let mut corner_base = 0u32;

    for face in 0..source.face_count() {
        let vertices = source.face_vertices(face);
        let n = vertices.len();
        let base = corner_base;
        corner_base += n as u32;

        if n < 3 {
            tracing::warn!("Skipping face {} with {} corners", face, n);
            continue;
        }
        if let Some(&bad) = vertices.iter().find(|&&v| v as usize >= vertex_count) {
            tracing::warn!("Skipping face {}: unknown vertex {}", face, bad);
            continue;
        }

        positions.clear();
        positions.extend(vertices.iter().map(|&v| source.position(v as usize)));

        let fan = if n == 3 {
            let fan = validated_fan(&positions, 0);
            if fan.is_empty() {
                tracing::warn!("Skipping degenerate triangle face {}", face);
                continue;
            }
            fan
        } else {
            let anchor = match options.anchor {
                AnchorStrategy::First => 0,
                AnchorStrategy::Robust => robust_anchor(&positions, vertices, &valence),
            };
            let fan = validated_fan(&positions, anchor);
            if !fan.is_empty() {
                if fan.len() < n - 2 {
                    tracing::debug!(
                        "Face {}: dropped {} degenerate triangles",
                        face,
                        n - 2 - fan.len()
                    );
                }
                fan
            } else if options.anchor == AnchorStrategy::Robust {
                tracing::warn!(
                    "Face {} has no non-degenerate fan triangle, emitting unvalidated fan",
                    face
                );
                naive_fan(n)
            } else {
                tracing::warn!("Skipping face {}: every fan triangle is degenerate", face);
                continue;
            }
        };

        let material_index = source.face_material(face);
        for [a, b, c] in fan {
            triangles.push(FanTriangle {
                face: face as u32,
                material_index,
                corners: [base + a as u32, base + b as u32, base + c as u32],
                vertices: [vertices[a], vertices[b], vertices[c]],
            });
        }
    }

    triangles
}

/// `n - 2` triangles `(anchor, anchor + i, anchor + i + 1)`, keeping valid ones
fn validated_fan(positions: &[Vec3], anchor: usize) -> Fan {
    let n = positions.len();
    (1..n - 1)
        .map(|i| [anchor, (anchor + i) % n, (anchor + i + 1) % n])
        .filter(|&[a, b, c]| is_valid_triangle(positions[a], positions[b], positions[c]))
        .collect()
}

fn naive_fan(n: usize) -> Fan {
    (1..n - 1).map(|i| [0, i, i + 1]).collect()
}

/// Number of distinct face edges touching each vertex
fn vertex_valence<S: MeshSource + ?Sized>(source: &S) -> Vec<u32> {
    let mut valence = vec![0u32; source.vertex_count()];
    let mut seen: HashSet<(u32, u32)> = HashSet::new();
    for face in 0..source.face_count() {
        let vertices = source.face_vertices(face);
        let n = vertices.len();
        for i in 0..n {
            let (a, b) = (vertices[i], vertices[(i + 1) % n]);
            if a == b || !seen.insert((a.min(b), a.max(b))) {
                continue;
            }
            for v in [a, b] {
                if let Some(count) = valence.get_mut(v as usize) {
                    *count += 1;
                }
            }
        }
    }
    valence
}

/// Pick the anchor with the highest score; ties keep the lowest corner
///
/// Score = valid triangle count, plus up to 0.5 for being close to the
/// centroid and having low valence. The bonus never outweighs one triangle.
fn robust_anchor(positions: &[Vec3], vertices: &[u32], valence: &[u32]) -> usize {
    let center = centroid(positions);
    let distances: SmallVec<[f32; 8]> = positions.iter().map(|p| p.distance(center)).collect();
    let max_distance = distances.iter().copied().fold(0.0f32, f32::max);
    let valences: SmallVec<[u32; 8]> = vertices
        .iter()
        .map(|&v| valence.get(v as usize).copied().unwrap_or(0))
        .collect();
    let max_valence = valences.iter().copied().max().unwrap_or(0);

    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for anchor in 0..positions.len() {
        let valid = validated_fan(positions, anchor).len() as f32;
        let distance_term = if max_distance > 0.0 {
            1.0 - distances[anchor] / max_distance
        } else {
            1.0
        };
        let valence_term = if max_valence > 0 {
            1.0 - valences[anchor] as f32 / max_valence as f32
        } else {
            1.0
        };
        let score = valid + 0.25 * distance_term + 0.25 * valence_term;
        if score > best_score {
            best = anchor;
            best_score = score;
        }
    }
    best
}
