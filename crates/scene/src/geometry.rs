//! Per-vertex attributes derived from indexed triangle geometry.

use glam::{Vec2, Vec3};

fn position(vertices: &[f32], index: u16) -> Option<Vec3> {
    let i = usize::from(index) * 3;
    vertices.get(i..i + 3).map(Vec3::from_slice)
}

fn uv(coords: &[f32], index: u16) -> Option<Vec2> {
    let i = usize::from(index) * 2;
    coords.get(i..i + 2).map(Vec2::from_slice)
}

fn accumulate(out: &mut [Vec3], triangle: &[u16], value: Vec3) {
    for &index in triangle {
        out[usize::from(index)] += value;
    }
}

fn flatten(vectors: Vec<Vec3>) -> Vec<f32> {
    vectors
        .into_iter()
        .flat_map(|v| v.normalize_or_zero().to_array())
        .collect()
}

/// Smooth vertex normals: face normals summed per vertex, then normalized.
///
/// Triangles are read counter-clockwise. Trailing indices that do not form a
/// full triangle and triangles with out-of-range indices are ignored.
pub fn calculate_normals(vertices: &[f32], indices: &[u16]) -> Vec<f32> {
    let mut normals = vec![Vec3::ZERO; vertices.len() / 3];
    for triangle in indices.chunks_exact(3) {
        let (Some(p0), Some(p1), Some(p2)) = (
            position(vertices, triangle[0]),
            position(vertices, triangle[1]),
            position(vertices, triangle[2]),
        ) else {
            continue;
        };
        let face = (p1 - p0).cross(p2 - p0);
        accumulate(&mut normals, triangle, face);
    }
    flatten(normals)
}

/// Per-vertex tangents from positions and texture coordinates, for normal mapping.
pub fn calculate_tangents(vertices: &[f32], texture_coords: &[f32], indices: &[u16]) -> Vec<f32> {
    let mut tangents = vec![Vec3::ZERO; vertices.len() / 3];
    for triangle in indices.chunks_exact(3) {
        let (Some(p0), Some(p1), Some(p2), Some(t0), Some(t1), Some(t2)) = (
            position(vertices, triangle[0]),
            position(vertices, triangle[1]),
            position(vertices, triangle[2]),
            uv(texture_coords, triangle[0]),
            uv(texture_coords, triangle[1]),
            uv(texture_coords, triangle[2]),
        ) else {
            continue;
        };
        let (edge1, edge2) = (p1 - p0, p2 - p0);
        let (duv1, duv2) = (t1 - t0, t2 - t0);
        let det = duv1.x * duv2.y - duv2.x * duv1.y;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let tangent = (edge1 * duv2.y - edge2 * duv1.y) / det;
        accumulate(&mut tangents, triangle, tangent);
    }
    flatten(tangents)
}
