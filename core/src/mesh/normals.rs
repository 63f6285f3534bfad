//! Vertex normal computation.

use crate::math::Vec3;

use super::geometry::{AttributeData, Geometry, GeometryError, NORMAL, POSITION};

/// Recompute the `normal` attribute from triangle faces.
///
/// For indexed geometry, face normals are accumulated into every vertex the
/// face references and the sums are normalized, giving smooth shading across
/// shared vertices. For non-indexed geometry each vertex takes the normal of
/// its own triangle. Degenerate faces contribute nothing, and vertices with
/// no contribution keep a zero normal.
///
/// Faces wind counter-clockwise, so for a face `(a, b, c)` the normal is
/// `(c - b) × (a - b)`.
///
/// # Errors
///
/// Returns [`GeometryError::MalformedInput`] if there is no 3-component
/// position attribute, and [`GeometryError::IndexOutOfRange`] for bad indices.
pub fn compute_vertex_normals(geometry: &mut Geometry) -> Result<(), GeometryError> {
    let positions = geometry
        .attribute(POSITION)
        .filter(|p| p.components() == 3)
        .ok_or_else(|| {
            GeometryError::MalformedInput("normals need a 3-component position attribute".into())
        })?;

    let vertex_count = positions.count();
    if let Some(indices) = geometry.indices() {
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
    }

    let normals = face_normals(positions.values(), geometry.indices());
    geometry.set_attribute(NORMAL, AttributeData::new(normals, 3));
    Ok(())
}

/// Computes flat-array normals for `positions`. Indices must be in range.
pub(crate) fn face_normals(positions: &[f32], indices: Option<&[u32]>) -> Vec<f32> {
    let vertex = |i: usize| Vec3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]);
    let face_normal = |a: usize, b: usize, c: usize| {
        let (va, vb, vc) = (vertex(a), vertex(b), vertex(c));
        (vc - vb).cross(&(va - vb))
    };

    let vertex_count = positions.len() / 3;
    let mut accum = vec![Vec3::zeros(); vertex_count];

    match indices {
        Some(indices) => {
            for face in indices.chunks_exact(3) {
                let (a, b, c) = (face[0] as usize, face[1] as usize, face[2] as usize);
                let n = face_normal(a, b, c);
                accum[a] += n;
                accum[b] += n;
                accum[c] += n;
            }
        }
        None => {
            for start in (0..vertex_count - vertex_count % 3).step_by(3) {
                let n = face_normal(start, start + 1, start + 2);
                accum[start] = n;
                accum[start + 1] = n;
                accum[start + 2] = n;
            }
        }
    }

    let mut out = Vec::with_capacity(vertex_count * 3);
    for n in accum {
        let n = n.try_normalize(0.0).unwrap_or(n);
        out.extend_from_slice(&[n.x, n.y, n.z]);
    }
    out
}
