//! Polyhedron subdivision with spherical UV unwrapping.
//!
//! A coarse polyhedron (vertex list plus triangle indices) is turned into a
//! rounder solid by:
//!
//! 1. splitting every triangle into `4^detail` triangles on a barycentric grid,
//! 2. pushing every vertex out to `radius`,
//! 3. assigning equirectangular UVs from azimuth and inclination,
//! 4. fixing triangles that wrap across the U seam or touch a pole.
//!
//! The result is non-indexed: every triangle owns three vertices so seam
//! triangles can carry UVs that disagree with their neighbours.

use std::f32::consts::PI;

use crate::math::{self, Vec3};

use super::geometry::{AttributeData, Geometry, GeometryError, NORMAL, POSITION, UV};
use super::normals::face_normals;

/// A triangle whose largest U exceeds this is a seam candidate.
pub const SEAM_HIGH_THRESHOLD: f32 = 0.9;
/// A triangle whose smallest U is below this is a seam candidate.
pub const SEAM_LOW_THRESHOLD: f32 = 0.1;
/// In a seam-straddling triangle, U values below this are shifted by +1.
pub const SEAM_SHIFT_THRESHOLD: f32 = 0.2;

/// Build a subdivided polyhedron projected onto a sphere.
///
/// `vertices` holds `x, y, z` triples and `indices` holds counter-clockwise
/// triangles into them. Each triangle is split `detail` times (so `F`
/// triangles become `F * 4^detail`), and every resulting vertex is scaled to
/// length `radius`. Vertices at the origin cannot be projected and are left
/// in place.
///
/// The geometry carries `position`, `normal` and `uv` attributes, with
/// `3 * F * 4^detail` vertices and no index buffer.
///
/// # Errors
///
/// Returns [`GeometryError::MalformedInput`] when a length is not a multiple
/// of 3 or `detail` is too large to address, and
/// [`GeometryError::IndexOutOfRange`] when an index is past the vertex list.
///
/// # Example
///
/// ```
/// use lumen_core::mesh::polyhedron;
///
/// let vertices = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
/// let geometry = polyhedron(&vertices, &[0, 1, 2], 1.0, 1).unwrap();
/// assert_eq!(geometry.triangle_count(), 4);
/// ```
pub fn polyhedron(
    vertices: &[f32],
    indices: &[u32],
    radius: f32,
    detail: u32,
) -> Result<Geometry, GeometryError> {
    if vertices.len() % 3 != 0 {
        return Err(GeometryError::MalformedInput(format!(
            "vertex list length {} is not a multiple of 3",
            vertices.len()
        )));
    }
    if indices.len() % 3 != 0 {
        return Err(GeometryError::MalformedInput(format!(
            "index list length {} is not a multiple of 3",
            indices.len()
        )));
    }
    let vertex_count = vertices.len() / 3;
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(GeometryError::IndexOutOfRange {
            index,
            vertex_count,
        });
    }
    let too_large = || GeometryError::MalformedInput(format!("detail {} is too large", detail));
    let cols = 1usize.checked_shl(detail).ok_or_else(too_large)?;
    let bytes = cols
        .checked_mul(cols)
        .and_then(|cells| cells.checked_mul(indices.len()))
        .and_then(|points| points.checked_mul(std::mem::size_of::<Vec3>()))
        .filter(|&bytes| bytes <= isize::MAX as usize);
    if bytes.is_none() {
        return Err(too_large());
    }

    Ok(build(vertices, indices, radius, cols))
}

/// Builds the polyhedron from already validated input.
pub(crate) fn build(vertices: &[f32], indices: &[u32], radius: f32, cols: usize) -> Geometry {
    let corner = |i: u32| {
        let i = i as usize * 3;
        Vec3::new(vertices[i], vertices[i + 1], vertices[i + 2])
    };

    let mut points = Vec::with_capacity(indices.len() * cols * cols);
    for face in indices.chunks_exact(3) {
        subdivide_face(
            &corner(face[0]),
            &corner(face[1]),
            &corner(face[2]),
            cols,
            &mut points,
        );
    }

    for point in points.iter_mut() {
        *point = math::with_length(point, radius);
    }

    let mut uvs = generate_uvs(&points);
    correct_uvs(&points, &mut uvs);
    correct_seam(&mut uvs);

    let positions: Vec<f32> = points.iter().flat_map(|p| [p.x, p.y, p.z]).collect();
    let normals = face_normals(&positions, None);

    log::trace!(
        "polyhedron: {} source faces, {} cols, {} vertices",
        indices.len() / 3,
        cols,
        points.len()
    );

    Geometry::new()
        .with_attribute(POSITION, AttributeData::new(positions, 3))
        .with_attribute(NORMAL, AttributeData::new(normals, 3))
        .with_attribute(UV, AttributeData::new(uvs, 2))
        .with_label("polyhedron")
}

/// Split triangle `(a, b, c)` into `cols * cols` triangles, appending three
/// independent vertices per triangle to `out`.
///
/// Row `i` of the grid runs from `lerp(a, c, i/cols)` to `lerp(b, c, i/cols)`
/// and holds `cols - i + 1` points; the last row is the single point `c`.
fn subdivide_face(a: &Vec3, b: &Vec3, c: &Vec3, cols: usize, out: &mut Vec<Vec3>) {
    let mut grid: Vec<Vec<Vec3>> = Vec::with_capacity(cols + 1);
    for i in 0..=cols {
        let t = i as f32 / cols as f32;
        let aj = a.lerp(c, t);
        let bj = b.lerp(c, t);
        let rows = cols - i;

        let row = (0..=rows)
            .map(|j| {
                if j == 0 && i == cols {
                    aj
                } else {
                    aj.lerp(&bj, j as f32 / rows as f32)
                }
            })
            .collect();
        grid.push(row);
    }

    for i in 0..cols {
        for j in 0..2 * (cols - i) - 1 {
            let k = j / 2;
            if j % 2 == 0 {
                out.extend_from_slice(&[grid[i][k + 1], grid[i + 1][k], grid[i][k]]);
            } else {
                out.extend_from_slice(&[grid[i][k + 1], grid[i + 1][k + 1], grid[i + 1][k]]);
            }
        }
    }
}

fn azimuth_u(azimuth: f32) -> f32 {
    azimuth / 2.0 / PI + 0.5
}

fn generate_uvs(points: &[Vec3]) -> Vec<f32> {
    let mut uvs = Vec::with_capacity(points.len() * 2);
    for point in points {
        let u = azimuth_u(math::azimuth(point));
        let v = math::inclination(point) / PI + 0.5;
        uvs.extend_from_slice(&[u, v]);
    }
    uvs
}

/// Per-triangle fix-up using the centroid azimuth: seam vertices of
/// triangles on the negative side move from `u = 1` to `u = 0`, and pole
/// vertices take the centroid's U.
fn correct_uvs(points: &[Vec3], uvs: &mut [f32]) {
    for (triangle, uv) in points.chunks_exact(3).zip(uvs.chunks_exact_mut(6)) {
        let centroid = (triangle[0] + triangle[1] + triangle[2]) * (1.0 / 3.0);
        let azimuth = math::azimuth(&centroid);

        for (corner, point) in triangle.iter().enumerate() {
            let u = &mut uv[corner * 2];
            if azimuth < 0.0 && *u == 1.0 {
                *u -= 1.0;
            }
            if point.x == 0.0 && point.z == 0.0 {
                *u = azimuth_u(azimuth);
            }
        }
    }
}

/// Shift the low U values of triangles that straddle the seam.
///
/// `uvs` holds `u, v` pairs, three pairs per triangle. When a triangle's U
/// values reach both above [`SEAM_HIGH_THRESHOLD`] and below
/// [`SEAM_LOW_THRESHOLD`], every U below [`SEAM_SHIFT_THRESHOLD`] gets `+1`
/// so the triangle samples a contiguous strip. Applying it twice is the same
/// as applying it once. A trailing partial triangle is left untouched.
pub fn correct_seam(uvs: &mut [f32]) {
    for triangle in uvs.chunks_exact_mut(6) {
        let (u0, u1, u2) = (triangle[0], triangle[2], triangle[4]);
        let max = u0.max(u1).max(u2);
        let min = u0.min(u1).min(u2);

        if max > SEAM_HIGH_THRESHOLD && min < SEAM_LOW_THRESHOLD {
            for i in [0, 2, 4] {
                if triangle[i] < SEAM_SHIFT_THRESHOLD {
                    triangle[i] += 1.0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::generators::{OCTAHEDRON_INDICES, OCTAHEDRON_VERTICES};
    use rstest::rstest;

    fn us(geometry: &Geometry) -> Vec<f32> {
        geometry
            .attribute(UV)
            .unwrap()
            .values()
            .chunks_exact(2)
            .map(|uv| uv[0])
            .collect()
    }

    #[test]
    fn test_scenario_octahedron_radius_two() {
        let geometry = polyhedron(&OCTAHEDRON_VERTICES, &OCTAHEDRON_INDICES, 2.0, 0).unwrap();

        assert_eq!(geometry.triangle_count(), 8);
        assert_eq!(geometry.vertex_count(), 24);
        assert!(!geometry.is_indexed());
        assert!(geometry.validate().is_ok());

        for p in geometry.attribute(POSITION).unwrap().values().chunks_exact(3) {
            let length = Vec3::new(p[0], p[1], p[2]).norm();
            assert!((length - 2.0).abs() < 1e-5);
        }
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 4)]
    #[case(2, 16)]
    #[case(3, 64)]
    fn test_single_face_triangle_count(#[case] detail: u32, #[case] expected: usize) {
        let vertices = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        let geometry = polyhedron(&vertices, &[0, 1, 2], 1.0, detail).unwrap();
        assert_eq!(geometry.triangle_count(), expected);
        assert_eq!(geometry.vertex_count(), expected * 3);
    }

    #[test]
    fn test_subdivision_covers_face() {
        // Level-1 subdivision of a flat triangle: four triangles whose
        // corners are the original corners and edge midpoints.
        let mut out = Vec::new();
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(2.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 2.0, 0.0);
        subdivide_face(&a, &b, &c, 2, &mut out);

        assert_eq!(out.len(), 12);
        assert!(out.contains(&a));
        assert!(out.contains(&b));
        assert!(out.contains(&c));
        assert!(out.contains(&Vec3::new(1.0, 0.0, 0.0)));
        assert!(out.contains(&Vec3::new(1.0, 1.0, 0.0)));
        assert!(out.contains(&Vec3::new(0.0, 1.0, 0.0)));

        let area: f32 = out
            .chunks_exact(3)
            .map(|t| (t[1] - t[0]).cross(&(t[2] - t[0])).norm() / 2.0)
            .sum();
        assert!((area - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_pole_takes_centroid_u() {
        let geometry = polyhedron(&OCTAHEDRON_VERTICES, &OCTAHEDRON_INDICES, 2.0, 0).unwrap();
        let u = us(&geometry);

        // Face (+X, +Y, +Z) is emitted as (+Y, +Z, +X); its centroid azimuth
        // is 3π/4.
        assert!((u[0] - 0.875).abs() < 1e-6);
        assert!((u[1] - 0.75).abs() < 1e-6);
        assert_eq!(u[2], 1.0);
    }

    #[test]
    fn test_seam_vertex_moves_for_negative_centroid() {
        let geometry = polyhedron(&OCTAHEDRON_VERTICES, &OCTAHEDRON_INDICES, 2.0, 0).unwrap();
        let u = us(&geometry);

        // Face (+X, -Z, +Y) is emitted as (-Z, +Y, +X) with centroid
        // azimuth -3π/4, so +X drops from the seam at 1 to 0.
        assert!((u[9] - 0.25).abs() < 1e-6);
        assert!((u[10] - 0.125).abs() < 1e-6);
        assert_eq!(u[11], 0.0);
    }

    #[test]
    fn test_correct_seam_shifts_straddling_triangle() {
        let mut uvs = vec![0.96875, 0.3, 0.0625, 0.3, 0.5, 0.6];
        correct_seam(&mut uvs);
        assert_eq!(uvs, vec![0.96875, 0.3, 1.0625, 0.3, 0.5, 0.6]);

        let mut calm = vec![0.3, 0.0, 0.4, 0.0, 0.5, 0.0];
        correct_seam(&mut calm);
        assert_eq!(calm, vec![0.3, 0.0, 0.4, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_correct_seam_is_idempotent() {
        let geometry = polyhedron(&OCTAHEDRON_VERTICES, &OCTAHEDRON_INDICES, 1.0, 3).unwrap();
        let once = geometry.attribute(UV).unwrap().values().to_vec();
        let mut twice = once.clone();
        correct_seam(&mut twice);
        assert_eq!(once, twice);

        let mut synthetic = vec![0.95, 0.0, 0.05, 0.0, 0.15, 1.0, 0.92, 0.1, 0.08, 0.2, 0.5, 0.3];
        correct_seam(&mut synthetic);
        let snapshot = synthetic.clone();
        correct_seam(&mut synthetic);
        assert_eq!(synthetic, snapshot);
    }

    #[test]
    fn test_seam_thresholds() {
        // Tunable: changing these shifts which triangles count as wrapping.
        assert_eq!(SEAM_HIGH_THRESHOLD, 0.9);
        assert_eq!(SEAM_LOW_THRESHOLD, 0.1);
        assert_eq!(SEAM_SHIFT_THRESHOLD, 0.2);
    }

    #[test]
    fn test_zero_vertex_stays_at_origin() {
        let vertices = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let geometry = polyhedron(&vertices, &[0, 1, 2], 5.0, 0).unwrap();
        let positions = geometry.attribute(POSITION).unwrap().values();
        // Emitted as (b, c, a): the origin is the last vertex.
        assert_eq!(&positions[6..9], &[0.0, 0.0, 0.0]);
        assert!((positions[0] - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_normals_point_outward() {
        let geometry = polyhedron(&OCTAHEDRON_VERTICES, &OCTAHEDRON_INDICES, 1.0, 1).unwrap();
        let positions = geometry.attribute(POSITION).unwrap().values();
        let normals = geometry.attribute(NORMAL).unwrap().values();
        for (p, n) in positions.chunks_exact(3).zip(normals.chunks_exact(3)) {
            let p = Vec3::new(p[0], p[1], p[2]);
            let n = Vec3::new(n[0], n[1], n[2]);
            assert!((n.norm() - 1.0).abs() < 1e-5);
            assert!(p.dot(&n) > 0.0);
        }
    }

    #[rstest]
    #[case::ragged_vertices(&[0.0, 1.0], &[0, 0, 0])]
    #[case::ragged_indices(&[0.0, 1.0, 0.0], &[0, 0])]
    fn test_malformed_input(#[case] vertices: &[f32], #[case] indices: &[u32]) {
        assert!(matches!(
            polyhedron(vertices, indices, 1.0, 0),
            Err(GeometryError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        let vertices = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        assert_eq!(
            polyhedron(&vertices, &[0, 1, 3], 1.0, 0),
            Err(GeometryError::IndexOutOfRange {
                index: 3,
                vertex_count: 3,
            })
        );
    }

    #[rstest]
    #[case::shift_overflow(64)]
    #[case::allocation_overflow(31)]
    fn test_detail_too_large(#[case] detail: u32) {
        let vertices = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        assert!(matches!(
            polyhedron(&vertices, &[0, 1, 2], 1.0, detail),
            Err(GeometryError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_tiny_vertex_reaches_radius() {
        let vertices = [1e-25, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        let geometry = polyhedron(&vertices, &[0, 1, 2], 2.0, 0).unwrap();
        for p in geometry.attribute(POSITION).unwrap().values().chunks_exact(3) {
            let length = Vec3::new(p[0], p[1], p[2]).norm();
            assert!((length - 2.0).abs() < 1e-5, "vertex {:?} has length {}", p, length);
        }
    }
}
