//! Geometry generators for common shapes.
//!
//! These produce [`Geometry`] values that can be uploaded to the device via
//! `BoundGeometry::upload`.

use super::geometry::{AttributeData, Geometry, POSITION, UV};
use super::polyhedron::build;

/// Corners of the regular tetrahedron.
pub const TETRAHEDRON_VERTICES: [f32; 12] = [
    1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, -1.0,
];

/// Faces of the regular tetrahedron.
pub const TETRAHEDRON_INDICES: [u32; 12] = [2, 1, 0, 0, 3, 2, 1, 3, 0, 2, 3, 1];

/// Corners of the regular octahedron (the unit axis points).
pub const OCTAHEDRON_VERTICES: [f32; 18] = [
    1.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, -1.0,
];

/// Faces of the regular octahedron.
pub const OCTAHEDRON_INDICES: [u32; 24] = [
    0, 2, 4, 0, 4, 3, 0, 3, 5, 0, 5, 2, 1, 2, 5, 1, 5, 3, 1, 3, 4, 1, 4, 2,
];

/// Golden ratio, used for the icosahedron corners.
const T: f32 = 1.618_034;

/// Corners of the regular icosahedron.
pub const ICOSAHEDRON_VERTICES: [f32; 36] = [
    -1.0, T, 0.0, 1.0, T, 0.0, -1.0, -T, 0.0, 1.0, -T, 0.0, //
    0.0, -1.0, T, 0.0, 1.0, T, 0.0, -1.0, -T, 0.0, 1.0, -T, //
    T, 0.0, -1.0, T, 0.0, 1.0, -T, 0.0, -1.0, -T, 0.0, 1.0,
];

/// Faces of the regular icosahedron.
pub const ICOSAHEDRON_INDICES: [u32; 60] = [
    0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11, 1, 5, 9, 5, 11, 4, 11, 10, 2, 10, 7, 6, 7, 1,
    8, 3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9, 4, 9, 5, 2, 4, 11, 6, 2, 10, 8, 6, 7, 9, 8, 1,
];

/// Subdivision level above which presets clamp, keeping allocation bounded.
pub const MAX_PRESET_DETAIL: u32 = 8;

fn preset(vertices: &[f32], indices: &[u32], radius: f32, detail: u32, label: &str) -> Geometry {
    let detail = if detail > MAX_PRESET_DETAIL {
        log::warn!(
            "{}: detail {} clamped to {}",
            label,
            detail,
            MAX_PRESET_DETAIL
        );
        MAX_PRESET_DETAIL
    } else {
        detail
    };
    build(vertices, indices, radius, 1 << detail).with_label(label)
}

/// Generate a subdivided tetrahedron (4 faces before subdivision).
pub fn tetrahedron(radius: f32, detail: u32) -> Geometry {
    preset(
        &TETRAHEDRON_VERTICES,
        &TETRAHEDRON_INDICES,
        radius,
        detail,
        "tetrahedron",
    )
}

/// Generate a subdivided octahedron (8 faces before subdivision).
pub fn octahedron(radius: f32, detail: u32) -> Geometry {
    preset(
        &OCTAHEDRON_VERTICES,
        &OCTAHEDRON_INDICES,
        radius,
        detail,
        "octahedron",
    )
}

/// Generate a subdivided icosahedron (20 faces before subdivision).
///
/// With `detail` of 2 or more this is a good approximation of a sphere.
pub fn icosahedron(radius: f32, detail: u32) -> Geometry {
    preset(
        &ICOSAHEDRON_VERTICES,
        &ICOSAHEDRON_INDICES,
        radius,
        detail,
        "icosahedron",
    )
}

/// Generate the full-screen quad used by render-to-texture passes.
///
/// Four vertices spanning clip space `[-1, 1]²` at `z = 0`, with `uv`
/// coordinates from `(0, 0)` to `(1, 1)` and two counter-clockwise
/// triangles.
pub fn pass_geometry() -> Geometry {
    let positions = vec![
        -1.0, -1.0, 0.0, //
        1.0, -1.0, 0.0, //
        1.0, 1.0, 0.0, //
        -1.0, 1.0, 0.0,
    ];
    let uvs = vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];

    Geometry::new()
        .with_attribute(POSITION, AttributeData::new(positions, 3))
        .with_attribute(UV, AttributeData::new(uvs, 2))
        .with_indices(vec![0, 1, 2, 0, 2, 3])
        .with_label("pass")
}
