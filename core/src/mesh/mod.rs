//! CPU-side geometry and generators.
//!
//! This module provides device-agnostic geometry data:
//!
//! - [`Geometry`] - named per-vertex attributes plus optional indices
//! - [`compute_vertex_normals`] - face-normal averaging
//! - [`polyhedron`] - subdivided, sphere-projected, UV-mapped polyhedra
//! - [`generators`] - preset solids and the full-screen pass quad
//!
//! These types are re-exported by `lumen-graphics`, which uploads them
//! to device buffers.

mod geometry;
pub mod generators;
mod normals;
mod polyhedron;

pub use geometry::{
    AttributeData, Geometry, GeometryError, PrimitiveTopology, NORMAL, POSITION, UV,
};
pub use normals::compute_vertex_normals;
pub use polyhedron::{
    correct_seam, polyhedron, SEAM_HIGH_THRESHOLD, SEAM_LOW_THRESHOLD, SEAM_SHIFT_THRESHOLD,
};
