//! # Lumen Core
//!
//! Device-free building blocks shared by the Lumen renderer:
//!
//! - [`math`] - vector aliases and spherical-coordinate helpers
//! - [`mesh`] - named-attribute [`Geometry`](mesh::Geometry) and the
//!   polyhedron subdivision generator
//! - [`sampler`] - texture sampling parameters
//! - [`texture`] - pixel formats, images and texture sources

pub mod math;
pub mod mesh;
pub mod sampler;
pub mod texture;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core library version.
pub fn init() {
    log::info!("Lumen Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
