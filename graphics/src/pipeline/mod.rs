//! Render-to-texture pipelines.
//!
//! Pipelines are multi-step device procedures that create transient
//! resources, render with them and release them before returning:
//!
//! ```text
//!  equirectangular CpuTexture
//!            │  upload (wrap S repeat, wrap T clamp, linear)
//!            ▼
//!     source Texture ──► cube face program ──► framebuffer ──► cube Texture
//!                          (one pass quad draw per face, faceIndex 0..6)
//! ```
//!
//! - [`equirect`] - equirectangular image to cube map

pub mod equirect;

pub use equirect::{
    convert_equirectangular_to_cube, convert_equirectangular_to_cube_with,
    CubeConversionOptions,
};
