//! CPU-side texture types.
//!
//! Provides [`CpuTexture`] and [`CpuCubeTexture`] for describing textures
//! before upload, the [`PixelFormat`] and [`DataType`] enums shared between
//! CPU and device code, and [`TextureSource`] for textures that are
//! refreshed every frame.

mod cpu;
mod source;
mod types;

pub use cpu::{CpuCubeTexture, CpuTexture, Image};
pub use source::{FrameQueue, FrameSource, TextureSource};
pub use types::{bytes_per_pixel, CubeFace, DataType, PixelFormat};
