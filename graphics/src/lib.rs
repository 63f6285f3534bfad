//! # Lumen Graphics
//!
//! GPU resource lifecycle and render-to-texture pipelines for Lumen.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`GraphicsDevice`] - Shared device handle with live resource accounting
//! - [`Buffer`], [`Texture`], [`Program`], [`Framebuffer`], [`Renderbuffer`] -
//!   Owned device resources with explicit, idempotent disposal
//! - [`BoundGeometry`] and [`render_geometry`] - Drawing CPU geometry
//! - [`pipeline`] - Equirectangular to cube map conversion
//! - [`GpuBackend`] - Trait for device bindings, with [`DummyBackend`] for
//!   headless use and testing
//!
//! ## Example
//!
//! ```
//! use lumen_graphics::texture::{CpuTexture, Image};
//! use lumen_graphics::{convert_equirectangular_to_cube, Disposable, GraphicsDevice};
//!
//! let device = GraphicsDevice::dummy();
//! let panorama = CpuTexture::new(Image::filled(32, 16, &[255, 255, 255, 255]));
//! let mut cube = convert_equirectangular_to_cube(&device, &panorama, 8, false)?;
//! assert_eq!(cube.width(), 8);
//! cube.dispose();
//! assert_eq!(device.live_resource_count(), 0);
//! # Ok::<(), lumen_graphics::GraphicsError>(())
//! ```

pub mod backend;
pub mod device;
pub mod error;
pub mod framebuffer;
pub mod geometry;
pub mod pipeline;
pub mod program;
pub mod render;
pub mod resources;
pub mod types;

pub use lumen_core::{math, mesh, sampler, texture};

// Re-export main types for convenience
pub use backend::{DummyBackend, DummyCommand, GpuBackend};
pub use device::{DeviceCapabilities, GraphicsDevice};
pub use error::GraphicsError;
pub use framebuffer::{
    AttachmentTarget, CanvasFramebuffer, Framebuffer, FramebufferState, RenderTarget,
    Renderbuffer,
};
pub use geometry::BoundGeometry;
pub use pipeline::{
    convert_equirectangular_to_cube, convert_equirectangular_to_cube_with,
    CubeConversionOptions,
};
pub use program::{
    Program, ProgramAttribute, ProgramUniform, UniformValue, Uniforms, VariableKey,
};
pub use render::render_geometry;
pub use resources::{AttributeBinding, Buffer, Disposable, Texture};
pub use types::{
    AttachmentPoint, BufferBit, BufferTarget, BufferUsageHint, ClearState, ComponentType,
    FramebufferStatus, ImageTarget, ScalarType, ShaderStage, TextureTarget, VariableType,
    Viewport,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// This should be called before using any graphics functionality.
pub fn init() {
    log::info!("Lumen Graphics v{} initialized", VERSION);
}
