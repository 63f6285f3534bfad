//! Common types shared by the backend and the resource layer.
//!
//! This module contains the enums, flags and small value types that cross
//! the [`GpuBackend`](crate::backend::GpuBackend) boundary.

mod buffer;
mod common;
mod shader;
mod texture;

pub use buffer::{BufferTarget, BufferUsageHint, ComponentType};
pub use common::{BufferBit, ClearState, Viewport};
pub use shader::{ScalarType, ShaderStage, VariableType};
pub use texture::{
    full_mip_count, mip_size, AttachmentPoint, FramebufferStatus, ImageTarget, TextureTarget,
};
