//! GPU backend abstraction layer.
//!
//! This module provides a trait-based abstraction over the graphics device,
//! allowing the resource layer to work against different device bindings.
//!
//! # Available Backends
//!
//! - [`DummyBackend`]: in-process software device for tests and headless use
//!
//! # Architecture
//!
//! Each backend implements the [`GpuBackend`] trait, which provides the
//! primitive device operations: object creation and deletion, uploads,
//! shader compilation and introspection, binding state, draws and
//! synchronization. Objects are referred to by small copyable handles; the
//! resource layer in [`crate::resources`], [`crate::program`] and
//! [`crate::framebuffer`] owns them and enforces lifecycles.
//!
//! Creation methods return `None` when the device hands back no object.
//! Methods that can be rejected by the device return
//! `Result<_, GraphicsError>`. Everything else is fire-and-forget and
//! executes in submission order.

pub mod dummy;
mod glsl;

pub use dummy::{DummyBackend, DummyCommand, DummyTextureInfo};

use lumen_core::mesh::PrimitiveTopology;
use lumen_core::sampler::TextureParameters;
use lumen_core::texture::{DataType, PixelFormat};

use crate::device::DeviceCapabilities;
use crate::error::GraphicsError;
use crate::types::{
    AttachmentPoint, BufferBit, BufferTarget, BufferUsageHint, ClearState, ComponentType,
    FramebufferStatus, ImageTarget, ShaderStage, TextureTarget, VariableType, Viewport,
};

/// Handle to a device buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

/// Handle to a device shader stage object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderHandle(pub u32);

/// Handle to a device program object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

/// Handle to a device texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Handle to a device framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferHandle(pub u32);

/// Handle to a device renderbuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderbufferHandle(pub u32);

/// Location of a uniform within a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

/// An active attribute or uniform reported by a linked program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActiveVariable {
    /// Variable name as written in the source.
    pub name: String,
    /// Declared type.
    pub variable_type: VariableType,
    /// Array length, 1 for non-arrays.
    pub size: u32,
}

/// A value written to a uniform location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformData {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Int(i32),
    IntVec2([i32; 2]),
    IntVec3([i32; 3]),
    IntVec4([i32; 4]),
    Mat2([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
    /// Texture unit for a sampler uniform.
    Sampler(u32),
}

impl UniformData {
    /// Check if this value can be written to a uniform of type `ty`.
    pub fn matches(&self, ty: VariableType) -> bool {
        matches!(
            (self, ty),
            (Self::Float(_), VariableType::Float)
                | (Self::Vec2(_), VariableType::FloatVec2)
                | (Self::Vec3(_), VariableType::FloatVec3)
                | (Self::Vec4(_), VariableType::FloatVec4)
                | (Self::Int(_), VariableType::Int | VariableType::Bool)
                | (Self::IntVec2(_), VariableType::IntVec2)
                | (Self::IntVec3(_), VariableType::IntVec3)
                | (Self::IntVec4(_), VariableType::IntVec4)
                | (Self::Mat2(_), VariableType::FloatMat2)
                | (Self::Mat3(_), VariableType::FloatMat3)
                | (Self::Mat4(_), VariableType::FloatMat4)
                | (
                    Self::Sampler(_),
                    VariableType::Sampler2D | VariableType::SamplerCube
                )
        )
    }
}

/// How to read one vertex attribute from a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribPointer {
    /// Source buffer.
    pub buffer: BufferHandle,
    /// Components per vertex (1 to 4).
    pub components: u32,
    /// Type of each component in memory.
    pub component_type: ComponentType,
    /// Map integer components to `[0, 1]` / `[-1, 1]`.
    pub normalized: bool,
    /// Bytes between consecutive vertices, 0 for tightly packed.
    pub stride: u32,
    /// Byte offset of the first component.
    pub offset: u32,
}

/// The elements a draw call consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawRange {
    /// `count` vertices starting at `first`.
    Arrays { first: u32, count: u32 },
    /// `count` `u32` indices read from `buffer` at byte `offset`.
    Indexed {
        buffer: BufferHandle,
        count: u32,
        offset: u32,
    },
}

impl DrawRange {
    /// Number of vertices the draw processes.
    pub fn count(&self) -> u32 {
        match self {
            Self::Arrays { count, .. } | Self::Indexed { count, .. } => *count,
        }
    }
}

/// Image data for one texture image slot.
#[derive(Debug, Clone, Copy)]
pub struct ImageUpload<'a> {
    /// Which image of the texture to define.
    pub target: ImageTarget,
    /// Mip level.
    pub level: u32,
    /// Device-side storage format.
    pub internal_format: PixelFormat,
    /// Channel layout of `data`.
    pub pixel_format: PixelFormat,
    /// Channel type of `data`.
    pub data_type: DataType,
    pub width: u32,
    pub height: u32,
    /// Pixel rows, or `None` to allocate storage only.
    pub data: Option<&'a [u8]>,
}

/// An image bound to a framebuffer slot, as seen by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawAttachment {
    /// A texture image at a mip level.
    Texture {
        texture: TextureHandle,
        target: ImageTarget,
        level: u32,
    },
    /// A renderbuffer.
    Renderbuffer(RenderbufferHandle),
}

/// GPU backend trait for abstracting the graphics device.
pub trait GpuBackend: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Limits and optional features of the device.
    fn capabilities(&self) -> DeviceCapabilities;

    // --- Buffers ---

    /// Create a buffer object.
    fn create_buffer(&self) -> Option<BufferHandle>;

    /// Allocate `data.len()` bytes for `buffer` and fill them.
    fn buffer_data(
        &self,
        buffer: BufferHandle,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsageHint,
    );

    /// Delete a buffer object.
    fn delete_buffer(&self, buffer: BufferHandle);

    // --- Shaders and programs ---

    /// Create a shader object for `stage`.
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderHandle>;

    /// Compile `source` into `shader`. Returns the info log on failure.
    fn compile_shader(&self, shader: ShaderHandle, source: &str) -> Result<(), String>;

    /// Delete a shader object.
    fn delete_shader(&self, shader: ShaderHandle);

    /// Create a program object.
    fn create_program(&self) -> Option<ProgramHandle>;

    /// Attach both stages to `program` and link. Returns the info log on failure.
    fn link_program(
        &self,
        program: ProgramHandle,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<(), String>;

    /// Delete a program object.
    fn delete_program(&self, program: ProgramHandle);

    /// Number of active attributes in a linked program.
    fn active_attribute_count(&self, program: ProgramHandle) -> u32;

    /// Active attribute `index` of a linked program.
    fn active_attribute(&self, program: ProgramHandle, index: u32) -> Option<ActiveVariable>;

    /// Binding slot of attribute `name`.
    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Number of active uniforms in a linked program.
    fn active_uniform_count(&self, program: ProgramHandle) -> u32;

    /// Active uniform `index` of a linked program.
    fn active_uniform(&self, program: ProgramHandle, index: u32) -> Option<ActiveVariable>;

    /// Location of uniform `name`.
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Make `program` current, or clear the current program.
    fn use_program(&self, program: Option<ProgramHandle>);

    /// Write a uniform of the current program.
    fn set_uniform(&self, location: UniformLocation, value: UniformData);

    /// Enable attribute slot `location` and point it at a buffer region.
    fn bind_attribute(&self, location: u32, pointer: VertexAttribPointer);

    // --- Textures ---

    /// Create a texture object.
    fn create_texture(&self) -> Option<TextureHandle>;

    /// Define one image of `texture` (allocating storage).
    ///
    /// # Errors
    ///
    /// [`GraphicsError::FormatUnsupported`] when the device rejects the
    /// format combination.
    fn upload_image(&self, texture: TextureHandle, upload: &ImageUpload<'_>)
        -> Result<(), GraphicsError>;

    /// Replace the contents of level 0 of an already defined image.
    fn update_image(&self, texture: TextureHandle, target: ImageTarget, data: &[u8]);

    /// Apply sampling parameters.
    fn set_texture_parameters(
        &self,
        texture: TextureHandle,
        target: TextureTarget,
        params: &TextureParameters,
    );

    /// Generate the full mip chain from level 0.
    fn generate_mipmaps(&self, texture: TextureHandle, target: TextureTarget)
        -> Result<(), GraphicsError>;

    /// Bind `texture` to texture unit `unit`.
    fn bind_texture(&self, unit: u32, target: TextureTarget, texture: Option<TextureHandle>);

    /// Delete a texture object.
    fn delete_texture(&self, texture: TextureHandle);

    // --- Framebuffers ---

    /// Create a framebuffer object.
    fn create_framebuffer(&self) -> Option<FramebufferHandle>;

    /// Create a renderbuffer object.
    fn create_renderbuffer(&self) -> Option<RenderbufferHandle>;

    /// Allocate renderbuffer storage.
    fn renderbuffer_storage(
        &self,
        renderbuffer: RenderbufferHandle,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<(), GraphicsError>;

    /// Bind (`Some`) or clear (`None`) a framebuffer slot.
    fn attach(
        &self,
        framebuffer: FramebufferHandle,
        point: AttachmentPoint,
        attachment: Option<RawAttachment>,
    );

    /// Completeness of a framebuffer's current attachments.
    fn check_framebuffer_status(&self, framebuffer: FramebufferHandle) -> FramebufferStatus;

    /// Make a framebuffer the draw target, or the canvas when `None`.
    fn bind_framebuffer(&self, framebuffer: Option<FramebufferHandle>);

    /// Set the viewport of the current draw target.
    fn set_viewport(&self, viewport: Viewport);

    /// Clear buffers of the current draw target.
    fn clear(&self, mask: BufferBit, state: &ClearState);

    /// Draw with the current program and attribute bindings.
    fn draw(&self, topology: PrimitiveTopology, range: DrawRange);

    /// Delete a framebuffer object.
    fn delete_framebuffer(&self, framebuffer: FramebufferHandle);

    /// Delete a renderbuffer object.
    fn delete_renderbuffer(&self, renderbuffer: RenderbufferHandle);

    // --- Synchronization ---

    /// Submit pending commands.
    fn flush(&self);

    /// Block until every submitted command has completed.
    fn finish(&self);
}
