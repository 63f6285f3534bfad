//! Dummy GPU backend for testing and development.
//!
//! This backend performs no rendering, but it keeps enough bookkeeping to
//! behave like a strict device: objects live in tables keyed by handle,
//! shader sources are scanned for their interface, format combinations are
//! checked against the capabilities, and every texture image tracks whether
//! it holds defined contents ("populated"). All commands are recorded in
//! submission order so tests can assert on protocol ordering.

use std::collections::{BTreeMap, HashMap, HashSet};

use lumen_core::mesh::PrimitiveTopology;
use lumen_core::sampler::TextureParameters;
use lumen_core::texture::{DataType, PixelFormat};
use parking_lot::Mutex;

use crate::device::DeviceCapabilities;
use crate::error::GraphicsError;
use crate::types::{
    full_mip_count, mip_size, AttachmentPoint, BufferBit, BufferTarget, BufferUsageHint,
    ClearState, FramebufferStatus, ImageTarget, ShaderStage, TextureTarget, Viewport,
};

use super::glsl::{self, ShaderInterface};
use super::{
    ActiveVariable, BufferHandle, DrawRange, FramebufferHandle, GpuBackend, ImageUpload,
    ProgramHandle, RawAttachment, RenderbufferHandle, ShaderHandle, TextureHandle,
    UniformData, UniformLocation, VertexAttribPointer,
};

/// A command recorded by the [`DummyBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum DummyCommand {
    CreateBuffer(BufferHandle),
    BufferData { buffer: BufferHandle, size: usize },
    DeleteBuffer(BufferHandle),
    CompileShader(ShaderHandle),
    DeleteShader(ShaderHandle),
    LinkProgram(ProgramHandle),
    DeleteProgram(ProgramHandle),
    UseProgram(Option<ProgramHandle>),
    SetUniform { location: UniformLocation, value: UniformData },
    BindAttribute { location: u32, pointer: VertexAttribPointer },
    CreateTexture(TextureHandle),
    UploadImage { texture: TextureHandle, target: ImageTarget, level: u32 },
    UpdateImage { texture: TextureHandle, target: ImageTarget },
    SetTextureParameters {
        texture: TextureHandle,
        params: TextureParameters,
    },
    GenerateMipmaps(TextureHandle),
    BindTexture { unit: u32, texture: Option<TextureHandle> },
    DeleteTexture(TextureHandle),
    CreateFramebuffer(FramebufferHandle),
    CreateRenderbuffer(RenderbufferHandle),
    RenderbufferStorage(RenderbufferHandle),
    Attach {
        framebuffer: FramebufferHandle,
        point: AttachmentPoint,
        attachment: Option<RawAttachment>,
    },
    BindFramebuffer(Option<FramebufferHandle>),
    SetViewport(Viewport),
    Clear(BufferBit),
    Draw {
        framebuffer: Option<FramebufferHandle>,
        program: Option<ProgramHandle>,
        topology: PrimitiveTopology,
        count: u32,
    },
    DeleteFramebuffer(FramebufferHandle),
    DeleteRenderbuffer(RenderbufferHandle),
    Flush,
    Finish,
}

/// Snapshot of a dummy texture's storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyTextureInfo {
    /// Kind, once the first image was defined.
    pub target: Option<TextureTarget>,
    /// Level-0 width.
    pub width: u32,
    /// Level-0 height.
    pub height: u32,
    /// Storage format, once the first image was defined.
    pub internal_format: Option<PixelFormat>,
    /// Number of defined mip levels.
    pub levels: u32,
    /// Number of level-0 images with defined contents.
    pub populated_images: usize,
}

#[derive(Debug)]
struct DummyBuffer {
    data: Vec<u8>,
}

#[derive(Debug)]
struct DummyShader {
    stage: ShaderStage,
    interface: Option<ShaderInterface>,
}

#[derive(Debug, Default)]
struct DummyProgram {
    attributes: Vec<ActiveVariable>,
    uniforms: Vec<ActiveVariable>,
    linked: bool,
}

#[derive(Debug, Default)]
struct DummyTexture {
    target: Option<TextureTarget>,
    width: u32,
    height: u32,
    internal_format: Option<PixelFormat>,
    levels: u32,
    /// (image index, level) pairs with allocated storage.
    defined: HashSet<(usize, u32)>,
    /// (image index, level) pairs with defined contents.
    populated: HashSet<(usize, u32)>,
    params: Option<TextureParameters>,
}

#[derive(Debug, Default)]
struct DummyRenderbuffer {
    storage: Option<(PixelFormat, u32, u32)>,
}

#[derive(Debug, Default)]
struct DummyFramebuffer {
    attachments: BTreeMap<AttachmentPoint, RawAttachment>,
}

#[derive(Debug, Default)]
struct DummyState {
    next_id: u32,
    buffers: HashMap<u32, DummyBuffer>,
    shaders: HashMap<u32, DummyShader>,
    programs: HashMap<u32, DummyProgram>,
    textures: HashMap<u32, DummyTexture>,
    framebuffers: HashMap<u32, DummyFramebuffer>,
    renderbuffers: HashMap<u32, DummyRenderbuffer>,
    current_program: Option<ProgramHandle>,
    bound_framebuffer: Option<FramebufferHandle>,
    viewport: Viewport,
    uniform_values: HashMap<(u32, u32), UniformData>,
    attribute_bindings: BTreeMap<u32, VertexAttribPointer>,
    texture_units: BTreeMap<u32, TextureHandle>,
    commands: Vec<DummyCommand>,
    /// Remaining framebuffer checks before every check reports `Unsupported`.
    checks_until_failure: Option<usize>,
    introspection_queries: usize,
}

impl DummyState {
    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, command: DummyCommand) {
        log::trace!("DummyBackend: {:?}", command);
        self.commands.push(command);
    }

    /// Mark the color attachments of the bound framebuffer as populated.
    fn populate_color_attachments(&mut self) {
        let Some(framebuffer) = self.bound_framebuffer else {
            return;
        };
        let Some(fb) = self.framebuffers.get(&framebuffer.0) else {
            return;
        };
        let targets: Vec<_> = fb
            .attachments
            .iter()
            .filter(|(point, _)| point.is_color())
            .filter_map(|(_, attachment)| match attachment {
                RawAttachment::Texture {
                    texture,
                    target,
                    level,
                } => Some((texture.0, target.index(), *level)),
                RawAttachment::Renderbuffer(_) => None,
            })
            .collect();
        for (texture, index, level) in targets {
            if let Some(tex) = self.textures.get_mut(&texture) {
                if tex.defined.contains(&(index, level)) {
                    tex.populated.insert((index, level));
                }
            }
        }
    }

    fn attachment_status(
        &self,
        point: AttachmentPoint,
        attachment: &RawAttachment,
    ) -> Result<(u32, u32), FramebufferStatus> {
        let (size, format) = match attachment {
            RawAttachment::Texture {
                texture,
                target,
                level,
            } => {
                let tex = self
                    .textures
                    .get(&texture.0)
                    .ok_or(FramebufferStatus::IncompleteAttachment)?;
                if tex.target != Some(target.texture_target())
                    || !tex.defined.contains(&(target.index(), *level))
                {
                    return Err(FramebufferStatus::IncompleteAttachment);
                }
                (
                    mip_size(tex.width, tex.height, *level),
                    tex.internal_format,
                )
            }
            RawAttachment::Renderbuffer(renderbuffer) => {
                let (format, width, height) = self
                    .renderbuffers
                    .get(&renderbuffer.0)
                    .and_then(|rb| rb.storage)
                    .ok_or(FramebufferStatus::IncompleteAttachment)?;
                ((width, height), Some(format))
            }
        };

        let format = format.ok_or(FramebufferStatus::IncompleteAttachment)?;
        let compatible = match point {
            AttachmentPoint::Color(_) => format.is_color_renderable(),
            AttachmentPoint::Depth => format == PixelFormat::DepthComponent,
            AttachmentPoint::Stencil | AttachmentPoint::DepthStencil => {
                format == PixelFormat::DepthStencil
            }
        };
        if !compatible {
            return Err(FramebufferStatus::IncompleteAttachment);
        }
        Ok(size)
    }

    fn framebuffer_status(&self, framebuffer: FramebufferHandle) -> FramebufferStatus {
        let Some(fb) = self.framebuffers.get(&framebuffer.0) else {
            return FramebufferStatus::IncompleteAttachment;
        };
        if fb.attachments.is_empty() {
            return FramebufferStatus::IncompleteMissingAttachment;
        }

        let mut expected = None;
        for (point, attachment) in &fb.attachments {
            let size = match self.attachment_status(*point, attachment) {
                Ok(size) => size,
                Err(status) => return status,
            };
            match expected {
                None => expected = Some(size),
                Some(expected) if expected != size => {
                    return FramebufferStatus::IncompleteDimensions;
                }
                Some(_) => {}
            }
        }
        FramebufferStatus::Complete
    }
}

/// Dummy GPU backend.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lumen_graphics::backend::{DummyBackend, GpuBackend};
///
/// let backend = Arc::new(DummyBackend::new());
/// let buffer = backend.create_buffer().unwrap();
/// assert_eq!(backend.live_object_count(), 1);
/// backend.delete_buffer(buffer);
/// assert_eq!(backend.live_object_count(), 0);
/// ```
#[derive(Debug)]
pub struct DummyBackend {
    capabilities: DeviceCapabilities,
    state: Mutex<DummyState>,
}

impl DummyBackend {
    /// Create a new dummy backend with default capabilities.
    pub fn new() -> Self {
        Self::with_capabilities(DeviceCapabilities::default())
    }

    /// Create a dummy backend reporting `capabilities`.
    pub fn with_capabilities(capabilities: DeviceCapabilities) -> Self {
        Self {
            capabilities,
            state: Mutex::new(DummyState::default()),
        }
    }

    /// All commands recorded so far, in submission order.
    pub fn commands(&self) -> Vec<DummyCommand> {
        self.state.lock().commands.clone()
    }

    /// Forget recorded commands.
    pub fn clear_commands(&self) {
        self.state.lock().commands.clear();
    }

    /// Total number of live device objects of every kind.
    pub fn live_object_count(&self) -> usize {
        let state = self.state.lock();
        state.buffers.len()
            + state.shaders.len()
            + state.programs.len()
            + state.textures.len()
            + state.framebuffers.len()
            + state.renderbuffers.len()
    }

    /// Storage snapshot of a texture.
    pub fn texture_info(&self, texture: TextureHandle) -> Option<DummyTextureInfo> {
        let state = self.state.lock();
        let tex = state.textures.get(&texture.0)?;
        let image_count = tex.target.map(|t| t.image_count()).unwrap_or(0);
        Some(DummyTextureInfo {
            target: tex.target,
            width: tex.width,
            height: tex.height,
            internal_format: tex.internal_format,
            levels: tex.levels,
            populated_images: (0..image_count)
                .filter(|i| tex.populated.contains(&(*i, 0)))
                .count(),
        })
    }

    /// Check if an image of `texture` holds defined contents.
    pub fn is_populated(&self, texture: TextureHandle, target: ImageTarget, level: u32) -> bool {
        self.state
            .lock()
            .textures
            .get(&texture.0)
            .is_some_and(|tex| tex.populated.contains(&(target.index(), level)))
    }

    /// Sampling parameters last applied to `texture`.
    pub fn texture_parameters(&self, texture: TextureHandle) -> Option<TextureParameters> {
        self.state.lock().textures.get(&texture.0)?.params
    }

    /// Contents of a buffer.
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state
            .lock()
            .buffers
            .get(&buffer.0)
            .map(|b| b.data.clone())
    }

    /// Last value written to uniform `name` of `program`.
    pub fn uniform_value(&self, program: ProgramHandle, name: &str) -> Option<UniformData> {
        let state = self.state.lock();
        let index = state
            .programs
            .get(&program.0)?
            .uniforms
            .iter()
            .position(|u| u.name == name)?;
        state
            .uniform_values
            .get(&(program.0, index as u32))
            .copied()
    }

    /// Current pointer for attribute slot `location`.
    pub fn attribute_binding(&self, location: u32) -> Option<VertexAttribPointer> {
        self.state.lock().attribute_bindings.get(&location).copied()
    }

    /// Texture bound to unit `unit`.
    pub fn bound_texture(&self, unit: u32) -> Option<TextureHandle> {
        self.state.lock().texture_units.get(&unit).copied()
    }

    /// The current program.
    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.state.lock().current_program
    }

    /// The current draw framebuffer (`None` is the canvas).
    pub fn bound_framebuffer(&self) -> Option<FramebufferHandle> {
        self.state.lock().bound_framebuffer
    }

    /// The current viewport.
    pub fn viewport(&self) -> Viewport {
        self.state.lock().viewport
    }

    /// Number of attribute and uniform introspection queries answered so far.
    pub fn introspection_query_count(&self) -> usize {
        self.state.lock().introspection_queries
    }

    /// Let the next `checks` framebuffer checks behave normally, then report
    /// every later check as [`FramebufferStatus::Unsupported`].
    pub fn fail_framebuffer_checks_after(&self, checks: usize) {
        self.state.lock().checks_until_failure = Some(checks);
    }

    /// Stop injecting framebuffer check failures.
    pub fn clear_failure_injection(&self) {
        self.state.lock().checks_until_failure = None;
    }

    fn check_format(&self, upload: &ImageUpload<'_>) -> Result<(), GraphicsError> {
        let unsupported = || GraphicsError::FormatUnsupported {
            internal_format: upload.internal_format,
            pixel_format: upload.pixel_format,
            data_type: upload.data_type,
        };
        let caps = &self.capabilities;

        if upload.internal_format != upload.pixel_format {
            return Err(unsupported());
        }
        let supported = match upload.pixel_format {
            PixelFormat::DepthComponent => {
                caps.depth_textures
                    && upload.target == ImageTarget::Texture2D
                    && matches!(
                        upload.data_type,
                        DataType::UnsignedShort | DataType::UnsignedInt
                    )
            }
            PixelFormat::DepthStencil => {
                caps.depth_textures
                    && upload.target == ImageTarget::Texture2D
                    && upload.data_type == DataType::UnsignedInt24_8
            }
            _ => match upload.data_type {
                DataType::UnsignedByte => true,
                DataType::HalfFloat | DataType::Float => caps.float_textures,
                _ => false,
            },
        };
        if supported {
            Ok(())
        } else {
            Err(unsupported())
        }
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(DummyBackend: Send, Sync);

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy"
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn create_buffer(&self) -> Option<BufferHandle> {
        let mut state = self.state.lock();
        let handle = BufferHandle(state.allocate_id());
        state.buffers.insert(handle.0, DummyBuffer { data: Vec::new() });
        state.record(DummyCommand::CreateBuffer(handle));
        Some(handle)
    }

    fn buffer_data(
        &self,
        buffer: BufferHandle,
        _target: BufferTarget,
        data: &[u8],
        _usage: BufferUsageHint,
    ) {
        let mut state = self.state.lock();
        match state.buffers.get_mut(&buffer.0) {
            Some(b) => b.data = data.to_vec(),
            None => log::warn!("DummyBackend: buffer_data on unknown buffer {:?}", buffer),
        }
        state.record(DummyCommand::BufferData {
            buffer,
            size: data.len(),
        });
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.lock();
        if state.buffers.remove(&buffer.0).is_none() {
            log::warn!("DummyBackend: delete of unknown buffer {:?}", buffer);
        }
        state.attribute_bindings.retain(|_, p| p.buffer != buffer);
        state.record(DummyCommand::DeleteBuffer(buffer));
    }

    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderHandle> {
        let mut state = self.state.lock();
        let handle = ShaderHandle(state.allocate_id());
        state.shaders.insert(
            handle.0,
            DummyShader {
                stage,
                interface: None,
            },
        );
        Some(handle)
    }

    fn compile_shader(&self, shader: ShaderHandle, source: &str) -> Result<(), String> {
        let mut state = self.state.lock();
        state.record(DummyCommand::CompileShader(shader));
        let entry = state
            .shaders
            .get_mut(&shader.0)
            .ok_or_else(|| format!("ERROR: unknown shader object {}", shader.0))?;
        let interface = glsl::scan(entry.stage, source)?;
        entry.interface = Some(interface);
        Ok(())
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.lock();
        if state.shaders.remove(&shader.0).is_none() {
            log::warn!("DummyBackend: delete of unknown shader {:?}", shader);
        }
        state.record(DummyCommand::DeleteShader(shader));
    }

    fn create_program(&self) -> Option<ProgramHandle> {
        let mut state = self.state.lock();
        let handle = ProgramHandle(state.allocate_id());
        state.programs.insert(handle.0, DummyProgram::default());
        Some(handle)
    }

    fn link_program(
        &self,
        program: ProgramHandle,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<(), String> {
        let mut state = self.state.lock();
        state.record(DummyCommand::LinkProgram(program));

        let stage_interface = |handle: ShaderHandle, stage: ShaderStage| {
            let shader = state
                .shaders
                .get(&handle.0)
                .ok_or_else(|| format!("ERROR: unknown shader object {}", handle.0))?;
            if shader.stage != stage {
                return Err(format!("ERROR: shader {} is not a {} shader", handle.0, stage));
            }
            shader
                .interface
                .clone()
                .ok_or_else(|| format!("ERROR: {} shader {} is not compiled", stage, handle.0))
        };
        let vs = stage_interface(vertex, ShaderStage::Vertex)?;
        let fs = stage_interface(fragment, ShaderStage::Fragment)?;

        for input in fs.inputs.iter().filter(|i| i.active) {
            match vs.outputs.iter().find(|o| o.name == input.name) {
                None => {
                    return Err(format!(
                        "ERROR: Varying '{}' is read by the fragment shader but not written by the vertex shader",
                        input.name
                    ));
                }
                Some(output) if output.ty != input.ty => {
                    return Err(format!(
                        "ERROR: Types of varying '{}' differ between shader stages",
                        input.name
                    ));
                }
                Some(_) => {}
            }
        }

        let mut uniforms: Vec<glsl::Declaration> = Vec::new();
        for decl in vs.uniforms.iter().chain(fs.uniforms.iter()) {
            match uniforms.iter_mut().find(|u| u.name == decl.name) {
                Some(existing) if existing.ty != decl.ty || existing.size != decl.size => {
                    return Err(format!(
                        "ERROR: Uniform '{}' has different types in the vertex and fragment shaders",
                        decl.name
                    ));
                }
                Some(existing) => existing.active |= decl.active,
                None => uniforms.push(decl.clone()),
            }
        }

        let to_active = |d: &glsl::Declaration| ActiveVariable {
            name: d.name.clone(),
            variable_type: d.ty,
            size: d.size,
        };
        let linked = DummyProgram {
            attributes: vs.attributes.iter().filter(|a| a.active).map(to_active).collect(),
            uniforms: uniforms.iter().filter(|u| u.active).map(to_active).collect(),
            linked: true,
        };

        match state.programs.get_mut(&program.0) {
            Some(entry) => {
                *entry = linked;
                Ok(())
            }
            None => Err(format!("ERROR: unknown program object {}", program.0)),
        }
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state.lock();
        if state.programs.remove(&program.0).is_none() {
            log::warn!("DummyBackend: delete of unknown program {:?}", program);
        }
        state.uniform_values.retain(|(p, _), _| *p != program.0);
        if state.current_program == Some(program) {
            state.current_program = None;
        }
        state.record(DummyCommand::DeleteProgram(program));
    }

    fn active_attribute_count(&self, program: ProgramHandle) -> u32 {
        let mut state = self.state.lock();
        state.introspection_queries += 1;
        state
            .programs
            .get(&program.0)
            .map_or(0, |p| p.attributes.len() as u32)
    }

    fn active_attribute(&self, program: ProgramHandle, index: u32) -> Option<ActiveVariable> {
        let mut state = self.state.lock();
        state.introspection_queries += 1;
        state
            .programs
            .get(&program.0)?
            .attributes
            .get(index as usize)
            .cloned()
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let mut state = self.state.lock();
        state.introspection_queries += 1;
        state
            .programs
            .get(&program.0)?
            .attributes
            .iter()
            .position(|a| a.name == name)
            .map(|i| i as u32)
    }

    fn active_uniform_count(&self, program: ProgramHandle) -> u32 {
        let mut state = self.state.lock();
        state.introspection_queries += 1;
        state
            .programs
            .get(&program.0)
            .map_or(0, |p| p.uniforms.len() as u32)
    }

    fn active_uniform(&self, program: ProgramHandle, index: u32) -> Option<ActiveVariable> {
        let mut state = self.state.lock();
        state.introspection_queries += 1;
        state
            .programs
            .get(&program.0)?
            .uniforms
            .get(index as usize)
            .cloned()
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let name = name.strip_suffix("[0]").unwrap_or(name);
        let mut state = self.state.lock();
        state.introspection_queries += 1;
        state
            .programs
            .get(&program.0)?
            .uniforms
            .iter()
            .position(|u| u.name == name)
            .map(|i| UniformLocation(i as u32))
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        let mut state = self.state.lock();
        if let Some(p) = program {
            if !state.programs.get(&p.0).is_some_and(|p| p.linked) {
                log::warn!("DummyBackend: use of unlinked program {:?}", p);
            }
        }
        state.current_program = program;
        state.record(DummyCommand::UseProgram(program));
    }

    fn set_uniform(&self, location: UniformLocation, value: UniformData) {
        let mut state = self.state.lock();
        match state.current_program {
            Some(program) => {
                state.uniform_values.insert((program.0, location.0), value);
            }
            None => log::warn!("DummyBackend: set_uniform with no current program"),
        }
        state.record(DummyCommand::SetUniform { location, value });
    }

    fn bind_attribute(&self, location: u32, pointer: VertexAttribPointer) {
        let mut state = self.state.lock();
        state.attribute_bindings.insert(location, pointer);
        state.record(DummyCommand::BindAttribute { location, pointer });
    }

    fn create_texture(&self) -> Option<TextureHandle> {
        let mut state = self.state.lock();
        let handle = TextureHandle(state.allocate_id());
        state.textures.insert(handle.0, DummyTexture::default());
        state.record(DummyCommand::CreateTexture(handle));
        Some(handle)
    }

    fn upload_image(
        &self,
        texture: TextureHandle,
        upload: &ImageUpload<'_>,
    ) -> Result<(), GraphicsError> {
        self.check_format(upload)?;

        let mut state = self.state.lock();
        let tex = state.textures.get_mut(&texture.0).ok_or_else(|| {
            GraphicsError::InvalidArgument(format!("unknown texture {:?}", texture))
        })?;

        let target = upload.target.texture_target();
        if tex.target.is_some_and(|t| t != target) {
            return Err(GraphicsError::InvalidArgument(format!(
                "texture {:?} is a {:?}, not a {:?}",
                texture, tex.target, target
            )));
        }
        tex.target = Some(target);
        tex.internal_format = Some(upload.internal_format);
        if upload.level == 0 {
            tex.width = upload.width;
            tex.height = upload.height;
        }
        tex.levels = tex.levels.max(upload.level + 1);

        let key = (upload.target.index(), upload.level);
        tex.defined.insert(key);
        if upload.data.is_some() {
            tex.populated.insert(key);
        } else {
            tex.populated.remove(&key);
        }

        state.record(DummyCommand::UploadImage {
            texture,
            target: upload.target,
            level: upload.level,
        });
        Ok(())
    }

    fn update_image(&self, texture: TextureHandle, target: ImageTarget, _data: &[u8]) {
        let mut state = self.state.lock();
        match state.textures.get_mut(&texture.0) {
            Some(tex) if tex.defined.contains(&(target.index(), 0)) => {
                tex.populated.insert((target.index(), 0));
            }
            _ => log::warn!(
                "DummyBackend: update of undefined image {:?} of {:?}",
                target,
                texture
            ),
        }
        state.record(DummyCommand::UpdateImage { texture, target });
    }

    fn set_texture_parameters(
        &self,
        texture: TextureHandle,
        _target: TextureTarget,
        params: &TextureParameters,
    ) {
        let mut state = self.state.lock();
        if let Some(tex) = state.textures.get_mut(&texture.0) {
            tex.params = Some(*params);
        }
        state.record(DummyCommand::SetTextureParameters {
            texture,
            params: *params,
        });
    }

    fn generate_mipmaps(
        &self,
        texture: TextureHandle,
        target: TextureTarget,
    ) -> Result<(), GraphicsError> {
        let mut state = self.state.lock();
        let tex = state.textures.get_mut(&texture.0).ok_or_else(|| {
            GraphicsError::InvalidArgument(format!("unknown texture {:?}", texture))
        })?;

        let images = target.image_count();
        if tex.target != Some(target) || (0..images).any(|i| !tex.defined.contains(&(i, 0))) {
            return Err(GraphicsError::InvalidState(format!(
                "texture {:?} has undefined level-0 images",
                texture
            )));
        }

        tex.levels = full_mip_count(tex.width, tex.height);
        for image in 0..images {
            let populated = tex.populated.contains(&(image, 0));
            for level in 1..tex.levels {
                tex.defined.insert((image, level));
                if populated {
                    tex.populated.insert((image, level));
                }
            }
        }

        state.record(DummyCommand::GenerateMipmaps(texture));
        Ok(())
    }

    fn bind_texture(&self, unit: u32, _target: TextureTarget, texture: Option<TextureHandle>) {
        let mut state = self.state.lock();
        match texture {
            Some(t) => {
                state.texture_units.insert(unit, t);
            }
            None => {
                state.texture_units.remove(&unit);
            }
        }
        state.record(DummyCommand::BindTexture { unit, texture });
    }

    fn delete_texture(&self, texture: TextureHandle) {
        let mut state = self.state.lock();
        if state.textures.remove(&texture.0).is_none() {
            log::warn!("DummyBackend: delete of unknown texture {:?}", texture);
        }
        state.texture_units.retain(|_, t| *t != texture);
        state.record(DummyCommand::DeleteTexture(texture));
    }

    fn create_framebuffer(&self) -> Option<FramebufferHandle> {
        let mut state = self.state.lock();
        let handle = FramebufferHandle(state.allocate_id());
        state
            .framebuffers
            .insert(handle.0, DummyFramebuffer::default());
        state.record(DummyCommand::CreateFramebuffer(handle));
        Some(handle)
    }

    fn create_renderbuffer(&self) -> Option<RenderbufferHandle> {
        let mut state = self.state.lock();
        let handle = RenderbufferHandle(state.allocate_id());
        state
            .renderbuffers
            .insert(handle.0, DummyRenderbuffer::default());
        state.record(DummyCommand::CreateRenderbuffer(handle));
        Some(handle)
    }

    fn renderbuffer_storage(
        &self,
        renderbuffer: RenderbufferHandle,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<(), GraphicsError> {
        if !(format.is_color_renderable() || format.is_depth()) {
            return Err(GraphicsError::FormatUnsupported {
                internal_format: format,
                pixel_format: format,
                data_type: DataType::UnsignedByte,
            });
        }

        let mut state = self.state.lock();
        let rb = state.renderbuffers.get_mut(&renderbuffer.0).ok_or_else(|| {
            GraphicsError::InvalidArgument(format!("unknown renderbuffer {:?}", renderbuffer))
        })?;
        rb.storage = Some((format, width, height));
        state.record(DummyCommand::RenderbufferStorage(renderbuffer));
        Ok(())
    }

    fn attach(
        &self,
        framebuffer: FramebufferHandle,
        point: AttachmentPoint,
        attachment: Option<RawAttachment>,
    ) {
        let mut state = self.state.lock();
        match state.framebuffers.get_mut(&framebuffer.0) {
            Some(fb) => match attachment {
                Some(a) => {
                    fb.attachments.insert(point, a);
                }
                None => {
                    fb.attachments.remove(&point);
                }
            },
            None => log::warn!("DummyBackend: attach on unknown framebuffer {:?}", framebuffer),
        }
        state.record(DummyCommand::Attach {
            framebuffer,
            point,
            attachment,
        });
    }

    fn check_framebuffer_status(&self, framebuffer: FramebufferHandle) -> FramebufferStatus {
        let mut state = self.state.lock();
        match state.checks_until_failure {
            Some(0) => return FramebufferStatus::Unsupported,
            Some(n) => state.checks_until_failure = Some(n - 1),
            None => {}
        }
        state.framebuffer_status(framebuffer)
    }

    fn bind_framebuffer(&self, framebuffer: Option<FramebufferHandle>) {
        let mut state = self.state.lock();
        state.bound_framebuffer = framebuffer;
        state.record(DummyCommand::BindFramebuffer(framebuffer));
    }

    fn set_viewport(&self, viewport: Viewport) {
        let mut state = self.state.lock();
        state.viewport = viewport;
        state.record(DummyCommand::SetViewport(viewport));
    }

    fn clear(&self, mask: BufferBit, _state: &ClearState) {
        let mut state = self.state.lock();
        if mask.contains(BufferBit::COLOR) {
            state.populate_color_attachments();
        }
        state.record(DummyCommand::Clear(mask));
    }

    fn draw(&self, topology: PrimitiveTopology, range: DrawRange) {
        let mut state = self.state.lock();
        let program = state.current_program;
        if program.is_none() {
            log::warn!("DummyBackend: draw with no current program");
        } else {
            state.populate_color_attachments();
        }
        let framebuffer = state.bound_framebuffer;
        state.record(DummyCommand::Draw {
            framebuffer,
            program,
            topology,
            count: range.count(),
        });
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferHandle) {
        let mut state = self.state.lock();
        if state.framebuffers.remove(&framebuffer.0).is_none() {
            log::warn!("DummyBackend: delete of unknown framebuffer {:?}", framebuffer);
        }
        if state.bound_framebuffer == Some(framebuffer) {
            state.bound_framebuffer = None;
        }
        state.record(DummyCommand::DeleteFramebuffer(framebuffer));
    }

    fn delete_renderbuffer(&self, renderbuffer: RenderbufferHandle) {
        let mut state = self.state.lock();
        if state.renderbuffers.remove(&renderbuffer.0).is_none() {
            log::warn!("DummyBackend: delete of unknown renderbuffer {:?}", renderbuffer);
        }
        state.record(DummyCommand::DeleteRenderbuffer(renderbuffer));
    }

    fn flush(&self) {
        self.state.lock().record(DummyCommand::Flush);
    }

    fn finish(&self) {
        self.state.lock().record(DummyCommand::Finish);
    }
}
