//! Shader programs.
//!
//! A [`Program`] owns a compiled vertex stage, a compiled fragment stage and
//! the linked program object. Active attributes and uniforms are queried
//! once at construction and cached; lookups never go back to the device.
//! Attributes or uniforms the driver optimized out are simply absent, so a
//! [`GraphicsError::NotFound`] from a lookup is a legitimate outcome.

mod uniforms;

pub use uniforms::{UniformValue, Uniforms};

use std::sync::Arc;

use crate::backend::{ProgramHandle, ShaderHandle, UniformData, UniformLocation};
use crate::device::{GraphicsDevice, ResourceKind};
use crate::error::GraphicsError;
use crate::resources::{AttributeBinding, Disposable};
use crate::types::{ScalarType, ShaderStage, TextureTarget, VariableType};

/// Key for attribute and uniform lookups: an introspection index or a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKey<'a> {
    Index(usize),
    Name(&'a str),
}

impl<'a> From<&'a str> for VariableKey<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for VariableKey<'_> {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl std::fmt::Display for VariableKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// An active vertex attribute of a linked program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramAttribute {
    /// Name as declared in the vertex stage.
    pub name: String,
    /// Introspection index.
    pub index: usize,
    /// Binding slot.
    pub location: u32,
    pub variable_type: VariableType,
    /// Components per vertex.
    pub components: u32,
    pub scalar_type: ScalarType,
}

/// An active uniform of a linked program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramUniform {
    pub name: String,
    /// Introspection index.
    pub index: usize,
    pub location: UniformLocation,
    pub variable_type: VariableType,
    /// Array length, 1 for non-arrays.
    pub size: u32,
    /// First texture unit of a sampler uniform.
    pub texture_unit: Option<u32>,
}

/// A linked shader program.
///
/// # Example
///
/// ```
/// use lumen_graphics::{Disposable, GraphicsDevice, Program};
///
/// let device = GraphicsDevice::dummy();
/// let mut program = Program::compile_and_link(
///     &device,
///     "attribute vec3 position;\nvoid main() { gl_Position = vec4(position, 1.0); }",
///     "precision mediump float;\nuniform vec4 color;\nvoid main() { gl_FragColor = color; }",
/// )?;
/// assert_eq!(program.attribute("position")?.components, 3);
/// assert!(program.uniform("missing").is_err());
/// program.dispose();
/// # Ok::<(), lumen_graphics::GraphicsError>(())
/// ```
pub struct Program {
    device: Arc<GraphicsDevice>,
    handle: Option<ProgramHandle>,
    vertex: ShaderHandle,
    fragment: ShaderHandle,
    attributes: Vec<ProgramAttribute>,
    uniforms: Vec<ProgramUniform>,
    label: Option<String>,
}

impl Program {
    /// Compile both stages, link them and cache the program interface.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::CompileError`] or [`GraphicsError::LinkError`] with
    /// the driver's info log. Every device object created along the way is
    /// deleted before the error is returned.
    pub fn compile_and_link(
        device: &Arc<GraphicsDevice>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, GraphicsError> {
        let backend = device.backend();

        let vertex = compile_stage(device, ShaderStage::Vertex, vertex_source)?;
        let fragment = match compile_stage(device, ShaderStage::Fragment, fragment_source) {
            Ok(fragment) => fragment,
            Err(err) => {
                backend.delete_shader(vertex);
                return Err(err);
            }
        };

        let Some(handle) = backend.create_program() else {
            backend.delete_shader(vertex);
            backend.delete_shader(fragment);
            return Err(GraphicsError::ResourceCreationFailed("program".to_string()));
        };
        if let Err(log) = backend.link_program(handle, vertex, fragment) {
            backend.delete_program(handle);
            backend.delete_shader(vertex);
            backend.delete_shader(fragment);
            log::debug!("Program: link failed: {}", log);
            return Err(GraphicsError::LinkError { log });
        }

        let attributes = introspect_attributes(device, handle);
        let uniforms = introspect_uniforms(device, handle);
        device.track_created(ResourceKind::Program);

        log::trace!(
            "GraphicsDevice: created program {:?}, {} attributes, {} uniforms",
            handle,
            attributes.len(),
            uniforms.len()
        );

        Ok(Self {
            device: Arc::clone(device),
            handle: Some(handle),
            vertex,
            fragment,
            attributes,
            uniforms,
            label: None,
        })
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Look up an active attribute by index or name.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::NotFound`] when the program has no such active
    /// attribute, [`GraphicsError::InvalidState`] after disposal.
    pub fn attribute<'k>(
        &self,
        key: impl Into<VariableKey<'k>>,
    ) -> Result<&ProgramAttribute, GraphicsError> {
        self.handle()?;
        let key = key.into();
        let found = match key {
            VariableKey::Index(index) => self.attributes.get(index),
            VariableKey::Name(name) => self.attributes.iter().find(|a| a.name == name),
        };
        found.ok_or_else(|| GraphicsError::NotFound {
            kind: "attribute",
            key: key.to_string(),
        })
    }

    /// Look up an active uniform by index or name.
    ///
    /// # Errors
    ///
    /// Same as [`Program::attribute`].
    pub fn uniform<'k>(
        &self,
        key: impl Into<VariableKey<'k>>,
    ) -> Result<&ProgramUniform, GraphicsError> {
        self.handle()?;
        let key = key.into();
        let found = match key {
            VariableKey::Index(index) => self.uniforms.get(index),
            VariableKey::Name(name) => self.uniforms.iter().find(|u| u.name == name),
        };
        found.ok_or_else(|| GraphicsError::NotFound {
            kind: "uniform",
            key: key.to_string(),
        })
    }

    /// All active attributes, in introspection order.
    pub fn attributes(&self) -> &[ProgramAttribute] {
        &self.attributes
    }

    /// All active uniforms, in introspection order.
    pub fn uniforms(&self) -> &[ProgramUniform] {
        &self.uniforms
    }

    /// Point `attribute`'s slot at `binding` for the next draw.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidState`] when the program or the buffer was
    /// disposed, [`GraphicsError::InvalidArgument`] for a malformed binding.
    pub fn bind_attribute(
        &self,
        attribute: &ProgramAttribute,
        binding: &AttributeBinding<'_>,
    ) -> Result<(), GraphicsError> {
        self.handle()?;
        let pointer = binding.pointer()?;
        if binding.components() != attribute.components {
            log::trace!(
                "Program: attribute {} reads {} components from a {}-component binding",
                attribute.name,
                attribute.components,
                binding.components()
            );
        }
        self.device
            .backend()
            .bind_attribute(attribute.location, pointer);
        Ok(())
    }

    /// Make the program current and apply `uniforms`.
    ///
    /// Values for names the program does not have are skipped. Texture
    /// values are bound to the uniform's texture unit.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidArgument`] when a value does not fit the
    /// uniform's type, [`GraphicsError::InvalidState`] after disposal of the
    /// program or of a texture value.
    pub fn set_uniforms(&self, uniforms: &Uniforms<'_>) -> Result<(), GraphicsError> {
        let handle = self.handle()?;
        let backend = self.device.backend();
        backend.use_program(Some(handle));

        for (name, value) in uniforms.iter() {
            let Some(uniform) = self.uniforms.iter().find(|u| u.name == name) else {
                log::trace!("Program {:?}: no active uniform {}, skipped", handle, name);
                continue;
            };
            let data = self.uniform_data(uniform, value)?;
            backend.set_uniform(uniform.location, data);
        }
        Ok(())
    }

    fn uniform_data(
        &self,
        uniform: &ProgramUniform,
        value: &UniformValue<'_>,
    ) -> Result<UniformData, GraphicsError> {
        let data = match *value {
            UniformValue::Texture(texture) => {
                let expected = match uniform.variable_type {
                    VariableType::Sampler2D => Some(TextureTarget::Texture2D),
                    VariableType::SamplerCube => Some(TextureTarget::CubeMap),
                    _ => None,
                };
                let unit = uniform.texture_unit.unwrap_or(0);
                if expected != Some(texture.target()) {
                    return Err(GraphicsError::InvalidArgument(format!(
                        "uniform {} is {:?}, cannot sample a {:?} texture",
                        uniform.name,
                        uniform.variable_type,
                        texture.target()
                    )));
                }
                texture.bind(unit)?;
                UniformData::Sampler(unit)
            }
            UniformValue::Float(v) => UniformData::Float(v),
            UniformValue::Vec2(v) => UniformData::Vec2(v),
            UniformValue::Vec3(v) => UniformData::Vec3(v),
            UniformValue::Vec4(v) => UniformData::Vec4(v),
            UniformValue::Int(v) => UniformData::Int(v),
            UniformValue::IntVec2(v) => UniformData::IntVec2(v),
            UniformValue::IntVec3(v) => UniformData::IntVec3(v),
            UniformValue::IntVec4(v) => UniformData::IntVec4(v),
            UniformValue::Bool(v) => UniformData::Int(i32::from(v)),
            UniformValue::Mat2(v) => UniformData::Mat2(v),
            UniformValue::Mat3(v) => UniformData::Mat3(v),
            UniformValue::Mat4(v) => UniformData::Mat4(v),
        };
        if !data.matches(uniform.variable_type) {
            return Err(GraphicsError::InvalidArgument(format!(
                "uniform {} is {:?}, got {:?}",
                uniform.name, uniform.variable_type, data
            )));
        }
        Ok(data)
    }

    /// Get the device handle.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidState`] after disposal.
    pub fn handle(&self) -> Result<ProgramHandle, GraphicsError> {
        self.handle.ok_or_else(|| GraphicsError::disposed("program"))
    }

    /// Get the parent device.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Get the program label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

fn compile_stage(
    device: &GraphicsDevice,
    stage: ShaderStage,
    source: &str,
) -> Result<ShaderHandle, GraphicsError> {
    let backend = device.backend();
    let shader = backend
        .create_shader(stage)
        .ok_or_else(|| GraphicsError::ResourceCreationFailed(format!("{stage} shader")))?;
    if let Err(log) = backend.compile_shader(shader, source) {
        backend.delete_shader(shader);
        log::debug!("Program: {} stage failed to compile: {}", stage, log);
        return Err(GraphicsError::CompileError { stage, log });
    }
    Ok(shader)
}

fn introspect_attributes(device: &GraphicsDevice, program: ProgramHandle) -> Vec<ProgramAttribute> {
    let backend = device.backend();
    (0..backend.active_attribute_count(program))
        .filter_map(|i| backend.active_attribute(program, i))
        .filter_map(|active| {
            let Some(location) = backend.attribute_location(program, &active.name) else {
                log::warn!("Program {:?}: attribute {} has no location", program, active.name);
                return None;
            };
            Some((active, location))
        })
        .enumerate()
        .map(|(index, (active, location))| ProgramAttribute {
            index,
            location,
            variable_type: active.variable_type,
            components: active.variable_type.components(),
            scalar_type: active.variable_type.scalar_type(),
            name: active.name,
        })
        .collect()
}

fn introspect_uniforms(device: &GraphicsDevice, program: ProgramHandle) -> Vec<ProgramUniform> {
    let backend = device.backend();
    let mut next_unit = 0;
    (0..backend.active_uniform_count(program))
        .filter_map(|i| backend.active_uniform(program, i))
        .filter_map(|active| {
            let Some(location) = backend.uniform_location(program, &active.name) else {
                log::warn!("Program {:?}: uniform {} has no location", program, active.name);
                return None;
            };
            Some((active, location))
        })
        .enumerate()
        .map(|(index, (active, location))| {
            let texture_unit = active.variable_type.is_sampler().then(|| {
                let unit = next_unit;
                next_unit += active.size;
                unit
            });
            ProgramUniform {
                index,
                location,
                variable_type: active.variable_type,
                size: active.size,
                texture_unit,
                name: active.name,
            }
        })
        .collect()
}

impl Disposable for Program {
    fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            let backend = self.device.backend();
            backend.delete_program(handle);
            backend.delete_shader(self.vertex);
            backend.delete_shader(self.fragment);
            self.device.track_released(ResourceKind::Program);
            log::trace!("GraphicsDevice: deleted program {:?}", handle);
        }
    }

    fn is_disposed(&self) -> bool {
        self.handle.is_none()
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            log::warn!(
                "Program {:?} ({:?}) dropped without dispose",
                handle,
                self.label
            );
        }
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("handle", &self.handle)
            .field("attributes", &self.attributes.len())
            .field("uniforms", &self.uniforms.len())
            .field("label", &self.label)
            .finish()
    }
}

// Ensure Program is Send + Sync
static_assertions::assert_impl_all!(Program: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;
    use crate::framebuffer::CanvasFramebuffer;
    use crate::geometry::BoundGeometry;
    use crate::render::render_geometry;
    use crate::resources::{Buffer, Texture};
    use crate::types::{BufferTarget, BufferUsageHint, ComponentType};
    use lumen_core::mesh::generators;
    use lumen_core::sampler::TextureParameters;
    use lumen_core::texture::{DataType, Image, PixelFormat};

    const VERTEX: &str = r#"
        attribute vec3 position;
        attribute vec2 uv;
        uniform mat4 transform;
        varying vec2 v_uv;
        void main() {
            v_uv = uv;
            gl_Position = transform * vec4(position, 1.0);
        }
    "#;

    const FRAGMENT: &str = r#"
        precision mediump float;
        uniform sampler2D albedo;
        uniform samplerCube environment;
        uniform float exposure;
        varying vec2 v_uv;
        void main() {
            vec4 env = textureCube(environment, vec3(v_uv, 1.0));
            gl_FragColor = texture2D(albedo, v_uv) * env * exposure;
        }
    "#;

    const FLAT_FRAGMENT: &str = r#"
        precision mediump float;
        uniform float exposure;
        varying vec2 v_uv;
        void main() {
            gl_FragColor = vec4(v_uv, exposure, 1.0);
        }
    "#;

    fn setup() -> (Arc<DummyBackend>, Arc<GraphicsDevice>) {
        let backend = Arc::new(DummyBackend::new());
        let device = GraphicsDevice::new(backend.clone());
        (backend, device)
    }

    #[test]
    fn test_introspection_cache() {
        let (_, device) = setup();
        let mut program = Program::compile_and_link(&device, VERTEX, FRAGMENT).unwrap();
        let position = program.attribute("position").unwrap();
        assert_eq!(position.components, 3);
        assert_eq!(position.scalar_type, ScalarType::Float);
        assert_eq!(program.attribute(1usize).unwrap().name, "uv");
        assert_eq!(program.attributes().len(), 2);

        let albedo = program.uniform("albedo").unwrap();
        let environment = program.uniform("environment").unwrap();
        assert_eq!(albedo.texture_unit, Some(0));
        assert_eq!(environment.texture_unit, Some(1));
        assert_eq!(program.uniform("exposure").unwrap().texture_unit, None);
        program.dispose();
    }

    #[test]
    fn test_lookups_survive_device_activity() {
        let (backend, device) = setup();
        let mut program = Program::compile_and_link(&device, VERTEX, FRAGMENT).unwrap();
        let position = program.attribute("position").unwrap().clone();
        let albedo = program.uniform("albedo").unwrap().clone();

        let mut other = Program::compile_and_link(&device, VERTEX, FLAT_FRAGMENT).unwrap();
        let queries = backend.introspection_query_count();
        assert!(queries > 0);

        let mut quad = BoundGeometry::upload(
            &device,
            &generators::pass_geometry(),
            BufferUsageHint::StaticDraw,
        )
        .unwrap();
        let canvas = CanvasFramebuffer::new(&device, 64, 64);
        let uniforms = Uniforms::new().with("exposure", 0.5f32);
        render_geometry(&canvas, &other, &uniforms, &quad).unwrap();
        quad.dispose();
        other.dispose();

        assert_eq!(program.attribute("position").unwrap(), &position);
        assert_eq!(program.attribute(position.index).unwrap(), &position);
        assert_eq!(program.uniform("albedo").unwrap(), &albedo);
        assert_eq!(backend.introspection_query_count(), queries);
        program.dispose();
    }

    #[test]
    fn test_index_matches_position() {
        let (_, device) = setup();
        let mut program = Program::compile_and_link(&device, VERTEX, FRAGMENT).unwrap();
        for (position, attribute) in program.attributes().iter().enumerate() {
            assert_eq!(attribute.index, position);
            assert_eq!(program.attribute(attribute.index).unwrap(), attribute);
        }
        for (position, uniform) in program.uniforms().iter().enumerate() {
            assert_eq!(uniform.index, position);
            assert_eq!(program.uniform(uniform.index).unwrap(), uniform);
        }
        program.dispose();
    }

    #[test]
    fn test_lookup_misses() {
        let (_, device) = setup();
        let mut program = Program::compile_and_link(&device, VERTEX, FRAGMENT).unwrap();
        assert_eq!(
            program.attribute("nonexistent").unwrap_err(),
            GraphicsError::NotFound {
                kind: "attribute",
                key: "nonexistent".to_string(),
            }
        );
        assert!(matches!(
            program.uniform(99usize),
            Err(GraphicsError::NotFound { kind: "uniform", .. })
        ));
        program.dispose();
        assert!(matches!(
            program.attribute("position"),
            Err(GraphicsError::InvalidState(_))
        ));
    }

    #[test]
    fn test_compile_error_cleans_up() {
        let (backend, device) = setup();
        let err = Program::compile_and_link(&device, VERTEX, "void main() {").unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::CompileError {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
        assert_eq!(backend.live_object_count(), 0);
        assert_eq!(device.program_count(), 0);
    }

    #[test]
    fn test_link_error_cleans_up() {
        let (backend, device) = setup();
        let vertex = "attribute vec3 position;\nvoid main() { gl_Position = vec4(position, 1.0); }";
        let err = Program::compile_and_link(&device, vertex, FRAGMENT).unwrap_err();
        assert!(matches!(err, GraphicsError::LinkError { .. }));
        assert_eq!(backend.live_object_count(), 0);
    }

    #[test]
    fn test_dispose_releases_stages() {
        let (backend, device) = setup();
        let mut program = Program::compile_and_link(&device, VERTEX, FRAGMENT).unwrap();
        assert_eq!(device.program_count(), 1);
        program.dispose();
        program.dispose();
        assert!(program.is_disposed());
        assert_eq!(device.program_count(), 0);
        assert_eq!(backend.live_object_count(), 0);
    }

    #[test]
    fn test_set_uniforms() {
        let (backend, device) = setup();
        let mut program = Program::compile_and_link(&device, VERTEX, FRAGMENT).unwrap();
        let mut albedo = Texture::new_2d(
            &device,
            &Image::filled(2, 2, &[0; 4]),
            PixelFormat::Rgba,
            DataType::UnsignedByte,
            PixelFormat::Rgba,
            TextureParameters::default(),
        )
        .unwrap();

        let uniforms = Uniforms::new()
            .with("albedo", &albedo)
            .with("exposure", 0.5f32)
            .with("unused", 3);
        program.set_uniforms(&uniforms).unwrap();

        let handle = program.handle().unwrap();
        assert_eq!(backend.current_program(), Some(handle));
        assert_eq!(
            backend.uniform_value(handle, "exposure"),
            Some(UniformData::Float(0.5))
        );
        assert_eq!(
            backend.uniform_value(handle, "albedo"),
            Some(UniformData::Sampler(0))
        );
        assert_eq!(backend.bound_texture(0), albedo.handle().ok());

        let wrong_type = Uniforms::new().with("exposure", 1);
        assert!(matches!(
            program.set_uniforms(&wrong_type),
            Err(GraphicsError::InvalidArgument(_))
        ));
        let wrong_sampler = Uniforms::new().with("environment", &albedo);
        assert!(program.set_uniforms(&wrong_sampler).is_err());

        albedo.dispose();
        program.dispose();
    }

    #[test]
    fn test_bind_attribute() {
        let (backend, device) = setup();
        let mut program = Program::compile_and_link(&device, VERTEX, FRAGMENT).unwrap();
        let mut buffer = Buffer::from_slice(
            &device,
            BufferTarget::Array,
            &[0.0f32; 9],
            BufferUsageHint::StaticDraw,
        )
        .unwrap();

        let attribute = program.attribute("position").unwrap().clone();
        let binding = AttributeBinding::new(&buffer, 3, ComponentType::Float);
        program.bind_attribute(&attribute, &binding).unwrap();
        let pointer = backend.attribute_binding(attribute.location).unwrap();
        assert_eq!(pointer.buffer, buffer.handle().unwrap());
        assert_eq!(pointer.components, 3);

        buffer.dispose();
        program.dispose();
    }
}
