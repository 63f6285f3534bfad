//! Equirectangular to cube map conversion.

use std::sync::Arc;

use lumen_core::mesh::generators;
use lumen_core::sampler::{AddressMode, FilterMode, TextureParameters};
use lumen_core::texture::{CpuTexture, CubeFace, DataType, Image, PixelFormat};

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::framebuffer::{AttachmentTarget, Framebuffer};
use crate::geometry::BoundGeometry;
use crate::program::{Program, Uniforms};
use crate::render::render_geometry;
use crate::resources::{Disposable, Texture};
use crate::types::{AttachmentPoint, BufferUsageHint, ImageTarget};

const CUBE_FACE_VERTEX: &str = include_str!("shaders/cube_face.vert");
const CUBE_FACE_FRAGMENT: &str = include_str!("shaders/cube_face.frag");

/// Options for [`convert_equirectangular_to_cube_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeConversionOptions {
    /// Width and height of each cube face.
    pub face_size: u32,
    /// Generate the cube's mip chain after rendering.
    pub generate_mipmaps: bool,
    /// Storage format of the cube faces.
    pub internal_format: PixelFormat,
    /// Channel type of the cube faces.
    pub data_type: DataType,
    /// Debug label for the cube texture.
    pub label: Option<String>,
}

impl CubeConversionOptions {
    /// Default options with `face_size`.
    pub fn new(face_size: u32) -> Self {
        Self {
            face_size,
            ..Default::default()
        }
    }

    pub fn with_mipmaps(mut self, generate: bool) -> Self {
        self.generate_mipmaps = generate;
        self
    }

    /// Set the cube's storage format and channel type.
    pub fn with_format(mut self, internal_format: PixelFormat, data_type: DataType) -> Self {
        self.internal_format = internal_format;
        self.data_type = data_type;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl Default for CubeConversionOptions {
    fn default() -> Self {
        Self {
            face_size: 512,
            generate_mipmaps: true,
            internal_format: PixelFormat::Rgba,
            data_type: DataType::UnsignedByte,
            label: None,
        }
    }
}

/// Render an equirectangular (latitude/longitude) image into a new cube map.
///
/// # Errors
///
/// See [`convert_equirectangular_to_cube_with`].
pub fn convert_equirectangular_to_cube(
    device: &Arc<GraphicsDevice>,
    source: &CpuTexture,
    face_size: u32,
    generate_mipmaps: bool,
) -> Result<Texture, GraphicsError> {
    let options = CubeConversionOptions::new(face_size).with_mipmaps(generate_mipmaps);
    convert_equirectangular_to_cube_with(device, source, &options)
}

/// Render an equirectangular image into a new cube map.
///
/// The source is uploaded with wrap S = repeat, wrap T = clamp and linear
/// filtering, whatever `source.params` says. Each face, in
/// [`CubeFace::ALL`] order, is attached to color slot 0 of one framebuffer
/// and filled by a single full-screen draw. All transient resources are
/// released after the device has finished.
///
/// # Example
///
/// ```
/// use lumen_graphics::pipeline::convert_equirectangular_to_cube;
/// use lumen_graphics::texture::{CpuTexture, Image};
/// use lumen_graphics::{Disposable, GraphicsDevice};
///
/// let device = GraphicsDevice::dummy();
/// let panorama = CpuTexture::new(Image::filled(64, 32, &[128, 128, 255, 255]));
/// let mut cube = convert_equirectangular_to_cube(&device, &panorama, 16, true)?;
/// assert_eq!(cube.mip_level_count(), 5);
/// assert_eq!(device.live_resource_count(), 1);
/// cube.dispose();
/// # Ok::<(), lumen_graphics::GraphicsError>(())
/// ```
///
/// # Errors
///
/// [`GraphicsError::InvalidArgument`] for a zero or oversized face size, and
/// any error of [`Texture::new_2d`] for the source, before anything is
/// allocated. Later failures are wrapped in
/// [`GraphicsError::ConversionFailed`] after every transient resource and
/// the partial cube have been released.
pub fn convert_equirectangular_to_cube_with(
    device: &Arc<GraphicsDevice>,
    source: &CpuTexture,
    options: &CubeConversionOptions,
) -> Result<Texture, GraphicsError> {
    let max_dim = device.capabilities().max_texture_dimension;
    if options.face_size == 0 || options.face_size > max_dim {
        return Err(GraphicsError::InvalidArgument(format!(
            "cube face size {} outside 1..={}",
            options.face_size, max_dim
        )));
    }

    let source_params = source
        .params
        .with_wrap(AddressMode::Repeat, AddressMode::ClampToEdge)
        .with_min_filter(FilterMode::Linear)
        .with_mag_filter(FilterMode::Linear);
    let lat_long = Texture::new_2d(
        device,
        &source.image,
        source.pixel_format,
        source.data_type,
        source.pixel_format,
        source_params,
    )?
    .with_label("equirectangular source");

    let mut transients = Transients {
        source: Some(lat_long),
        ..Default::default()
    };

    match render_faces(device, options, &mut transients) {
        Ok(()) => {
            let cube = transients.cube.take();
            transients.release(device);
            let cube = cube.ok_or_else(|| {
                GraphicsError::InvalidState("cube map was not created".to_string())
            })?;
            log::info!(
                "Equirect: converted {}x{} map to {}x{} cube, {} mip levels",
                source.image.width(),
                source.image.height(),
                options.face_size,
                options.face_size,
                cube.mip_level_count()
            );
            Ok(cube)
        }
        Err(err) => {
            log::warn!("Equirect: conversion failed: {}", err);
            transients.release(device);
            Err(err)
        }
    }
}

/// Everything the conversion allocates, released in a fixed order.
#[derive(Default)]
struct Transients {
    source: Option<Texture>,
    program: Option<Program>,
    quad: Option<BoundGeometry>,
    cube: Option<Texture>,
    framebuffer: Option<Framebuffer>,
}

impl Transients {
    /// Wait for the device, then release framebuffer, program, quad and
    /// source. A cube still held here is a partial result and goes last.
    fn release(&mut self, device: &GraphicsDevice) {
        device.flush();
        device.finish();
        if let Some(framebuffer) = &mut self.framebuffer {
            framebuffer.dispose();
        }
        if let Some(program) = &mut self.program {
            program.dispose();
        }
        if let Some(quad) = &mut self.quad {
            quad.dispose();
        }
        if let Some(source) = &mut self.source {
            source.dispose();
        }
        if let Some(cube) = &mut self.cube {
            cube.dispose();
        }
    }
}

fn render_faces(
    device: &Arc<GraphicsDevice>,
    options: &CubeConversionOptions,
    transients: &mut Transients,
) -> Result<(), GraphicsError> {
    let program = Program::compile_and_link(device, CUBE_FACE_VERTEX, CUBE_FACE_FRAGMENT)
        .map_err(|e| GraphicsError::conversion("compile cube face program", e))?;
    let program = transients.program.insert(program.with_label("cube face"));

    let quad = BoundGeometry::upload(
        device,
        &generators::pass_geometry(),
        BufferUsageHint::StaticDraw,
    )
    .map_err(|e| GraphicsError::conversion("upload pass geometry", e))?;
    let quad = transients.quad.insert(quad);

    let faces = vec![Image::storage(options.face_size, options.face_size); 6];
    let params = TextureParameters::linear()
        .with_wrap(AddressMode::ClampToEdge, AddressMode::ClampToEdge)
        .with_mipmaps(options.generate_mipmaps);
    let cube = Texture::new_cube(
        device,
        &faces,
        options.internal_format,
        options.data_type,
        options.internal_format,
        params,
    )
    .map_err(|e| GraphicsError::conversion("allocate cube map", e))?;
    let cube = transients.cube.insert(match &options.label {
        Some(label) => cube.with_label(label.clone()),
        None => cube,
    });

    let framebuffer = Framebuffer::new(device)
        .map_err(|e| GraphicsError::conversion("create framebuffer", e))?;
    let framebuffer = transients.framebuffer.insert(framebuffer.with_label("cube face"));

    let source = transients
        .source
        .as_ref()
        .ok_or_else(|| GraphicsError::InvalidState("source texture missing".to_string()))?;

    for (index, face) in CubeFace::ALL.iter().enumerate() {
        AttachmentTarget::texture(cube, ImageTarget::CubeFace(*face), 0)
            .and_then(|target| framebuffer.attach(AttachmentPoint::COLOR0, target))
            .map_err(|e| GraphicsError::conversion(format!("attach cube face {face:?}"), e))?;

        let uniforms = Uniforms::new()
            .with("map", source)
            .with("faceIndex", index as i32);
        render_geometry(&*framebuffer, program, &uniforms, quad)
            .map_err(|e| GraphicsError::conversion(format!("render cube face {face:?}"), e))?;
        log::trace!("Equirect: rendered face {:?}", face);
    }

    if options.generate_mipmaps {
        cube.generate_mipmaps()
            .map_err(|e| GraphicsError::conversion("generate cube mipmaps", e))?;
    }
    Ok(())
}
