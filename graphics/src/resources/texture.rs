//! GPU texture resource.

use std::sync::Arc;

use lumen_core::sampler::TextureParameters;
use lumen_core::texture::{CpuCubeTexture, CpuTexture, DataType, Image, PixelFormat, TextureSource};

use crate::backend::{ImageUpload, TextureHandle};
use crate::device::{GraphicsDevice, ResourceKind};
use crate::error::GraphicsError;
use crate::types::{full_mip_count, ImageTarget, TextureTarget};

use super::Disposable;

/// A GPU texture resource: one 2D image or six cube faces.
///
/// All images of a texture share dimensions and format. Re-uploading
/// replaces their contents in place without reallocating.
///
/// # Example
///
/// ```
/// use lumen_graphics::{Disposable, GraphicsDevice, Texture};
/// use lumen_graphics::texture::{CpuTexture, Image};
///
/// let device = GraphicsDevice::dummy();
/// let cpu = CpuTexture::new(Image::filled(4, 4, &[255, 0, 0, 255]));
/// let mut texture = Texture::from_cpu(&device, &cpu)?;
/// assert_eq!(texture.width(), 4);
/// texture.dispose();
/// # Ok::<(), lumen_graphics::GraphicsError>(())
/// ```
pub struct Texture {
    device: Arc<GraphicsDevice>,
    handle: Option<TextureHandle>,
    target: TextureTarget,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    data_type: DataType,
    internal_format: PixelFormat,
    params: TextureParameters,
    mip_level_count: u32,
    label: Option<String>,
}

impl Texture {
    /// Create a 2D texture from `image`.
    ///
    /// Storage-only images (no data) allocate the texture without contents,
    /// as render targets do.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidArgument`] for zero or oversized dimensions
    /// or a data length that does not match the format,
    /// [`GraphicsError::FormatUnsupported`] when the device rejects the
    /// format combination.
    pub fn new_2d(
        device: &Arc<GraphicsDevice>,
        image: &Image,
        pixel_format: PixelFormat,
        data_type: DataType,
        internal_format: PixelFormat,
        params: TextureParameters,
    ) -> Result<Self, GraphicsError> {
        Self::allocate(
            device,
            TextureTarget::Texture2D,
            std::slice::from_ref(image),
            pixel_format,
            data_type,
            internal_format,
            params,
        )
    }

    /// Create a cube texture from six faces in +X, -X, +Y, -Y, +Z, -Z order.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidArgument`] when there are not exactly six
    /// faces, the faces are not square or their dimensions differ, plus the
    /// errors of [`Texture::new_2d`].
    pub fn new_cube(
        device: &Arc<GraphicsDevice>,
        images: &[Image],
        pixel_format: PixelFormat,
        data_type: DataType,
        internal_format: PixelFormat,
        params: TextureParameters,
    ) -> Result<Self, GraphicsError> {
        Self::allocate(
            device,
            TextureTarget::CubeMap,
            images,
            pixel_format,
            data_type,
            internal_format,
            params,
        )
    }

    /// Create a 2D texture from a CPU-side description.
    ///
    /// # Errors
    ///
    /// Same as [`Texture::new_2d`].
    pub fn from_cpu(device: &Arc<GraphicsDevice>, cpu: &CpuTexture) -> Result<Self, GraphicsError> {
        let texture = Self::new_2d(
            device,
            &cpu.image,
            cpu.pixel_format,
            cpu.data_type,
            cpu.pixel_format,
            cpu.params,
        )?;
        Ok(match &cpu.label {
            Some(label) => texture.with_label(label.clone()),
            None => texture,
        })
    }

    /// Create a cube texture from a CPU-side description.
    ///
    /// # Errors
    ///
    /// Same as [`Texture::new_cube`].
    pub fn from_cpu_cube(
        device: &Arc<GraphicsDevice>,
        cpu: &CpuCubeTexture,
    ) -> Result<Self, GraphicsError> {
        let texture = Self::new_cube(
            device,
            &cpu.faces,
            cpu.pixel_format,
            cpu.data_type,
            cpu.pixel_format,
            cpu.params,
        )?;
        Ok(match &cpu.label {
            Some(label) => texture.with_label(label.clone()),
            None => texture,
        })
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn allocate(
        device: &Arc<GraphicsDevice>,
        target: TextureTarget,
        images: &[Image],
        pixel_format: PixelFormat,
        data_type: DataType,
        internal_format: PixelFormat,
        mut params: TextureParameters,
    ) -> Result<Self, GraphicsError> {
        let (width, height) = validate_images(device, target, images, pixel_format, data_type)?;

        let caps = device.capabilities();
        if params.anisotropy_levels > caps.max_anisotropy {
            log::warn!(
                "Texture: anisotropy {} clamped to device maximum {}",
                params.anisotropy_levels,
                caps.max_anisotropy
            );
            params.anisotropy_levels = caps.max_anisotropy.max(1);
        }

        let backend = device.backend();
        let handle = backend
            .create_texture()
            .ok_or_else(|| GraphicsError::ResourceCreationFailed("texture".to_string()))?;

        for (image, image_target) in images.iter().zip(ImageTarget::all_for(target)) {
            let upload = ImageUpload {
                target: image_target,
                level: 0,
                internal_format,
                pixel_format,
                data_type,
                width,
                height,
                data: image.data(),
            };
            if let Err(err) = backend.upload_image(handle, &upload) {
                backend.delete_texture(handle);
                return Err(err);
            }
        }
        backend.set_texture_parameters(handle, target, &params);

        let mut mip_level_count = 1;
        if params.generate_mipmaps && images.iter().all(|i| i.data().is_some()) {
            if let Err(err) = backend.generate_mipmaps(handle, target) {
                backend.delete_texture(handle);
                return Err(err);
            }
            mip_level_count = full_mip_count(width, height);
        }

        device.track_created(ResourceKind::Texture);
        log::trace!(
            "Texture: created {:?} texture {:?} ({}x{}), format={:?}, levels={}",
            target,
            handle,
            width,
            height,
            internal_format,
            mip_level_count
        );

        Ok(Self {
            device: Arc::clone(device),
            handle: Some(handle),
            target,
            width,
            height,
            pixel_format,
            data_type,
            internal_format,
            params,
            mip_level_count,
            label: None,
        })
    }

    /// Regenerate the mip chain from level 0.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidState`] after disposal or when mipmaps were
    /// not requested at construction.
    pub fn generate_mipmaps(&mut self) -> Result<(), GraphicsError> {
        let handle = self.handle()?;
        if !self.params.generate_mipmaps {
            return Err(GraphicsError::InvalidState(
                "mipmap generation was not requested for this texture".to_string(),
            ));
        }
        self.device.backend().generate_mipmaps(handle, self.target)?;
        self.mip_level_count = full_mip_count(self.width, self.height);
        log::trace!(
            "Texture: generated {} mip levels for {:?}",
            self.mip_level_count,
            handle
        );
        Ok(())
    }

    /// Replace the contents of a 2D texture.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::DimensionMismatch`] when the size or byte length
    /// differs from the existing image, [`GraphicsError::InvalidArgument`]
    /// for cube textures or storage-only images.
    pub fn reupload_image(&mut self, image: &Image) -> Result<(), GraphicsError> {
        if self.target != TextureTarget::Texture2D {
            return Err(GraphicsError::InvalidArgument(
                "cube textures are re-uploaded with reupload_images".to_string(),
            ));
        }
        self.reupload_images(std::slice::from_ref(image))
    }

    /// Replace the contents of every image, in upload order.
    ///
    /// All images are checked before any is uploaded.
    ///
    /// # Errors
    ///
    /// Same as [`Texture::reupload_image`], plus
    /// [`GraphicsError::InvalidArgument`] when the image count differs.
    pub fn reupload_images(&mut self, images: &[Image]) -> Result<(), GraphicsError> {
        let handle = self.handle()?;
        if images.len() != self.target.image_count() {
            return Err(GraphicsError::InvalidArgument(format!(
                "expected {} images, got {}",
                self.target.image_count(),
                images.len()
            )));
        }

        let expected_len = images[0].expected_len(self.pixel_format, self.data_type);
        let mut contents = Vec::with_capacity(images.len());
        for image in images {
            if image.size() != (self.width, self.height) {
                return Err(GraphicsError::DimensionMismatch {
                    expected: format!("{}x{}", self.width, self.height),
                    actual: format!("{}x{}", image.width(), image.height()),
                });
            }
            let data = image.data().ok_or_else(|| {
                GraphicsError::InvalidArgument("re-upload needs pixel data".to_string())
            })?;
            if data.len() != expected_len {
                return Err(GraphicsError::DimensionMismatch {
                    expected: format!("{expected_len} bytes"),
                    actual: format!("{} bytes", data.len()),
                });
            }
            contents.push(data);
        }

        let backend = self.device.backend();
        for (data, image_target) in contents.into_iter().zip(ImageTarget::all_for(self.target)) {
            backend.update_image(handle, image_target, data);
        }
        if self.params.generate_mipmaps {
            backend.generate_mipmaps(handle, self.target)?;
            self.mip_level_count = full_mip_count(self.width, self.height);
        }
        Ok(())
    }

    /// Pull the next frame from `source` and re-upload it.
    ///
    /// Returns `true` when a new frame was uploaded. Static sources never
    /// produce frames.
    ///
    /// # Errors
    ///
    /// Same as [`Texture::reupload_image`].
    pub fn refresh(&mut self, source: &mut TextureSource) -> Result<bool, GraphicsError> {
        self.handle()?;
        match source.refresh() {
            Some(frame) => {
                self.reupload_image(&frame)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Re-apply sampling parameters.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidState`] after disposal.
    pub fn set_parameters(&mut self, params: TextureParameters) -> Result<(), GraphicsError> {
        let handle = self.handle()?;
        self.device
            .backend()
            .set_texture_parameters(handle, self.target, &params);
        self.params = params;
        Ok(())
    }

    /// Bind to texture unit `unit`.
    pub(crate) fn bind(&self, unit: u32) -> Result<(), GraphicsError> {
        let handle = self.handle()?;
        self.device
            .backend()
            .bind_texture(unit, self.target, Some(handle));
        Ok(())
    }

    /// Get the device handle.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidState`] after disposal.
    pub fn handle(&self) -> Result<TextureHandle, GraphicsError> {
        self.handle.ok_or_else(|| GraphicsError::disposed("texture"))
    }

    /// Get the parent device.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    pub fn target(&self) -> TextureTarget {
        self.target
    }

    /// Get the level-0 width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the level-0 height.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn internal_format(&self) -> PixelFormat {
        self.internal_format
    }

    /// Get the sampling parameters.
    pub fn params(&self) -> &TextureParameters {
        &self.params
    }

    /// Get the mip level count.
    pub fn mip_level_count(&self) -> u32 {
        self.mip_level_count
    }

    /// Get the texture label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

fn validate_images(
    device: &GraphicsDevice,
    target: TextureTarget,
    images: &[Image],
    pixel_format: PixelFormat,
    data_type: DataType,
) -> Result<(u32, u32), GraphicsError> {
    let expected_count = target.image_count();
    if images.len() != expected_count {
        return Err(GraphicsError::InvalidArgument(format!(
            "{:?} texture needs {} images, got {}",
            target,
            expected_count,
            images.len()
        )));
    }

    let (width, height) = images[0].size();
    if width == 0 || height == 0 {
        return Err(GraphicsError::InvalidArgument(
            "texture dimensions cannot be zero".to_string(),
        ));
    }
    let max_dim = device.capabilities().max_texture_dimension;
    if width > max_dim || height > max_dim {
        return Err(GraphicsError::InvalidArgument(format!(
            "texture dimension {width}x{height} exceeds maximum {max_dim}"
        )));
    }

    if target == TextureTarget::CubeMap {
        if let Some(face) = images.iter().position(|i| i.size() != (width, height)) {
            return Err(GraphicsError::InvalidArgument(format!(
                "cube face {} is {}x{}, expected {}x{}",
                face,
                images[face].width(),
                images[face].height(),
                width,
                height
            )));
        }
        if width != height {
            return Err(GraphicsError::InvalidArgument(format!(
                "cube faces must be square, got {width}x{height}"
            )));
        }
    }

    for image in images {
        if let Some(data) = image.data() {
            let expected = image.expected_len(pixel_format, data_type);
            if data.len() != expected {
                return Err(GraphicsError::InvalidArgument(format!(
                    "image data is {} bytes, expected {} for {}x{} {:?}/{:?}",
                    data.len(),
                    expected,
                    width,
                    height,
                    pixel_format,
                    data_type
                )));
            }
        }
    }

    Ok((width, height))
}

impl Disposable for Texture {
    fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.device.backend().delete_texture(handle);
            self.device.track_released(ResourceKind::Texture);
            log::trace!("Texture: deleted {:?} {:?}", handle, self.label);
        }
    }

    fn is_disposed(&self) -> bool {
        self.handle.is_none()
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            log::warn!(
                "Texture {:?} ({:?}) dropped without dispose; device memory leaked",
                handle,
                self.label
            );
        }
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("target", &self.target)
            .field("size", &(self.width, self.height))
            .field("internal_format", &self.internal_format)
            .field("mip_level_count", &self.mip_level_count)
            .field("label", &self.label)
            .finish()
    }
}

// Ensure Texture is Send + Sync
static_assertions::assert_impl_all!(Texture: Send, Sync);
