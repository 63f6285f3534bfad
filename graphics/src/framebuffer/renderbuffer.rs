//! Renderbuffer resource.

use std::sync::Arc;

use lumen_core::texture::PixelFormat;

use crate::backend::RenderbufferHandle;
use crate::device::{GraphicsDevice, ResourceKind};
use crate::error::GraphicsError;
use crate::resources::Disposable;

/// Render-only image storage, attachable to a framebuffer but never sampled.
pub struct Renderbuffer {
    device: Arc<GraphicsDevice>,
    handle: Option<RenderbufferHandle>,
    format: PixelFormat,
    width: u32,
    height: u32,
}

impl Renderbuffer {
    /// Allocate a `width`x`height` renderbuffer.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidArgument`] for zero or oversized dimensions,
    /// [`GraphicsError::FormatUnsupported`] for formats that cannot be
    /// rendered to.
    pub fn new(
        device: &Arc<GraphicsDevice>,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, GraphicsError> {
        let max_dim = device.capabilities().max_texture_dimension;
        if width == 0 || height == 0 || width > max_dim || height > max_dim {
            return Err(GraphicsError::InvalidArgument(format!(
                "renderbuffer size {width}x{height} outside 1..={max_dim}"
            )));
        }

        let backend = device.backend();
        let handle = backend
            .create_renderbuffer()
            .ok_or_else(|| GraphicsError::ResourceCreationFailed("renderbuffer".to_string()))?;
        if let Err(err) = backend.renderbuffer_storage(handle, format, width, height) {
            backend.delete_renderbuffer(handle);
            return Err(err);
        }
        device.track_created(ResourceKind::Renderbuffer);

        log::trace!(
            "GraphicsDevice: created renderbuffer {:?}, format={:?}, size={}x{}",
            handle,
            format,
            width,
            height
        );

        Ok(Self {
            device: Arc::clone(device),
            handle: Some(handle),
            format,
            width,
            height,
        })
    }

    /// Get the device handle.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidState`] after disposal.
    pub fn handle(&self) -> Result<RenderbufferHandle, GraphicsError> {
        self.handle
            .ok_or_else(|| GraphicsError::disposed("renderbuffer"))
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Disposable for Renderbuffer {
    fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.device.backend().delete_renderbuffer(handle);
            self.device.track_released(ResourceKind::Renderbuffer);
        }
    }

    fn is_disposed(&self) -> bool {
        self.handle.is_none()
    }
}

impl Drop for Renderbuffer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            log::warn!("Renderbuffer {:?} dropped without dispose", handle);
        }
    }
}

impl std::fmt::Debug for Renderbuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderbuffer")
            .field("handle", &self.handle)
            .field("format", &self.format)
            .field("size", &(self.width, self.height))
            .finish()
    }
}
