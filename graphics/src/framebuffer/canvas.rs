//! The device's default drawable surface.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::types::Viewport;

use super::RenderTarget;

/// The canvas the device presents. Always complete.
#[derive(Debug, Clone)]
pub struct CanvasFramebuffer {
    device: Arc<GraphicsDevice>,
    width: u32,
    height: u32,
}

impl CanvasFramebuffer {
    pub fn new(device: &Arc<GraphicsDevice>, width: u32, height: u32) -> Self {
        Self {
            device: Arc::clone(device),
            width,
            height,
        }
    }

    /// Track a new drawable size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            log::debug!(
                "CanvasFramebuffer: resized {}x{} -> {}x{}",
                self.width,
                self.height,
                width,
                height
            );
            self.width = width;
            self.height = height;
        }
    }

    /// Width over height, 1.0 for a zero-height canvas.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

impl RenderTarget for CanvasFramebuffer {
    fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn bind(&self) -> Result<(), GraphicsError> {
        let backend = self.device.backend();
        backend.bind_framebuffer(None);
        backend.set_viewport(Viewport::from_dimensions(self.width, self.height));
        Ok(())
    }
}
