//! Render targets.
//!
//! A [`Framebuffer`] binds texture images and [`Renderbuffer`]s to
//! attachment slots so draws can render into them. It keeps non-owning
//! [`AttachmentTarget`] records (handle, size, format); the textures and
//! renderbuffers stay owned by whoever created them.
//!
//! [`CanvasFramebuffer`] is the device's own drawable surface. Both
//! implement [`RenderTarget`].

mod canvas;
mod renderbuffer;

pub use canvas::CanvasFramebuffer;
pub use renderbuffer::Renderbuffer;

use std::collections::BTreeMap;
use std::sync::Arc;

use lumen_core::texture::PixelFormat;

use crate::backend::{FramebufferHandle, RawAttachment};
use crate::device::{GraphicsDevice, ResourceKind};
use crate::error::GraphicsError;
use crate::resources::{Disposable, Texture};
use crate::types::{mip_size, AttachmentPoint, BufferBit, ClearState, ImageTarget, Viewport};

/// Anything a draw can render into.
pub trait RenderTarget {
    /// The device owning the target.
    fn device(&self) -> &Arc<GraphicsDevice>;

    /// Width and height of the drawable area.
    fn size(&self) -> (u32, u32);

    /// Make this the draw target and set the viewport to cover it.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidState`] if the target cannot be rendered to.
    fn bind(&self) -> Result<(), GraphicsError>;

    /// Clear the buffers selected by `mask`.
    ///
    /// # Errors
    ///
    /// Same as [`RenderTarget::bind`].
    fn clear(&self, mask: BufferBit, state: &ClearState) -> Result<(), GraphicsError> {
        self.bind()?;
        self.device().backend().clear(mask, state);
        Ok(())
    }
}

/// A non-owning record of an image that can be attached to a framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentTarget {
    raw: RawAttachment,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl AttachmentTarget {
    /// Mip `level` of one image of `texture`.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidState`] for a disposed texture,
    /// [`GraphicsError::InvalidArgument`] when `image` does not belong to
    /// the texture's kind or `level` does not exist.
    pub fn texture(
        texture: &Texture,
        image: ImageTarget,
        level: u32,
    ) -> Result<Self, GraphicsError> {
        let handle = texture.handle()?;
        if image.texture_target() != texture.target() {
            return Err(GraphicsError::InvalidArgument(format!(
                "{:?} is not an image of a {:?} texture",
                image,
                texture.target()
            )));
        }
        if level >= texture.mip_level_count() {
            return Err(GraphicsError::InvalidArgument(format!(
                "mip level {} out of range, texture has {}",
                level,
                texture.mip_level_count()
            )));
        }
        let (width, height) = mip_size(texture.width(), texture.height(), level);
        Ok(Self {
            raw: RawAttachment::Texture {
                texture: handle,
                target: image,
                level,
            },
            width,
            height,
            format: texture.internal_format(),
        })
    }

    /// A whole renderbuffer.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidState`] for a disposed renderbuffer.
    pub fn renderbuffer(renderbuffer: &Renderbuffer) -> Result<Self, GraphicsError> {
        Ok(Self {
            raw: RawAttachment::Renderbuffer(renderbuffer.handle()?),
            width: renderbuffer.width(),
            height: renderbuffer.height(),
            format: renderbuffer.format(),
        })
    }

    pub fn raw(&self) -> RawAttachment {
        self.raw
    }

    /// Width and height of the attached image.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }
}

/// Lifecycle state of a [`Framebuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferState {
    /// Nothing attached yet.
    Unattached,
    /// At least one attach succeeded.
    Attached,
    /// Released.
    Disposed,
}

/// An offscreen render target.
///
/// # Example
///
/// ```
/// use lumen_graphics::framebuffer::{AttachmentTarget, Framebuffer};
/// use lumen_graphics::texture::{CpuTexture, Image};
/// use lumen_graphics::{AttachmentPoint, Disposable, GraphicsDevice, ImageTarget, Texture};
///
/// let device = GraphicsDevice::dummy();
/// let mut color = Texture::from_cpu(&device, &CpuTexture::new(Image::storage(64, 64)))?;
/// let mut framebuffer = Framebuffer::new(&device)?;
/// framebuffer.attach(
///     AttachmentPoint::COLOR0,
///     AttachmentTarget::texture(&color, ImageTarget::Texture2D, 0)?,
/// )?;
/// assert!(framebuffer.is_complete());
///
/// framebuffer.dispose();
/// color.dispose();
/// # Ok::<(), lumen_graphics::GraphicsError>(())
/// ```
pub struct Framebuffer {
    device: Arc<GraphicsDevice>,
    handle: Option<FramebufferHandle>,
    attachments: BTreeMap<AttachmentPoint, AttachmentTarget>,
    state: FramebufferState,
    label: Option<String>,
}

impl Framebuffer {
    /// Create an empty framebuffer.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::ResourceCreationFailed`] when the device returns no
    /// framebuffer.
    pub fn new(device: &Arc<GraphicsDevice>) -> Result<Self, GraphicsError> {
        let handle = device
            .backend()
            .create_framebuffer()
            .ok_or_else(|| GraphicsError::ResourceCreationFailed("framebuffer".to_string()))?;
        device.track_created(ResourceKind::Framebuffer);
        log::trace!("GraphicsDevice: created framebuffer {:?}", handle);

        Ok(Self {
            device: Arc::clone(device),
            handle: Some(handle),
            attachments: BTreeMap::new(),
            state: FramebufferState::Unattached,
            label: None,
        })
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Bind `target` to slot `point`, replacing any previous attachment.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::IncompatibleAttachment`] when the format does not
    /// suit the slot, the size differs from the other attachments, or the
    /// device reports the result incomplete (the slot is then restored).
    /// [`GraphicsError::InvalidState`] after disposal.
    pub fn attach(
        &mut self,
        point: AttachmentPoint,
        target: AttachmentTarget,
    ) -> Result<(), GraphicsError> {
        let handle = self.handle()?;
        self.check_compatible(point, &target)?;

        let backend = self.device.backend();
        let previous = self.attachments.get(&point).copied();
        backend.attach(handle, point, Some(target.raw));

        let status = backend.check_framebuffer_status(handle);
        if !status.is_complete() {
            backend.attach(handle, point, previous.map(|p| p.raw));
            return Err(GraphicsError::IncompatibleAttachment(format!(
                "device reported {:?} after attaching {}",
                status, point
            )));
        }

        self.attachments.insert(point, target);
        if self.state == FramebufferState::Unattached {
            log::debug!("Framebuffer {:?}: Unattached -> Attached", handle);
            self.state = FramebufferState::Attached;
        }
        log::trace!(
            "Framebuffer {:?}: attached {:?} to {} ({}x{})",
            handle,
            target.raw,
            point,
            target.width,
            target.height
        );
        Ok(())
    }

    fn check_compatible(
        &self,
        point: AttachmentPoint,
        target: &AttachmentTarget,
    ) -> Result<(), GraphicsError> {
        if let AttachmentPoint::Color(index) = point {
            let max = self.device.capabilities().max_color_attachments;
            if index >= max {
                return Err(GraphicsError::IncompatibleAttachment(format!(
                    "{point} exceeds the device's {max} color attachments"
                )));
            }
        }

        let format = target.format;
        let suitable = match point {
            AttachmentPoint::Color(_) => format.is_color_renderable(),
            AttachmentPoint::Depth => format == PixelFormat::DepthComponent,
            AttachmentPoint::Stencil | AttachmentPoint::DepthStencil => {
                format == PixelFormat::DepthStencil
            }
        };
        if !suitable {
            return Err(GraphicsError::IncompatibleAttachment(format!(
                "{format:?} cannot be attached to {point}"
            )));
        }

        let conflict = self
            .attachments
            .iter()
            .find(|(p, a)| **p != point && a.size() != target.size());
        if let Some((other, existing)) = conflict {
            return Err(GraphicsError::IncompatibleAttachment(format!(
                "{} is {}x{} but {} is {}x{}",
                point, target.width, target.height, other, existing.width, existing.height
            )));
        }
        Ok(())
    }

    /// Clear slot `point`. Detaching an empty slot is a no-op.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidState`] after disposal.
    pub fn detach(&mut self, point: AttachmentPoint) -> Result<(), GraphicsError> {
        let handle = self.handle()?;
        if self.attachments.remove(&point).is_some() {
            self.device.backend().attach(handle, point, None);
            log::trace!("Framebuffer {:?}: detached {}", handle, point);
        }
        Ok(())
    }

    /// Check if the framebuffer can be rendered to: at least one color
    /// attachment, all attachments of one size.
    pub fn is_complete(&self) -> bool {
        self.handle.is_some()
            && self.attachments.keys().any(AttachmentPoint::is_color)
            && self
                .attachments
                .values()
                .all(|a| Some(a.size()) == self.attachments.values().next().map(|f| f.size()))
    }

    /// The record bound to `point`, if any.
    pub fn attachment(&self, point: AttachmentPoint) -> Option<&AttachmentTarget> {
        self.attachments.get(&point)
    }

    pub fn state(&self) -> FramebufferState {
        self.state
    }

    /// Get the device handle.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidState`] after disposal.
    pub fn handle(&self) -> Result<FramebufferHandle, GraphicsError> {
        self.handle
            .ok_or_else(|| GraphicsError::disposed("framebuffer"))
    }

    /// Schedule pending commands for execution.
    pub fn flush(&self) {
        self.device.flush();
    }

    /// Block until every submitted command has completed.
    pub fn finish(&self) {
        self.device.finish();
    }

    /// Get the framebuffer label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl RenderTarget for Framebuffer {
    fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    fn size(&self) -> (u32, u32) {
        self.attachments
            .values()
            .next()
            .map_or((0, 0), AttachmentTarget::size)
    }

    fn bind(&self) -> Result<(), GraphicsError> {
        let handle = self.handle()?;
        if !self.is_complete() {
            return Err(GraphicsError::InvalidState(format!(
                "framebuffer {:?} is incomplete",
                handle
            )));
        }
        let (width, height) = self.size();
        let backend = self.device.backend();
        backend.bind_framebuffer(Some(handle));
        backend.set_viewport(Viewport::from_dimensions(width, height));
        Ok(())
    }
}

impl Disposable for Framebuffer {
    fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.device.backend().delete_framebuffer(handle);
            self.device.track_released(ResourceKind::Framebuffer);
            self.attachments.clear();
            log::debug!("Framebuffer {:?}: -> Disposed", handle);
        }
        self.state = FramebufferState::Disposed;
    }

    fn is_disposed(&self) -> bool {
        self.handle.is_none()
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            log::warn!(
                "Framebuffer {:?} ({:?}) dropped without dispose",
                handle,
                self.label
            );
        }
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("handle", &self.handle)
            .field("state", &self.state)
            .field("attachments", &self.attachments)
            .field("label", &self.label)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;
    use lumen_core::sampler::TextureParameters;
    use lumen_core::texture::{DataType, Image};

    fn color_texture(device: &Arc<GraphicsDevice>, size: u32) -> Texture {
        Texture::new_2d(
            device,
            &Image::storage(size, size),
            PixelFormat::Rgba,
            DataType::UnsignedByte,
            PixelFormat::Rgba,
            TextureParameters::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_state_machine() {
        let device = GraphicsDevice::dummy();
        let mut color = color_texture(&device, 16);
        let mut framebuffer = Framebuffer::new(&device).unwrap();
        assert_eq!(framebuffer.state(), FramebufferState::Unattached);
        assert!(!framebuffer.is_complete());
        assert!(matches!(framebuffer.bind(), Err(GraphicsError::InvalidState(_))));

        let target = AttachmentTarget::texture(&color, ImageTarget::Texture2D, 0).unwrap();
        framebuffer.attach(AttachmentPoint::COLOR0, target).unwrap();
        assert_eq!(framebuffer.state(), FramebufferState::Attached);
        framebuffer.attach(AttachmentPoint::COLOR0, target).unwrap();
        assert_eq!(framebuffer.state(), FramebufferState::Attached);
        assert_eq!(framebuffer.size(), (16, 16));

        framebuffer.dispose();
        assert_eq!(framebuffer.state(), FramebufferState::Disposed);
        assert!(framebuffer.attach(AttachmentPoint::COLOR0, target).is_err());
        color.dispose();
    }

    #[test]
    fn test_depth_slot_needs_depth_format() {
        let device = GraphicsDevice::dummy();
        let mut color = color_texture(&device, 16);
        let mut framebuffer = Framebuffer::new(&device).unwrap();
        let target = AttachmentTarget::texture(&color, ImageTarget::Texture2D, 0).unwrap();
        let err = framebuffer
            .attach(AttachmentPoint::Depth, target)
            .unwrap_err();
        assert!(matches!(err, GraphicsError::IncompatibleAttachment(_)));
        assert_eq!(framebuffer.state(), FramebufferState::Unattached);
        framebuffer.dispose();
        color.dispose();
    }

    #[test]
    fn test_color_slot_limit() {
        let device = GraphicsDevice::dummy();
        let mut color = color_texture(&device, 16);
        let mut framebuffer = Framebuffer::new(&device).unwrap();
        let target = AttachmentTarget::texture(&color, ImageTarget::Texture2D, 0).unwrap();
        let max = device.capabilities().max_color_attachments;
        assert!(framebuffer
            .attach(AttachmentPoint::Color(max), target)
            .is_err());
        framebuffer.dispose();
        color.dispose();
    }

    #[test]
    fn test_device_rejection_rolls_back() {
        let backend = Arc::new(DummyBackend::new());
        let device = GraphicsDevice::new(backend.clone());
        let mut first = color_texture(&device, 16);
        let mut second = color_texture(&device, 16);
        let mut framebuffer = Framebuffer::new(&device).unwrap();

        let first_target = AttachmentTarget::texture(&first, ImageTarget::Texture2D, 0).unwrap();
        framebuffer
            .attach(AttachmentPoint::COLOR0, first_target)
            .unwrap();

        backend.fail_framebuffer_checks_after(0);
        let second_target = AttachmentTarget::texture(&second, ImageTarget::Texture2D, 0).unwrap();
        let err = framebuffer
            .attach(AttachmentPoint::COLOR0, second_target)
            .unwrap_err();
        assert!(matches!(err, GraphicsError::IncompatibleAttachment(_)));
        assert_eq!(
            framebuffer.attachment(AttachmentPoint::COLOR0),
            Some(&first_target)
        );
        let last = backend.commands().last().cloned();
        assert!(matches!(
            last,
            Some(crate::backend::DummyCommand::Attach {
                attachment: Some(a),
                ..
            }) if a == first_target.raw()
        ));

        backend.clear_failure_injection();
        framebuffer.dispose();
        first.dispose();
        second.dispose();
    }

    #[test]
    fn test_detach() {
        let device = GraphicsDevice::dummy();
        let mut color = color_texture(&device, 8);
        let mut framebuffer = Framebuffer::new(&device).unwrap();
        let target = AttachmentTarget::texture(&color, ImageTarget::Texture2D, 0).unwrap();
        framebuffer.attach(AttachmentPoint::COLOR0, target).unwrap();
        framebuffer.detach(AttachmentPoint::COLOR0).unwrap();
        framebuffer.detach(AttachmentPoint::COLOR0).unwrap();
        assert!(framebuffer.attachment(AttachmentPoint::COLOR0).is_none());
        assert!(!framebuffer.is_complete());
        framebuffer.dispose();
        color.dispose();
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let backend = Arc::new(DummyBackend::new());
        let device = GraphicsDevice::new(backend.clone());
        let mut color = color_texture(&device, 8);
        let mut framebuffer = Framebuffer::new(&device).unwrap();
        let target = AttachmentTarget::texture(&color, ImageTarget::Texture2D, 0).unwrap();
        framebuffer.attach(AttachmentPoint::COLOR0, target).unwrap();
        assert_eq!(device.framebuffer_count(), 1);

        framebuffer.dispose();
        framebuffer.dispose();
        assert!(framebuffer.is_disposed());
        assert_eq!(framebuffer.state(), FramebufferState::Disposed);
        assert!(framebuffer.attachment(AttachmentPoint::COLOR0).is_none());
        assert_eq!(device.framebuffer_count(), 0);
        let deletes = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, crate::backend::DummyCommand::DeleteFramebuffer(_)))
            .count();
        assert_eq!(deletes, 1);

        color.dispose();
        assert_eq!(device.live_resource_count(), 0);
    }

    #[test]
    fn test_clear_populates_color() {
        let backend = Arc::new(DummyBackend::new());
        let device = GraphicsDevice::new(backend.clone());
        let mut color = color_texture(&device, 8);
        let mut framebuffer = Framebuffer::new(&device).unwrap();
        let state = ClearState::new([0.0, 0.0, 0.0], 1.0);
        assert!(framebuffer.clear(BufferBit::COLOR, &state).is_err());

        let target = AttachmentTarget::texture(&color, ImageTarget::Texture2D, 0).unwrap();
        framebuffer.attach(AttachmentPoint::COLOR0, target).unwrap();
        let handle = color.handle().unwrap();
        assert!(!backend.is_populated(handle, ImageTarget::Texture2D, 0));
        framebuffer.clear(BufferBit::COLOR, &state).unwrap();
        assert!(backend.is_populated(handle, ImageTarget::Texture2D, 0));

        framebuffer.dispose();
        color.dispose();
    }

    #[test]
    fn test_attachment_target_validation() {
        let device = GraphicsDevice::dummy();
        let mut color = color_texture(&device, 8);
        assert!(AttachmentTarget::texture(
            &color,
            ImageTarget::CubeFace(lumen_core::texture::CubeFace::PositiveX),
            0
        )
        .is_err());
        assert!(AttachmentTarget::texture(&color, ImageTarget::Texture2D, 1).is_err());
        color.dispose();
        assert!(matches!(
            AttachmentTarget::texture(&color, ImageTarget::Texture2D, 0),
            Err(GraphicsError::InvalidState(_))
        ));
    }
}
