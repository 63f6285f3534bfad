//! GPU buffer resource and attribute bindings.

use std::sync::Arc;

use crate::backend::{BufferHandle, VertexAttribPointer};
use crate::device::{GraphicsDevice, ResourceKind};
use crate::error::GraphicsError;
use crate::types::{BufferTarget, BufferUsageHint, ComponentType};

use super::Disposable;

/// A GPU buffer resource.
///
/// # Example
///
/// ```
/// use lumen_graphics::{Buffer, BufferTarget, BufferUsageHint, Disposable, GraphicsDevice};
///
/// let device = GraphicsDevice::dummy();
/// let positions = [0.0f32, 1.0, 2.0];
/// let mut buffer = Buffer::from_slice(
///     &device,
///     BufferTarget::Array,
///     &positions,
///     BufferUsageHint::StaticDraw,
/// )?;
/// assert_eq!(buffer.size(), 12);
/// buffer.dispose();
/// # Ok::<(), lumen_graphics::GraphicsError>(())
/// ```
pub struct Buffer {
    device: Arc<GraphicsDevice>,
    handle: Option<BufferHandle>,
    target: BufferTarget,
    usage: BufferUsageHint,
    size: usize,
    label: Option<String>,
}

impl Buffer {
    /// Allocate a buffer of exactly `data.len()` bytes and fill it.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidArgument`] for empty data,
    /// [`GraphicsError::ResourceCreationFailed`] when the device returns no
    /// buffer.
    pub fn upload(
        device: &Arc<GraphicsDevice>,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsageHint,
    ) -> Result<Self, GraphicsError> {
        if data.is_empty() {
            return Err(GraphicsError::InvalidArgument(
                "buffer data cannot be empty".to_string(),
            ));
        }

        let backend = device.backend();
        let handle = backend
            .create_buffer()
            .ok_or_else(|| GraphicsError::ResourceCreationFailed("buffer".to_string()))?;
        backend.buffer_data(handle, target, data, usage);
        device.track_created(ResourceKind::Buffer);

        log::trace!(
            "GraphicsDevice: created buffer {:?}, target={:?}, size={}",
            handle,
            target,
            data.len()
        );

        Ok(Self {
            device: Arc::clone(device),
            handle: Some(handle),
            target,
            usage,
            size: data.len(),
            label: None,
        })
    }

    /// Upload a slice of plain-old-data values.
    ///
    /// # Errors
    ///
    /// Same as [`Buffer::upload`].
    pub fn from_slice<T: bytemuck::Pod>(
        device: &Arc<GraphicsDevice>,
        target: BufferTarget,
        data: &[T],
        usage: BufferUsageHint,
    ) -> Result<Self, GraphicsError> {
        Self::upload(device, target, bytemuck::cast_slice(data), usage)
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Replace the buffer contents, reallocating to `data.len()` bytes.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidState`] after disposal,
    /// [`GraphicsError::InvalidArgument`] for empty data.
    pub fn update(&mut self, data: &[u8]) -> Result<(), GraphicsError> {
        let handle = self.handle()?;
        if data.is_empty() {
            return Err(GraphicsError::InvalidArgument(
                "buffer data cannot be empty".to_string(),
            ));
        }
        self.device
            .backend()
            .buffer_data(handle, self.target, data, self.usage);
        self.size = data.len();
        Ok(())
    }

    /// Get the device handle.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidState`] after disposal.
    pub fn handle(&self) -> Result<BufferHandle, GraphicsError> {
        self.handle.ok_or_else(|| GraphicsError::disposed("buffer"))
    }

    /// Get the parent device.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Get the buffer size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn target(&self) -> BufferTarget {
        self.target
    }

    pub fn usage(&self) -> BufferUsageHint {
        self.usage
    }

    /// Get the buffer label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl Disposable for Buffer {
    fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.device.backend().delete_buffer(handle);
            self.device.track_released(ResourceKind::Buffer);
            log::trace!("GraphicsDevice: deleted buffer {:?}", handle);
        }
    }

    fn is_disposed(&self) -> bool {
        self.handle.is_none()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            log::warn!(
                "Buffer {:?} ({:?}) dropped without dispose; device memory leaked",
                handle,
                self.label
            );
        }
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("handle", &self.handle)
            .field("target", &self.target)
            .field("size", &self.size)
            .field("label", &self.label)
            .finish()
    }
}

static_assertions::assert_impl_all!(Buffer: Send, Sync);

/// A region of a [`Buffer`] read as one vertex attribute.
///
/// Bindings borrow their buffer, so a binding can never outlive it.
#[derive(Debug, Clone, Copy)]
pub struct AttributeBinding<'a> {
    buffer: &'a Buffer,
    components: u32,
    component_type: ComponentType,
    normalized: bool,
    stride: u32,
    offset: u32,
}

impl<'a> AttributeBinding<'a> {
    /// Read `components` values of `component_type` per vertex, tightly packed.
    pub fn new(buffer: &'a Buffer, components: u32, component_type: ComponentType) -> Self {
        Self {
            buffer,
            components,
            component_type,
            normalized: false,
            stride: 0,
            offset: 0,
        }
    }

    /// Map integer components to the normalized range.
    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    /// Set the byte distance between consecutive vertices.
    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    /// Set the byte offset of the first component.
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn buffer(&self) -> &'a Buffer {
        self.buffer
    }

    pub fn components(&self) -> u32 {
        self.components
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn normalized(&self) -> bool {
        self.normalized
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Resolve to the device-level pointer.
    pub(crate) fn pointer(&self) -> Result<VertexAttribPointer, GraphicsError> {
        if !(1..=4).contains(&self.components) {
            return Err(GraphicsError::InvalidArgument(format!(
                "attribute component count must be 1 to 4, got {}",
                self.components
            )));
        }
        if self.offset as usize >= self.buffer.size() {
            return Err(GraphicsError::InvalidArgument(format!(
                "attribute offset {} is past the end of a {} byte buffer",
                self.offset,
                self.buffer.size()
            )));
        }
        Ok(VertexAttribPointer {
            buffer: self.buffer.handle()?,
            components: self.components,
            component_type: self.component_type,
            normalized: self.normalized,
            stride: self.stride,
            offset: self.offset,
        })
    }
}
