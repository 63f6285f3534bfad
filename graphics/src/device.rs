//! Graphics device.
//!
//! The [`GraphicsDevice`] wraps a [`GpuBackend`] and is the handle every
//! resource keeps to the device that created it. It also counts live
//! resources per kind, which leak tests rely on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::backend::{DummyBackend, GpuBackend};

/// Capabilities of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Maximum texture width or height.
    pub max_texture_dimension: u32,
    /// Maximum anisotropic filtering level.
    pub max_anisotropy: u16,
    /// Number of color attachment slots per framebuffer.
    pub max_color_attachments: u8,
    /// Whether half-float and float color textures are supported.
    pub float_textures: bool,
    /// Whether depth and depth-stencil textures are supported.
    pub depth_textures: bool,
}

impl DeviceCapabilities {
    /// Set the maximum texture dimension.
    pub fn with_max_texture_dimension(mut self, dimension: u32) -> Self {
        self.max_texture_dimension = dimension;
        self
    }

    /// Set the maximum anisotropy level.
    pub fn with_max_anisotropy(mut self, levels: u16) -> Self {
        self.max_anisotropy = levels;
        self
    }

    /// Set the number of color attachment slots.
    pub fn with_max_color_attachments(mut self, count: u8) -> Self {
        self.max_color_attachments = count;
        self
    }

    /// Enable or disable float textures.
    pub fn with_float_textures(mut self, supported: bool) -> Self {
        self.float_textures = supported;
        self
    }

    /// Enable or disable depth textures.
    pub fn with_depth_textures(mut self, supported: bool) -> Self {
        self.depth_textures = supported;
        self
    }
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_texture_dimension: 4096,
            max_anisotropy: 16,
            max_color_attachments: 4,
            float_textures: true,
            depth_textures: true,
        }
    }
}

/// Kinds of device objects counted by [`GraphicsDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ResourceKind {
    Buffer,
    Texture,
    Program,
    Framebuffer,
    Renderbuffer,
}

impl ResourceKind {
    const COUNT: usize = 5;

    fn slot(self) -> usize {
        match self {
            Self::Buffer => 0,
            Self::Texture => 1,
            Self::Program => 2,
            Self::Framebuffer => 3,
            Self::Renderbuffer => 4,
        }
    }
}

/// A graphics device for creating GPU resources.
///
/// # Thread Safety
///
/// `GraphicsDevice` is `Send + Sync` and is shared as `Arc<GraphicsDevice>`.
/// Commands are executed by the backend in submission order.
///
/// # Example
///
/// ```
/// use lumen_graphics::GraphicsDevice;
///
/// let device = GraphicsDevice::dummy();
/// assert_eq!(device.name(), "Dummy");
/// assert_eq!(device.texture_count(), 0);
/// ```
pub struct GraphicsDevice {
    backend: Arc<dyn GpuBackend>,
    capabilities: DeviceCapabilities,
    live: [AtomicUsize; ResourceKind::COUNT],
}

impl GraphicsDevice {
    /// Create a device over `backend`.
    pub fn new(backend: Arc<dyn GpuBackend>) -> Arc<Self> {
        let capabilities = backend.capabilities();
        log::debug!(
            "GraphicsDevice: created on {} backend, max texture dimension {}",
            backend.name(),
            capabilities.max_texture_dimension
        );
        Arc::new(Self {
            backend,
            capabilities,
            live: Default::default(),
        })
    }

    /// Create a device over a [`DummyBackend`] with default capabilities.
    pub fn dummy() -> Arc<Self> {
        Self::new(Arc::new(DummyBackend::new()))
    }

    /// Create a device over a [`DummyBackend`] reporting `capabilities`.
    pub fn with_capabilities(capabilities: DeviceCapabilities) -> Arc<Self> {
        Self::new(Arc::new(DummyBackend::with_capabilities(capabilities)))
    }

    /// Get the backend.
    pub fn backend(&self) -> &dyn GpuBackend {
        self.backend.as_ref()
    }

    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        self.backend.name()
    }

    /// Get the device capabilities.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Schedule pending commands for execution.
    pub fn flush(&self) {
        self.backend.flush();
    }

    /// Block until every submitted command has completed.
    pub fn finish(&self) {
        self.backend.finish();
    }

    pub(crate) fn track_created(&self, kind: ResourceKind) {
        self.live[kind.slot()].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn track_released(&self, kind: ResourceKind) {
        let previous = self.live[kind.slot()].fetch_sub(1, Ordering::Relaxed);
        debug_assert!(previous > 0, "released more {kind:?} objects than created");
    }

    fn live_count(&self, kind: ResourceKind) -> usize {
        self.live[kind.slot()].load(Ordering::Relaxed)
    }

    /// Get the number of live buffers created by this device.
    pub fn buffer_count(&self) -> usize {
        self.live_count(ResourceKind::Buffer)
    }

    /// Get the number of live textures created by this device.
    pub fn texture_count(&self) -> usize {
        self.live_count(ResourceKind::Texture)
    }

    /// Get the number of live programs created by this device.
    pub fn program_count(&self) -> usize {
        self.live_count(ResourceKind::Program)
    }

    /// Get the number of live framebuffers created by this device.
    pub fn framebuffer_count(&self) -> usize {
        self.live_count(ResourceKind::Framebuffer)
    }

    /// Get the number of live renderbuffers created by this device.
    pub fn renderbuffer_count(&self) -> usize {
        self.live_count(ResourceKind::Renderbuffer)
    }

    /// Total number of live resources of every kind.
    pub fn live_resource_count(&self) -> usize {
        self.live.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("backend", &self.backend.name())
            .field("capabilities", &self.capabilities)
            .field("live_resources", &self.live_resource_count())
            .finish()
    }
}

// Ensure GraphicsDevice is Send + Sync
static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_name() {
        let device = GraphicsDevice::dummy();
        assert_eq!(device.name(), "Dummy");
    }

    #[test]
    fn test_capabilities_from_backend() {
        let caps = DeviceCapabilities::default()
            .with_max_texture_dimension(256)
            .with_float_textures(false);
        let device = GraphicsDevice::with_capabilities(caps);
        assert_eq!(device.capabilities().max_texture_dimension, 256);
        assert!(!device.capabilities().float_textures);
    }

    #[test]
    fn test_resource_counters() {
        let device = GraphicsDevice::dummy();
        device.track_created(ResourceKind::Buffer);
        device.track_created(ResourceKind::Buffer);
        device.track_created(ResourceKind::Texture);
        assert_eq!(device.buffer_count(), 2);
        assert_eq!(device.texture_count(), 1);
        assert_eq!(device.live_resource_count(), 3);

        device.track_released(ResourceKind::Buffer);
        assert_eq!(device.buffer_count(), 1);
        assert_eq!(device.program_count(), 0);
    }

    #[test]
    fn test_device_debug() {
        let device = GraphicsDevice::dummy();
        let debug = format!("{:?}", device);
        assert!(debug.contains("GraphicsDevice"));
        assert!(debug.contains("Dummy"));
    }
}
