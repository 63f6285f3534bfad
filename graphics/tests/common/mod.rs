//! Common utilities for device integration tests.
//!
//! This module provides shared test infrastructure that can be reused
//! across backend configurations.

use std::sync::Arc;

use lumen_graphics::texture::{CpuTexture, DataType, Image, PixelFormat};
use lumen_graphics::sampler::TextureParameters;
use lumen_graphics::{
    DeviceCapabilities, DummyBackend, GraphicsDevice, Program, Renderbuffer, Texture,
};

// ============================================================================
// Backend Enumeration
// ============================================================================

/// Device configurations for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Dummy backend with default capabilities.
    Dummy,
    /// Dummy backend reporting the smallest device the crate supports:
    /// one color attachment, no float or depth textures.
    DummyMinimal,
}

impl Backend {
    /// Get the backend name for display.
    #[allow(dead_code)]
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Dummy => "dummy",
            Backend::DummyMinimal => "dummy-minimal",
        }
    }

    fn capabilities(self) -> DeviceCapabilities {
        match self {
            Backend::Dummy => DeviceCapabilities::default(),
            Backend::DummyMinimal => DeviceCapabilities::default()
                .with_max_texture_dimension(1024)
                .with_max_color_attachments(1)
                .with_float_textures(false)
                .with_depth_textures(false),
        }
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// A device plus direct access to its dummy backend for inspection.
pub struct TestContext {
    /// The backend being tested.
    #[allow(dead_code)]
    pub backend: Backend,
    /// The device's backend, for command and state inspection.
    pub dummy: Arc<DummyBackend>,
    /// Graphics device for creating resources.
    pub device: Arc<GraphicsDevice>,
}

impl TestContext {
    /// Create a new test context for the given backend.
    ///
    /// Returns `None` if the backend is not available.
    pub fn new(backend: Backend) -> Option<Self> {
        let _ = env_logger::builder().is_test(true).try_init();

        let dummy = Arc::new(DummyBackend::with_capabilities(backend.capabilities()));
        let device = GraphicsDevice::new(dummy.clone());
        Some(Self {
            backend,
            dummy,
            device,
        })
    }

    /// Create an empty RGBA8 2D texture usable as a color attachment.
    #[allow(dead_code)]
    pub fn create_render_target(&self, width: u32, height: u32) -> Texture {
        Texture::new_2d(
            &self.device,
            &Image::storage(width, height),
            PixelFormat::Rgba,
            DataType::UnsignedByte,
            PixelFormat::Rgba,
            TextureParameters::default(),
        )
        .expect("Failed to create render target")
    }

    /// Create a depth renderbuffer.
    #[allow(dead_code)]
    pub fn create_depth_buffer(&self, width: u32, height: u32) -> Renderbuffer {
        Renderbuffer::new(&self.device, PixelFormat::DepthComponent, width, height)
            .expect("Failed to create depth renderbuffer")
    }

    /// Compile and link the UV test program.
    #[allow(dead_code)]
    pub fn create_uv_program(&self) -> Program {
        Program::compile_and_link(&self.device, UV_VERTEX_SHADER, UV_FRAGMENT_SHADER)
            .expect("Failed to link UV program")
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        // Ensure the device is idle before cleanup
        self.device.finish();
    }
}

// ============================================================================
// Test Data
// ============================================================================

/// A 2:1 equirectangular image with a horizontal gradient.
#[allow(dead_code)]
pub fn gradient_panorama(width: u32) -> CpuTexture {
    let height = width / 2;
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..height {
        for x in 0..width {
            let r = (x * 255 / width.max(1)) as u8;
            data.extend_from_slice(&[r, 64, 255 - r, 255]);
        }
    }
    CpuTexture::new(Image::new(width, height, data))
}

// ============================================================================
// Shaders
// ============================================================================

/// Vertex shader passing UVs through.
pub const UV_VERTEX_SHADER: &str = r#"
attribute vec3 position;
attribute vec2 uv;
varying vec2 v_uv;

void main() {
    v_uv = uv;
    gl_Position = vec4(position, 1.0);
}
"#;

/// Fragment shader sampling one texture with a tint.
pub const UV_FRAGMENT_SHADER: &str = r#"
precision mediump float;
uniform sampler2D map;
uniform vec4 tint;
varying vec2 v_uv;

void main() {
    gl_FragColor = texture2D(map, v_uv) * tint;
}
"#;
