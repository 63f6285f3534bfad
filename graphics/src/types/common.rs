//! Common types shared across the graphics system.

use bitflags::bitflags;

// ============================================================================
// Viewport
// ============================================================================

/// Viewport rectangle in framebuffer pixels.
///
/// Render targets set a viewport covering their full size every time they
/// are bound, so callers never inherit a stale viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    /// X coordinate of the lower-left corner.
    pub x: i32,
    /// Y coordinate of the lower-left corner.
    pub y: i32,
    /// Width of the viewport.
    pub width: u32,
    /// Height of the viewport.
    pub height: u32,
}

impl Viewport {
    /// Create a new viewport.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a viewport from dimensions with origin at (0, 0).
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }
}

// ============================================================================
// Clearing
// ============================================================================

bitflags! {
    /// Which buffers of a render target a clear touches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferBit: u32 {
        /// Color attachments.
        const COLOR = 1 << 0;
        /// Depth attachment.
        const DEPTH = 1 << 1;
        /// Stencil attachment.
        const STENCIL = 1 << 2;
    }
}

impl Default for BufferBit {
    fn default() -> Self {
        Self::all()
    }
}

/// Values written by a clear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearState {
    /// RGB clear color.
    pub color: [f32; 3],
    /// Alpha clear value.
    pub alpha: f32,
    /// Depth clear value.
    pub depth: f32,
    /// Stencil clear value.
    pub stencil: u32,
}

impl ClearState {
    /// Clear to an opaque-or-not color with default depth and stencil.
    pub fn new(color: [f32; 3], alpha: f32) -> Self {
        Self {
            color,
            alpha,
            ..Default::default()
        }
    }

    /// Set the depth clear value.
    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    /// Set the stencil clear value.
    pub fn with_stencil(mut self, stencil: u32) -> Self {
        self.stencil = stencil;
        self
    }
}

impl Default for ClearState {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0],
            alpha: 1.0,
            depth: 1.0,
            stencil: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_from_dimensions() {
        let viewport = Viewport::from_dimensions(640, 480);
        assert_eq!(viewport, Viewport::new(0, 0, 640, 480));
    }

    #[test]
    fn test_clear_state_builders() {
        let state = ClearState::new([1.0, 1.0, 1.0], 1.0).with_depth(0.5).with_stencil(3);
        assert_eq!(state.color, [1.0, 1.0, 1.0]);
        assert_eq!(state.depth, 0.5);
        assert_eq!(state.stencil, 3);
    }

    #[test]
    fn test_buffer_bit_default_is_all() {
        let mask = BufferBit::default();
        assert!(mask.contains(BufferBit::COLOR | BufferBit::DEPTH | BufferBit::STENCIL));
    }
}
