//! GPU resources.
//!
//! This module contains the device-owned resource types:
//! - [`Buffer`] - device memory block, read through [`AttributeBinding`]s
//! - [`Texture`] - 2D or cube texture
//!
//! Programs live in [`crate::program`], framebuffers and renderbuffers in
//! [`crate::framebuffer`].
//!
//! Every resource owns exactly one device handle, allocated at construction
//! and released by [`Disposable::dispose`]. Dropping an undisposed resource
//! releases nothing and logs a leak warning.

mod buffer;
mod texture;

pub use buffer::{AttributeBinding, Buffer};
pub use texture::Texture;

/// Explicit release of device objects.
pub trait Disposable {
    /// Release the device handle. Calling it again is a no-op.
    fn dispose(&mut self);

    /// Check if [`dispose`](Self::dispose) has run.
    fn is_disposed(&self) -> bool;
}
