//! CPU-side sampler types.
//!
//! Provides [`TextureParameters`] for describing texture sampling, along
//! with the [`FilterMode`] and [`AddressMode`] enums shared between CPU and
//! device code.

mod types;

pub use types::{AddressMode, FilterMode, TextureParameters};
