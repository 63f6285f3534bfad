//! Texture sampling parameters and filter/address mode definitions.

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest neighbor filtering.
    Nearest,
    /// Linear filtering.
    #[default]
    Linear,
}

/// Texture address mode (wrapping behavior).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Clamp to edge.
    #[default]
    ClampToEdge,
    /// Repeat.
    Repeat,
    /// Mirrored repeat.
    MirroredRepeat,
}

/// How a texture is sampled, plus whether it carries a mip chain.
///
/// This is a device-agnostic descriptor; `lumen-graphics` applies it to a
/// device texture at creation and on `Texture::set_parameters`.
///
/// # Example
///
/// ```
/// use lumen_core::sampler::{AddressMode, TextureParameters};
///
/// let params = TextureParameters::linear()
///     .with_wrap(AddressMode::Repeat, AddressMode::ClampToEdge)
///     .with_mipmaps(true);
/// assert!(params.generate_mipmaps);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureParameters {
    /// Address mode along S (U).
    pub wrap_s: AddressMode,
    /// Address mode along T (V).
    pub wrap_t: AddressMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Filter between mip levels, `None` to sample level 0 only.
    pub mipmap_filter: Option<FilterMode>,
    /// Anisotropic filtering level; 1 disables it.
    pub anisotropy_levels: u16,
    /// Whether the texture keeps a generated mip chain.
    pub generate_mipmaps: bool,
}

impl TextureParameters {
    /// Linear filtering, clamped addressing, no mipmaps.
    pub fn linear() -> Self {
        Self::default()
    }

    /// Nearest neighbor filtering, clamped addressing, no mipmaps.
    pub fn nearest() -> Self {
        Self {
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            ..Default::default()
        }
    }

    /// Set address modes for S and T.
    pub fn with_wrap(mut self, wrap_s: AddressMode, wrap_t: AddressMode) -> Self {
        self.wrap_s = wrap_s;
        self.wrap_t = wrap_t;
        self
    }

    /// Set the minification filter.
    pub fn with_min_filter(mut self, filter: FilterMode) -> Self {
        self.min_filter = filter;
        self
    }

    /// Set the magnification filter.
    pub fn with_mag_filter(mut self, filter: FilterMode) -> Self {
        self.mag_filter = filter;
        self
    }

    /// Request (or drop) a generated mip chain.
    ///
    /// Enabling mipmaps also enables linear filtering between levels.
    pub fn with_mipmaps(mut self, generate: bool) -> Self {
        self.generate_mipmaps = generate;
        self.mipmap_filter = if generate {
            Some(self.mipmap_filter.unwrap_or(FilterMode::Linear))
        } else {
            None
        };
        self
    }

    /// Set the anisotropic filtering level (clamped to at least 1).
    pub fn with_anisotropy(mut self, levels: u16) -> Self {
        self.anisotropy_levels = levels.max(1);
        self
    }
}

impl Default for TextureParameters {
    fn default() -> Self {
        Self {
            wrap_s: AddressMode::ClampToEdge,
            wrap_t: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: None,
            anisotropy_levels: 1,
            generate_mipmaps: false,
        }
    }
}
