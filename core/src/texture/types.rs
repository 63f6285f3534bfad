//! Pixel formats, component data types and cube face order.

/// Layout of the channels in a pixel, used both for uploaded data and for
/// the device-side internal format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// Single alpha channel.
    Alpha,
    /// Single luminance channel.
    Luminance,
    /// Luminance plus alpha.
    LuminanceAlpha,
    /// Red, green, blue.
    Rgb,
    /// Red, green, blue, alpha.
    #[default]
    Rgba,
    /// Depth only.
    DepthComponent,
    /// Packed depth and stencil.
    DepthStencil,
}

impl PixelFormat {
    /// Number of channels per pixel.
    pub fn components(&self) -> u32 {
        match self {
            Self::Alpha | Self::Luminance | Self::DepthComponent => 1,
            Self::LuminanceAlpha | Self::DepthStencil => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Check if this is a depth (or depth-stencil) format.
    pub fn is_depth(&self) -> bool {
        matches!(self, Self::DepthComponent | Self::DepthStencil)
    }

    /// Check if this format carries stencil bits.
    pub fn has_stencil(&self) -> bool {
        matches!(self, Self::DepthStencil)
    }

    /// Check if images of this format can be bound to a color attachment.
    pub fn is_color_renderable(&self) -> bool {
        matches!(self, Self::Rgb | Self::Rgba)
    }
}

/// Scalar type of each uploaded channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    /// 8-bit unsigned integer.
    #[default]
    UnsignedByte,
    /// 16-bit unsigned integer.
    UnsignedShort,
    /// 32-bit unsigned integer.
    UnsignedInt,
    /// 16-bit float.
    HalfFloat,
    /// 32-bit float.
    Float,
    /// Packed 24-bit depth plus 8-bit stencil, one per pixel.
    UnsignedInt24_8,
}

impl DataType {
    /// Size of one channel in bytes. Packed types report the whole pixel.
    pub fn size(&self) -> usize {
        match self {
            Self::UnsignedByte => 1,
            Self::UnsignedShort | Self::HalfFloat => 2,
            Self::UnsignedInt | Self::Float | Self::UnsignedInt24_8 => 4,
        }
    }

    /// Check if this is a floating-point type.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::HalfFloat | Self::Float)
    }

    /// Check if one value of this type covers every channel of a pixel.
    pub fn is_packed(&self) -> bool {
        matches!(self, Self::UnsignedInt24_8)
    }
}

/// Bytes per pixel for `format` uploaded as `data_type`.
pub fn bytes_per_pixel(format: PixelFormat, data_type: DataType) -> usize {
    if data_type.is_packed() {
        data_type.size()
    } else {
        format.components() as usize * data_type.size()
    }
}

/// One face of a cube map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    /// All faces in upload and render order.
    pub const ALL: [CubeFace; 6] = [
        Self::PositiveX,
        Self::NegativeX,
        Self::PositiveY,
        Self::NegativeY,
        Self::PositiveZ,
        Self::NegativeZ,
    ];

    /// Position of this face in [`CubeFace::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_format_components() {
        assert_eq!(PixelFormat::Alpha.components(), 1);
        assert_eq!(PixelFormat::LuminanceAlpha.components(), 2);
        assert_eq!(PixelFormat::Rgb.components(), 3);
        assert_eq!(PixelFormat::Rgba.components(), 4);
    }

    #[test]
    fn test_format_classes() {
        assert!(PixelFormat::DepthComponent.is_depth());
        assert!(PixelFormat::DepthStencil.has_stencil());
        assert!(!PixelFormat::DepthComponent.has_stencil());
        assert!(PixelFormat::Rgba.is_color_renderable());
        assert!(!PixelFormat::Luminance.is_color_renderable());
        assert!(!PixelFormat::DepthComponent.is_color_renderable());
    }

    #[test]
    fn test_bytes_per_pixel() {
        assert_eq!(bytes_per_pixel(PixelFormat::Rgba, DataType::UnsignedByte), 4);
        assert_eq!(bytes_per_pixel(PixelFormat::Rgb, DataType::Float), 12);
        assert_eq!(bytes_per_pixel(PixelFormat::Rgba, DataType::HalfFloat), 8);
        assert_eq!(
            bytes_per_pixel(PixelFormat::DepthStencil, DataType::UnsignedInt24_8),
            4
        );
    }

    #[test]
    fn test_cube_face_order() {
        for (i, face) in CubeFace::ALL.iter().enumerate() {
            assert_eq!(face.index(), i);
        }
        assert_eq!(CubeFace::ALL[0], CubeFace::PositiveX);
        assert_eq!(CubeFace::ALL[5], CubeFace::NegativeZ);
    }
}
