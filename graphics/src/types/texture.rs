//! Texture targets and framebuffer attachment points.

use lumen_core::texture::CubeFace;

/// Kind of texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    /// A single 2D image (plus mips).
    Texture2D,
    /// Six square face images (plus mips).
    CubeMap,
}

impl TextureTarget {
    /// Number of level-0 images this kind of texture holds.
    pub fn image_count(&self) -> usize {
        match self {
            Self::Texture2D => 1,
            Self::CubeMap => 6,
        }
    }
}

/// One image slot of a texture: the 2D image or one cube face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageTarget {
    /// The image of a 2D texture.
    Texture2D,
    /// One face of a cube texture.
    CubeFace(CubeFace),
}

impl ImageTarget {
    /// The texture kind that owns this image slot.
    pub fn texture_target(&self) -> TextureTarget {
        match self {
            Self::Texture2D => TextureTarget::Texture2D,
            Self::CubeFace(_) => TextureTarget::CubeMap,
        }
    }

    /// Index of this slot within its texture (0 for 2D, face index for cubes).
    pub fn index(&self) -> usize {
        match self {
            Self::Texture2D => 0,
            Self::CubeFace(face) => face.index(),
        }
    }

    /// All image slots of a texture kind, in upload order.
    pub fn all_for(target: TextureTarget) -> Vec<ImageTarget> {
        match target {
            TextureTarget::Texture2D => vec![Self::Texture2D],
            TextureTarget::CubeMap => CubeFace::ALL.iter().copied().map(Self::CubeFace).collect(),
        }
    }
}

/// A framebuffer attachment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttachmentPoint {
    /// Color attachment `n`.
    Color(u8),
    /// Depth attachment.
    Depth,
    /// Stencil attachment.
    Stencil,
    /// Combined depth-stencil attachment.
    DepthStencil,
}

impl AttachmentPoint {
    /// The first color attachment.
    pub const COLOR0: Self = Self::Color(0);

    /// Check if this is a color slot.
    pub fn is_color(&self) -> bool {
        matches!(self, Self::Color(_))
    }
}

impl std::fmt::Display for AttachmentPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Color(i) => write!(f, "color{i}"),
            Self::Depth => write!(f, "depth"),
            Self::Stencil => write!(f, "stencil"),
            Self::DepthStencil => write!(f, "depth-stencil"),
        }
    }
}

/// Completeness status reported by the device for a framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferStatus {
    /// Ready for rendering.
    Complete,
    /// An attachment references a missing or unusable image.
    IncompleteAttachment,
    /// Nothing is attached.
    IncompleteMissingAttachment,
    /// Attachments differ in size.
    IncompleteDimensions,
    /// The combination of formats is not supported by the device.
    Unsupported,
}

impl FramebufferStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Number of mip levels in a full chain for an image of this size.
pub fn full_mip_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Size of mip `level` of an image of this size.
pub fn mip_size(width: u32, height: u32, level: u32) -> (u32, u32) {
    (
        width.checked_shr(level).unwrap_or(0).max(1),
        height.checked_shr(level).unwrap_or(0).max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_mip_count() {
        assert_eq!(full_mip_count(1, 1), 1);
        assert_eq!(full_mip_count(2, 2), 2);
        assert_eq!(full_mip_count(512, 512), 10);
        assert_eq!(full_mip_count(300, 17), 9);
    }

    #[test]
    fn test_mip_size() {
        assert_eq!(mip_size(256, 64, 0), (256, 64));
        assert_eq!(mip_size(256, 64, 3), (32, 8));
        assert_eq!(mip_size(256, 64, 8), (1, 1));
        assert_eq!(mip_size(256, 64, 40), (1, 1));
    }

    #[test]
    fn test_image_targets_for_cube() {
        let targets = ImageTarget::all_for(TextureTarget::CubeMap);
        assert_eq!(targets.len(), 6);
        assert_eq!(targets[2], ImageTarget::CubeFace(CubeFace::PositiveY));
        assert!(targets
            .iter()
            .all(|t| t.texture_target() == TextureTarget::CubeMap));
    }

    #[test]
    fn test_attachment_point_display() {
        assert_eq!(AttachmentPoint::COLOR0.to_string(), "color0");
        assert_eq!(AttachmentPoint::DepthStencil.to_string(), "depth-stencil");
    }
}
