//! CPU-side images and texture descriptions.

use crate::sampler::TextureParameters;

use super::types::{bytes_per_pixel, DataType, PixelFormat};

/// A 2D image: dimensions plus optional tightly packed pixel rows.
///
/// An image without data describes storage only, such as a render target
/// face that will be filled by drawing.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    data: Option<Vec<u8>>,
}

impl Image {
    /// Create an image from pixel bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Some(data),
        }
    }

    /// Create a storage-only image with no pixel data.
    pub fn storage(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: None,
        }
    }

    /// Create an image filled with a repeated pixel value.
    pub fn filled(width: u32, height: u32, pixel: &[u8]) -> Self {
        let data = pixel.repeat(width as usize * height as usize);
        Self::new(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width and height.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixel bytes, or `None` for storage-only images.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Check if width equals height.
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Byte length pixel data must have for the given format and type.
    pub fn expected_len(&self, format: PixelFormat, data_type: DataType) -> usize {
        self.width as usize * self.height as usize * bytes_per_pixel(format, data_type)
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.as_ref().map(Vec::len))
            .finish()
    }
}

/// CPU-side description of a 2D texture.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuTexture {
    /// Debug label.
    pub label: Option<String>,
    /// Source image.
    pub image: Image,
    /// Channel layout of the image data.
    pub pixel_format: PixelFormat,
    /// Channel type of the image data.
    pub data_type: DataType,
    /// Sampling parameters.
    pub params: TextureParameters,
}

impl CpuTexture {
    /// Describe an RGBA8 texture for `image` with default parameters.
    pub fn new(image: Image) -> Self {
        Self {
            label: None,
            image,
            pixel_format: PixelFormat::Rgba,
            data_type: DataType::UnsignedByte,
            params: TextureParameters::default(),
        }
    }

    /// Set the pixel format and data type of the image data.
    pub fn with_format(mut self, pixel_format: PixelFormat, data_type: DataType) -> Self {
        self.pixel_format = pixel_format;
        self.data_type = data_type;
        self
    }

    /// Set the sampling parameters.
    pub fn with_params(mut self, params: TextureParameters) -> Self {
        self.params = params;
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// CPU-side description of a cube texture: six face images in
/// [`CubeFace::ALL`](super::CubeFace::ALL) order.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuCubeTexture {
    /// Debug label.
    pub label: Option<String>,
    /// Face images, +X, -X, +Y, -Y, +Z, -Z.
    pub faces: Vec<Image>,
    /// Channel layout of the image data.
    pub pixel_format: PixelFormat,
    /// Channel type of the image data.
    pub data_type: DataType,
    /// Sampling parameters.
    pub params: TextureParameters,
}

impl CpuCubeTexture {
    /// Describe an RGBA8 cube texture from face images.
    pub fn new(faces: Vec<Image>) -> Self {
        Self {
            label: None,
            faces,
            pixel_format: PixelFormat::Rgba,
            data_type: DataType::UnsignedByte,
            params: TextureParameters::default(),
        }
    }

    /// Describe a storage-only cube texture with square faces.
    pub fn storage(face_size: u32) -> Self {
        Self::new(vec![Image::storage(face_size, face_size); 6])
    }

    /// Set the pixel format and data type of the face data.
    pub fn with_format(mut self, pixel_format: PixelFormat, data_type: DataType) -> Self {
        self.pixel_format = pixel_format;
        self.data_type = data_type;
        self
    }

    /// Set the sampling parameters.
    pub fn with_params(mut self, params: TextureParameters) -> Self {
        self.params = params;
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_expected_len() {
        let image = Image::filled(4, 2, &[1, 2, 3, 4]);
        assert_eq!(image.data().map(<[u8]>::len), Some(32));
        assert_eq!(
            image.expected_len(PixelFormat::Rgba, DataType::UnsignedByte),
            32
        );
        assert!(!image.is_square());
    }

    #[test]
    fn test_storage_image() {
        let image = Image::storage(8, 8);
        assert!(image.data().is_none());
        assert!(image.is_square());
        assert_eq!(format!("{:?}", image), "Image { width: 8, height: 8, bytes: None }");
    }

    #[test]
    fn test_cube_storage() {
        let cube = CpuCubeTexture::storage(16).with_label("env");
        assert_eq!(cube.faces.len(), 6);
        assert!(cube.faces.iter().all(|f| f.size() == (16, 16)));
        assert_eq!(cube.label.as_deref(), Some("env"));
    }
}
