//! Texture data in upload form and the configured texture sources.
//!
//! Rows are kept bottom-up, the way a BMP stores them, so a texcoord of
//! `v = 0` addresses the bottom of the picture. Images decoded through the
//! `image` crate are flipped to match.

use std::path::{Path, PathBuf};

use image::{
    RgbaImage,
    imageops::{self, FilterType},
};

use crate::{
    bmp::{self, RawImage},
    error::{AssetError, AssetResult},
};

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureData {
    /// Create a new texture with given dimensions and RGBA8 format.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> AssetResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(AssetError::TruncatedData {
                expected,
                found: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        })
    }

    /// Expand a decoded RGB image to opaque RGBA8.
    pub fn from_rgb(image: &RawImage) -> AssetResult<Self> {
        let data = image
            .pixels
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 255])
            .collect();
        Self::new_rgba8(image.width, image.height, data)
    }

    /// Load a non-BMP texture (PNG) through the `image` crate.
    pub fn load_png<P: AsRef<Path>>(path: P) -> AssetResult<Self> {
        let path = path.as_ref();
        log::info!("Loading texture from {:?}", path);

        let img = image::open(path).map_err(|e| match e {
            image::ImageError::IoError(source) => AssetError::io(path, source),
            other => AssetError::UnsupportedFormat(format!("{}: {other}", path.display())),
        })?;

        let rgba = img.flipv().to_rgba8();
        let (width, height) = rgba.dimensions();
        let data = rgba.into_raw();

        log::info!("Loaded texture {}x{} with {} bytes", width, height, data.len());

        Self::new_rgba8(width, height, data)
    }

    /// Create a simple test texture (checkerboard pattern).
    pub fn create_test_texture(size: u32) -> Self {
        let mut data = Vec::with_capacity((size * size * 4) as usize);

        for y in 0..size {
            for x in 0..size {
                let checker = ((x / 8) + (y / 8)) % 2;
                if checker == 0 {
                    // White square
                    data.extend_from_slice(&[255, 255, 255, 255]);
                } else {
                    // Gray square
                    data.extend_from_slice(&[128, 128, 128, 255]);
                }
            }
        }

        Self {
            data,
            width: size,
            height: size,
            format: TextureFormat::Rgba8,
        }
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    /// Number of levels in a full mip chain down to 1x1.
    pub fn mip_level_count(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }

    /// Levels 1.. of the mip chain (level 0 is `self`), each half the size
    /// of the previous one.
    pub fn mip_chain(&self) -> AssetResult<Vec<TextureData>> {
        let mut current = RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or(AssetError::TruncatedData {
                expected: self.byte_len().unwrap_or(usize::MAX),
                found: self.data.len(),
            })?;

        let mut levels = Vec::new();
        for _ in 1..self.mip_level_count() {
            let width = (current.width() / 2).max(1);
            let height = (current.height() / 2).max(1);
            current = imageops::resize(&current, width, height, FilterType::Triangle);
            levels.push(Self::new_rgba8(width, height, current.as_raw().clone())?);
        }
        Ok(levels)
    }

    fn byte_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.bytes_per_pixel() as usize)
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        self.byte_len() == Some(self.data.len()) && self.width > 0 && self.height > 0
    }
}

/// Where the viewer takes its texture from.
#[derive(Clone, Debug, PartialEq)]
pub enum TextureSource {
    /// `.bmp` files go through the bitmap decoder, anything else through `image`.
    File(PathBuf),
    Checker(u32),
}

impl TextureSource {
    pub fn load(&self) -> AssetResult<TextureData> {
        match self {
            TextureSource::File(path) => {
                let is_bmp = path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("bmp"));
                if is_bmp {
                    TextureData::from_rgb(&bmp::load_bmp(path)?)
                } else {
                    TextureData::load_png(path)
                }
            }
            TextureSource::Checker(size) => Ok(TextureData::create_test_texture(*size)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_expands_to_opaque_rgba() {
        let image = RawImage {
            width: 2,
            height: 1,
            pixels: vec![1, 2, 3, 4, 5, 6],
        };
        let tex = TextureData::from_rgb(&image).expect("expand");
        assert_eq!(tex.data, vec![1, 2, 3, 255, 4, 5, 6, 255]);
        assert!(tex.is_valid());
    }

    #[test]
    fn checker_texture_is_valid() {
        let tex = TextureSource::Checker(16).load().expect("checker");
        assert!(tex.is_valid());
        assert_eq!(&tex.data[..4], &[255, 255, 255, 255]);
        assert_eq!(&tex.data[8 * 4..8 * 4 + 4], &[128, 128, 128, 255]);
    }

    #[test]
    fn mip_chain_halves_down_to_one_texel() {
        let tex = TextureData::new_rgba8(
            5,
            2,
            (0..5 * 2).flat_map(|_| [200, 100, 50, 255]).collect(),
        )
        .expect("texture");
        assert_eq!(tex.mip_level_count(), 3);
        let chain = tex.mip_chain().expect("mip chain");
        let dims: Vec<_> = chain.iter().map(|t| (t.width, t.height)).collect();
        assert_eq!(dims, vec![(2, 1), (1, 1)]);
        assert!(chain.iter().all(TextureData::is_valid));
        // A flat colour survives filtering.
        for level in &chain {
            for px in level.data.chunks_exact(4) {
                assert!(px[0].abs_diff(200) <= 1 && px[1].abs_diff(100) <= 1);
                assert!(px[2].abs_diff(50) <= 1 && px[3] == 255);
            }
        }
    }

    #[test]
    fn validity_check_does_not_overflow() {
        let huge = TextureData {
            data: vec![0; 4],
            width: u32::MAX,
            height: u32::MAX,
            format: TextureFormat::Rgba8,
        };
        assert!(!huge.is_valid());
        assert!(huge.mip_chain().is_err());
    }

    #[test]
    fn wrong_buffer_size_is_rejected() {
        assert!(TextureData::new_rgba8(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn bmp_extension_uses_bitmap_decoder() {
        let source = TextureSource::File(PathBuf::from("missing/world.BMP"));
        assert!(matches!(source.load(), Err(AssetError::Io { .. })));
    }
}
