//! Decoder for uncompressed 24-bit bitmaps (BMP, bottom-up, BGR).
//!
//! Only the classic 54-byte header layout is understood: the pixel block is
//! assumed to start right after it and is read as one `width * height * 3`
//! run, without stripping row padding.

use std::path::Path;

use crate::error::{AssetError, AssetResult};

/// Offset of the width field.
const DIMENSIONS_OFFSET: usize = 18;
/// Bytes between the bit-depth field and the pixel data.
const HEADER_TAIL: usize = 24;
/// Total header size: 18 + width + height + planes + bpp + 24.
pub const HEADER_LEN: usize = DIMENSIONS_OFFSET + 4 + 4 + 2 + 2 + HEADER_TAIL;

/// Decoded image: RGB triplets, rows in stored (bottom-up) order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RawImage {
    /// RGB triplet at `(x, y)` in stored row order.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }
}

/// Load and decode a bitmap file.
pub fn load_bmp(path: impl AsRef<Path>) -> AssetResult<RawImage> {
    let path = path.as_ref();
    log::info!("Loading bitmap from {:?}", path);
    // Whole-file read: the handle is closed before decoding starts.
    let bytes = std::fs::read(path).map_err(|e| AssetError::io(path, e))?;
    let image = decode_bmp(&bytes)?;
    log::info!(
        "Loaded bitmap {}x{} with {} bytes",
        image.width,
        image.height,
        image.pixels.len()
    );
    Ok(image)
}

/// Decode a bitmap held in memory.
pub fn decode_bmp(bytes: &[u8]) -> AssetResult<RawImage> {
    let mut cursor = ByteCursor::new(bytes);
    cursor.skip(DIMENSIONS_OFFSET)?;
    let width = cursor.read_u32_le()?;
    let height = cursor.read_u32_le()?;

    let planes = cursor.read_u16_le()?;
    if planes != 1 {
        return Err(AssetError::UnsupportedFormat(format!(
            "bitmap plane count is {planes}, expected 1"
        )));
    }
    let bpp = cursor.read_u16_le()?;
    if bpp != 24 {
        return Err(AssetError::UnsupportedFormat(format!(
            "bitmap bit depth is {bpp}, expected 24"
        )));
    }
    if width == 0 || height == 0 {
        return Err(AssetError::UnsupportedFormat(format!(
            "bitmap has empty dimensions {width}x{height}"
        )));
    }
    cursor.skip(HEADER_TAIL)?;

    let size = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| {
            AssetError::UnsupportedFormat(format!("bitmap dimensions {width}x{height} overflow"))
        })?;

    let mut pixels = cursor.take(size)?.to_vec();
    for px in pixels.chunks_exact_mut(3) {
        px.swap(0, 2);
    }

    Ok(RawImage {
        width,
        height,
        pixels,
    })
}

/// Little-endian reader over a byte slice; every read is bounds-checked.
struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> AssetResult<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.bytes.len());
        match end {
            Some(end) => {
                let out = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(out)
            }
            None => Err(AssetError::TruncatedData {
                expected: self.pos.saturating_add(n),
                found: self.bytes.len(),
            }),
        }
    }

    fn skip(&mut self, n: usize) -> AssetResult<()> {
        self.take(n).map(|_| ())
    }

    fn read_u16_le(&mut self) -> AssetResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32_le(&mut self) -> AssetResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal bitmap with the given header fields followed by `pixels` (BGR).
    pub(crate) fn bitmap(width: u32, height: u32, planes: u16, bpp: u16, pixels: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + pixels.len());
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&((HEADER_LEN + pixels.len()) as u32).to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&(HEADER_LEN as u32).to_le_bytes());
        out.extend_from_slice(&40u32.to_le_bytes());
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&planes.to_le_bytes());
        out.extend_from_slice(&bpp.to_le_bytes());
        out.extend_from_slice(&[0; HEADER_TAIL]);
        assert_eq!(out.len(), HEADER_LEN);
        out.extend_from_slice(pixels);
        out
    }

    #[test]
    fn decodes_bgr_into_rgb() {
        // 2x2, each pixel stored as B, G, R with distinct values.
        let stored = [
            10, 20, 30, 11, 21, 31, //
            12, 22, 32, 13, 23, 33,
        ];
        let image = decode_bmp(&bitmap(2, 2, 1, 24, &stored)).expect("decode");
        assert_eq!(image.width, 2);
        assert_eq!(image.height, 2);
        assert_eq!(image.pixels.len(), 2 * 2 * 3);
        assert_eq!(image.pixel(0, 0), Some([30, 20, 10]));
        assert_eq!(image.pixel(1, 0), Some([31, 21, 11]));
        assert_eq!(image.pixel(1, 1), Some([33, 23, 13]));
        assert_eq!(image.pixel(2, 0), None);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut stored = vec![1, 2, 3];
        stored.extend_from_slice(&[0xAA; 5]);
        let image = decode_bmp(&bitmap(1, 1, 1, 24, &stored)).expect("decode");
        assert_eq!(image.pixels, vec![3, 2, 1]);
    }

    #[test]
    fn wrong_plane_count_is_unsupported() {
        // Huge dimensions: rejection must happen before any pixel allocation.
        let bytes = bitmap(u32::MAX, u32::MAX, 2, 24, &[]);
        assert!(matches!(
            decode_bmp(&bytes),
            Err(AssetError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn wrong_bit_depth_is_unsupported() {
        let bytes = bitmap(1, 1, 1, 32, &[0; 4]);
        assert!(matches!(
            decode_bmp(&bytes),
            Err(AssetError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn short_pixel_block_is_truncated() {
        let bytes = bitmap(2, 2, 1, 24, &[0; 11]);
        match decode_bmp(&bytes) {
            Err(AssetError::TruncatedData { expected, found }) => {
                assert_eq!(expected, HEADER_LEN + 12);
                assert_eq!(found, HEADER_LEN + 11);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
    }

    #[test]
    fn short_header_is_truncated() {
        assert!(matches!(
            decode_bmp(b"BM\0\0"),
            Err(AssetError::TruncatedData { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_bmp("no/such/texture.bmp"),
            Err(AssetError::Io { .. })
        ));
    }

    #[test]
    fn load_from_disk() {
        let path = std::env::temp_dir().join(format!("svarog-bmp-{}.bmp", std::process::id()));
        std::fs::write(&path, bitmap(1, 1, 1, 24, &[0, 128, 255])).expect("write fixture");
        let image = load_bmp(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(image.expect("decode").pixels, vec![255, 128, 0]);
    }
}
