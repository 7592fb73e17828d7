use crate::foundation::error::{RasterError, RasterResult};

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Straight (non-premultiplied) RGBA8 pixel.
pub type Rgba8 = [u8; 4];

/// Owned RGBA8 raster in row-major order with straight alpha.
///
/// `pixels.len() == width * height * 4` holds for every value of this type; the only
/// way to build one from raw bytes is [`RasterBuffer::new`], which checks it.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl std::fmt::Debug for RasterBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

pub(crate) fn rgba_len(width: u32, height: u32) -> RasterResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| RasterError::validation("raster buffer size overflow"))
}

impl RasterBuffer {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> RasterResult<Self> {
        let expected = rgba_len(width, height)?;
        if pixels.len() != expected {
            return Err(RasterError::decode(format!(
                "rgba8 buffer of {width}x{height} expects {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Fully transparent black buffer.
    pub fn transparent(width: u32, height: u32) -> RasterResult<Self> {
        let len = rgba_len(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![0u8; len],
        })
    }

    pub fn filled(width: u32, height: u32, rgba: Rgba8) -> RasterResult<Self> {
        let count = rgba_len(width, height)? / 4;
        Ok(Self {
            width,
            height,
            pixels: rgba.repeat(count),
        })
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Rgba8) -> RasterResult<Self> {
        let mut pixels = Vec::with_capacity(rgba_len(width, height)?);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&f(x, y));
            }
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True when the buffer covers no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    #[inline]
    pub(crate) fn offset(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Pixel at `(x, y)`. Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba8 {
        assert!(x < self.width && y < self.height, "pixel ({x},{y}) out of bounds");
        let i = self.offset(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: Rgba8) {
        assert!(x < self.width && y < self.height, "pixel ({x},{y}) out of bounds");
        let i = self.offset(x, y);
        self.pixels[i..i + 4].copy_from_slice(&rgba);
    }

    #[inline]
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.pixels[self.offset(x, y) + 3]
    }

    /// Number of pixels whose alpha is non-zero.
    pub fn count_opaque(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|px| px[3] != 0).count()
    }

    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    pub fn into_rgba_image(self) -> image::RgbaImage {
        // Length is guaranteed by construction.
        image::RgbaImage::from_raw(self.width, self.height, self.pixels)
            .unwrap_or_else(|| image::RgbaImage::new(0, 0))
    }

    /// Copy the `w x h` rectangle at `(src_x, src_y)` of `src` to `(dst_x, dst_y)` of `self`,
    /// replacing destination pixels. Parts falling outside either buffer are clipped.
    #[allow(clippy::too_many_arguments)]
    pub fn copy_rect_from(
        &mut self,
        src: &RasterBuffer,
        src_x: u32,
        src_y: u32,
        w: u32,
        h: u32,
        dst_x: i64,
        dst_y: i64,
    ) {
        for row in 0..h {
            let sy = src_y + row;
            let dy = dst_y + i64::from(row);
            if sy >= src.height || dy < 0 || dy >= i64::from(self.height) {
                continue;
            }
            for col in 0..w {
                let sx = src_x + col;
                let dx = dst_x + i64::from(col);
                if sx >= src.width || dx < 0 || dx >= i64::from(self.width) {
                    continue;
                }
                let s = src.offset(sx, sy);
                let d = self.offset(dx as u32, dy as u32);
                self.pixels[d..d + 4].copy_from_slice(&src.pixels[s..s + 4]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_length_mismatch() {
        let err = RasterBuffer::new(2, 2, vec![0u8; 15]).unwrap_err();
        assert!(matches!(err, RasterError::Decode(_)));
        RasterBuffer::new(2, 2, vec![0u8; 16]).unwrap();
    }

    #[test]
    fn zero_area_buffers_are_empty() {
        let b = RasterBuffer::transparent(0, 7).unwrap();
        assert!(b.is_empty());
        assert!(b.pixels().is_empty());
    }

    #[test]
    fn put_and_read_pixel() {
        let mut b = RasterBuffer::filled(3, 2, [1, 2, 3, 255]).unwrap();
        b.put_pixel(2, 1, [9, 8, 7, 6]);
        assert_eq!(b.pixel(2, 1), [9, 8, 7, 6]);
        assert_eq!(b.pixel(0, 0), [1, 2, 3, 255]);
        assert_eq!(b.count_opaque(), 6);
    }

    #[test]
    fn copy_rect_clips_to_destination() {
        let src = RasterBuffer::filled(4, 4, [255, 0, 0, 255]).unwrap();
        let mut dst = RasterBuffer::transparent(3, 3).unwrap();
        dst.copy_rect_from(&src, 0, 0, 4, 4, 1, 1);
        assert_eq!(dst.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(dst.pixel(1, 1), [255, 0, 0, 255]);
        assert_eq!(dst.pixel(2, 2), [255, 0, 0, 255]);
        assert_eq!(dst.count_opaque(), 4);
    }

    #[test]
    fn rgba_image_conversion_preserves_bytes() {
        let b = RasterBuffer::from_fn(2, 1, |x, _| [x as u8, 0, 0, 255]).unwrap();
        let img = b.clone().into_rgba_image();
        assert_eq!(RasterBuffer::from_rgba_image(img), b);
    }
}
