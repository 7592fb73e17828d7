use image::imageops::FilterType;

use crate::foundation::{
    core::RasterBuffer,
    error::{RasterError, RasterResult},
    math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place},
};

/// Resample to exactly `width x height`.
///
/// Filtering happens on premultiplied pixels so fully transparent neighbours do not bleed
/// their (meaningless) colour into the result.
pub fn resize_exact(src: &RasterBuffer, width: u32, height: u32) -> RasterResult<RasterBuffer> {
    if width == 0 || height == 0 {
        return Err(RasterError::validation("resize target must be non-zero"));
    }
    if src.is_empty() {
        return Err(RasterError::validation("cannot resize an empty buffer"));
    }
    if src.dimensions() == (width, height) {
        return Ok(src.clone());
    }

    let mut premul = src.pixels().to_vec();
    premultiply_rgba8_in_place(&mut premul);
    let img = RasterBuffer::new(src.width(), src.height(), premul)?.into_rgba_image();

    let resized = image::imageops::resize(&img, width, height, FilterType::Triangle);
    let mut out = RasterBuffer::from_rgba_image(resized);
    unpremultiply_rgba8_in_place(out.pixels_mut());
    Ok(out)
}

/// Copy out the `w x h` region at `(x, y)`; the region must lie inside `src`.
pub fn crop_region(src: &RasterBuffer, x: u32, y: u32, w: u32, h: u32) -> RasterResult<RasterBuffer> {
    let fits_x = x.checked_add(w).is_some_and(|r| r <= src.width());
    let fits_y = y.checked_add(h).is_some_and(|b| b <= src.height());
    if !fits_x || !fits_y {
        return Err(RasterError::validation(format!(
            "crop {w}x{h}+{x}+{y} exceeds {}x{} source",
            src.width(),
            src.height()
        )));
    }
    let mut out = RasterBuffer::transparent(w, h)?;
    out.copy_rect_from(src, x, y, w, h, 0, 0);
    Ok(out)
}

/// Shrink images wider than `max_width`, preserving aspect ratio. Narrower images are
/// returned unchanged; images are never enlarged.
#[tracing::instrument(skip(src), fields(w = src.width(), h = src.height()))]
pub fn fit_width(src: RasterBuffer, max_width: u32) -> RasterResult<RasterBuffer> {
    if max_width == 0 {
        return Err(RasterError::validation("max_width must be non-zero"));
    }
    if src.width() <= max_width {
        return Ok(src);
    }
    let scale = f64::from(max_width) / f64::from(src.width());
    let height = ((f64::from(src.height()) * scale).round() as u32).max(1);
    resize_exact(&src, max_width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_constant_image_stays_constant() {
        let src = RasterBuffer::filled(8, 6, [10, 20, 30, 255]).unwrap();
        let out = resize_exact(&src, 4, 3).unwrap();
        assert_eq!(out.dimensions(), (4, 3));
        for px in out.pixels().chunks_exact(4) {
            assert_eq!(px, &[10, 20, 30, 255]);
        }
    }

    #[test]
    fn resize_does_not_bleed_transparent_colour() {
        // Left half opaque red, right half transparent white.
        let src = RasterBuffer::from_fn(4, 1, |x, _| {
            if x < 2 {
                [255, 0, 0, 255]
            } else {
                [255, 255, 255, 0]
            }
        })
        .unwrap();
        let out = resize_exact(&src, 2, 1).unwrap();
        let left = out.pixel(0, 0);
        assert!(left[1] < 16 && left[2] < 16, "got {left:?}");
    }

    #[test]
    fn crop_region_bounds_are_checked() {
        let src = RasterBuffer::filled(4, 4, [1, 1, 1, 255]).unwrap();
        assert_eq!(crop_region(&src, 1, 1, 3, 3).unwrap().dimensions(), (3, 3));
        assert!(crop_region(&src, 2, 0, 3, 1).is_err());
    }

    #[test]
    fn fit_width_only_shrinks() {
        let small = RasterBuffer::filled(100, 50, [0, 0, 0, 255]).unwrap();
        assert_eq!(fit_width(small, 1024).unwrap().dimensions(), (100, 50));

        let wide = RasterBuffer::filled(2048, 1000, [0, 0, 0, 255]).unwrap();
        assert_eq!(fit_width(wide, 1024).unwrap().dimensions(), (1024, 500));
    }
}
