use crate::foundation::{
    core::RasterBuffer,
    error::{RasterError, RasterResult},
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CropOptions {
    /// A pixel is content when `alpha > alpha_threshold`; keeps faint halos out of the box.
    pub alpha_threshold: u8,
    /// Padding on each side as a fraction of the longest content side.
    pub padding_ratio: f64,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            alpha_threshold: 50,
            padding_ratio: 0.05,
        }
    }
}

impl CropOptions {
    pub fn validate(&self) -> RasterResult<()> {
        if !self.padding_ratio.is_finite() || self.padding_ratio < 0.0 {
            return Err(RasterError::validation(
                "padding_ratio must be finite and >= 0",
            ));
        }
        if self.padding_ratio > 10.0 {
            return Err(RasterError::validation("padding_ratio must be <= 10"));
        }
        Ok(())
    }
}

/// Inclusive pixel bounds of the content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContentBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl ContentBounds {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// Scan for the tight box around pixels with `alpha > alpha_threshold`.
pub fn content_bounds(buffer: &RasterBuffer, alpha_threshold: u8) -> RasterResult<ContentBounds> {
    let (width, height) = buffer.dimensions();
    let mut bounds: Option<ContentBounds> = None;

    for (y, row) in buffer
        .pixels()
        .chunks_exact((width as usize * 4).max(1))
        .enumerate()
        .take(height as usize)
    {
        let y = y as u32;
        for (x, px) in row.chunks_exact(4).enumerate() {
            if px[3] <= alpha_threshold {
                continue;
            }
            let x = x as u32;
            match bounds.as_mut() {
                None => {
                    bounds = Some(ContentBounds {
                        min_x: x,
                        min_y: y,
                        max_x: x,
                        max_y: y,
                    })
                }
                Some(b) => {
                    b.min_x = b.min_x.min(x);
                    b.max_x = b.max_x.max(x);
                    b.max_y = y;
                }
            }
        }
    }

    bounds.ok_or(RasterError::EmptyContent)
}

/// Re-frame the content on a transparent, padded square canvas.
///
/// The canvas side is `max(content_w, content_h) + 2 * floor(max * padding_ratio)` and the
/// content is centred on it. Applying this to its own output returns the same buffer.
/// When nothing passes the threshold the input is returned unchanged.
#[tracing::instrument(skip(buffer), fields(w = buffer.width(), h = buffer.height()))]
pub fn tight_crop(buffer: RasterBuffer, opts: &CropOptions) -> RasterResult<RasterBuffer> {
    opts.validate()?;
    match try_tight_crop(&buffer, opts) {
        Ok(out) => Ok(out),
        Err(RasterError::EmptyContent) => {
            tracing::warn!("no content above alpha threshold; returning input unchanged");
            Ok(buffer)
        }
        Err(e) => Err(e),
    }
}

/// Like [`tight_crop`] but reports [`RasterError::EmptyContent`] instead of recovering.
pub fn try_tight_crop(buffer: &RasterBuffer, opts: &CropOptions) -> RasterResult<RasterBuffer> {
    opts.validate()?;
    let bounds = content_bounds(buffer, opts.alpha_threshold)?;
    let (content_w, content_h) = (bounds.width(), bounds.height());

    let max_dim = content_w.max(content_h);
    let padding = (f64::from(max_dim) * opts.padding_ratio).floor() as u32;
    let target = max_dim
        .checked_add(padding.saturating_mul(2))
        .ok_or_else(|| RasterError::validation("padded crop size overflow"))?;

    let dest_x = (target - content_w) / 2;
    let dest_y = (target - content_h) / 2;

    let mut out = RasterBuffer::transparent(target, target)?;
    out.copy_rect_from(
        buffer,
        bounds.min_x,
        bounds.min_y,
        content_w,
        content_h,
        i64::from(dest_x),
        i64::from(dest_y),
    );

    tracing::debug!(?bounds, target, padding, "tight crop");
    Ok(out)
}
