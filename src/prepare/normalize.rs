use crate::{
    assets::decode::decode_image,
    encode::codec::{OutputFormat, encode_as},
    foundation::{
        core::RasterBuffer,
        error::{RasterError, RasterResult},
    },
    prepare::resample::{crop_region, resize_exact},
};

/// Aspect ratios accepted by the downstream generative model, in selection order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait3x4,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait9x16,
        AspectRatio::Landscape16x9,
    ];

    /// `(width, height)` terms of the ratio.
    pub fn terms(self) -> (u32, u32) {
        match self {
            Self::Square => (1, 1),
            Self::Portrait3x4 => (3, 4),
            Self::Landscape4x3 => (4, 3),
            Self::Portrait9x16 => (9, 16),
            Self::Landscape16x9 => (16, 9),
        }
    }

    pub fn value(self) -> f64 {
        let (w, h) = self.terms();
        f64::from(w) / f64::from(h)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait3x4 => "3:4",
            Self::Landscape4x3 => "4:3",
            Self::Portrait9x16 => "9:16",
            Self::Landscape16x9 => "16:9",
        }
    }

    /// Closest supported ratio to `width / height`; ties go to the earlier entry of
    /// [`AspectRatio::ALL`].
    pub fn closest(width: u32, height: u32) -> RasterResult<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::decode(format!(
                "cannot pick an aspect ratio for {width}x{height}"
            )));
        }
        let source = f64::from(width) / f64::from(height);
        let mut best = Self::ALL[0];
        let mut best_diff = f64::INFINITY;
        for ratio in Self::ALL {
            let diff = (source - ratio.value()).abs();
            if diff < best_diff {
                best_diff = diff;
                best = ratio;
            }
        }
        Ok(best)
    }

    /// Largest centred crop of `width x height` with exactly this ratio, as
    /// `(x, y, crop_width, crop_height)`. Integer arithmetic keeps the ratio exact
    /// up to truncation of one pixel.
    pub fn center_crop(self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let (num, den) = self.terms();
        let (w, h) = (u64::from(width), u64::from(height));
        let (num, den) = (u64::from(num), u64::from(den));

        let (crop_w, crop_h) = if w * den > h * num {
            // wider than the ratio: trim columns
            ((h * num / den).max(1), h)
        } else {
            (w, (w * den / num).max(1))
        };
        let crop_w = crop_w.min(w) as u32;
        let crop_h = crop_h.min(h) as u32;
        ((width - crop_w) / 2, (height - crop_h) / 2, crop_w, crop_h)
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.label() == s.trim())
            .ok_or_else(|| RasterError::validation(format!("unsupported aspect ratio '{s}'")))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Longest side allowed after cropping.
    pub max_dimension: u32,
    /// JPEG quality (1..=100) used by [`prepare_for_model`].
    pub jpeg_quality: u8,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_dimension: 1024,
            jpeg_quality: 95,
        }
    }
}

impl NormalizeOptions {
    pub fn validate(&self) -> RasterResult<()> {
        if self.max_dimension == 0 {
            return Err(RasterError::validation("max_dimension must be non-zero"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(RasterError::validation("jpeg_quality must be in 1..=100"));
        }
        Ok(())
    }
}

/// Centre-crop `buffer` to the closest supported ratio and shrink it so neither side
/// exceeds `max_dimension`.
#[tracing::instrument(skip(buffer), fields(w = buffer.width(), h = buffer.height()))]
pub fn normalize(buffer: RasterBuffer, max_dimension: u32) -> RasterResult<(RasterBuffer, AspectRatio)> {
    if max_dimension == 0 {
        return Err(RasterError::validation("max_dimension must be non-zero"));
    }
    let (src_w, src_h) = buffer.dimensions();
    let ratio = AspectRatio::closest(src_w, src_h)?;
    let (x, y, crop_w, crop_h) = ratio.center_crop(src_w, src_h);

    let cropped = if (crop_w, crop_h) == (src_w, src_h) {
        buffer
    } else {
        crop_region(&buffer, x, y, crop_w, crop_h)?
    };

    let longest = crop_w.max(crop_h);
    let out = if longest > max_dimension {
        let scale = f64::from(max_dimension) / f64::from(longest);
        let out_w = ((f64::from(crop_w) * scale).round() as u32).clamp(1, max_dimension);
        let out_h = ((f64::from(crop_h) * scale).round() as u32).clamp(1, max_dimension);
        resize_exact(&cropped, out_w, out_h)?
    } else {
        cropped
    };

    tracing::debug!(
        ratio = ratio.label(),
        crop_w,
        crop_h,
        out_w = out.width(),
        out_h = out.height(),
        "normalized aspect"
    );
    Ok((out, ratio))
}

/// Encoded model input plus the ratio that was applied.
#[derive(Clone, Debug)]
pub struct PreparedInput {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub aspect_ratio: AspectRatio,
    pub width: u32,
    pub height: u32,
}

/// Decode, normalize and re-encode an image so a generative model receives a frame with
/// one of its native aspect ratios.
pub fn prepare_for_model(bytes: &[u8], opts: &NormalizeOptions) -> RasterResult<PreparedInput> {
    opts.validate()?;
    let decoded = decode_image(bytes)?;
    let (buffer, aspect_ratio) = normalize(decoded, opts.max_dimension)?;

    let format = OutputFormat::Jpeg;
    let bytes = encode_as(&buffer, format, opts.jpeg_quality, [255, 255, 255])?;

    Ok(PreparedInput {
        bytes,
        mime: format.mime(),
        aspect_ratio,
        width: buffer.width(),
        height: buffer.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(w: u32, h: u32) -> RasterBuffer {
        RasterBuffer::from_fn(w, h, |x, y| [(x % 256) as u8, (y % 256) as u8, 0, 255]).unwrap()
    }

    #[test]
    fn selects_expected_ratios() {
        let cases = [
            ((1000, 1000), AspectRatio::Square),
            ((1200, 900), AspectRatio::Landscape4x3),
            ((1920, 1080), AspectRatio::Landscape16x9),
            ((900, 1600), AspectRatio::Portrait9x16),
            ((600, 800), AspectRatio::Portrait3x4),
        ];
        for ((w, h), want) in cases {
            assert_eq!(AspectRatio::closest(w, h).unwrap(), want, "{w}x{h}");
        }
    }

    #[test]
    fn center_crop_matches_ratio_and_fits_source() {
        for (w, h) in [(1000, 1000), (1201, 899), (1920, 1080), (901, 1603), (333, 77), (5, 999)] {
            let ratio = AspectRatio::closest(w, h).unwrap();
            let (x, y, cw, ch) = ratio.center_crop(w, h);
            assert!(cw <= w && ch <= h);
            assert!(x + cw <= w && y + ch <= h);
            let (num, den) = ratio.terms();
            let ideal_w = f64::from(ch) * f64::from(num) / f64::from(den);
            assert!((f64::from(cw) - ideal_w).abs() <= 1.0, "{w}x{h} -> {cw}x{ch}");
        }
    }

    #[test]
    fn normalize_crops_then_scales() {
        let (out, ratio) = normalize(opaque(2000, 1000), 1024).unwrap();
        assert_eq!(ratio, AspectRatio::Landscape16x9);
        assert_eq!(out.dimensions(), (1024, 576));
    }

    #[test]
    fn normalize_leaves_small_exact_ratio_untouched() {
        let src = opaque(400, 300);
        let (out, ratio) = normalize(src.clone(), 1024).unwrap();
        assert_eq!(ratio, AspectRatio::Landscape4x3);
        assert_eq!(out, src);
    }

    #[test]
    fn normalize_centers_the_crop() {
        // 5x4 source is closest to 4:3; the crop trims to 5x3, removing one row at the
        // bottom because offsets truncate.
        let src = opaque(5, 4);
        let (x, y, cw, ch) = AspectRatio::Landscape4x3.center_crop(5, 4);
        assert_eq!((x, y, cw, ch), (0, 0, 5, 3));
        let (out, _) = normalize(src.clone(), 1024).unwrap();
        assert_eq!(out.pixel(0, 0), src.pixel(0, 0));
    }

    #[test]
    fn empty_source_is_a_decode_error() {
        let err = normalize(RasterBuffer::transparent(0, 10).unwrap(), 1024).unwrap_err();
        assert!(matches!(err, RasterError::Decode(_)));
    }

    #[test]
    fn ratio_labels_round_trip() {
        for r in AspectRatio::ALL {
            assert_eq!(r.label().parse::<AspectRatio>().unwrap(), r);
        }
        assert!("2:1".parse::<AspectRatio>().is_err());
    }
}
