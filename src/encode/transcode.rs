use crate::{
    encode::codec::{OutputFormat, encode_as},
    foundation::{
        core::RasterBuffer,
        error::{RasterError, RasterResult},
    },
    prepare::resample::resize_exact,
};

/// Hard ceiling on encoded size, in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ByteBudget(pub usize);

impl ByteBudget {
    /// 100 KiB, the sticker size limit of common messaging apps.
    pub const STICKER: ByteBudget = ByteBudget(100 * 1024);

    pub fn bytes(self) -> usize {
        self.0
    }

    /// Strictly below the ceiling.
    pub fn admits(self, len: usize) -> bool {
        len < self.0
    }
}

impl Default for ByteBudget {
    fn default() -> Self {
        Self::STICKER
    }
}

/// Parameters of the letterbox + quality search. Qualities are integer percents.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TranscodeOptions {
    pub target_width: u32,
    pub target_height: u32,
    pub budget: ByteBudget,
    pub format: OutputFormat,
    pub start_quality: u8,
    pub quality_step: u8,
    pub floor_quality: u8,
    /// Background colour for formats without alpha.
    pub matte: [u8; 3],
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            target_width: 512,
            target_height: 512,
            budget: ByteBudget::default(),
            format: OutputFormat::WebP,
            start_quality: 90,
            quality_step: 10,
            floor_quality: 10,
            matte: [255, 255, 255],
        }
    }
}

impl TranscodeOptions {
    pub fn validate(&self) -> RasterResult<()> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(RasterError::validation("transcode target must be non-zero"));
        }
        if self.budget.0 == 0 {
            return Err(RasterError::validation("byte budget must be positive"));
        }
        if self.quality_step == 0 {
            return Err(RasterError::validation("quality_step must be >= 1"));
        }
        if self.floor_quality == 0
            || self.floor_quality > self.start_quality
            || self.start_quality > 100
        {
            return Err(RasterError::validation(format!(
                "qualities must satisfy 1 <= floor ({}) <= start ({}) <= 100",
                self.floor_quality, self.start_quality
            )));
        }
        Ok(())
    }

    /// Qualities tried, in order, ending exactly at the floor.
    pub fn quality_ladder(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut q = self.start_quality;
        while q > self.floor_quality {
            out.push(q);
            q = q.saturating_sub(self.quality_step).max(self.floor_quality);
        }
        out.push(self.floor_quality);
        out
    }
}

/// Output of [`encode_under_budget`].
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub quality_percent: u8,
    pub width: u32,
    pub height: u32,
    pub attempts: usize,
    pub budget: ByteBudget,
    pub budget_met: bool,
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .field("quality_percent", &self.quality_percent)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("attempts", &self.attempts)
            .field("budget_met", &self.budget_met)
            .finish()
    }
}

impl EncodedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Quality as a fraction in `(0, 1]`.
    pub fn quality(&self) -> f32 {
        f32::from(self.quality_percent) / 100.0
    }

    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }

    /// Turn a best-effort result into [`RasterError::BudgetUnsatisfiable`].
    pub fn ensure_within_budget(self) -> RasterResult<Self> {
        if self.budget_met {
            Ok(self)
        } else {
            Err(RasterError::BudgetUnsatisfiable {
                budget: self.budget.0,
                actual: self.bytes.len(),
            })
        }
    }
}

/// Scale `buffer` to fit inside `width x height`, preserving its aspect ratio, and centre
/// it on a transparent canvas of exactly that size.
pub fn letterbox(buffer: &RasterBuffer, width: u32, height: u32) -> RasterResult<RasterBuffer> {
    if width == 0 || height == 0 {
        return Err(RasterError::validation("letterbox target must be non-zero"));
    }
    if buffer.is_empty() {
        return Err(RasterError::validation("cannot letterbox an empty buffer"));
    }
    let (src_w, src_h) = buffer.dimensions();
    let scale = (f64::from(width) / f64::from(src_w)).min(f64::from(height) / f64::from(src_h));
    let fit_w = ((f64::from(src_w) * scale).round() as u32).clamp(1, width);
    let fit_h = ((f64::from(src_h) * scale).round() as u32).clamp(1, height);

    let scaled = resize_exact(buffer, fit_w, fit_h)?;
    if (fit_w, fit_h) == (width, height) {
        return Ok(scaled);
    }
    let mut canvas = RasterBuffer::transparent(width, height)?;
    canvas.copy_rect_from(
        &scaled,
        0,
        0,
        fit_w,
        fit_h,
        i64::from((width - fit_w) / 2),
        i64::from((height - fit_h) / 2),
    );
    Ok(canvas)
}

/// Letterbox to the target canvas, then walk down the quality ladder until the encoding
/// fits strictly under the budget.
///
/// When even the floor quality is too large, the floor result is returned with
/// `budget_met == false`; see [`EncodedImage::ensure_within_budget`].
#[tracing::instrument(skip(buffer, opts), fields(
    w = buffer.width(),
    h = buffer.height(),
    format = ?opts.format,
    budget = opts.budget.0
))]
pub fn encode_under_budget(
    buffer: &RasterBuffer,
    opts: &TranscodeOptions,
) -> RasterResult<EncodedImage> {
    opts.validate()?;
    let canvas = letterbox(buffer, opts.target_width, opts.target_height)?;

    let mut last = None;
    for (i, quality) in opts.quality_ladder().into_iter().enumerate() {
        let bytes = encode_as(&canvas, opts.format, quality, opts.matte)?;
        let met = opts.budget.admits(bytes.len());
        tracing::debug!(quality, len = bytes.len(), met, "transcode attempt");
        let encoded = EncodedImage {
            bytes,
            format: opts.format,
            quality_percent: quality,
            width: canvas.width(),
            height: canvas.height(),
            attempts: i + 1,
            budget: opts.budget,
            budget_met: met,
        };
        if met {
            return Ok(encoded);
        }
        last = Some(encoded);
    }

    let encoded = last.ok_or_else(|| RasterError::encode("empty quality ladder"))?;
    tracing::warn!(
        len = encoded.len(),
        budget = opts.budget.0,
        quality = encoded.quality_percent,
        "byte budget unsatisfiable at floor quality; returning best effort"
    );
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_steps_down_to_floor() {
        let opts = TranscodeOptions::default();
        assert_eq!(
            opts.quality_ladder(),
            vec![90, 80, 70, 60, 50, 40, 30, 20, 10]
        );

        let odd = TranscodeOptions {
            start_quality: 95,
            quality_step: 20,
            floor_quality: 20,
            ..TranscodeOptions::default()
        };
        assert_eq!(odd.quality_ladder(), vec![95, 75, 55, 35, 20]);
    }

    #[test]
    fn letterbox_centers_wide_input() {
        let src = RasterBuffer::filled(200, 100, [0, 0, 255, 255]).unwrap();
        let out = letterbox(&src, 64, 64).unwrap();
        assert_eq!(out.dimensions(), (64, 64));
        assert_eq!(out.alpha(32, 0), 0);
        assert_eq!(out.alpha(32, 63), 0);
        assert_eq!(out.pixel(32, 32), [0, 0, 255, 255]);
        assert_eq!(out.pixel(0, 16), [0, 0, 255, 255]);
        assert_eq!(out.alpha(0, 15), 0);
    }

    #[test]
    fn letterbox_upscales_small_input() {
        let src = RasterBuffer::filled(10, 20, [9, 9, 9, 255]).unwrap();
        let out = letterbox(&src, 100, 100).unwrap();
        assert_eq!(out.alpha(50, 50), 255);
        assert_eq!(out.alpha(24, 50), 0);
        assert_eq!(out.alpha(25, 50), 255);
    }

    #[test]
    fn flat_image_fits_on_first_attempt() {
        let src = RasterBuffer::filled(300, 300, [240, 10, 10, 255]).unwrap();
        let out = encode_under_budget(&src, &TranscodeOptions::default()).unwrap();
        assert!(out.budget_met);
        assert_eq!(out.attempts, 1);
        assert_eq!(out.quality_percent, 90);
        assert_eq!((out.width, out.height), (512, 512));
        assert!(out.len() < 100 * 1024);
        assert_eq!(&out.bytes[8..12], b"WEBP");
    }

    #[test]
    fn tiny_budget_returns_floor_result() {
        let src = RasterBuffer::filled(16, 16, [1, 2, 3, 255]).unwrap();
        let opts = TranscodeOptions {
            target_width: 16,
            target_height: 16,
            budget: ByteBudget(1),
            ..TranscodeOptions::default()
        };
        let out = encode_under_budget(&src, &opts).unwrap();
        assert!(!out.budget_met);
        assert_eq!(out.quality_percent, 10);
        assert_eq!(out.attempts, 9);
        assert!(matches!(
            out.ensure_within_budget(),
            Err(RasterError::BudgetUnsatisfiable { budget: 1, .. })
        ));
    }

    #[test]
    fn jpeg_output_is_opaque_format() {
        let src = RasterBuffer::filled(20, 10, [0, 0, 0, 0]).unwrap();
        let opts = TranscodeOptions {
            target_width: 40,
            target_height: 40,
            format: OutputFormat::Jpeg,
            ..TranscodeOptions::default()
        };
        let out = encode_under_budget(&src, &opts).unwrap();
        assert_eq!(out.mime(), "image/jpeg");
        assert_eq!(&out.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let src = RasterBuffer::filled(4, 4, [0, 0, 0, 255]).unwrap();
        let opts = TranscodeOptions {
            floor_quality: 95,
            ..TranscodeOptions::default()
        };
        assert!(matches!(
            encode_under_budget(&src, &opts),
            Err(RasterError::Validation(_))
        ));
    }
}
