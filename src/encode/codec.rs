use image::{
    ExtendedColorType, ImageEncoder,
    codecs::{jpeg::JpegEncoder, png::PngEncoder, webp::WebPEncoder},
};

use crate::foundation::{
    core::RasterBuffer,
    error::{RasterError, RasterResult},
    math::mul_div255_u16,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    WebP,
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::WebP => "image/webp",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webp" => Ok(Self::WebP),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            other => Err(RasterError::validation(format!(
                "unsupported output format '{other}'"
            ))),
        }
    }
}

/// Encode `buffer` at `quality` (1..=100).
///
/// JPEG uses the encoder's native quality after flattening onto `matte`. WebP and PNG are
/// written with lossless encoders; below 100 their colour channels are quantized first,
/// which is what trades fidelity for size.
pub fn encode_as(
    buffer: &RasterBuffer,
    format: OutputFormat,
    quality: u8,
    matte: [u8; 3],
) -> RasterResult<Vec<u8>> {
    if buffer.is_empty() {
        return Err(RasterError::encode("cannot encode a zero-area buffer"));
    }
    let quality = quality.clamp(1, 100);
    let (width, height) = buffer.dimensions();
    let mut out = Vec::new();

    match format {
        OutputFormat::Jpeg => {
            let rgb = flatten_to_rgb8(buffer.pixels(), matte);
            let mut enc = JpegEncoder::new_with_quality(&mut out, quality);
            enc.encode(&rgb, width, height, ExtendedColorType::Rgb8)
                .map_err(|e| RasterError::encode(format!("jpeg: {e}")))?;
        }
        OutputFormat::Png => {
            let rgba = prepare_lossless(buffer.pixels(), quality);
            PngEncoder::new(&mut out)
                .write_image(&rgba, width, height, ExtendedColorType::Rgba8)
                .map_err(|e| RasterError::encode(format!("png: {e}")))?;
        }
        OutputFormat::WebP => {
            let rgba = prepare_lossless(buffer.pixels(), quality);
            WebPEncoder::new_lossless(&mut out)
                .encode(&rgba, width, height, ExtendedColorType::Rgba8)
                .map_err(|e| RasterError::encode(format!("webp: {e}")))?;
        }
    }
    Ok(out)
}

/// Lossless PNG at full quality.
pub fn encode_png(buffer: &RasterBuffer) -> RasterResult<Vec<u8>> {
    encode_as(buffer, OutputFormat::Png, 100, [0, 0, 0])
}

fn prepare_lossless(src: &[u8], quality: u8) -> Vec<u8> {
    let mut rgba = src.to_vec();
    for px in rgba.chunks_exact_mut(4) {
        if px[3] == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
        }
    }
    quantize_rgb(&mut rgba, quality);
    rgba
}

fn quantize_rgb(data: &mut [u8], quality: u8) {
    if quality >= 100 {
        return;
    }
    let levels = levels_for_quality(quality);
    let step = 255.0 / (f32::from(levels) - 1.0);
    for px in data.chunks_exact_mut(4) {
        for c in px.iter_mut().take(3) {
            let bucket = (f32::from(*c) / step).round();
            *c = (bucket * step).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Palette levels per channel: fine near 100, aggressively coarse at low quality.
fn levels_for_quality(quality: u8) -> u16 {
    if quality >= 100 {
        return 256;
    }
    let q = f32::from(quality.max(1)) / 100.0;
    (2.0 + q * q * 254.0).round().clamp(2.0, 256.0) as u16
}

fn flatten_to_rgb8(src: &[u8], matte: [u8; 3]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len() / 4 * 3);
    for s in src.chunks_exact(4) {
        let a = u16::from(s[3]);
        if a == 255 {
            out.extend_from_slice(&s[..3]);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let v = mul_div255_u16(u16::from(s[c]), a) + mul_div255_u16(u16::from(matte[c]), inv);
            out.push(v.min(255) as u8);
        }
    }
    out
}
