use crate::foundation::{
    core::RasterBuffer,
    error::{RasterError, RasterResult},
    math::unit_to_u8,
};

/// Fixed colour correction applied to an overlay before multiply compositing, which
/// otherwise darkens and desaturates it on skin-toned backgrounds.
///
/// Stages run in order brightness, contrast, saturation, each clamped to `[0, 1]`, using
/// the CSS filter-effects definitions of those functions.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ColorBoost {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
}

impl Default for ColorBoost {
    fn default() -> Self {
        Self {
            brightness: 2.2,
            contrast: 1.1,
            saturation: 2.0,
        }
    }
}

impl ColorBoost {
    pub const IDENTITY: ColorBoost = ColorBoost {
        brightness: 1.0,
        contrast: 1.0,
        saturation: 1.0,
    };

    pub fn validate(&self) -> RasterResult<()> {
        for (name, v) in [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(RasterError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Boost one straight-alpha pixel; alpha is untouched.
    pub fn apply_pixel(&self, px: [u8; 4]) -> [u8; 4] {
        let mut c = [
            f32::from(px[0]) / 255.0,
            f32::from(px[1]) / 255.0,
            f32::from(px[2]) / 255.0,
        ];

        for v in &mut c {
            *v = (*v * self.brightness).clamp(0.0, 1.0);
        }
        let intercept = 0.5 - 0.5 * self.contrast;
        for v in &mut c {
            *v = (*v * self.contrast + intercept).clamp(0.0, 1.0);
        }

        let s = self.saturation;
        let [r, g, b] = c;
        let sat = [
            (0.213 + 0.787 * s) * r + (0.715 - 0.715 * s) * g + (0.072 - 0.072 * s) * b,
            (0.213 - 0.213 * s) * r + (0.715 + 0.285 * s) * g + (0.072 - 0.072 * s) * b,
            (0.213 - 0.213 * s) * r + (0.715 - 0.715 * s) * g + (0.072 + 0.928 * s) * b,
        ];

        [
            unit_to_u8(sat[0]),
            unit_to_u8(sat[1]),
            unit_to_u8(sat[2]),
            px[3],
        ]
    }

    pub fn apply(&self, buffer: RasterBuffer) -> RasterBuffer {
        if self.is_identity() {
            return buffer;
        }
        let mut out = buffer;
        for px in out.pixels_mut().chunks_exact_mut(4) {
            let boosted = self.apply_pixel([px[0], px[1], px[2], px[3]]);
            px.copy_from_slice(&boosted);
        }
        out
    }
}
