use crate::foundation::math::mul_div255_u16;

pub type PremulRgba8 = [u8; 4];

/// How an overlay pixel combines with the background under it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    Normal,
    /// `background * overlay` per channel; white overlay pixels leave the background as is.
    #[default]
    Multiply,
}

impl BlendMode {
    pub fn apply(self, dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
        match self {
            Self::Normal => over(dst, src, 1.0),
            Self::Multiply => multiply(dst, src),
        }
    }
}

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u16(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - sa;

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255_u16(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u16(u16::from(src[i]), op);
        let dc = mul_div255_u16(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

/// Separable multiply blend composited source-over, in premultiplied form:
/// `co = cs * (1 - ab) + cb * (1 - as) + cs * cb`, `ao = as + ab - as * ab`.
pub fn multiply(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    let sa = u16::from(src[3]);
    let da = u16::from(dst[3]);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, da - mul_div255_u16(sa, da));
    for i in 0..3 {
        let s = u16::from(src[i]);
        let d = u16::from(dst[i]);
        let v = mul_div255_u16(s, 255 - da) + mul_div255_u16(d, 255 - sa) + mul_div255_u16(s, d);
        out[i] = v.min(255) as u8;
    }
    out
}

fn add_sat_u8(a: u16, b: u16) -> u8 {
    (a + b).min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_opacity_0_is_noop() {
        let dst = [1, 2, 3, 4];
        let src = [200, 200, 200, 200];
        assert_eq!(over(dst, src, 0.0), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let dst = [0, 0, 0, 255];
        let src = [255, 0, 0, 255];
        assert_eq!(over(dst, src, 1.0), src);
    }

    #[test]
    fn multiply_white_is_identity_on_opaque_background() {
        let dst = [120, 80, 40, 255];
        assert_eq!(multiply(dst, [255, 255, 255, 255]), dst);
    }

    #[test]
    fn multiply_black_darkens_to_black() {
        assert_eq!(multiply([120, 80, 40, 255], [0, 0, 0, 255]), [0, 0, 0, 255]);
    }

    #[test]
    fn multiply_half_grey_halves() {
        let out = multiply([200, 100, 50, 255], [128, 128, 128, 255]);
        assert_eq!(out, [100, 50, 25, 255]);
    }

    #[test]
    fn multiply_onto_transparent_is_source() {
        let src = [10, 20, 30, 255];
        assert_eq!(multiply([0, 0, 0, 0], src), src);
    }

    #[test]
    fn multiply_transparent_source_is_noop() {
        let dst = [10, 20, 30, 255];
        assert_eq!(multiply(dst, [0, 0, 0, 0]), dst);
    }
}
