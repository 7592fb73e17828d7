use crate::{
    composite::{blend::BlendMode, filter::ColorBoost},
    foundation::{
        core::{Affine, Point, RasterBuffer, Rect, Size, Vec2},
        error::{RasterError, RasterResult},
        math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place},
    },
};

/// Placement of a rectangle relative to its container's top-left corner, in display
/// (screen) pixels. Rotation is about the rectangle's centre, clockwise in degrees.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, alias = "rotation")]
    pub rotation_degrees: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 150.0,
            height: 150.0,
            rotation_degrees: 0.0,
        }
    }
}

impl Transform {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Initial placement of an overlay: longest side `base`, aspect ratio of `overlay`,
    /// centred in `container`.
    pub fn centered_in(container: Size, overlay: Size, base: f64) -> Self {
        let aspect = if overlay.width > 0.0 && overlay.height > 0.0 {
            overlay.width / overlay.height
        } else {
            1.0
        };
        let (w, h) = if aspect >= 1.0 {
            (base, base / aspect)
        } else {
            (base * aspect, base)
        };
        Self {
            x: container.width / 2.0 - w / 2.0,
            y: container.height / 2.0 - h / 2.0,
            width: w,
            height: h,
            rotation_degrees: 0.0,
        }
    }
}

/// Maps display coordinates of the container onto the background's native pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DisplayMapping {
    /// Offset of the displayed image inside its container (letterboxing, padding).
    pub offset_x: f64,
    pub offset_y: f64,
    /// `native_width / displayed_width`.
    pub scale_x: f64,
    /// `native_height / displayed_height`.
    pub scale_y: f64,
}

impl Default for DisplayMapping {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl DisplayMapping {
    pub fn from_display(offset: Vec2, displayed: Size, native: Size) -> RasterResult<Self> {
        let positive = |v: f64| v > 0.0;
        if !positive(displayed.width) || !positive(displayed.height) {
            return Err(RasterError::validation(
                "displayed image size must be positive",
            ));
        }
        Ok(Self {
            offset_x: offset.x,
            offset_y: offset.y,
            scale_x: native.width / displayed.width,
            scale_y: native.height / displayed.height,
        })
    }

    pub fn validate(&self) -> RasterResult<()> {
        let finite = [self.offset_x, self.offset_y, self.scale_x, self.scale_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.scale_x <= 0.0 || self.scale_y <= 0.0 {
            return Err(RasterError::validation(
                "display mapping must be finite with positive scale",
            ));
        }
        Ok(())
    }

    /// Native-space placement of a display-space transform.
    pub fn to_native(&self, t: &Transform) -> NativePlacement {
        let left = (t.x - self.offset_x) * self.scale_x;
        let top = (t.y - self.offset_y) * self.scale_y;
        let size = Size::new(t.width * self.scale_x, t.height * self.scale_y);
        NativePlacement {
            // Centre of the scaled rectangle, not of the display one.
            center: Point::new(left + size.width / 2.0, top + size.height / 2.0),
            size,
            rotation_rad: t.rotation_degrees.to_radians(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NativePlacement {
    pub center: Point,
    pub size: Size,
    pub rotation_rad: f64,
}

impl NativePlacement {
    /// Overlay-local (origin at the centre) to background pixel space.
    pub fn to_affine(&self) -> Affine {
        Affine::translate(self.center.to_vec2()) * Affine::rotate(self.rotation_rad)
    }

    pub fn is_degenerate(&self) -> bool {
        let values = [
            self.center.x,
            self.center.y,
            self.size.width,
            self.size.height,
            self.rotation_rad,
        ];
        values.iter().any(|v| !v.is_finite()) || self.size.width < 1e-6 || self.size.height < 1e-6
    }

    fn local_rect(&self) -> Rect {
        let (hw, hh) = (self.size.width / 2.0, self.size.height / 2.0);
        Rect::new(-hw, -hh, hw, hh)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompositeOptions {
    pub blend: BlendMode,
    pub boost: ColorBoost,
}

impl CompositeOptions {
    pub fn validate(&self) -> RasterResult<()> {
        self.boost.validate()
    }
}

/// Draw `overlay` onto `background` at the display-space `transform`.
///
/// The output has the background's native size. The overlay is colour boosted, scaled to
/// its native rectangle, rotated about that rectangle's centre and blended. A degenerate
/// placement (zero or non-finite size) leaves the background unchanged.
#[tracing::instrument(skip(background, overlay), fields(
    bg_w = background.width(),
    bg_h = background.height(),
    ov_w = overlay.width(),
    ov_h = overlay.height()
))]
pub fn composite(
    background: RasterBuffer,
    overlay: &RasterBuffer,
    transform: &Transform,
    mapping: &DisplayMapping,
    opts: &CompositeOptions,
) -> RasterResult<RasterBuffer> {
    opts.validate()?;
    mapping.validate()?;

    let placement = mapping.to_native(transform);
    if overlay.is_empty() || background.is_empty() || placement.is_degenerate() {
        tracing::warn!(?placement, "degenerate overlay placement; background left unchanged");
        return Ok(background);
    }

    let mut src = opts.boost.apply(overlay.clone()).into_pixels();
    premultiply_rgba8_in_place(&mut src);
    let (src_w, src_h) = overlay.dimensions();

    let to_device = placement.to_affine();
    let to_local = to_device.inverse();
    let bbox = to_device.transform_rect_bbox(placement.local_rect());

    let (bg_w, bg_h) = background.dimensions();
    let x0 = bbox.x0.floor().max(0.0) as u32;
    let y0 = bbox.y0.floor().max(0.0) as u32;
    let x1 = (bbox.x1.ceil().max(0.0) as u32).min(bg_w);
    let y1 = (bbox.y1.ceil().max(0.0) as u32).min(bg_h);

    let mut out = background.into_pixels();
    let (hw, hh) = (placement.size.width / 2.0, placement.size.height / 2.0);
    let sx = f64::from(src_w) / placement.size.width;
    let sy = f64::from(src_h) / placement.size.height;
    let mut touched = 0usize;

    for y in y0..y1 {
        for x in x0..x1 {
            let local = to_local * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let u = (local.x + hw) * sx;
            let v = (local.y + hh) * sy;
            if u < 0.0 || v < 0.0 || u >= f64::from(src_w) || v >= f64::from(src_h) {
                continue;
            }
            let s = sample_bilinear(&src, src_w, src_h, u - 0.5, v - 0.5);
            if s[3] == 0 {
                continue;
            }

            let i = ((y as usize) * (bg_w as usize) + (x as usize)) * 4;
            let mut d = [out[i], out[i + 1], out[i + 2], out[i + 3]];
            premultiply_rgba8_in_place(&mut d);
            let mut blended = opts.blend.apply(d, s);
            unpremultiply_rgba8_in_place(&mut blended);
            out[i..i + 4].copy_from_slice(&blended);
            touched += 1;
        }
    }

    tracing::debug!(touched, ?bbox, "overlay composited");
    RasterBuffer::new(bg_w, bg_h, out)
}

/// Bilinear sample of premultiplied RGBA8 at continuous pixel coordinates, clamping at
/// the edges.
fn sample_bilinear(src: &[u8], w: u32, h: u32, fx: f64, fy: f64) -> [u8; 4] {
    let max_x = f64::from(w - 1);
    let max_y = f64::from(h - 1);
    let fx = fx.clamp(0.0, max_x);
    let fy = fy.clamp(0.0, max_y);

    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = fx - f64::from(x0);
    let ty = fy - f64::from(y0);

    let at = |x: u32, y: u32, c: usize| -> f64 {
        f64::from(src[((y as usize) * (w as usize) + (x as usize)) * 4 + c])
    };

    let mut out = [0u8; 4];
    for (c, o) in out.iter_mut().enumerate() {
        let top = at(x0, y0, c) * (1.0 - tx) + at(x1, y0, c) * tx;
        let bottom = at(x0, y1, c) * (1.0 - tx) + at(x1, y1, c) * tx;
        *o = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    out
}
