use crate::foundation::{
    core::RasterBuffer,
    error::{RasterError, RasterResult},
};

/// Where the background flood fill starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedStrategy {
    /// Only the four corner pixels.
    Corners,
    /// Every pixel on the image border.
    #[default]
    Border,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct IsolateOptions {
    /// A channel counts as background when `value > 255 - threshold`.
    pub threshold: u8,
    pub seeds: SeedStrategy,
}

impl Default for IsolateOptions {
    fn default() -> Self {
        Self {
            threshold: 60,
            seeds: SeedStrategy::Border,
        }
    }
}

impl IsolateOptions {
    pub fn validate(&self) -> RasterResult<()> {
        if self.threshold == 0 {
            return Err(RasterError::validation(
                "isolate threshold must be > 0 (0 matches nothing)",
            ));
        }
        Ok(())
    }
}

#[inline]
fn is_background(px: &[u8], threshold: u8) -> bool {
    let floor = 255 - threshold;
    px[0] > floor && px[1] > floor && px[2] > floor
}

/// Make the near-white background transparent.
///
/// Only pixels reachable from the seeds through 4-connected near-white neighbours are
/// cleared, so near-white regions enclosed by other colours keep their alpha. Alpha 0 is
/// the visited mark: a pixel is cleared when popped and never pushed again afterwards.
#[tracing::instrument(skip(buffer), fields(w = buffer.width(), h = buffer.height()))]
pub fn isolate_background(buffer: RasterBuffer, opts: &IsolateOptions) -> RasterResult<RasterBuffer> {
    opts.validate()?;
    let mut out = buffer;
    if out.is_empty() {
        return Ok(out);
    }

    let (width, height) = out.dimensions();
    let threshold = opts.threshold;
    let mut stack: Vec<(u32, u32)> = Vec::new();

    let seed = |out: &RasterBuffer, stack: &mut Vec<(u32, u32)>, x: u32, y: u32| {
        let i = out.offset(x, y);
        let px = &out.pixels()[i..i + 4];
        if px[3] != 0 && is_background(px, threshold) {
            stack.push((x, y));
        }
    };

    match opts.seeds {
        SeedStrategy::Corners => {
            for (x, y) in [(0, 0), (width - 1, 0), (0, height - 1), (width - 1, height - 1)] {
                seed(&out, &mut stack, x, y);
            }
        }
        SeedStrategy::Border => {
            for x in 0..width {
                seed(&out, &mut stack, x, 0);
                seed(&out, &mut stack, x, height - 1);
            }
            for y in 1..height.saturating_sub(1) {
                seed(&out, &mut stack, 0, y);
                seed(&out, &mut stack, width - 1, y);
            }
        }
    }

    let mut removed = 0usize;
    while let Some((x, y)) = stack.pop() {
        let i = out.offset(x, y);
        if out.pixels()[i + 3] == 0 {
            continue;
        }
        out.pixels_mut()[i + 3] = 0;
        removed += 1;

        let neighbours = [
            (x.checked_add(1).filter(|&nx| nx < width), Some(y)),
            (x.checked_sub(1), Some(y)),
            (Some(x), y.checked_add(1).filter(|&ny| ny < height)),
            (Some(x), y.checked_sub(1)),
        ];
        for (nx, ny) in neighbours {
            let (Some(nx), Some(ny)) = (nx, ny) else {
                continue;
            };
            let n = out.offset(nx, ny);
            let px = &out.pixels()[n..n + 4];
            if px[3] != 0 && is_background(px, threshold) {
                stack.push((nx, ny));
            }
        }
    }

    tracing::debug!(removed, "background pixels cleared");
    Ok(out)
}
