//! Buffer preparation stages: aspect normalization, background isolation and tight cropping.

/// Bounding-box cropping onto a padded square canvas.
pub mod crop;
/// Edge-seeded flood fill that clears a uniform light background.
pub mod isolate;
/// Snapping to the supported aspect ratios and a maximum dimension.
pub mod normalize;
pub(crate) mod resample;

use crate::config::PipelineConfig;
use crate::foundation::{core::RasterBuffer, error::RasterResult};

/// Display-preparation path for a sticker: isolate the subject, then crop tightly around it.
#[tracing::instrument(skip(buffer, cfg), fields(w = buffer.width(), h = buffer.height()))]
pub fn prepare_sticker(buffer: RasterBuffer, cfg: &PipelineConfig) -> RasterResult<RasterBuffer> {
    let isolated = isolate::isolate_background(buffer, &cfg.isolate)?;
    crop::tight_crop(isolated, &cfg.crop)
}
