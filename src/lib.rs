//! Rasterprep prepares raster images for generative models, stickers and overlays.
//!
//! Every stage takes an owned [`RasterBuffer`] (straight-alpha RGBA8) and returns a new one:
//!
//! - [`normalize`] snaps an input to the nearest supported aspect ratio and size cap
//! - [`isolate_background`] clears a light, border-connected background
//! - [`tight_crop`] re-frames content on a padded square canvas
//! - [`composite`] draws a rotated, colour-boosted overlay onto a background
//! - [`encode_under_budget`] letterboxes and searches for a quality under a byte budget
//! - [`pack`] bundles transcoded assets into a deterministic ZIP
//!
//! Interactive overlay placement is modelled by [`GestureSession`] and [`TransformHistory`].
#![forbid(unsafe_code)]

mod assets;
mod foundation;

/// Overlay compositing and interactive placement.
pub mod composite;
/// Stage options and their JSON loader.
pub mod config;
/// Byte-budgeted encoding and archive packaging.
pub mod encode;
/// Normalization, isolation and cropping.
pub mod prepare;

pub use crate::foundation::core::{Affine, Point, RasterBuffer, Rect, Rgba8, Size, Vec2};
pub use crate::foundation::error::{RasterError, RasterResult};

pub use crate::assets::decode::{decode_image, decode_image_with_mime};
pub use crate::composite::blend::BlendMode;
pub use crate::composite::filter::ColorBoost;
pub use crate::composite::gesture::{GestureKind, GestureSession, GestureState};
pub use crate::composite::history::TransformHistory;
pub use crate::composite::overlay::{CompositeOptions, DisplayMapping, Transform, composite};
pub use crate::config::PipelineConfig;
pub use crate::encode::codec::{OutputFormat, encode_as, encode_png};
pub use crate::encode::package::{NamedAsset, PackOptions, PackedArchive, pack};
pub use crate::encode::transcode::{
    ByteBudget, EncodedImage, TranscodeOptions, encode_under_budget, letterbox,
};
pub use crate::prepare::crop::{CropOptions, content_bounds, tight_crop};
pub use crate::prepare::isolate::{IsolateOptions, SeedStrategy, isolate_background};
pub use crate::prepare::normalize::{
    AspectRatio, NormalizeOptions, PreparedInput, normalize, prepare_for_model,
};
pub use crate::prepare::prepare_sticker;
pub use crate::prepare::resample::{fit_width, resize_exact};
