//! Encoding sinks: single-image codecs, byte-budgeted transcoding and archive packaging.

pub(crate) mod codec;
/// Sticker-pack archive builder.
pub mod package;
/// Quality search under a byte budget.
pub mod transcode;
