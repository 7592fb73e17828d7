use crate::foundation::{
    core::RasterBuffer,
    error::{RasterError, RasterResult},
};

/// Decode any raster format the `image` crate understands into straight RGBA8.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode_image(bytes: &[u8]) -> RasterResult<RasterBuffer> {
    if bytes.is_empty() {
        return Err(RasterError::decode("input is empty"));
    }
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| RasterError::decode(format!("decode image from memory: {e}")))?;
    let buffer = RasterBuffer::from_rgba_image(dyn_img.to_rgba8());
    if buffer.is_empty() {
        return Err(RasterError::decode("decoded image has zero area"));
    }
    tracing::debug!(width = buffer.width(), height = buffer.height(), "decoded image");
    Ok(buffer)
}

/// Decode, additionally checking the declared MIME type against the sniffed format.
pub fn decode_image_with_mime(bytes: &[u8], mime: &str) -> RasterResult<RasterBuffer> {
    let declared = image::ImageFormat::from_mime_type(mime)
        .ok_or_else(|| RasterError::decode(format!("unsupported mime type '{mime}'")))?;
    if let Ok(sniffed) = image::guess_format(bytes)
        && sniffed != declared
    {
        tracing::warn!(?declared, ?sniffed, "declared mime type does not match content");
    }
    decode_image(bytes)
}
