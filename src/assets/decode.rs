use std::sync::Arc;

use anyhow::Context;

use crate::{
    assets::store::ImageAsset,
    foundation::error::{ThumbError, ThumbResult},
};

/// Largest width or height kept after decoding; larger images are shrunk to fit.
pub const MAX_IMAGE_DIM: u32 = 2048;

/// Decode encoded image bytes, normalize to RGBA8 and bound the size to [`MAX_IMAGE_DIM`].
pub fn decode_image(bytes: &[u8]) -> ThumbResult<ImageAsset> {
    let dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| ThumbError::decode(format!("{e:#}")))?;
    Ok(ImageAsset::from_rgba(Arc::new(bound_size(dyn_img).to_rgba8())))
}

/// Read and decode an image file.
pub(crate) fn decode_image_file(path: &std::path::Path) -> ThumbResult<ImageAsset> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
}

fn bound_size(img: image::DynamicImage) -> image::DynamicImage {
    if img.width() <= MAX_IMAGE_DIM && img.height() <= MAX_IMAGE_DIM {
        return img;
    }
    tracing::debug!(
        width = img.width(),
        height = img.height(),
        "downscaling oversized image"
    );
    // Fits within the box and keeps the aspect ratio.
    img.resize(
        MAX_IMAGE_DIM,
        MAX_IMAGE_DIM,
        image::imageops::FilterType::Lanczos3,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
