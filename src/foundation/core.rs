use std::io::Cursor;

use anyhow::Context as _;

use crate::foundation::error::{ThumbError, ThumbResult};

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque white, the fallback for unparseable colors.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Build a color from all four channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same color with alpha replaced.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Same color at full opacity.
    pub const fn opaque(self) -> Self {
        self.with_alpha(255)
    }

    /// Channels as an array in RGBA order.
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Output raster: `width × height` straight-alpha RGBA8, row-major.
///
/// A canvas is created per render and handed to the caller once every layer has been applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    image: image::RgbaImage,
}

impl Canvas {
    /// Fully transparent canvas.
    pub fn new(width: u32, height: u32) -> ThumbResult<Self> {
        if width == 0 || height == 0 {
            return Err(ThumbError::validation(format!(
                "canvas dimensions must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self {
            image: image::RgbaImage::new(width, height),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        self.image
            .get_pixel_checked(x, y)
            .map(|p| Rgba8::new(p[0], p[1], p[2], p[3]))
    }

    /// Raw RGBA bytes.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Borrow the backing image buffer.
    pub fn as_image(&self) -> &image::RgbaImage {
        &self.image
    }

    pub(crate) fn as_image_mut(&mut self) -> &mut image::RgbaImage {
        &mut self.image
    }

    /// Consume the canvas, returning the backing image buffer.
    pub fn into_image(self) -> image::RgbaImage {
        self.image
    }

    /// Encode as PNG.
    pub fn encode_png(&self) -> ThumbResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode canvas as png")?;
        Ok(buf)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
