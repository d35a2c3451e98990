use image::imageops::FilterType;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{ThumbError, ThumbResult};
use crate::foundation::math::{mul_div255_u8, scale_alpha_percent};

/// Largest scaled layer, in pixels, the pipeline will allocate.
pub const MAX_LAYER_PIXELS: u64 = 64 * 1024 * 1024;

/// Non-premultiplied RGBA8 pixel.
pub type StraightRgba8 = [u8; 4];

/// Straight-alpha source-over.
pub fn over(dst: StraightRgba8, src: StraightRgba8) -> StraightRgba8 {
    let sa = u32::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let dpart = u32::from(mul_div255_u8(u16::from(dst[3]), 255 - sa as u16));
    let out_a = sa + dpart;

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = u32::from(src[i]) * sa + u32::from(dst[i]) * dpart;
        out[i] = ((c + out_a / 2) / out_a).min(255) as u8;
    }
    out[3] = out_a.min(255) as u8;
    out
}

/// Per-pixel adjustments applied to a layer before it is blended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerPaint {
    /// Alpha scale, 0..=100.
    pub opacity: u8,
    /// Replace RGB, keeping alpha as coverage.
    pub tint: Option<Rgba8>,
}

impl LayerPaint {
    /// Full opacity, no tint.
    pub const PLAIN: Self = Self {
        opacity: 100,
        tint: None,
    };

    fn apply(self, px: StraightRgba8) -> StraightRgba8 {
        let [r, g, b, a] = px;
        let [r, g, b] = match self.tint {
            Some(t) => [t.r, t.g, t.b],
            None => [r, g, b],
        };
        [r, g, b, scale_alpha_percent(a, self.opacity)]
    }
}

/// Blend `layer` onto `dst` with its top-left at `(x, y)`, clipping to `dst`.
pub fn over_image_at(
    dst: &mut image::RgbaImage,
    layer: &image::RgbaImage,
    x: i64,
    y: i64,
    paint: LayerPaint,
) {
    if paint.opacity == 0 {
        return;
    }
    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    let (lw, lh) = (i64::from(layer.width()), i64::from(layer.height()));

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = x.saturating_add(lw).min(dw);
    let y1 = y.saturating_add(lh).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    for dy in y0..y1 {
        for dx in x0..x1 {
            let src = layer.get_pixel((dx - x) as u32, (dy - y) as u32).0;
            let d = dst.get_pixel_mut(dx as u32, dy as u32);
            d.0 = over(d.0, paint.apply(src));
        }
    }
}

/// `extent × percent / 100`, truncated.
pub fn scaled_extent(extent: u32, percent: u32) -> u64 {
    u64::from(extent) * u64::from(percent) / 100
}

/// Resize `img` to `w × h`: Lanczos3 when `shrinking`, bilinear otherwise.
///
/// `Ok(None)` when either target dimension is zero; a target above [`MAX_LAYER_PIXELS`] is a
/// render error.
pub fn resize_layer(
    img: &image::RgbaImage,
    w: u64,
    h: u64,
    shrinking: bool,
) -> ThumbResult<Option<image::RgbaImage>> {
    if w == 0 || h == 0 {
        return Ok(None);
    }
    if w.saturating_mul(h) > MAX_LAYER_PIXELS {
        return Err(ThumbError::render(format!(
            "scaled layer {w}x{h} exceeds {MAX_LAYER_PIXELS} pixels"
        )));
    }
    let (w, h) = (w as u32, h as u32);
    if (w, h) == img.dimensions() {
        return Ok(Some(img.clone()));
    }
    let filter = if shrinking {
        FilterType::Lanczos3
    } else {
        FilterType::Triangle
    };
    Ok(Some(image::imageops::resize(img, w, h, filter)))
}

/// Paint a `w × h` rectangle at `(x, y)`, clipped. Opaque colors overwrite; others blend.
pub fn fill_rect(dst: &mut image::RgbaImage, x: i64, y: i64, w: i64, h: i64, color: Rgba8) {
    if color.a == 0 || w <= 0 || h <= 0 {
        return;
    }
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = x.saturating_add(w).min(i64::from(dst.width()));
    let y1 = y.saturating_add(h).min(i64::from(dst.height()));
    let src = color.to_array();

    for py in y0..y1 {
        for px in x0..x1 {
            let d = dst.get_pixel_mut(px as u32, py as u32);
            d.0 = if color.a == 255 { src } else { over(d.0, src) };
        }
    }
}

/// Convert premultiplied RGBA8 to straight alpha in place.
pub fn unpremultiply_in_place(buf: &mut [u8]) {
    for px in buf.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        match a {
            0 => px.copy_from_slice(&[0, 0, 0, 0]),
            255 => {}
            _ => {
                for c in &mut px[..3] {
                    *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
