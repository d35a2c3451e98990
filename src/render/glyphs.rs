use kurbo::Affine;

use crate::{
    assets::fonts::FontHandle,
    foundation::core::{Canvas, Rgba8},
    foundation::error::{ThumbError, ThumbResult},
    layout::text::{PlacedLine, TextLayoutEngine},
    render::composite::{LayerPaint, over_image_at, unpremultiply_in_place},
};

/// Glyph paint for one text block. Colors are drawn fully opaque.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphPaint {
    /// Fill color.
    pub fill: Rgba8,
    /// Outline radius and color, drawn under the fill.
    pub stroke: Option<(u32, Rgba8)>,
}

/// Rasterize `lines` with vello_cpu and blend the result onto `canvas`.
pub(crate) fn draw_lines(
    canvas: &mut Canvas,
    engine: &mut TextLayoutEngine,
    font: &FontHandle,
    lines: &[PlacedLine],
    paint: GlyphPaint,
) -> ThumbResult<()> {
    let Some(face) = font.face() else {
        return Ok(());
    };
    if lines.is_empty() {
        return Ok(());
    }

    let (w, h) = (canvas.width(), canvas.height());
    let (Ok(w16), Ok(h16)) = (u16::try_from(w), u16::try_from(h)) else {
        return Err(ThumbError::render(format!(
            "text rasterizer supports at most {}x{} pixels, got {w}x{h}",
            u16::MAX,
            u16::MAX
        )));
    };

    let mut ctx = vello_cpu::RenderContext::new(w16, h16);
    let size = font.size() as f32;
    let fill = paint.fill.opaque();
    let stroke = paint
        .stroke
        .filter(|(width, _)| *width > 0)
        .map(|(width, color)| (width, color.opaque()));

    // Glyphs can overhang their line box by about a font size, plus the outline.
    let reach = i64::from(font.size())
        .saturating_mul(2)
        .saturating_add(stroke.map_or(0, |(width, _)| i64::from(width)));
    for line in lines {
        if !line_reaches_canvas(line, reach, w, h) {
            continue;
        }
        let Some(layout) = engine.layout_line(&line.text, font) else {
            continue;
        };
        let glyphs = positioned_glyphs(&layout);
        if glyphs.is_empty() {
            continue;
        }
        ctx.set_transform(affine_to_cpu(Affine::translate((
            line.x as f64,
            line.y as f64,
        ))));

        if let Some((width, color)) = stroke {
            // A centered stroke of twice the radius reaches `width` pixels past the outline.
            ctx.set_stroke(
                vello_cpu::kurbo::Stroke::new(2.0 * f64::from(width))
                    .with_join(vello_cpu::kurbo::Join::Round),
            );
            ctx.set_paint(to_cpu_color(color));
            ctx.glyph_run(face.paint())
                .font_size(size)
                .stroke_glyphs(glyphs.iter().copied());
        }

        ctx.set_paint(to_cpu_color(fill));
        ctx.glyph_run(face.paint())
            .font_size(size)
            .fill_glyphs(glyphs.into_iter());
    }

    let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);

    let mut bytes = pixmap.data_as_u8_slice().to_vec();
    unpremultiply_in_place(&mut bytes);
    let layer = image::RgbaImage::from_raw(w, h, bytes)
        .ok_or_else(|| ThumbError::render("glyph layer size mismatch"))?;
    over_image_at(canvas.as_image_mut(), &layer, 0, 0, LayerPaint::PLAIN);
    Ok(())
}

fn line_reaches_canvas(line: &PlacedLine, reach: i64, w: u32, h: u32) -> bool {
    line.x <= i64::from(w).saturating_add(reach)
        && line.y <= i64::from(h).saturating_add(reach)
        && line.x.saturating_add(line.width).saturating_add(reach) >= 0
        && line.y.saturating_add(reach) >= 0
}

fn positioned_glyphs(layout: &parley::Layout<()>) -> Vec<vello_cpu::Glyph> {
    let mut out = Vec::new();
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let mut x = run.offset();
            let y = run.baseline();
            for g in run.glyphs() {
                out.push(vello_cpu::Glyph {
                    id: g.id,
                    x: x + g.x,
                    y: y - g.y,
                });
                x += g.advance;
            }
        }
    }
    out
}

fn to_cpu_color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

#[cfg(test)]
#[path = "../../tests/unit/render/glyphs.rs"]
mod tests;
