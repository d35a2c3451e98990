use std::cell::RefCell;

use crate::{
    assets::fonts::FontHandle,
    assets::store::{AssetCategory, ImageAsset, ResourceCache},
    foundation::core::Canvas,
    foundation::error::ThumbResult,
    foundation::math::{half_floor, scale_alpha_percent},
    layout::text::{BlockParams, TextBlock, TextLayoutEngine, WrapKey, layout_block, wrap_with},
    render::composite::{LayerPaint, fill_rect, over_image_at, resize_layer, scaled_extent},
    render::glyphs::{self, GlyphPaint},
    scene::style::{ImageRef, StyleConfiguration},
};

thread_local! {
    // Shaping state outlives a single render; each rayon worker keeps its own.
    static TEXT_ENGINE: RefCell<TextLayoutEngine> = RefCell::new(TextLayoutEngine::new());
}

/// Render `text` (placeholders already substituted) onto a fresh `width × height` canvas.
///
/// Layers, bottom to top:
/// 1. background fill
/// 2. background image
/// 3. pattern overlay
/// 4. text box
/// 5. glyphs, outline under fill
///
/// Missing assets drop their layer. Any error aborts the whole render.
pub fn render_layers(
    resources: &ResourceCache,
    style: &StyleConfiguration,
    text: &str,
    width: u32,
    height: u32,
) -> ThumbResult<Canvas> {
    let mut canvas = Canvas::new(width, height)?;

    fill_background(&mut canvas, style);
    if let Some(img) = background_image(resources, style) {
        draw_background_image(&mut canvas, &img, style)?;
    }
    if let Some(name) = style.pattern.as_deref() {
        match resources.get_image(AssetCategory::Patterns, name) {
            Some(img) => draw_pattern(&mut canvas, &img, style)?,
            None => tracing::debug!(pattern = name, "pattern unavailable; layer skipped"),
        }
    }

    let font = resources.get_font(&style.font_name, style.font_size);
    let params = block_params(style, width, height);
    TEXT_ENGINE.with_borrow_mut(|engine| {
        let block = layout_text(resources, engine, &font, text, &params);
        if style.text_box_enabled {
            draw_text_box(&mut canvas, &block, &params, style);
        }
        glyphs::draw_lines(
            &mut canvas,
            engine,
            &font,
            &block.lines,
            GlyphPaint {
                fill: style.text_color,
                stroke: style
                    .text_stroke_enabled
                    .then_some((style.text_stroke_width, style.text_stroke_color)),
            },
        )
    })?;

    Ok(canvas)
}

fn fill_background(canvas: &mut Canvas, style: &StyleConfiguration) {
    let (w, h) = (i64::from(canvas.width()), i64::from(canvas.height()));
    fill_rect(canvas.as_image_mut(), 0, 0, w, h, style.background_color.opaque());
}

fn background_image(resources: &ResourceCache, style: &StyleConfiguration) -> Option<ImageAsset> {
    match style.background_image.as_ref()? {
        ImageRef::Named(name) => resources.get_image(AssetCategory::Backgrounds, name),
        ImageRef::FirstAvailable => {
            let name = resources.first_name(AssetCategory::Backgrounds)?;
            resources.get_image(AssetCategory::Backgrounds, &name)
        }
        ImageRef::Uploaded(asset) => Some(asset.clone()),
    }
}

fn draw_background_image(
    canvas: &mut Canvas,
    img: &ImageAsset,
    style: &StyleConfiguration,
) -> ThumbResult<()> {
    let scale = style.bg_image_scale;
    let tw = scaled_extent(canvas.width(), scale);
    let th = scaled_extent(canvas.height(), scale);
    let Some(layer) = resize_layer(img.image(), tw, th, scale < 100)? else {
        return Ok(());
    };
    place_centered(
        canvas,
        &layer,
        style.bg_image_x_offset,
        style.bg_image_y_offset,
        LayerPaint {
            opacity: style.background_opacity,
            tint: None,
        },
    );
    Ok(())
}

fn draw_pattern(
    canvas: &mut Canvas,
    img: &ImageAsset,
    style: &StyleConfiguration,
) -> ThumbResult<()> {
    let scale = style.pattern_scale;
    let paint = LayerPaint {
        opacity: style.pattern_opacity,
        tint: style.pattern_color_enabled.then_some(style.pattern_color),
    };

    if scale == 100 {
        place_centered(canvas, img.image(), style.pattern_x_offset, style.pattern_y_offset, paint);
        return Ok(());
    }
    let tw = scaled_extent(img.width(), scale);
    let th = scaled_extent(img.height(), scale);
    let Some(layer) = resize_layer(img.image(), tw, th, scale < 100)? else {
        return Ok(());
    };
    place_centered(canvas, &layer, style.pattern_x_offset, style.pattern_y_offset, paint);
    Ok(())
}

// Centered on the frame, then shifted.
fn place_centered(
    canvas: &mut Canvas,
    layer: &image::RgbaImage,
    dx: i64,
    dy: i64,
    paint: LayerPaint,
) {
    let x = half_floor(i64::from(canvas.width()) - i64::from(layer.width())).saturating_add(dx);
    let y = half_floor(i64::from(canvas.height()) - i64::from(layer.height())).saturating_add(dy);
    over_image_at(canvas.as_image_mut(), layer, x, y, paint);
}

fn block_params(style: &StyleConfiguration, width: u32, height: u32) -> BlockParams {
    BlockParams {
        width: i64::from(width),
        height: i64::from(height),
        font_size: i64::from(style.font_size),
        margin: style.text_margins,
        x_offset: style.text_x_offset,
        y_offset: style.text_y_offset,
        line_spacing_factor: style.line_spacing_factor,
        alignment: style.text_alignment,
    }
}

fn layout_text(
    resources: &ResourceCache,
    engine: &mut TextLayoutEngine,
    font: &FontHandle,
    text: &str,
    params: &BlockParams,
) -> TextBlock {
    let max_width = params.wrap_width();
    let key = WrapKey {
        text: text.to_owned(),
        font: font.identity(),
        size: font.size(),
        max_width,
    };
    let lines = resources.wrapped_lines(key, || {
        wrap_with(text, max_width, |s| engine.measure(s, font))
    });
    let measured = lines
        .iter()
        .map(|l| (l.clone(), engine.measure(l, font)))
        .collect();
    layout_block(params, measured)
}

fn draw_text_box(
    canvas: &mut Canvas,
    block: &TextBlock,
    params: &BlockParams,
    style: &StyleConfiguration,
) {
    if block.lines.is_empty() {
        return;
    }
    let pad = style.text_box_padding;
    let color = style
        .text_box_color
        .with_alpha(scale_alpha_percent(255, style.text_box_opacity));
    fill_rect(
        canvas.as_image_mut(),
        params.aligned_x(block.max_line_width).saturating_sub(pad),
        block.top.saturating_sub(pad),
        block.max_line_width.saturating_add(pad.saturating_mul(2)),
        block.height.saturating_add(pad.saturating_mul(2)),
        color,
    );
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
