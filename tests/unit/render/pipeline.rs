use std::io::Cursor;
use std::path::{Path, PathBuf};

use super::*;
use crate::assets::store::ResourceCacheOpts;
use crate::foundation::core::Rgba8;
use crate::foundation::error::ThumbError;
use crate::scene::style::Alignment;

fn temp_root(tag: &str) -> PathBuf {
    let tmp = std::env::temp_dir().join(format!(
        "thumbkit_pipeline_{tag}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&tmp).unwrap();
    tmp
}

fn write_png(path: &Path, img: image::RgbaImage) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, &buf).unwrap();
}

fn resources(tag: &str) -> (PathBuf, ResourceCache) {
    let root = temp_root(tag);
    write_png(
        &root.join("backgrounds").join("red.png"),
        image::RgbaImage::from_pixel(8, 8, image::Rgba([255, 0, 0, 255])),
    );
    write_png(
        &root.join("patterns").join("dot.png"),
        image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255])),
    );
    let cache = ResourceCache::new(ResourceCacheOpts::new(&root));
    (root, cache)
}

fn textless() -> StyleConfiguration {
    StyleConfiguration {
        background_color: Rgba8::rgb(0, 128, 0),
        ..StyleConfiguration::default()
    }
}

#[test]
fn background_fill_ignores_background_opacity() {
    let (_root, res) = resources("bgfill");
    let mut a = textless();
    a.background_opacity = 10;
    let mut b = textless();
    b.background_opacity = 100;

    let ca = render_layers(&res, &a, "", 16, 16).unwrap();
    let cb = render_layers(&res, &b, "", 16, 16).unwrap();
    assert_eq!(ca, cb);
    assert_eq!(ca.pixel(3, 3), Some(Rgba8::rgb(0, 128, 0)));
}

#[test]
fn background_fill_is_opaque_even_with_translucent_color() {
    let (_root, res) = resources("bgalpha");
    let mut s = textless();
    s.background_color = Rgba8::new(10, 20, 30, 5);
    let c = render_layers(&res, &s, "", 4, 4).unwrap();
    assert_eq!(c.pixel(0, 0), Some(Rgba8::rgb(10, 20, 30)));
}

#[test]
fn background_image_is_scaled_to_frame_and_centered() {
    let (_root, res) = resources("bgimg");
    let mut s = textless();
    s.background_image = Some(ImageRef::Named("red".to_owned()));
    s.bg_image_scale = 50;

    let c = render_layers(&res, &s, "", 20, 10).unwrap();
    // 10x5 image centered: x 5..15, y 2..7.
    assert_eq!(c.pixel(10, 4), Some(Rgba8::rgb(255, 0, 0)));
    assert_eq!(c.pixel(4, 4), Some(Rgba8::rgb(0, 128, 0)));
    assert_eq!(c.pixel(10, 1), Some(Rgba8::rgb(0, 128, 0)));
}

#[test]
fn first_available_background_and_missing_names() {
    let (_root, res) = resources("bgfirst");
    let mut s = textless();
    s.background_image = Some(ImageRef::FirstAvailable);
    let c = render_layers(&res, &s, "", 8, 8).unwrap();
    assert_eq!(c.pixel(4, 4), Some(Rgba8::rgb(255, 0, 0)));

    s.background_image = Some(ImageRef::Named("absent".to_owned()));
    let c = render_layers(&res, &s, "", 8, 8).unwrap();
    assert_eq!(c.pixel(4, 4), Some(Rgba8::rgb(0, 128, 0)));
}

#[test]
fn zero_scale_background_is_omitted() {
    let (_root, res) = resources("bgzero");
    let mut s = textless();
    s.background_image = Some(ImageRef::Named("red".to_owned()));
    s.bg_image_scale = 0;
    let c = render_layers(&res, &s, "", 8, 8).unwrap();
    assert_eq!(c.pixel(4, 4), Some(Rgba8::rgb(0, 128, 0)));
}

#[test]
fn oversized_scaled_layer_is_a_render_error() {
    let (_root, res) = resources("bghuge");
    let mut s = textless();
    s.background_image = Some(ImageRef::Named("red".to_owned()));
    s.bg_image_scale = 100_000;
    assert!(matches!(
        render_layers(&res, &s, "", 100, 100),
        Err(ThumbError::Render(_))
    ));
}

#[test]
fn zero_opacity_pattern_matches_no_pattern() {
    let (_root, res) = resources("patzero");
    let plain = render_layers(&res, &textless(), "", 16, 16).unwrap();

    let mut s = textless();
    s.pattern = Some("dot".to_owned());
    s.pattern_opacity = 0;
    let faded = render_layers(&res, &s, "", 16, 16).unwrap();
    assert_eq!(plain, faded);
}

#[test]
fn pattern_scales_from_native_size_and_tints() {
    let (_root, res) = resources("pattint");
    let mut s = textless();
    s.pattern = Some("dot".to_owned());
    s.pattern_scale = 200;
    s.pattern_color_enabled = true;
    s.pattern_color = Rgba8::rgb(255, 255, 0);

    let c = render_layers(&res, &s, "", 10, 10).unwrap();
    // 4x4 centered: 3..7.
    assert_eq!(c.pixel(3, 3), Some(Rgba8::rgb(255, 255, 0)));
    assert_eq!(c.pixel(6, 6), Some(Rgba8::rgb(255, 255, 0)));
    assert_eq!(c.pixel(2, 2), Some(Rgba8::rgb(0, 128, 0)));
    assert_eq!(c.pixel(7, 7), Some(Rgba8::rgb(0, 128, 0)));
}

#[test]
fn pattern_offset_moves_it() {
    let (_root, res) = resources("patoff");
    let mut s = textless();
    s.pattern = Some("dot".to_owned());
    s.pattern_scale = 100;
    s.pattern_x_offset = -4;
    let c = render_layers(&res, &s, "", 10, 10).unwrap();
    assert_eq!(c.pixel(0, 4), Some(Rgba8::rgb(0, 0, 255)));
    assert_eq!(c.pixel(4, 4), Some(Rgba8::rgb(0, 128, 0)));
}

#[test]
fn text_box_surrounds_the_block() {
    let (_root, res) = resources("textbox");
    let font = res.get_font("anything", 40);
    if font.face().is_none() {
        return;
    }
    let mut s = textless();
    s.font_size = 40;
    s.text_margins = 10;
    s.text_alignment = Alignment::TopLeft;
    s.text_box_enabled = true;
    s.text_box_color = Rgba8::rgb(0, 0, 0);
    s.text_box_padding = 5;
    s.text_color = Rgba8::rgb(0, 0, 0);

    let c = render_layers(&res, &s, "Hello", 300, 100).unwrap();
    // Box top-left corner sits at margin - padding.
    assert_eq!(c.pixel(5, 5), Some(Rgba8::rgb(0, 0, 0)));
    assert_eq!(c.pixel(4, 4), Some(Rgba8::rgb(0, 128, 0)));
    assert_eq!(c.pixel(299, 99), Some(Rgba8::rgb(0, 128, 0)));
}

#[test]
fn translucent_text_box_blends() {
    let (_root, res) = resources("textboxalpha");
    if res.get_font("anything", 40).face().is_none() {
        return;
    }
    let mut s = textless();
    s.background_color = Rgba8::rgb(255, 255, 255);
    s.font_size = 40;
    s.text_margins = 10;
    s.text_alignment = Alignment::TopLeft;
    s.text_box_enabled = true;
    s.text_box_color = Rgba8::rgb(0, 0, 0);
    s.text_box_opacity = 50;
    s.text_box_padding = 5;

    let c = render_layers(&res, &s, "Hi", 200, 100).unwrap();
    let p = c.pixel(5, 5).unwrap();
    assert_eq!(p.a, 255);
    assert!(p.r > 100 && p.r < 160, "got {p:?}");
}

#[test]
fn empty_text_draws_no_box() {
    let (_root, res) = resources("emptybox");
    let mut s = textless();
    s.text_box_enabled = true;
    let c = render_layers(&res, &s, "   ", 50, 50).unwrap();
    assert!(c.as_image().pixels().all(|p| p.0 == [0, 128, 0, 255]));
}

#[test]
fn tall_centered_block_overflows_and_is_boxed() {
    let (_root, res) = resources("tall");
    let s = StyleConfiguration {
        text_margins: 100,
        font_size: 160,
        text_box_enabled: true,
        text_box_color: Rgba8::rgb(0, 0, 0),
        text_box_opacity: 100,
        ..textless()
    };
    let font = res.get_font(&s.font_name, s.font_size);
    if font.face().is_none() {
        return;
    }
    let text = "one two three four five six seven eight nine ten eleven twelve";
    let params = block_params(&s, 1280, 720);
    let block = layout_text(&res, &mut TextLayoutEngine::new(), &font, text, &params);
    assert!(block.height > 520, "block height {}", block.height);
    assert_eq!(block.top, half_floor(720 - block.height));

    let c = render_layers(&res, &s, text, 1280, 720).unwrap();
    let pad = s.text_box_padding;
    let x = (params.aligned_x(block.max_line_width) - pad).max(0) as u32;
    let y0 = (block.top - pad).max(0);
    let y1 = (block.top + block.height + pad).min(720);
    let boxed = (0..720u32)
        .filter(|&y| c.pixel(x, y) == Some(Rgba8::rgb(0, 0, 0)))
        .count() as i64;
    assert_eq!(boxed, y1 - y0);
    assert!(boxed > 520);
}
