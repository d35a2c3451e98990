use std::io::Cursor;

use super::*;

fn encode(img: image::DynamicImage, format: image::ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

#[test]
fn decode_png_keeps_straight_alpha() {
    let img = image::RgbaImage::from_raw(1, 1, vec![100, 50, 200, 128]).unwrap();
    let bytes = encode(image::DynamicImage::ImageRgba8(img), image::ImageFormat::Png);

    let asset = decode_image(&bytes).unwrap();
    assert_eq!((asset.width(), asset.height()), (1, 1));
    assert_eq!(asset.image().get_pixel(0, 0).0, [100, 50, 200, 128]);
}

#[test]
fn decode_rgb_jpeg_normalizes_to_opaque_rgba() {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([10, 200, 30]));
    let bytes = encode(image::DynamicImage::ImageRgb8(img), image::ImageFormat::Jpeg);

    let asset = decode_image(&bytes).unwrap();
    assert_eq!((asset.width(), asset.height()), (4, 4));
    assert!(asset.image().pixels().all(|p| p[3] == 255));
}

#[test]
fn oversized_image_is_bounded_with_aspect_kept() {
    let img = image::RgbImage::from_pixel(4000, 3000, image::Rgb([1, 2, 3]));
    let bytes = encode(image::DynamicImage::ImageRgb8(img), image::ImageFormat::Png);

    let asset = decode_image(&bytes).unwrap();
    assert!(asset.width().max(asset.height()) <= MAX_IMAGE_DIM);
    assert_eq!(asset.width(), 2048);
    assert_eq!(asset.height(), 1536);
}

#[test]
fn garbage_bytes_are_a_decode_error() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(matches!(err, ThumbError::Decode(_)));
}
