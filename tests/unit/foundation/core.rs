use super::*;

#[test]
fn canvas_rejects_zero_dimensions() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
}

#[test]
fn new_canvas_is_transparent() {
    let c = Canvas::new(3, 2).unwrap();
    assert_eq!(c.width(), 3);
    assert_eq!(c.height(), 2);
    assert_eq!(c.as_raw().len(), 3 * 2 * 4);
    assert!(c.as_raw().iter().all(|&b| b == 0));
    assert_eq!(c.pixel(3, 0), None);
}

#[test]
fn png_encoding_decodes_back_to_same_size() {
    let c = Canvas::new(5, 4).unwrap();
    let png = c.encode_png().unwrap();
    let back = image::load_from_memory(&png).unwrap();
    assert_eq!((back.width(), back.height()), (5, 4));
}

#[test]
fn opaque_forces_alpha() {
    let c = Rgba8::new(10, 20, 30, 40).opaque();
    assert_eq!(c.to_array(), [10, 20, 30, 255]);
}
