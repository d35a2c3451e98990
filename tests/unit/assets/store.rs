use std::io::Cursor;

use super::*;

fn temp_root(tag: &str) -> PathBuf {
    let tmp = std::env::temp_dir().join(format!(
        "thumbkit_store_{tag}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&tmp).unwrap();
    tmp
}

fn write_png(path: &Path, w: u32, h: u32, px: [u8; 4]) {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, &buf).unwrap();
}

#[test]
fn new_creates_missing_directories() {
    let root = temp_root("dirs");
    let _cache = ResourceCache::new(ResourceCacheOpts::new(&root));
    for category in AssetCategory::ALL {
        assert!(root.join(category.dir_name()).is_dir());
    }
}

#[test]
fn names_are_sorted_stems_filtered_by_extension() {
    let root = temp_root("names");
    let bg = root.join("backgrounds");
    std::fs::create_dir_all(&bg).unwrap();
    write_png(&bg.join("zeta.png"), 1, 1, [0, 0, 0, 255]);
    write_png(&bg.join("alpha.png"), 1, 1, [0, 0, 0, 255]);
    std::fs::write(bg.join("notes.txt"), "ignored").unwrap();

    let cache = ResourceCache::new(ResourceCacheOpts::new(&root));
    assert_eq!(
        cache.list_names(AssetCategory::Backgrounds),
        vec!["alpha".to_string(), "zeta".to_string()]
    );
    assert_eq!(
        cache.first_name(AssetCategory::Backgrounds).as_deref(),
        Some("alpha")
    );
    assert!(cache.list_names(AssetCategory::Patterns).is_empty());
}

#[test]
fn png_wins_over_jpeg_with_same_stem() {
    let root = temp_root("priority");
    let pat = root.join("patterns");
    std::fs::create_dir_all(&pat).unwrap();
    write_png(&pat.join("dots.png"), 2, 2, [9, 9, 9, 255]);
    std::fs::write(pat.join("dots.jpg"), b"not really a jpeg").unwrap();

    let cache = ResourceCache::new(ResourceCacheOpts::new(&root));
    let img = cache.get_image(AssetCategory::Patterns, "dots").unwrap();
    assert_eq!((img.width(), img.height()), (2, 2));
}

#[test]
fn images_are_cached_and_corrupt_files_yield_none() {
    let root = temp_root("images");
    let bg = root.join("backgrounds");
    std::fs::create_dir_all(&bg).unwrap();
    write_png(&bg.join("sky.png"), 3, 2, [10, 20, 30, 255]);
    std::fs::write(bg.join("broken.png"), b"garbage").unwrap();

    let cache = ResourceCache::new(ResourceCacheOpts::new(&root));
    let a = cache.get_image(AssetCategory::Backgrounds, "sky").unwrap();
    let b = cache.get_image(AssetCategory::Backgrounds, "sky").unwrap();
    assert!(Arc::ptr_eq(&a.image, &b.image));
    assert_eq!(a.image().get_pixel(0, 0).0, [10, 20, 30, 255]);

    assert!(cache.get_image(AssetCategory::Backgrounds, "broken").is_none());
    assert!(cache.get_image(AssetCategory::Backgrounds, "missing").is_none());
    assert!(cache.get_image(AssetCategory::Backgrounds, "None").is_none());
    assert!(cache.get_image(AssetCategory::Backgrounds, "").is_none());

    let st = cache.stats();
    assert_eq!(st.images.entries, 1);
    assert!(st.images.hits >= 1);
}

#[test]
fn refresh_picks_up_new_files() {
    let root = temp_root("refresh");
    let cache = ResourceCache::new(ResourceCacheOpts::new(&root));
    assert!(cache.list_names(AssetCategory::Backgrounds).is_empty());

    write_png(&root.join("backgrounds").join("late.png"), 1, 1, [1, 1, 1, 255]);
    assert!(cache.get_image(AssetCategory::Backgrounds, "late").is_none());

    cache.refresh();
    assert_eq!(cache.list_names(AssetCategory::Backgrounds), vec!["late".to_string()]);
    assert!(cache.get_image(AssetCategory::Backgrounds, "late").is_some());
}

#[test]
fn image_cache_respects_capacity() {
    let root = temp_root("capacity");
    let bg = root.join("backgrounds");
    std::fs::create_dir_all(&bg).unwrap();
    for i in 0..5 {
        write_png(&bg.join(format!("img{i}.png")), 1, 1, [i, 0, 0, 255]);
    }

    let mut opts = ResourceCacheOpts::new(&root);
    opts.image_capacity = 2;
    let cache = ResourceCache::new(opts);
    for i in 0..5 {
        assert!(cache.get_image(AssetCategory::Backgrounds, &format!("img{i}")).is_some());
    }
    assert_eq!(cache.stats().images.entries, 2);
}

#[test]
fn font_handles_are_cached_per_name_and_size() {
    let root = temp_root("fonts");
    let cache = ResourceCache::new(ResourceCacheOpts::new(&root));

    let a = cache.get_font("Definitely Not Installed", 40);
    let b = cache.get_font("Definitely Not Installed", 40);
    let c = cache.get_font("Definitely Not Installed", 41);
    assert_eq!(a.identity(), b.identity());
    assert_eq!(a.size(), 40);
    assert_eq!(c.size(), 41);
    assert_eq!(cache.stats().fonts.entries, 2);

    // Same face behind both sizes.
    assert_eq!(a.identity(), c.identity());
    if a.face().is_some() {
        assert_ne!(a.origin(), FontOrigin::Custom);
        assert_ne!(a.origin(), FontOrigin::System);
    }
}

#[test]
fn decode_upload_rejects_garbage() {
    let root = temp_root("upload");
    let cache = ResourceCache::new(ResourceCacheOpts::new(&root));
    assert!(cache.decode_upload(b"nope").is_err());
}
