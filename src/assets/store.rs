use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::{
    assets::cache::{BoundedCache, CacheStats},
    assets::decode,
    assets::fonts::{self, FontFace, FontHandle, FontOrigin, Platform, SystemFonts},
    foundation::error::ThumbResult,
    layout::text::WrapKey,
};

/// Decoded straight-alpha RGBA8 bitmap, shared read-only.
#[derive(Clone)]
pub struct ImageAsset {
    image: Arc<image::RgbaImage>,
}

impl std::fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAsset")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl ImageAsset {
    pub(crate) fn from_rgba(image: Arc<image::RgbaImage>) -> Self {
        Self { image }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the pixels.
    pub fn image(&self) -> &image::RgbaImage {
        &self.image
    }
}

/// Asset directory under the resource root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetCategory {
    /// Full-frame background images.
    Backgrounds,
    /// Overlay patterns.
    Patterns,
    /// Custom font files.
    Fonts,
}

impl AssetCategory {
    /// Every category, in scan order.
    pub const ALL: [Self; 3] = [Self::Backgrounds, Self::Patterns, Self::Fonts];

    /// Directory name under the resource root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Backgrounds => "backgrounds",
            Self::Patterns => "patterns",
            Self::Fonts => "fonts",
        }
    }

    // Earlier extensions win when two files share a stem.
    fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Backgrounds | Self::Patterns => &["png", "jpg", "jpeg", "gif"],
            Self::Fonts => &["ttf", "otf"],
        }
    }
}

/// Resource cache configuration.
#[derive(Clone, Debug)]
pub struct ResourceCacheOpts {
    /// Directory holding `backgrounds/`, `patterns/` and `fonts/`.
    pub root: PathBuf,
    /// Maximum resolved `(name, size)` fonts retained.
    pub font_capacity: usize,
    /// Maximum decoded images retained.
    pub image_capacity: usize,
    /// Maximum wrapped-line sets retained.
    pub wrap_capacity: usize,
}

impl ResourceCacheOpts {
    /// Defaults for `root`, with capacities overridable through `THUMBKIT_*_CACHE_CAPACITY`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            font_capacity: env_capacity("THUMBKIT_FONT_CACHE_CAPACITY", 150),
            image_capacity: env_capacity("THUMBKIT_IMAGE_CACHE_CAPACITY", 64),
            wrap_capacity: env_capacity("THUMBKIT_WRAP_CACHE_CAPACITY", 128),
        }
    }
}

fn env_capacity(var: &str, default: usize) -> usize {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(default)
}

/// Occupancy of every cache owned by a [`ResourceCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceCacheStats {
    /// Sized font handles.
    pub fonts: CacheStats,
    /// Decoded images.
    pub images: CacheStats,
    /// Wrapped-line sets.
    pub wrapped: CacheStats,
}

#[derive(Debug, Default)]
struct AssetIndex {
    by_category: HashMap<AssetCategory, BTreeMap<String, PathBuf>>,
}

impl AssetIndex {
    fn scan(root: &Path) -> Self {
        let mut by_category = HashMap::new();
        for category in AssetCategory::ALL {
            by_category.insert(category, scan_dir(&root.join(category.dir_name()), category));
        }
        let out = Self { by_category };
        tracing::info!(
            backgrounds = out.names(AssetCategory::Backgrounds).len(),
            patterns = out.names(AssetCategory::Patterns).len(),
            fonts = out.names(AssetCategory::Fonts).len(),
            "scanned asset directories"
        );
        out
    }

    fn path(&self, category: AssetCategory, name: &str) -> Option<&PathBuf> {
        self.by_category.get(&category)?.get(name)
    }

    fn names(&self, category: AssetCategory) -> Vec<String> {
        self.by_category
            .get(&category)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn scan_dir(dir: &Path, category: AssetCategory) -> BTreeMap<String, PathBuf> {
    let exts = category.extensions();
    let mut found = BTreeMap::<String, (usize, PathBuf)>::new();

    let rd = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot scan asset directory");
            return BTreeMap::new();
        }
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(rank) = exts.iter().position(|x| ext.eq_ignore_ascii_case(x)) else {
            continue;
        };
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match found.get(stem) {
            Some((existing, _)) if *existing <= rank => {}
            _ => {
                found.insert(stem.to_owned(), (rank, path));
            }
        }
    }

    found.into_iter().map(|(k, (_, p))| (k, p)).collect()
}

type ResolvedFace = Option<(Arc<FontFace>, FontOrigin)>;

/// Process-wide store of fonts, images and wrapped text, loaded lazily from asset directories.
///
/// Construct once, share behind an `Arc`, and call [`refresh`](Self::refresh) when the
/// directories change. Lookups never fail: missing or corrupt assets come back as `None` (images)
/// or as the next font in the fallback chain.
pub struct ResourceCache {
    opts: ResourceCacheOpts,
    platform: Platform,
    index: RwLock<AssetIndex>,
    system_fonts: RwLock<Option<Arc<SystemFonts>>>,

    faces: BoundedCache<(Platform, String), ResolvedFace>,
    fonts: BoundedCache<(String, u32), FontHandle>,
    images: BoundedCache<(AssetCategory, String), ImageAsset>,
    wrapped: BoundedCache<WrapKey, Arc<[String]>>,
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("root", &self.opts.root)
            .field("platform", &self.platform)
            .field("stats", &self.stats())
            .finish()
    }
}

impl ResourceCache {
    /// Create missing asset directories and index their contents.
    pub fn new(opts: ResourceCacheOpts) -> Self {
        for category in AssetCategory::ALL {
            let dir = opts.root.join(category.dir_name());
            if let Err(e) = std::fs::create_dir_all(&dir) {
                tracing::warn!(dir = %dir.display(), error = %e, "cannot create asset directory");
            }
        }
        let index = AssetIndex::scan(&opts.root);
        Self {
            platform: Platform::current(),
            index: RwLock::new(index),
            system_fonts: RwLock::new(None),
            faces: BoundedCache::new(opts.font_capacity),
            fonts: BoundedCache::new(opts.font_capacity),
            images: BoundedCache::new(opts.image_capacity),
            wrapped: BoundedCache::new(opts.wrap_capacity),
            opts,
        }
    }

    /// Root directory of the asset catalog.
    pub fn root(&self) -> &Path {
        &self.opts.root
    }

    /// Sorted asset names (file stems) in `category`.
    pub fn list_names(&self, category: AssetCategory) -> Vec<String> {
        self.read_index().names(category)
    }

    /// First name in `category`, if the directory holds anything.
    pub fn first_name(&self, category: AssetCategory) -> Option<String> {
        self.list_names(category).into_iter().next()
    }

    /// Font `name` at `size` px, resolved through the fallback chain.
    pub fn get_font(&self, name: &str, size: u32) -> FontHandle {
        self.fonts.get_or_insert_with((name.to_owned(), size), || {
            let (face, origin) = match self.resolve_face(name) {
                Some((face, origin)) => (Some(face), origin),
                None => (None, FontOrigin::Default),
            };
            FontHandle::new(name, size, face, origin)
        })
    }

    fn resolve_face(&self, name: &str) -> ResolvedFace {
        self.faces
            .get_or_insert_with((self.platform, name.to_owned()), || {
                let resolved = self.resolve_face_uncached(name);
                match &resolved {
                    Some((face, origin)) => tracing::debug!(
                        requested = name,
                        family = face.family(),
                        ?origin,
                        "resolved font"
                    ),
                    None => tracing::warn!(requested = name, "no usable font found; text is skipped"),
                }
                resolved
            })
    }

    fn resolve_face_uncached(&self, name: &str) -> ResolvedFace {
        let custom = self.read_index().path(AssetCategory::Fonts, name).cloned();
        if let Some(face) = custom.and_then(|p| FontFace::from_file(&p)) {
            return Some((Arc::new(face), FontOrigin::Custom));
        }

        let system = self.system_fonts();
        if let Some(face) = system.by_literal_name(name) {
            return Some((Arc::new(face), FontOrigin::System));
        }
        for candidate in fonts::fallback_candidates(self.platform, name) {
            if let Some(face) = system.by_candidate(candidate) {
                return Some((Arc::new(face), FontOrigin::Fallback));
            }
        }
        system
            .default_face()
            .map(|face| (Arc::new(face), FontOrigin::Default))
    }

    fn system_fonts(&self) -> Arc<SystemFonts> {
        if let Some(db) = self
            .system_fonts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Arc::clone(db);
        }
        let mut slot = self
            .system_fonts
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slot.get_or_insert_with(|| Arc::new(SystemFonts::load())))
    }

    /// Decoded image `name` from `category`, or `None` if absent or undecodable.
    pub fn get_image(&self, category: AssetCategory, name: &str) -> Option<ImageAsset> {
        if category == AssetCategory::Fonts || name.is_empty() || name == "None" {
            return None;
        }
        let key = (category, name.to_owned());
        if let Some(img) = self.images.get(&key) {
            return Some(img);
        }

        let Some(path) = self.read_index().path(category, name).cloned() else {
            tracing::debug!(?category, name, "image not in catalog");
            return None;
        };
        match decode::decode_image_file(&path) {
            Ok(img) => Some(self.images.insert(key, img)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable image");
                None
            }
        }
    }

    /// Decode caller-supplied bytes exactly like a catalog image. Not cached.
    pub fn decode_upload(&self, bytes: &[u8]) -> ThumbResult<ImageAsset> {
        decode::decode_image(bytes)
    }

    pub(crate) fn wrapped_lines(
        &self,
        key: WrapKey,
        compute: impl FnOnce() -> Vec<String>,
    ) -> Arc<[String]> {
        self.wrapped
            .get_or_insert_with(key, || Arc::from(compute()))
    }

    /// Drop every cached font, image and wrapped-line set.
    pub fn clear(&self) {
        self.fonts.clear();
        self.faces.clear();
        self.images.clear();
        self.wrapped.clear();
    }

    /// Clear caches, forget the system font scan and re-index the asset directories.
    ///
    /// Not atomic with respect to concurrent lookups; treat as maintenance.
    pub fn refresh(&self) {
        tracing::info!(root = %self.opts.root.display(), "refreshing resources");
        self.clear();
        *self
            .system_fonts
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        let index = AssetIndex::scan(&self.opts.root);
        *self.index.write().unwrap_or_else(PoisonError::into_inner) = index;
    }

    /// Occupancy and hit counts.
    pub fn stats(&self) -> ResourceCacheStats {
        ResourceCacheStats {
            fonts: self.fonts.stats(),
            images: self.images.stats(),
            wrapped: self.wrapped.stats(),
        }
    }

    fn read_index(&self) -> std::sync::RwLockReadGuard<'_, AssetIndex> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
