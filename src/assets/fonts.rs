//! Font resolution: custom files, system lookup, platform fallback tables and a deterministic
//! default.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use usvg::fontdb;

static NEXT_FACE_ID: AtomicU64 = AtomicU64::new(1);

/// Font file extensions recognized on disk.
pub(crate) const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

/// Operating-system family selecting a fallback table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Windows.
    Windows,
    /// macOS.
    MacOs,
    /// Linux and every other Unix-like target.
    Linux,
}

impl Platform {
    /// Platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }
}

/// One entry of a fallback table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FontCandidate {
    /// Absolute path, or a bare file name searched among installed fonts.
    File(&'static str),
    /// Family name matched case-insensitively.
    Family(&'static str),
}

use FontCandidate::{Family, File};

const WINDOWS_FALLBACKS: &[FontCandidate] = &[
    File("arial.ttf"),
    File("calibri.ttf"),
    File("segoeui.ttf"),
    File("tahoma.ttf"),
    File("C:/Windows/Fonts/arial.ttf"),
    File("C:/Windows/Fonts/calibri.ttf"),
];

const MACOS_FALLBACKS: &[FontCandidate] = &[
    File("Arial.ttc"),
    File("Helvetica.ttc"),
    File("Arial.ttf"),
    File("/System/Library/Fonts/Arial.ttf"),
    File("/System/Library/Fonts/Helvetica.ttc"),
];

const LINUX_FALLBACKS: &[FontCandidate] = &[
    File("DejaVuSans.ttf"),
    File("liberation-sans.ttf"),
    File("Ubuntu-R.ttf"),
    File("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
    File("/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf"),
    Family("DejaVu Sans"),
    Family("Liberation Sans"),
];

// Tried ahead of the platform list when "Impact" is requested.
const WINDOWS_IMPACT: &[FontCandidate] = &[
    File("C:/Windows/Fonts/impact.ttf"),
    File("impact.ttf"),
];
const MACOS_IMPACT: &[FontCandidate] = &[File("Impact.ttf")];
const LINUX_IMPACT: &[FontCandidate] = &[
    Family("Anton"),
    File("DejaVuSans-Bold.ttf"),
    File("LiberationSans-Bold.ttf"),
];

/// Ordered fallback candidates for `requested` on `platform`.
pub(crate) fn fallback_candidates(platform: Platform, requested: &str) -> Vec<FontCandidate> {
    let (base, impact) = match platform {
        Platform::Windows => (WINDOWS_FALLBACKS, WINDOWS_IMPACT),
        Platform::MacOs => (MACOS_FALLBACKS, MACOS_IMPACT),
        Platform::Linux => (LINUX_FALLBACKS, LINUX_IMPACT),
    };
    let mut out = Vec::with_capacity(base.len() + impact.len());
    if requested.trim().eq_ignore_ascii_case("impact") {
        out.extend_from_slice(impact);
    }
    out.extend_from_slice(base);
    out
}

/// Where a resolved face came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontOrigin {
    /// The custom font directory.
    Custom,
    /// An installed font matching the requested name.
    System,
    /// The platform fallback table.
    Fallback,
    /// The built-in default.
    Default,
}

/// Loaded font file and the face index within it. The shaper and the rasterizer share one blob.
pub struct FontFace {
    id: u64,
    family: String,
    paint: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("index", &self.paint.index)
            .field("data_len", &self.paint.data.len())
            .finish()
    }
}

impl FontFace {
    pub(crate) fn from_bytes(bytes: Vec<u8>, index: u32) -> Option<Self> {
        let family = family_name_of(&bytes, index)?;
        Some(Self {
            id: NEXT_FACE_ID.fetch_add(1, Ordering::Relaxed),
            family,
            paint: vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(bytes),
                index,
            ),
        })
    }

    pub(crate) fn from_file(path: &Path) -> Option<Self> {
        match std::fs::read(path) {
            Ok(bytes) => {
                let face = Self::from_bytes(bytes, 0);
                if face.is_none() {
                    tracing::warn!(path = %path.display(), "unreadable font file");
                }
                face
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "font file not readable");
                None
            }
        }
    }

    /// Family name recorded in the font's name table.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Index of this face within its file; nonzero only for collections.
    pub fn index(&self) -> u32 {
        self.paint.index
    }

    pub(crate) fn data(&self) -> &vello_cpu::peniko::Blob<u8> {
        &self.paint.data
    }

    pub(crate) fn paint(&self) -> &vello_cpu::peniko::FontData {
        &self.paint
    }
}

fn family_name_of(bytes: &[u8], index: u32) -> Option<String> {
    let mut db = fontdb::Database::new();
    db.load_font_data(bytes.to_vec());
    db.faces()
        .find(|f| f.index == index)
        .and_then(|f| f.families.first())
        .map(|(name, _)| name.clone())
}

/// A resolved font at a specific pixel size.
///
/// `face` is `None` only when no font at all could be found on the machine; such a handle
/// measures every string as zero width and draws nothing.
#[derive(Clone, Debug)]
pub struct FontHandle {
    name: Arc<str>,
    size: u32,
    face: Option<Arc<FontFace>>,
    origin: FontOrigin,
}

impl FontHandle {
    pub(crate) fn new(
        name: &str,
        size: u32,
        face: Option<Arc<FontFace>>,
        origin: FontOrigin,
    ) -> Self {
        Self {
            name: Arc::from(name),
            size,
            face,
            origin,
        }
    }

    /// Name the caller asked for.
    pub fn requested_name(&self) -> &str {
        &self.name
    }

    /// Pixel size.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The backing face, if any font was found.
    pub fn face(&self) -> Option<&Arc<FontFace>> {
        self.face.as_ref()
    }

    /// How the face was resolved.
    pub fn origin(&self) -> FontOrigin {
        self.origin
    }

    /// Identity of the backing face for cache keys; never reused within a process.
    pub(crate) fn identity(&self) -> u64 {
        self.face.as_ref().map_or(0, |f| f.id)
    }
}

/// Installed fonts, scanned once on first use.
pub(crate) struct SystemFonts {
    db: fontdb::Database,
}

impl SystemFonts {
    pub(crate) fn load() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded system font database");
        Self { db }
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self {
            db: fontdb::Database::new(),
        }
    }

    /// Look up a name the way a user would type it: a file name when it carries a font
    /// extension, otherwise a family name.
    pub(crate) fn by_literal_name(&self, name: &str) -> Option<FontFace> {
        if has_font_extension(name) {
            self.by_file(name)
        } else {
            self.by_family(name)
        }
    }

    pub(crate) fn by_candidate(&self, candidate: FontCandidate) -> Option<FontFace> {
        match candidate {
            FontCandidate::File(f) => self.by_file(f),
            FontCandidate::Family(name) => self.by_family(name),
        }
    }

    fn by_file(&self, file: &str) -> Option<FontFace> {
        let p = Path::new(file);
        if p.is_absolute() || file.contains(":/") {
            return FontFace::from_file(p);
        }
        let id = self
            .db
            .faces()
            .filter(|f| {
                source_path(&f.source)
                    .and_then(|p| p.file_name())
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.eq_ignore_ascii_case(file))
            })
            .min_by_key(|f| f.index)
            .map(|f| f.id)?;
        self.load_face(id)
    }

    fn by_family(&self, family: &str) -> Option<FontFace> {
        let family = family.trim();
        if family.is_empty() {
            return None;
        }
        let id = self
            .db
            .faces()
            .filter(|f| {
                f.families
                    .iter()
                    .any(|(n, _)| n.eq_ignore_ascii_case(family))
            })
            .min_by_key(|f| {
                (
                    f.style != fontdb::Style::Normal,
                    f.weight.0.abs_diff(fontdb::Weight::NORMAL.0),
                    f.post_script_name.clone(),
                )
            })
            .map(|f| f.id)?;
        self.load_face(id)
    }

    /// Generic sans-serif, else the first installed face ordered by family name.
    pub(crate) fn default_face(&self) -> Option<FontFace> {
        let query = fontdb::Query {
            families: &[fontdb::Family::SansSerif],
            ..fontdb::Query::default()
        };
        if let Some(face) = self.db.query(&query).and_then(|id| self.load_face(id)) {
            return Some(face);
        }
        let id = self
            .db
            .faces()
            .min_by_key(|f| {
                (
                    f.families.first().map(|(n, _)| n.clone()),
                    f.post_script_name.clone(),
                )
            })
            .map(|f| f.id)?;
        self.load_face(id)
    }

    fn load_face(&self, id: fontdb::ID) -> Option<FontFace> {
        let (bytes, index) = self
            .db
            .with_face_data(id, |data, index| (data.to_vec(), index))?;
        FontFace::from_bytes(bytes, index)
    }
}

fn source_path(source: &fontdb::Source) -> Option<&Path> {
    match source {
        fontdb::Source::File(p) => Some(p.as_path()),
        fontdb::Source::SharedFile(p, _) => Some(p.as_path()),
        fontdb::Source::Binary(_) => None,
    }
}

pub(crate) fn has_font_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FONT_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
