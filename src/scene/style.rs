use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{
    assets::color::{color_from_value, to_hex},
    assets::store::ImageAsset,
    foundation::core::Rgba8,
    foundation::error::{ThumbError, ThumbResult},
};

/// Anchor of the text block within the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Top edge, left edge.
    TopLeft,
    /// Top edge, centered.
    TopCenter,
    /// Top edge, right edge.
    TopRight,
    /// Vertically centered, left edge.
    Left,
    /// Centered on both axes.
    #[default]
    Center,
    /// Vertically centered, right edge.
    Right,
    /// Bottom edge, left edge.
    BottomLeft,
    /// Bottom edge, centered.
    BottomCenter,
    /// Bottom edge, right edge.
    BottomRight,
}

/// Vertical component of an [`Alignment`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VAlign {
    /// Anchored to the top margin.
    Top,
    /// Centered in the frame.
    Middle,
    /// Anchored to the bottom margin.
    Bottom,
}

/// Horizontal component of an [`Alignment`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HAlign {
    /// Anchored to the left margin.
    Left,
    /// Centered in the frame.
    Center,
    /// Anchored to the right margin.
    Right,
}

impl Alignment {
    /// Every alignment, row by row.
    pub const ALL: [Self; 9] = [
        Self::TopLeft,
        Self::TopCenter,
        Self::TopRight,
        Self::Left,
        Self::Center,
        Self::Right,
        Self::BottomLeft,
        Self::BottomCenter,
        Self::BottomRight,
    ];

    /// Parse the snake_case name (`"top_left"`, `"center"`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s.trim())
    }

    /// Snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top_left",
            Self::TopCenter => "top_center",
            Self::TopRight => "top_right",
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::BottomLeft => "bottom_left",
            Self::BottomCenter => "bottom_center",
            Self::BottomRight => "bottom_right",
        }
    }

    /// Vertical anchoring.
    pub fn vertical(self) -> VAlign {
        match self {
            Self::TopLeft | Self::TopCenter | Self::TopRight => VAlign::Top,
            Self::Left | Self::Center | Self::Right => VAlign::Middle,
            Self::BottomLeft | Self::BottomCenter | Self::BottomRight => VAlign::Bottom,
        }
    }

    /// Horizontal anchoring.
    pub fn horizontal(self) -> HAlign {
        match self {
            Self::TopLeft | Self::Left | Self::BottomLeft => HAlign::Left,
            Self::TopCenter | Self::Center | Self::BottomCenter => HAlign::Center,
            Self::TopRight | Self::Right | Self::BottomRight => HAlign::Right,
        }
    }
}

/// Which image fills the background layer.
#[derive(Clone, Debug)]
pub enum ImageRef {
    /// A background from the catalog, by file stem.
    Named(String),
    /// The alphabetically first catalog background, if any.
    FirstAvailable,
    /// Caller-supplied bytes, already decoded. Never serialized.
    Uploaded(ImageAsset),
}

/// Every visual parameter of one render.
///
/// Deserialization is lenient: missing, malformed or out-of-range fields take their default
/// instead of failing, so any JSON object yields a usable style. See [`Default`] for the values.
#[derive(Clone, Debug)]
pub struct StyleConfiguration {
    /// Glyph fill color; alpha is ignored when drawing.
    pub text_color: Rgba8,
    /// Anchor of the text block.
    pub text_alignment: Alignment,
    /// Requested font: custom stem, installed family or file name.
    pub font_name: String,
    /// Font size in pixels, `1..=MAX_EXTENT`.
    pub font_size: u32,
    /// Distance kept from the frame edges; also narrows the wrap width on both sides.
    pub text_margins: i64,
    /// Horizontal shift applied after alignment.
    pub text_x_offset: i64,
    /// Vertical shift applied after alignment.
    pub text_y_offset: i64,
    /// Extra gap between lines as a fraction of the font size.
    pub line_spacing_factor: f64,

    /// Draw an outline around glyphs.
    pub text_stroke_enabled: bool,
    /// Outline radius in pixels.
    pub text_stroke_width: u32,
    /// Outline color; alpha is ignored when drawing.
    pub text_stroke_color: Rgba8,

    /// Draw a rectangle behind the text block.
    pub text_box_enabled: bool,
    /// Rectangle color; its alpha comes from `text_box_opacity`.
    pub text_box_color: Rgba8,
    /// Space between the text block and the rectangle edges.
    pub text_box_padding: i64,
    /// Rectangle opacity, 0..=100.
    pub text_box_opacity: u8,

    /// Solid fill under everything; always drawn opaque.
    pub background_color: Rgba8,
    /// Opacity of the background image, 0..=100.
    pub background_opacity: u8,
    /// Background image, if the layer is enabled.
    pub background_image: Option<ImageRef>,
    /// Background image size as a percentage of the frame.
    pub bg_image_scale: u32,
    /// Horizontal shift of the background image.
    pub bg_image_x_offset: i64,
    /// Vertical shift of the background image.
    pub bg_image_y_offset: i64,

    /// Pattern overlay stem, if the layer is enabled.
    pub pattern: Option<String>,
    /// Pattern opacity, 0..=100.
    pub pattern_opacity: u8,
    /// Pattern size as a percentage of its native size.
    pub pattern_scale: u32,
    /// Horizontal shift of the pattern.
    pub pattern_x_offset: i64,
    /// Vertical shift of the pattern.
    pub pattern_y_offset: i64,
    /// Replace the pattern's RGB with `pattern_color`, keeping its alpha.
    pub pattern_color_enabled: bool,
    /// Tint color.
    pub pattern_color: Rgba8,

    /// Output name; `^` is replaced by the sequence number, which is appended otherwise.
    pub filename_base: String,
}

impl Default for StyleConfiguration {
    fn default() -> Self {
        Self {
            text_color: Rgba8::WHITE,
            text_alignment: Alignment::Center,
            font_name: "Arial".to_owned(),
            font_size: 100,
            text_margins: 100,
            text_x_offset: 0,
            text_y_offset: 0,
            line_spacing_factor: 0.3,

            text_stroke_enabled: false,
            text_stroke_width: 2,
            text_stroke_color: Rgba8::BLACK,

            text_box_enabled: false,
            text_box_color: Rgba8::BLACK,
            text_box_padding: 20,
            text_box_opacity: 100,

            background_color: Rgba8::rgb(0xd7, 0x3f, 0x09),
            background_opacity: 100,
            background_image: None,
            bg_image_scale: 100,
            bg_image_x_offset: 0,
            bg_image_y_offset: 0,

            pattern: None,
            pattern_opacity: 100,
            pattern_scale: 300,
            pattern_x_offset: 0,
            pattern_y_offset: 0,
            pattern_color_enabled: false,
            pattern_color: Rgba8::WHITE,

            filename_base: "output".to_owned(),
        }
    }
}

// Names the catalog treats as "no specific image".
const UNNAMED_IMAGES: &[&str] = &["", "None", "Custom"];

/// Largest magnitude accepted for pixel lengths and offsets; anything beyond takes the default.
pub const MAX_EXTENT: i64 = 1_000_000;

/// Largest accepted `line_spacing_factor`.
pub const MAX_LINE_SPACING_FACTOR: f64 = 100.0;

impl StyleConfiguration {
    /// Parse a JSON object leniently. Only non-object input is an error.
    pub fn from_json(s: &str) -> ThumbResult<Self> {
        let v: Value = serde_json::from_str(s)
            .map_err(|e| ThumbError::validation(format!("style json: {e}")))?;
        Self::from_value(&v)
    }

    /// Build from an already parsed JSON value.
    pub fn from_value(v: &Value) -> ThumbResult<Self> {
        let obj = v
            .as_object()
            .ok_or_else(|| ThumbError::validation("style must be a json object"))?;
        let d = Self::default();
        let f = Fields(obj);

        let background_image = if f.flag("background_image_enabled") {
            match f.string("background_image") {
                Some(name) if !UNNAMED_IMAGES.contains(&name.as_str()) => {
                    Some(ImageRef::Named(name))
                }
                _ => Some(ImageRef::FirstAvailable),
            }
        } else {
            None
        };

        let pattern = if f.flag("pattern_enabled") {
            f.string("pattern_overlay")
                .filter(|n| !UNNAMED_IMAGES.contains(&n.as_str()))
        } else {
            None
        };

        Ok(Self {
            text_color: f.color("text_color", d.text_color),
            text_alignment: f
                .string("text_alignment")
                .and_then(|s| Alignment::parse(&s))
                .unwrap_or(d.text_alignment),
            font_name: f
                .string("font_name")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(d.font_name),
            font_size: f
                .int("font_size")
                .filter(|&n| (1..=MAX_EXTENT).contains(&n))
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(d.font_size),
            text_margins: f.extent("text_margins", d.text_margins),
            text_x_offset: f.extent("text_x_offset", d.text_x_offset),
            text_y_offset: f.extent("text_y_offset", d.text_y_offset),
            line_spacing_factor: f
                .float("line_spacing_factor")
                .filter(|x| (0.0..=MAX_LINE_SPACING_FACTOR).contains(x))
                .unwrap_or(d.line_spacing_factor),

            text_stroke_enabled: f.flag("text_stroke_enabled"),
            text_stroke_width: f
                .int("text_stroke_width")
                .filter(|&n| (0..=MAX_EXTENT).contains(&n))
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(d.text_stroke_width),
            text_stroke_color: f.color("text_stroke_color", d.text_stroke_color),

            text_box_enabled: f.flag("text_box_enabled"),
            text_box_color: f.color("text_box_color", d.text_box_color),
            text_box_padding: f.extent("text_box_padding", d.text_box_padding),
            text_box_opacity: f.percent("text_box_opacity", d.text_box_opacity),

            background_color: f.color("background_color", d.background_color),
            background_opacity: f.percent("background_opacity", d.background_opacity),
            background_image,
            bg_image_scale: f.scale("bg_image_scale", d.bg_image_scale),
            bg_image_x_offset: f.extent("bg_image_x_offset", d.bg_image_x_offset),
            bg_image_y_offset: f.extent("bg_image_y_offset", d.bg_image_y_offset),

            pattern,
            pattern_opacity: f.percent("pattern_opacity", d.pattern_opacity),
            pattern_scale: f.scale("pattern_scale", d.pattern_scale),
            pattern_x_offset: f.extent("pattern_x_offset", d.pattern_x_offset),
            pattern_y_offset: f.extent("pattern_y_offset", d.pattern_y_offset),
            pattern_color_enabled: f.flag("pattern_color_enabled"),
            pattern_color: f.color("pattern_color", d.pattern_color),

            filename_base: f.string("filename_base").unwrap_or(d.filename_base),
        })
    }

    /// JSON form accepted by [`from_value`](Self::from_value). Uploaded images are written as a
    /// disabled background layer.
    pub fn to_value(&self) -> Value {
        let (bg_enabled, bg_name) = match &self.background_image {
            Some(ImageRef::Named(n)) => (true, n.clone()),
            Some(ImageRef::FirstAvailable) => (true, "None".to_owned()),
            Some(ImageRef::Uploaded(_)) | None => (false, "None".to_owned()),
        };
        json!({
            "text_color": to_hex(self.text_color),
            "text_alignment": self.text_alignment.as_str(),
            "font_name": self.font_name,
            "font_size": self.font_size,
            "text_margins": self.text_margins,
            "text_x_offset": self.text_x_offset,
            "text_y_offset": self.text_y_offset,
            "line_spacing_factor": self.line_spacing_factor,
            "text_stroke_enabled": self.text_stroke_enabled,
            "text_stroke_width": self.text_stroke_width,
            "text_stroke_color": to_hex(self.text_stroke_color),
            "text_box_enabled": self.text_box_enabled,
            "text_box_color": to_hex(self.text_box_color),
            "text_box_padding": self.text_box_padding,
            "text_box_opacity": self.text_box_opacity,
            "background_color": to_hex(self.background_color),
            "background_opacity": self.background_opacity,
            "background_image_enabled": bg_enabled,
            "background_image": bg_name,
            "bg_image_scale": self.bg_image_scale,
            "bg_image_x_offset": self.bg_image_x_offset,
            "bg_image_y_offset": self.bg_image_y_offset,
            "pattern_enabled": self.pattern.is_some(),
            "pattern_overlay": self.pattern.as_deref().unwrap_or("None"),
            "pattern_opacity": self.pattern_opacity,
            "pattern_scale": self.pattern_scale,
            "pattern_x_offset": self.pattern_x_offset,
            "pattern_y_offset": self.pattern_y_offset,
            "pattern_color_enabled": self.pattern_color_enabled,
            "pattern_color": to_hex(self.pattern_color),
            "filename_base": self.filename_base,
        })
    }
}

impl Serialize for StyleConfiguration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StyleConfiguration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = Value::deserialize(deserializer)?;
        Self::from_value(&v).map_err(serde::de::Error::custom)
    }
}

/// Typed, forgiving accessors over a style object.
struct Fields<'a>(&'a Map<String, Value>);

impl Fields<'_> {
    fn string(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn int(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn float(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(s.trim(), "on" | "true" | "1"),
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            _ => false,
        }
    }

    fn color(&self, key: &str, default: Rgba8) -> Rgba8 {
        match self.0.get(key) {
            None | Some(Value::Null) => default,
            // Present but unreadable colors fall back to white.
            Some(v) => color_from_value(v).unwrap_or(Rgba8::WHITE),
        }
    }

    fn extent(&self, key: &str, default: i64) -> i64 {
        self.int(key)
            .filter(|n| (-MAX_EXTENT..=MAX_EXTENT).contains(n))
            .unwrap_or(default)
    }

    fn percent(&self, key: &str, default: u8) -> u8 {
        self.int(key)
            .filter(|n| (0..=100).contains(n))
            .map_or(default, |n| n as u8)
    }

    fn scale(&self, key: &str, default: u32) -> u32 {
        self.int(key)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(default)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/style.rs"]
mod tests;
