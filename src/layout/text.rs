use std::collections::HashMap;

use parley::fontique::{Collection, CollectionOptions, SourceCache};
use parley::style::{FontStyle, FontWeight, FontWidth, StyleProperty};

use crate::{
    assets::fonts::FontHandle,
    foundation::math::half_floor,
    scene::style::{Alignment, HAlign, VAlign},
};

/// Cache key for a wrapped line set: the result depends only on these.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct WrapKey {
    pub(crate) text: String,
    pub(crate) font: u64,
    pub(crate) size: u32,
    pub(crate) max_width: i64,
}

/// Faces registered before the collection is rebuilt.
const MAX_REGISTERED_FACES: usize = 64;

/// Parley's view of one registered face: enough to select exactly it from a font stack.
#[derive(Clone, Debug)]
struct RegisteredFace {
    family: String,
    weight: FontWeight,
    style: FontStyle,
    width: FontWidth,
}

/// Shapes text with parley against a single registered face.
///
/// Parley contexts are not `Sync`; the pipeline keeps one engine per worker thread. The font
/// collection holds only faces registered through [`FontHandle`]s; no system scan runs.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    faces: HashMap<u64, Option<RegisteredFace>>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: Self::empty_font_context(),
            layout_ctx: parley::LayoutContext::new(),
            faces: HashMap::new(),
        }
    }

    fn empty_font_context() -> parley::FontContext {
        parley::FontContext {
            collection: Collection::new(CollectionOptions {
                shared: false,
                system_fonts: false,
            }),
            source_cache: SourceCache::default(),
        }
    }

    fn registered(&mut self, font: &FontHandle) -> Option<RegisteredFace> {
        let face = font.face()?;
        if let Some(cached) = self.faces.get(&font.identity()) {
            return cached.clone();
        }
        if self.faces.len() >= MAX_REGISTERED_FACES {
            tracing::debug!(faces = self.faces.len(), "rebuilding shaper font collection");
            self.font_ctx = Self::empty_font_context();
            self.faces.clear();
        }

        // A collection file registers every face it holds; keep the one the handle points at.
        let collection = &mut self.font_ctx.collection;
        let registered = collection
            .register_fonts(face.data().clone(), None)
            .into_iter()
            .find_map(|(family, infos)| {
                let info = infos.into_iter().find(|i| i.index() == face.index())?;
                Some(RegisteredFace {
                    family: collection.family_name(family)?.to_owned(),
                    weight: info.weight(),
                    style: info.style(),
                    width: info.width(),
                })
            });
        if registered.is_none() {
            tracing::warn!(
                family = face.family(),
                index = face.index(),
                "font did not register with the shaper"
            );
        }
        self.faces.insert(font.identity(), registered.clone());
        registered
    }

    /// Shape `text` as one unbroken line. `None` when the handle has no usable face.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        font: &FontHandle,
    ) -> Option<parley::Layout<()>> {
        let face = self.registered(font)?;
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(StyleProperty::FontStack(parley::style::FontStack::Source(
            std::borrow::Cow::Owned(face.family),
        )));
        builder.push_default(StyleProperty::FontWeight(face.weight));
        builder.push_default(StyleProperty::FontStyle(face.style));
        builder.push_default(StyleProperty::FontWidth(face.width));
        builder.push_default(StyleProperty::FontSize(font.size() as f32));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        Some(layout)
    }

    /// Advance width of `text` in whole pixels, rounded up.
    pub(crate) fn measure(&mut self, text: &str, font: &FontHandle) -> i64 {
        if text.is_empty() {
            return 0;
        }
        self.layout_line(text, font)
            .map_or(0, |l| f64::from(l.width()).ceil() as i64)
    }
}

/// Greedy word wrap with a caller-supplied width function.
///
/// `\n` separates paragraphs, each wrapped on its own; a paragraph without words produces no
/// line. Words are split on whitespace and rejoined with single spaces. A word wider than
/// `max_width` is kept whole on its own line.
pub fn wrap_with(text: &str, max_width: i64, mut measure: impl FnMut(&str) -> i64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if measure(&candidate) > max_width {
                lines.push(std::mem::replace(&mut current, word.to_owned()));
            } else {
                current = candidate;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Frame and style inputs to block placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockParams {
    /// Frame width.
    pub width: i64,
    /// Frame height.
    pub height: i64,
    /// Font size in pixels.
    pub font_size: i64,
    /// Edge margin.
    pub margin: i64,
    /// Horizontal shift after alignment.
    pub x_offset: i64,
    /// Vertical shift after alignment.
    pub y_offset: i64,
    /// Line gap as a fraction of `font_size`.
    pub line_spacing_factor: f64,
    /// Block anchor.
    pub alignment: Alignment,
}

impl BlockParams {
    /// Width available to each line.
    pub fn wrap_width(&self) -> i64 {
        self.width.saturating_sub(self.margin.saturating_mul(2))
    }

    /// Gap between consecutive line boxes, floored. Saturates instead of overflowing.
    pub fn line_spacing(&self) -> i64 {
        (self.font_size as f64 * self.line_spacing_factor).floor() as i64
    }

    /// Left edge of something `content_width` wide under the horizontal alignment.
    pub fn aligned_x(&self, content_width: i64) -> i64 {
        let x = match self.alignment.horizontal() {
            HAlign::Left => self.margin,
            HAlign::Center => half_floor(self.width.saturating_sub(content_width)),
            HAlign::Right => self
                .width
                .saturating_sub(self.margin)
                .saturating_sub(content_width),
        };
        x.saturating_add(self.x_offset)
    }
}

/// One positioned line; `y` is the top of its line box.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedLine {
    /// Line content.
    pub text: String,
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Measured width.
    pub width: i64,
}

/// A wrapped and positioned block of text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextBlock {
    /// Lines top to bottom.
    pub lines: Vec<PlacedLine>,
    /// Top of the first line box.
    pub top: i64,
    /// `lines × (size + spacing) − spacing`.
    pub height: i64,
    /// Widest line.
    pub max_line_width: i64,
}

/// Place measured lines inside the frame.
pub fn layout_block(params: &BlockParams, measured: Vec<(String, i64)>) -> TextBlock {
    let spacing = params.line_spacing();
    let advance = params.font_size.saturating_add(spacing);
    let n = measured.len() as i64;
    let height = if n == 0 {
        0
    } else {
        n.saturating_mul(advance).saturating_sub(spacing)
    };

    let top = match params.alignment.vertical() {
        VAlign::Top => params.margin,
        VAlign::Middle => half_floor(params.height.saturating_sub(height)),
        VAlign::Bottom => params
            .height
            .saturating_sub(params.margin)
            .saturating_sub(height),
    }
    .saturating_add(params.y_offset);

    let max_line_width = measured.iter().map(|(_, w)| *w).max().unwrap_or(0);
    let lines = measured
        .into_iter()
        .enumerate()
        .map(|(i, (text, width))| PlacedLine {
            x: params.aligned_x(width),
            y: top.saturating_add((i as i64).saturating_mul(advance)),
            text,
            width,
        })
        .collect();

    TextBlock {
        lines,
        top,
        height,
        max_line_width,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/text.rs"]
mod tests;
