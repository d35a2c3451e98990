use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    assets::store::ResourceCache,
    foundation::core::Canvas,
    foundation::error::{ThumbError, ThumbResult},
    render::pipeline::render_layers,
    scene::style::StyleConfiguration,
};

/// Sequence-number placeholder in text and filename templates.
pub const PLACEHOLDER: char = '^';

/// Replace every `^` in `template` with `sequence`.
pub fn substitute_placeholder(template: &str, sequence: i64) -> String {
    template.replace(PLACEHOLDER, &sequence.to_string())
}

/// Output name for `sequence`: placeholders substituted, or the number appended when the
/// template has none.
pub fn output_filename(template: &str, sequence: i64) -> String {
    if template.contains(PLACEHOLDER) {
        substitute_placeholder(template, sequence)
    } else {
        format!("{template}{sequence}")
    }
}

/// A numbered run of thumbnails sharing one style.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchRequest {
    /// Text with `^` standing for the sequence number.
    pub text_template: String,
    /// Overrides the style's `filename_base` when set.
    pub filename_template: Option<String>,
    /// First sequence number.
    pub start: i64,
    /// Number of thumbnails.
    pub count: u32,
    /// Canvas width.
    pub width: u32,
    /// Canvas height.
    pub height: u32,
    /// Worker threads; `None` uses rayon's default.
    pub threads: Option<usize>,
}

impl BatchRequest {
    /// `count` thumbnails from `start` at 1280×720.
    pub fn new(text_template: impl Into<String>, start: i64, count: u32) -> Self {
        Self {
            text_template: text_template.into(),
            filename_template: None,
            start,
            count,
            width: 1280,
            height: 720,
            threads: None,
        }
    }
}

/// One encoded thumbnail of a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchEntry {
    /// Sequence number it was rendered with.
    pub sequence: i64,
    /// `<filename>.png`.
    pub filename: String,
    /// Encoded PNG.
    pub png: Vec<u8>,
}

/// Renders thumbnails from a style, a text template and a sequence number.
///
/// Holds only the shared [`ResourceCache`]; the style is passed to every call, so one generator
/// serves any number of concurrent requests.
#[derive(Clone, Debug)]
pub struct ThumbnailGenerator {
    resources: Arc<ResourceCache>,
}

impl ThumbnailGenerator {
    /// Generator drawing assets from `resources`.
    pub fn new(resources: Arc<ResourceCache>) -> Self {
        Self { resources }
    }

    /// The shared resource cache.
    pub fn resources(&self) -> &Arc<ResourceCache> {
        &self.resources
    }

    /// Render one thumbnail and derive its filename (without extension).
    #[tracing::instrument(level = "debug", skip(self, style, text), fields(font = %style.font_name))]
    pub fn generate(
        &self,
        style: &StyleConfiguration,
        text: &str,
        sequence: i64,
        width: u32,
        height: u32,
    ) -> ThumbResult<(Canvas, String)> {
        let display = substitute_placeholder(text, sequence);
        let canvas = render_layers(&self.resources, style, &display, width, height)?;
        Ok((canvas, output_filename(&style.filename_base, sequence)))
    }

    /// [`generate`](Self::generate), encoded as PNG.
    pub fn render_png(
        &self,
        style: &StyleConfiguration,
        text: &str,
        sequence: i64,
        width: u32,
        height: u32,
    ) -> ThumbResult<(Vec<u8>, String)> {
        let (canvas, name) = self.generate(style, text, sequence, width, height)?;
        Ok((canvas.encode_png()?, name))
    }

    /// Render `req.count` thumbnails in parallel, returned in ascending sequence order.
    ///
    /// The first failure aborts the batch.
    #[tracing::instrument(skip(self, style, req), fields(start = req.start, count = req.count))]
    pub fn generate_batch(
        &self,
        style: &StyleConfiguration,
        req: &BatchRequest,
    ) -> ThumbResult<Vec<BatchEntry>> {
        let name_template = req
            .filename_template
            .as_deref()
            .unwrap_or(&style.filename_base);

        if req.count > 0 {
            if req.start.checked_add(i64::from(req.count - 1)).is_none() {
                return Err(ThumbError::validation(format!(
                    "batch of {} starting at {} runs past the largest sequence number",
                    req.count, req.start
                )));
            }
            // Digits never add separators, so one substituted name covers the batch.
            check_plain_filename(&output_filename(name_template, req.start))?;
        }

        let pool = build_thread_pool(req.threads)?;
        let out = pool.install(|| {
            (0..req.count)
                .into_par_iter()
                .map(|i| {
                    let sequence = req.start + i64::from(i);
                    let display = substitute_placeholder(&req.text_template, sequence);
                    let canvas =
                        render_layers(&self.resources, style, &display, req.width, req.height)?;
                    Ok(BatchEntry {
                        sequence,
                        filename: format!("{}.png", output_filename(name_template, sequence)),
                        png: canvas.encode_png()?,
                    })
                })
                .collect::<ThumbResult<Vec<_>>>()
        })?;

        tracing::info!(rendered = out.len(), "batch complete");
        Ok(out)
    }
}

/// A batch filename must name a file inside the output directory, never a path.
fn check_plain_filename(name: &str) -> ThumbResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(ThumbError::validation(format!(
            "output filename '{name}' must not contain path separators"
        )));
    }
    Ok(())
}

fn build_thread_pool(threads: Option<usize>) -> ThumbResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ThumbError::validation(
            "batch 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ThumbError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/session/generator.rs"]
mod tests;
