//! Layer compositing onto a straight-alpha canvas.

/// Pixel-level blending, scaling and rectangle fills.
pub mod composite;
pub(crate) mod glyphs;
/// The fixed five-layer pipeline.
pub mod pipeline;
