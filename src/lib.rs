//! Thumbkit renders styled thumbnails: a solid background, an optional scaled background image,
//! an optional tinted pattern overlay, and wrapped, aligned, outlined text with an optional box
//! behind it.
//!
//! The public API is generator-oriented:
//!
//! - Build one [`ResourceCache`] over an asset directory and share it behind an `Arc`
//! - Parse a [`StyleConfiguration`] per request
//! - Call [`ThumbnailGenerator::generate`] for one image, or
//!   [`ThumbnailGenerator::generate_batch`] for a numbered run rendered in parallel
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;
mod layout;
mod render;
mod scene;
mod session;

pub use crate::foundation::core::{Canvas, Rgba8};
pub use crate::foundation::error::{ThumbError, ThumbResult};

pub use crate::assets::cache::CacheStats;
pub use crate::assets::decode::{MAX_IMAGE_DIM, decode_image};
pub use crate::assets::fonts::{FontFace, FontHandle, FontOrigin, Platform};
pub use crate::assets::store::{
    AssetCategory, ImageAsset, ResourceCache, ResourceCacheOpts, ResourceCacheStats,
};
pub use crate::layout::text::{BlockParams, PlacedLine, TextBlock, layout_block, wrap_with};
pub use crate::render::composite::MAX_LAYER_PIXELS;
pub use crate::render::pipeline::render_layers;
pub use crate::scene::style::{
    Alignment, HAlign, ImageRef, MAX_EXTENT, MAX_LINE_SPACING_FACTOR, StyleConfiguration, VAlign,
};
pub use crate::session::generator::{
    BatchEntry, BatchRequest, PLACEHOLDER, ThumbnailGenerator, output_filename,
    substitute_placeholder,
};
