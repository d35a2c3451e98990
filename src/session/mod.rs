//! Thumbnail generation entry points.

/// Single and batch generation.
pub mod generator;
