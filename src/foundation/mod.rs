//! Core value types shared by every layer.

/// Colors and the output canvas.
pub mod core;
/// Crate error type.
pub mod error;
pub(crate) mod math;
