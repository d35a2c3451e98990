//! Render parameters.

/// Style configuration and alignment.
pub mod style;
