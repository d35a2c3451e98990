//! Text measurement, wrapping and block placement.

/// Greedy wrapping and alignment.
pub mod text;
