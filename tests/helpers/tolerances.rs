//! Tolerance constants for composition testing.

/// Pixel coordinates that went through f32 normalization and back.
pub const PIXEL_EPSILON: f64 = 1e-3;

/// Heuristic scores are plain f64 arithmetic.
pub const SCORE_EPSILON: f64 = 1e-9;
