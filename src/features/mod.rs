//! Feature derivation over tracking trajectories.
//!
//! All windowed operations here share one edge policy: frames without
//! enough trailing history receive a defined sentinel value (0, -1, or the
//! current value itself, documented per function), never an error and never
//! wraparound.

/// Distance and border geometry over 2D point sequences
pub mod geometry;

/// Sliding-window statistics over numeric and categorical series
pub mod rolling;

use crate::{Error, Result};

/// Convert a window length in seconds to a frame count at the given fps.
/// Fractions of a frame are truncated, matching the windowing used
/// throughout the analyses.
///
/// # Errors
///
/// Returns an error if fps or the window is non-positive, or if the window
/// is shorter than a single frame.
pub fn window_frames(window_seconds: f64, fps: f64) -> Result<usize> {
    if fps <= 0.0 || !fps.is_finite() {
        return Err(Error::InvalidInput(format!(
            "fps must be positive, got {fps}"
        )));
    }
    if window_seconds <= 0.0 || !window_seconds.is_finite() {
        return Err(Error::InvalidInput(format!(
            "window length must be positive, got {window_seconds}s"
        )));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let frames = (window_seconds * fps) as usize;
    if frames == 0 {
        return Err(Error::InvalidInput(format!(
            "window of {window_seconds}s covers no full frame at {fps} fps"
        )));
    }
    Ok(frames)
}

pub(crate) fn validate_px_per_mm(px_per_mm: f64) -> Result<()> {
    if px_per_mm <= 0.0 || !px_per_mm.is_finite() {
        return Err(Error::InvalidInput(format!(
            "pixels/mm must be positive, got {px_per_mm}"
        )));
    }
    Ok(())
}
