//! Per-video velocity aggregation.
//!
//! Movement is the frame-to-frame displacement of a single body part in
//! centimetres, with the first frame pinned to zero. Rolling velocity sums
//! that movement over a one-second trailing window, so its unit is cm/s at
//! the video's frame rate.

use crate::constants::VELOCITY_WINDOW_SECONDS;
use crate::data_table::TrackPoint;
use crate::features::{geometry, rolling::sliding_sum};
use crate::Result;
use std::path::Path;

/// Rolling and mean velocity for one video
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityReport {
    pub video: String,
    /// cm/s per frame; unfilled leading entries carry the window sentinel
    pub rolling_cm_s: Vec<f64>,
    pub mean_cm_s: f64,
}

/// Frame-to-frame displacement in centimetres, first frame pinned to zero.
///
/// # Errors
///
/// Returns an error on a non-positive scale.
pub fn framewise_movement(points: &[TrackPoint], px_per_mm: f64) -> Result<Vec<f64>> {
    geometry::framewise_movement(points, px_per_mm, true)
}

/// Movement summed over a one-second trailing window.
///
/// # Errors
///
/// Returns an error on a non-positive frame rate or a window shorter than
/// one frame.
pub fn rolling_velocity(movement: &[f64], fps: f64) -> Result<Vec<f64>> {
    sliding_sum(movement, VELOCITY_WINDOW_SECONDS, fps)
}

/// Mean over the whole rolling series, sentinel entries included; zero for
/// an empty series.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_velocity(rolling: &[f64]) -> f64 {
    if rolling.is_empty() {
        return 0.0;
    }
    rolling.iter().sum::<f64>() / rolling.len() as f64
}

/// Full velocity pass for one video's body-part trajectory.
///
/// # Errors
///
/// Returns an error on a non-positive scale or frame rate.
pub fn analyze(
    video: &str,
    points: &[TrackPoint],
    px_per_mm: f64,
    fps: f64,
) -> Result<VelocityReport> {
    let movement = framewise_movement(points, px_per_mm)?;
    let rolling_cm_s = rolling_velocity(&movement, fps)?;
    let mean_cm_s = mean_velocity(&rolling_cm_s);
    log::debug!(
        "'{video}': mean velocity {mean_cm_s:.4} cm/s over {} frames",
        rolling_cm_s.len()
    );
    Ok(VelocityReport {
        video: video.to_string(),
        rolling_cm_s,
        mean_cm_s,
    })
}

/// Write one video's per-frame rolling velocity.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_rolling_csv(report: &VelocityReport, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["frame", "rolling_velocity_cm_s"])?;
    for (frame, velocity) in report.rolling_cm_s.iter().enumerate() {
        writer.write_record([frame.to_string(), velocity.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the batch summary, one mean per video.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_mean_summary(reports: &[VelocityReport], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["video", "mean_velocity_cm_s"])?;
    for report in reports {
        writer.write_record([report.video.clone(), report.mean_cm_s.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
