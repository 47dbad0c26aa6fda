//! Distance and border geometry over 2D point sequences.

use super::{validate_px_per_mm, window_frames};
use crate::constants::{MM_PER_CM, UNFILLED_BORDER_SENTINEL};
use crate::data_table::TrackPoint;
use crate::{Error, Result};

/// Per-frame Euclidean distance between two equal-length point sequences,
/// converted from pixels to millimetres (or centimetres).
///
/// # Errors
///
/// Returns an error if the sequences differ in length or the scale is
/// non-positive.
pub fn framewise_distance(
    a: &[TrackPoint],
    b: &[TrackPoint],
    px_per_mm: f64,
    centimeters: bool,
) -> Result<Vec<f64>> {
    validate_px_per_mm(px_per_mm)?;
    if a.len() != b.len() {
        return Err(Error::ShapeMismatch(format!(
            "point sequences differ in length ({} vs {})",
            a.len(),
            b.len()
        )));
    }
    let divisor = if centimeters {
        px_per_mm * MM_PER_CM
    } else {
        px_per_mm
    };
    Ok(a.iter()
        .zip(b)
        .map(|(pa, pb)| pa.distance_to(pb) / divisor)
        .collect())
}

/// Frame-to-frame displacement of one trajectory. The reference is the
/// trajectory shifted back one frame with its first point repeated, so the
/// first frame moves zero.
///
/// # Errors
///
/// Returns an error on a non-positive scale.
pub fn framewise_movement(
    points: &[TrackPoint],
    px_per_mm: f64,
    centimeters: bool,
) -> Result<Vec<f64>> {
    let first = match points.first() {
        Some(&first) => first,
        None => return Ok(Vec::new()),
    };
    let reference: Vec<TrackPoint> = std::iter::once(first)
        .chain(points[..points.len() - 1].iter().copied())
        .collect();
    framewise_distance(points, &reference, px_per_mm, centimeters)
}

/// Mean distance from every point in the trailing window to each image
/// edge, per frame.
///
/// The window includes the current frame; distances are perpendicular to
/// the edge (left = |x|, right = |width - x|, top = |y|,
/// bottom = |height - y|), averaged over the window, scaled by pixels/mm
/// and truncated to integer. Coordinates outside the frame still yield
/// nonnegative distances. Rows before the first full window hold
/// `[-1, -1, -1, -1]`.
///
/// # Errors
///
/// Returns an error on a non-positive scale or a window shorter than one
/// frame.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn border_distances(
    points: &[TrackPoint],
    px_per_mm: f64,
    image_size: (i32, i32),
    window_seconds: f64,
    fps: f64,
) -> Result<Vec<[i32; 4]>> {
    validate_px_per_mm(px_per_mm)?;
    let (width, height) = image_size;
    if width <= 0 || height <= 0 {
        return Err(Error::InvalidInput(format!(
            "image size must be positive, got {width}x{height}"
        )));
    }
    let frames = window_frames(window_seconds, fps)?;

    let mut results = vec![[UNFILLED_BORDER_SENTINEL; 4]; points.len()];
    for end in frames..=points.len() {
        let window = &points[end - frames..end];
        let mut sums = [0.0_f64; 4];
        for point in window {
            sums[0] += point.x.abs();
            sums[1] += (f64::from(width) - point.x).abs();
            sums[2] += point.y.abs();
            sums[3] += (f64::from(height) - point.y).abs();
        }
        let mut row = [0_i32; 4];
        for (out, sum) in row.iter_mut().zip(sums) {
            *out = (sum / window.len() as f64 / px_per_mm) as i32;
        }
        results[end - 1] = row;
    }
    Ok(results)
}

/// Sum of absolute x-axis movement minus sum of absolute y-axis movement
/// over the trailing window, per frame and per window size. Positive values
/// mean horizontal movement dominates. Rows before the first full window
/// hold `0`.
///
/// # Errors
///
/// Returns an error on a non-positive scale or any window shorter than one
/// frame.
#[allow(clippy::cast_possible_truncation)]
pub fn directional_movement_delta(
    points: &[TrackPoint],
    px_per_mm: f64,
    window_sizes: &[f64],
    fps: f64,
) -> Result<Vec<Vec<i32>>> {
    validate_px_per_mm(px_per_mm)?;
    let mut results = vec![vec![0_i32; window_sizes.len()]; points.len()];
    for (w, &window_seconds) in window_sizes.iter().enumerate() {
        let frames = window_frames(window_seconds, fps)?;
        for end in frames..=points.len() {
            let window = &points[end - frames..end];
            let mut x_movement = 0.0;
            let mut y_movement = 0.0;
            for pair in window.windows(2) {
                x_movement += (pair[1].x - pair[0].x).abs();
                y_movement += (pair[1].y - pair[0].y).abs();
            }
            results[end - 1][w] = ((x_movement - y_movement) / px_per_mm) as i32;
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<TrackPoint> {
        coords.iter().map(|&(x, y)| TrackPoint::new(x, y)).collect()
    }

    #[test]
    fn test_framewise_distance_is_elementwise_norm() {
        let a = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        let b = pts(&[(3.0, 4.0), (1.0, 1.0), (2.0, 5.0)]);
        let distances = framewise_distance(&a, &b, 1.0, false).unwrap();
        assert_eq!(distances, vec![5.0, 0.0, 5.0]);
    }

    #[test]
    fn test_framewise_distance_scaling() {
        let a = pts(&[(0.0, 0.0)]);
        let b = pts(&[(0.0, 100.0)]);
        assert_eq!(framewise_distance(&a, &b, 10.0, false).unwrap(), vec![10.0]);
        assert_eq!(framewise_distance(&a, &b, 10.0, true).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_framewise_movement_first_frame_zero() {
        let points = pts(&[(0.0, 0.0), (3.0, 4.0), (3.0, 4.0), (6.0, 8.0)]);
        let movement = framewise_movement(&points, 1.0, false).unwrap();
        assert_eq!(movement, vec![0.0, 5.0, 0.0, 5.0]);
        assert!(framewise_movement(&[], 1.0, false).unwrap().is_empty());
    }

    #[test]
    fn test_framewise_distance_length_mismatch() {
        let a = pts(&[(0.0, 0.0), (1.0, 1.0)]);
        let b = pts(&[(0.0, 0.0)]);
        assert!(matches!(
            framewise_distance(&a, &b, 1.0, false),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_border_distances_constant_point() {
        let points = pts(&[(250.0, 250.0); 6]);
        let results = border_distances(&points, 1.0, (500, 500), 1.0, 2.0).unwrap();
        assert_eq!(results[0], [UNFILLED_BORDER_SENTINEL; 4]);
        for row in &results[1..] {
            assert_eq!(*row, [250, 250, 250, 250]);
        }
    }

    #[test]
    fn test_border_distances_moving_point() {
        // Window of 2 frames at 2 fps and 1 s
        let points = pts(&[
            (250.0, 250.0),
            (250.0, 250.0),
            (250.0, 250.0),
            (500.0, 500.0),
            (500.0, 500.0),
            (500.0, 500.0),
        ]);
        let results = border_distances(&points, 1.0, (500, 500), 1.0, 2.0).unwrap();
        assert_eq!(
            results,
            vec![
                [-1, -1, -1, -1],
                [250, 250, 250, 250],
                [250, 250, 250, 250],
                [375, 125, 375, 125],
                [500, 0, 500, 0],
                [500, 0, 500, 0],
            ]
        );
    }

    #[test]
    fn test_border_distances_off_frame_point() {
        // Occlusion puts coordinates outside the frame; distances stay
        // absolute
        let points = pts(&[(-10.0, 50.0), (-10.0, 50.0), (-30.0, 50.0), (30.0, 50.0)]);
        let results = border_distances(&points, 1.0, (500, 500), 1.0, 2.0).unwrap();
        assert_eq!(results[0], [UNFILLED_BORDER_SENTINEL; 4]);
        assert_eq!(results[1], [10, 510, 50, 450]);
        // Mean of |-30| and |30| is 30, not a cancelled 0
        assert_eq!(results[3], [30, 500, 50, 450]);
    }

    #[test]
    fn test_directional_movement_delta() {
        let points = pts(&[
            (250.0, 250.0),
            (250.0, 250.0),
            (250.0, 250.0),
            (250.0, 500.0),
            (500.0, 500.0),
            (500.0, 500.0),
        ]);
        let results = directional_movement_delta(&points, 1.0, &[1.0], 2.0).unwrap();
        let flat: Vec<i32> = results.iter().map(|row| row[0]).collect();
        assert_eq!(flat, vec![0, 0, 0, -250, 250, 0]);
    }

    #[test]
    fn test_directional_movement_delta_scaled() {
        let points = pts(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
        let results = directional_movement_delta(&points, 2.0, &[1.0], 2.0).unwrap();
        // 10 px of x movement per frame pair, divided by 2 px/mm
        assert_eq!(results[1][0], 5);
        assert_eq!(results[2][0], 5);
    }

    #[test]
    fn test_window_too_short_is_error() {
        let points = pts(&[(0.0, 0.0)]);
        assert!(border_distances(&points, 1.0, (10, 10), 0.001, 2.0).is_err());
        assert!(directional_movement_delta(&points, 1.0, &[0.001], 2.0).is_err());
    }
}
