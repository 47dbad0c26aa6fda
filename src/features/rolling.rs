//! Sliding-window statistics over numeric and categorical series.

use super::window_frames;
use crate::constants::UNFILLED_WINDOW_SENTINEL;
use crate::Result;

/// Difference between each frame's value and the value `window*fps` frames
/// earlier, truncated to integer. Where the look-back index would be
/// negative, the reference is the current value itself, so missing history
/// reads as no change.
///
/// # Errors
///
/// Returns an error if any window is shorter than one frame.
#[allow(clippy::cast_possible_truncation)]
pub fn distance_change_vs_reference(
    distances: &[f64],
    fps: f64,
    window_sizes: &[f64],
) -> Result<Vec<Vec<i32>>> {
    let mut results = vec![vec![0_i32; window_sizes.len()]; distances.len()];
    for (w, &window_seconds) in window_sizes.iter().enumerate() {
        let frames = window_frames(window_seconds, fps)?;
        for (i, &current) in distances.iter().enumerate() {
            let reference = if i >= frames {
                distances[i - frames]
            } else {
                current
            };
            results[i][w] = (current - reference) as i32;
        }
    }
    Ok(results)
}

/// Count of peaks within one bucket. The first element is compared only
/// against its successor, the last only against its predecessor, interior
/// elements against their predecessor. A bucket with fewer than two
/// elements has no peaks.
fn bucket_peak_count(bucket: &[f64]) -> usize {
    if bucket.len() < 2 {
        return 0;
    }
    let mut peaks = 0;
    if bucket[0] > bucket[1] {
        peaks += 1;
    }
    if bucket[bucket.len() - 1] > bucket[bucket.len() - 2] {
        peaks += 1;
    }
    for j in 1..bucket.len() - 1 {
        if bucket[j] > bucket[j - 1] {
            peaks += 1;
        }
    }
    peaks
}

/// Peak ratio over consecutive non-overlapping buckets of
/// `bucket_seconds*fps` samples (the last bucket may be shorter). Every
/// sample in a bucket receives that bucket's `peaks / bucket_len` ratio.
///
/// # Errors
///
/// Returns an error if the bucket is shorter than one frame.
#[allow(clippy::cast_precision_loss)]
pub fn peak_ratio_per_bucket(data: &[f64], bucket_seconds: f64, fps: f64) -> Result<Vec<f64>> {
    let frames = window_frames(bucket_seconds, fps)?;
    let mut results = Vec::with_capacity(data.len());
    for bucket in data.chunks(frames) {
        let ratio = bucket_peak_count(bucket) as f64 / bucket.len() as f64;
        results.extend(std::iter::repeat(ratio).take(bucket.len()));
    }
    Ok(results)
}

/// Sliding variant of [`peak_ratio_per_bucket`]: once the trailing window
/// is full, the bucket peak rule is applied to the window slice ending at
/// the current frame. Frames before the window fills hold `-1`.
///
/// # Errors
///
/// Returns an error if any window is shorter than one frame.
#[allow(clippy::cast_precision_loss)]
pub fn rolling_peak_ratio(data: &[f64], fps: f64, window_sizes: &[f64]) -> Result<Vec<Vec<f64>>> {
    let mut results = vec![vec![UNFILLED_WINDOW_SENTINEL; window_sizes.len()]; data.len()];
    for (w, &window_seconds) in window_sizes.iter().enumerate() {
        let frames = window_frames(window_seconds, fps)?;
        for end in frames..=data.len() {
            let window = &data[end - frames..end];
            results[end - 1][w] = bucket_peak_count(window) as f64 / window.len() as f64;
        }
    }
    Ok(results)
}

/// Ratio of adjacent-sample value changes within the trailing window, per
/// frame and per window size. Frames before the window fills hold `-1`.
/// Works over any comparable category type, numeric or string.
///
/// # Errors
///
/// Returns an error if any window is shorter than one frame.
#[allow(clippy::cast_precision_loss)]
pub fn categorical_switch_ratio<T: PartialEq>(
    data: &[T],
    fps: f64,
    window_sizes: &[f64],
) -> Result<Vec<Vec<f64>>> {
    let mut results = vec![vec![UNFILLED_WINDOW_SENTINEL; window_sizes.len()]; data.len()];
    for (w, &window_seconds) in window_sizes.iter().enumerate() {
        let frames = window_frames(window_seconds, fps)?;
        for end in frames..=data.len() {
            let window = &data[end - frames..end];
            let switches = window.windows(2).filter(|pair| pair[0] != pair[1]).count();
            results[end - 1][w] = switches as f64 / window.len() as f64;
        }
    }
    Ok(results)
}

/// Duration in seconds of the run of identical values ending at each frame.
/// Resets on any value change; the first frame of a run reads `1/fps`.
///
/// # Errors
///
/// Returns an error if fps is non-positive.
#[allow(clippy::cast_precision_loss)]
pub fn consecutive_run_duration<T: PartialEq>(data: &[T], fps: f64) -> Result<Vec<f64>> {
    if fps <= 0.0 || !fps.is_finite() {
        return Err(crate::Error::InvalidInput(format!(
            "fps must be positive, got {fps}"
        )));
    }
    let mut results = Vec::with_capacity(data.len());
    let mut run = 0_usize;
    for (i, value) in data.iter().enumerate() {
        if i > 0 && *value == data[i - 1] {
            run += 1;
        } else {
            run = 1;
        }
        results.push(run as f64 / fps);
    }
    Ok(results)
}

/// Sum over the trailing window once it fills; frames before hold `-1`.
///
/// # Errors
///
/// Returns an error if the window is shorter than one frame.
pub fn sliding_sum(data: &[f64], window_seconds: f64, fps: f64) -> Result<Vec<f64>> {
    let frames = window_frames(window_seconds, fps)?;
    let mut results = vec![UNFILLED_WINDOW_SENTINEL; data.len()];
    for end in frames..=data.len() {
        results[end - 1] = data[end - frames..end].iter().sum();
    }
    Ok(results)
}
