//! Sequence analysis over discretized region-occupancy and coordinate
//! streams: spontaneous-alternation detection for maze arm entries and
//! exact-coordinate path-loop detection.

use crate::{Error, Result};
use std::collections::HashMap;

/// Outcome of one spontaneous-alternation analysis
#[derive(Debug, Clone, PartialEq)]
pub struct AlternationResult {
    /// Completed all-distinct visit sequences
    pub alternation_cnt: usize,

    /// Alternations as a percentage of evaluated visit windows
    pub pct_alternation: f64,

    /// Same-arm plus alternate-arm returns
    pub error_cnt: usize,

    /// Immediate re-entries into the arm just left
    pub same_arm_returns_cnt: usize,

    /// Re-entries into an earlier arm of the window
    pub alternate_arm_returns_cnt: usize,

    /// Frame indices at which each exact region-name sequence completed
    pub alternations: HashMap<Vec<String>, Vec<usize>>,

    /// Frame indices of same-arm returns, keyed by the re-entered region
    pub same_arm_returns: HashMap<String, Vec<usize>>,

    /// Frame indices of alternate-arm returns, keyed by the re-entered region
    pub alternate_arm_returns: HashMap<String, Vec<usize>>,
}

/// Detect spontaneous alternations in a row-per-frame occupancy table.
///
/// Every cell must be 0 or 1 with at most one region active per row.
/// All-zero rows (animal outside every region) are dropped, consecutive
/// stays in the same region collapse to one visit, and a window of
/// `region_names.len()` consecutive visits counts as an alternation when
/// all its entries are distinct. Non-alternating windows are classified as
/// same-arm returns (current visit repeats the immediately prior one) or
/// alternate-arm returns.
///
/// # Errors
///
/// Returns an error if row widths disagree with `region_names`, any cell
/// is outside {0, 1}, or any row has more than one active region.
#[allow(clippy::cast_precision_loss)]
pub fn spontaneous_alternations(
    occupancy: &[Vec<f64>],
    region_names: &[String],
) -> Result<AlternationResult> {
    let num_regions = region_names.len();
    if num_regions < 2 {
        return Err(Error::InvalidInput(format!(
            "alternation analysis needs at least two regions, got {num_regions}"
        )));
    }

    let mut invalid_values: Vec<f64> = Vec::new();
    let mut multi_active_frames = 0_usize;
    for (idx, row) in occupancy.iter().enumerate() {
        if row.len() != num_regions {
            return Err(Error::ShapeMismatch(format!(
                "occupancy row {idx} has {} values, expected {num_regions}",
                row.len()
            )));
        }
        let mut active = 0_usize;
        for &value in row {
            if value == 1.0 {
                active += 1;
            } else if value != 0.0 && !invalid_values.contains(&value) {
                invalid_values.push(value);
            }
        }
        if active > 1 {
            multi_active_frames += 1;
        }
    }
    if !invalid_values.is_empty() {
        invalid_values.sort_by(f64::total_cmp);
        return Err(Error::InvalidRoiData(format!(
            "occupancy values must be 0 or 1, found {invalid_values:?}"
        )));
    }
    if multi_active_frames > 0 {
        return Err(Error::InvalidRoiData(format!(
            "{multi_active_frames} frame(s) have more than one active region"
        )));
    }

    // Visits: (original frame index, region index), all-zero rows dropped,
    // consecutive stays collapsed to the run's first frame
    let mut visits: Vec<(usize, usize)> = Vec::new();
    for (idx, row) in occupancy.iter().enumerate() {
        if let Some(region) = row.iter().position(|&v| v == 1.0) {
            if visits.last().map_or(true, |&(_, prev)| prev != region) {
                visits.push((idx, region));
            }
        }
    }

    let mut alternations: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    let mut same_arm_returns: HashMap<String, Vec<usize>> = HashMap::new();
    let mut alternate_arm_returns: HashMap<String, Vec<usize>> = HashMap::new();
    let (mut alternation_cnt, mut same_cnt, mut alternate_cnt) = (0, 0, 0);

    for i in (num_regions - 1)..visits.len() {
        let window = &visits[i + 1 - num_regions..=i];
        let (frame_idx, current) = visits[i];
        let distinct = window
            .iter()
            .all(|&(_, a)| window.iter().filter(|&&(_, b)| a == b).count() == 1);
        if distinct {
            let key: Vec<String> = window
                .iter()
                .map(|&(_, region)| region_names[region].clone())
                .collect();
            alternations.entry(key).or_default().push(frame_idx);
            alternation_cnt += 1;
        } else if current == visits[i - 1].1 {
            same_arm_returns
                .entry(region_names[current].clone())
                .or_default()
                .push(frame_idx);
            same_cnt += 1;
        } else {
            alternate_arm_returns
                .entry(region_names[current].clone())
                .or_default()
                .push(frame_idx);
            alternate_cnt += 1;
        }
    }

    let evaluated_windows = visits.len().saturating_sub(num_regions - 1);
    let pct_alternation = if evaluated_windows == 0 {
        0.0
    } else {
        alternation_cnt as f64 / evaluated_windows as f64 * 100.0
    };

    Ok(AlternationResult {
        alternation_cnt,
        pct_alternation,
        error_cnt: same_cnt + alternate_cnt,
        same_arm_returns_cnt: same_cnt,
        alternate_arm_returns_cnt: alternate_cnt,
        alternations,
        same_arm_returns,
        alternate_arm_returns,
    })
}

/// Find coordinates the animal returned to after having left them.
///
/// Frame indices are grouped by exact coordinate; within a group an index
/// survives when it is more than one frame past the previous occurrence,
/// so dwelling on a spot collapses to the arrival frame while a departure
/// and return is recorded. Only coordinates with at least two surviving
/// visits are reported.
#[must_use]
pub fn find_path_loops(points: &[(i32, i32)]) -> HashMap<(i32, i32), Vec<usize>> {
    let mut seen: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
    for (idx, &point) in points.iter().enumerate() {
        seen.entry(point).or_default().push(idx);
    }

    let mut loops = HashMap::new();
    for (coord, frames) in seen {
        let kept: Vec<usize> = frames
            .iter()
            .enumerate()
            .filter(|&(n, &frame)| n == 0 || frame > frames[n - 1] + 1)
            .map(|(_, &frame)| frame)
            .collect();
        if kept.len() > 1 {
            loops.insert(coord, kept);
        }
    }
    loops
}
